//! プロセス内で完結するストア。テストや DB を用意できない環境で Postgres 実装の代わりに使う。
//! 書き込みは一つの RwLock の中で行うため、予約行と装備行は常にまとめて反映される。

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use async_trait::async_trait;
use chrono::NaiveDate;
use kernel::{
    model::{
        booking::{
            event::{NewBooking, UpdateBookingStatus},
            Booking, BookingEquipment, BookingStatus, EquipmentUsage,
        },
        equipment::Equipment,
        id::{BookingId, EquipmentId, SiteId, SiteTypeId, UserId},
        site::{Site, SiteStatus},
        site_type::{DailyPrice, SiteType},
        stay::StayRange,
    },
    repository::{
        booking::BookingRepository, catalog::CatalogRepository, health::HealthCheckRepository,
    },
};
use rust_decimal::Decimal;
use shared::error::{AppError, AppResult};
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    site_types: HashMap<SiteTypeId, SiteType>,
    sites: Vec<Site>,
    daily_prices: BTreeMap<(SiteTypeId, NaiveDate), Decimal>,
    equipments: HashMap<EquipmentId, Equipment>,
    bookings: Vec<Booking>,
    booking_equipments: Vec<BookingEquipment>,
}

#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_site_type(
        &self,
        type_name: &str,
        base_price: Decimal,
        max_guests: i32,
    ) -> SiteTypeId {
        let site_type_id = SiteTypeId::new();
        self.tables.write().await.site_types.insert(
            site_type_id,
            SiteType {
                site_type_id,
                type_name: type_name.into(),
                base_price,
                max_guests,
                description: String::new(),
                image_url: String::new(),
            },
        );
        site_type_id
    }

    pub async fn add_site(
        &self,
        site_type_id: SiteTypeId,
        site_no: &str,
        status: SiteStatus,
    ) -> SiteId {
        let site_id = SiteId::new();
        self.tables.write().await.sites.push(Site {
            site_id,
            site_type_id,
            site_no: site_no.into(),
            status,
        });
        site_id
    }

    pub async fn set_daily_price(&self, site_type_id: SiteTypeId, date: NaiveDate, price: Decimal) {
        self.tables
            .write()
            .await
            .daily_prices
            .insert((site_type_id, date), price);
    }

    pub async fn add_equipment(
        &self,
        equipment_name: &str,
        unit_price: Decimal,
        total_stock: i32,
        category: &str,
    ) -> EquipmentId {
        let equipment_id = EquipmentId::new();
        self.tables.write().await.equipments.insert(
            equipment_id,
            Equipment {
                equipment_id,
                equipment_name: equipment_name.into(),
                unit_price,
                total_stock,
                category: category.into(),
            },
        );
        equipment_id
    }

    /// 保存されている予約行をそのまま返す
    pub async fn bookings(&self) -> Vec<Booking> {
        self.tables.read().await.bookings.clone()
    }

    /// 保存されている装備行をそのまま返す
    pub async fn booking_equipments(&self) -> Vec<BookingEquipment> {
        self.tables.read().await.booking_equipments.clone()
    }
}

impl Tables {
    fn booking_mut(&mut self, event: &UpdateBookingStatus) -> AppResult<&mut Booking> {
        self.bookings
            .iter_mut()
            .find(|b| b.booking_id == event.booking_id && b.status == event.expected)
            .ok_or_else(|| {
                AppError::NoRowsAffectedError(format!(
                    "booking {} is no longer {}",
                    event.booking_id, event.expected
                ))
            })
    }
}

#[async_trait]
impl HealthCheckRepository for InMemoryDatabase {
    async fn check_db(&self) -> bool {
        true
    }
}

#[async_trait]
impl CatalogRepository for InMemoryDatabase {
    async fn find_site_type(&self, site_type_id: SiteTypeId) -> AppResult<Option<SiteType>> {
        Ok(self.tables.read().await.site_types.get(&site_type_id).cloned())
    }

    async fn find_sites_by_type(&self, site_type_id: SiteTypeId) -> AppResult<Vec<Site>> {
        let mut sites: Vec<Site> = self
            .tables
            .read()
            .await
            .sites
            .iter()
            .filter(|s| s.site_type_id == site_type_id)
            .cloned()
            .collect();
        sites.sort_by(|a, b| (a.site_no.as_str(), a.site_id).cmp(&(b.site_no.as_str(), b.site_id)));
        Ok(sites)
    }

    async fn find_daily_prices(
        &self,
        site_type_id: SiteTypeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<DailyPrice>> {
        if end <= start {
            return Ok(vec![]);
        }
        Ok(self
            .tables
            .read()
            .await
            .daily_prices
            .range((site_type_id, start)..(site_type_id, end))
            .map(|(&(site_type_id, specific_date), &price)| DailyPrice {
                site_type_id,
                specific_date,
                price,
            })
            .collect())
    }

    async fn find_equipment(&self, equipment_id: EquipmentId) -> AppResult<Option<Equipment>> {
        Ok(self.tables.read().await.equipments.get(&equipment_id).cloned())
    }
}

#[async_trait]
impl BookingRepository for InMemoryDatabase {
    async fn insert_booking(&self, event: NewBooking) -> AppResult<BookingId> {
        let mut tables = self.tables.write().await;

        let site = tables
            .sites
            .iter()
            .find(|s| s.site_id == event.site_id && s.site_type_id == event.site_type_id)
            .cloned()
            .ok_or_else(|| {
                AppError::ConversionEntityError(format!("unknown site {}", event.site_id))
            })?;
        // Postgres の排他制約と同じく、同じサイトで有効な予約の期間が重なる行は拒否する
        if tables
            .bookings
            .iter()
            .any(|b| b.site_id == site.site_id && b.status.is_active() && b.stay.overlaps(&event.stay))
        {
            return Err(AppError::NoSiteAvailable);
        }
        if let Some(line) = event
            .equipments
            .iter()
            .find(|line| !tables.equipments.contains_key(&line.equipment_id))
        {
            return Err(AppError::EquipmentNotFound(line.equipment_id.to_string()));
        }

        tables.bookings.push(Booking {
            booking_id: event.booking_id,
            user_id: event.user_id,
            site_type_id: event.site_type_id,
            site_id: site.site_id,
            site_no: site.site_no,
            stay: event.stay,
            guest_name: event.guest_name,
            guest_phone: event.guest_phone,
            total_price: event.total_price,
            status: BookingStatus::Pending,
            created_at: event.created_at,
            updated_at: event.created_at,
        });
        tables.booking_equipments.extend(event.equipments);

        Ok(event.booking_id)
    }

    async fn update_booking_status(&self, event: UpdateBookingStatus) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let booking = tables.booking_mut(&event)?;
        booking.status = event.next;
        booking.updated_at = event.updated_at;
        Ok(())
    }

    async fn cancel_booking(&self, event: UpdateBookingStatus) -> AppResult<()> {
        let mut tables = self.tables.write().await;
        let booking = tables.booking_mut(&event)?;
        booking.status = event.next;
        booking.updated_at = event.updated_at;
        tables
            .booking_equipments
            .retain(|line| line.booking_id != event.booking_id);
        Ok(())
    }

    async fn find_overlapping(
        &self,
        site_type_id: SiteTypeId,
        stay: StayRange,
    ) -> AppResult<Vec<Booking>> {
        Ok(self
            .tables
            .read()
            .await
            .bookings
            .iter()
            .filter(|b| {
                b.site_type_id == site_type_id && b.status.is_active() && b.stay.overlaps(&stay)
            })
            .cloned()
            .collect())
    }

    async fn find_equipment_usage(
        &self,
        equipment_id: EquipmentId,
        stay: StayRange,
    ) -> AppResult<Vec<EquipmentUsage>> {
        let tables = self.tables.read().await;
        let active: HashMap<BookingId, StayRange> = tables
            .bookings
            .iter()
            .filter(|b| b.status.is_active() && b.stay.overlaps(&stay))
            .map(|b| (b.booking_id, b.stay))
            .collect();
        Ok(tables
            .booking_equipments
            .iter()
            .filter(|line| line.equipment_id == equipment_id)
            .filter_map(|line| {
                active.get(&line.booking_id).map(|stay| EquipmentUsage {
                    booking_id: line.booking_id,
                    stay: *stay,
                    quantity: line.quantity,
                })
            })
            .collect())
    }

    async fn find_by_id(&self, booking_id: BookingId) -> AppResult<Option<Booking>> {
        Ok(self
            .tables
            .read()
            .await
            .bookings
            .iter()
            .find(|b| b.booking_id == booking_id)
            .cloned())
    }

    async fn find_by_user(
        &self,
        user_id: UserId,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .tables
            .read()
            .await
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id && status.map_or(true, |s| b.status == s))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn find_booking_equipments(
        &self,
        booking_id: BookingId,
    ) -> AppResult<Vec<BookingEquipment>> {
        let mut lines: Vec<BookingEquipment> = self
            .tables
            .read()
            .await
            .booking_equipments
            .iter()
            .filter(|line| line.booking_id == booking_id)
            .cloned()
            .collect();
        lines.sort_by_key(|line| line.equipment_id);
        Ok(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    async fn booking_on(
        db: &InMemoryDatabase,
        site_type_id: SiteTypeId,
        site_id: SiteId,
        stay: StayRange,
    ) -> AppResult<BookingId> {
        db.insert_booking(NewBooking {
            booking_id: BookingId::new(),
            user_id: UserId::new(),
            site_type_id,
            site_id,
            stay,
            guest_name: "Guest".into(),
            guest_phone: "000".into(),
            total_price: dec!(240.00),
            equipments: vec![],
            created_at: Utc::now(),
        })
        .await
    }

    #[tokio::test]
    async fn overlapping_insert_on_same_site_is_rejected() {
        let db = InMemoryDatabase::new();
        let site_type_id = db.add_site_type("Lake-View", dec!(120.00), 4).await;
        let site_id = db.add_site(site_type_id, "Site-1-01", SiteStatus::Normal).await;
        let stay = StayRange::new(date("2024-06-01"), date("2024-06-03")).unwrap();
        let later = StayRange::new(date("2024-06-02"), date("2024-06-04")).unwrap();

        booking_on(&db, site_type_id, site_id, stay).await.unwrap();
        let res = booking_on(&db, site_type_id, site_id, later).await;

        assert!(matches!(res, Err(AppError::NoSiteAvailable)));
        assert_eq!(db.bookings().await.len(), 1);
    }

    #[tokio::test]
    async fn stale_status_update_is_refused() {
        let db = InMemoryDatabase::new();
        let site_type_id = db.add_site_type("Lake-View", dec!(120.00), 4).await;
        let site_id = db.add_site(site_type_id, "Site-1-01", SiteStatus::Normal).await;
        let stay = StayRange::new(date("2024-06-01"), date("2024-06-03")).unwrap();
        let booking_id = booking_on(&db, site_type_id, site_id, stay).await.unwrap();

        let res = db
            .update_booking_status(UpdateBookingStatus::new(
                booking_id,
                BookingStatus::Paid,
                BookingStatus::Cancelled,
                Utc::now(),
            ))
            .await;

        assert!(matches!(res, Err(AppError::NoRowsAffectedError(_))));
        assert_eq!(db.bookings().await[0].status, BookingStatus::Pending);
    }

    #[tokio::test]
    async fn daily_prices_are_limited_to_the_half_open_range() {
        let db = InMemoryDatabase::new();
        let site_type_id = db.add_site_type("Lake-View", dec!(120.00), 4).await;
        db.set_daily_price(site_type_id, date("2024-06-01"), dec!(100.00)).await;
        db.set_daily_price(site_type_id, date("2024-06-03"), dec!(300.00)).await;

        let prices = db
            .find_daily_prices(site_type_id, date("2024-06-01"), date("2024-06-03"))
            .await
            .unwrap();

        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].price, dec!(100.00));
    }
}
