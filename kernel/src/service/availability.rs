use std::{collections::HashSet, sync::Arc};

use derive_new::new;
use shared::error::{AppError, AppResult};

use crate::{
    model::{
        booking::{Booking, EquipmentUsage},
        equipment::Equipment,
        id::{EquipmentId, SiteTypeId},
        site::Site,
        stay::StayRange,
    },
    repository::{booking::BookingRepository, catalog::CatalogRepository},
};

/// 期間内の各夜について、重なる予約が確保している数量の合計を求め、その最大値を返す。
/// 期間全体の単純合計ではなく、同じ夜に同時に使われる数量のピーク。
pub fn peak_usage(usages: &[EquipmentUsage], stay: &StayRange) -> i32 {
    stay.nights_iter()
        .map(|night| {
            usages
                .iter()
                .filter(|u| u.stay.contains_night(night))
                .map(|u| u.quantity)
                .sum::<i32>()
        })
        .max()
        .unwrap_or(0)
}

/// 稼働中（NORMAL）で、有効な予約と重ならないサイトだけを残す
pub fn free_sites(sites: Vec<Site>, overlapping: &[Booking], stay: &StayRange) -> Vec<Site> {
    let occupied: HashSet<_> = overlapping
        .iter()
        .filter(|b| b.status.is_active() && b.stay.overlaps(stay))
        .map(|b| b.site_id)
        .collect();
    sites
        .into_iter()
        .filter(|s| s.is_allocatable() && !occupied.contains(&s.site_id))
        .collect()
}

#[derive(new)]
pub struct AvailabilityChecker {
    catalog: Arc<dyn CatalogRepository>,
    bookings: Arc<dyn BookingRepository>,
}

impl AvailabilityChecker {
    pub async fn available_sites(
        &self,
        site_type_id: SiteTypeId,
        stay: StayRange,
    ) -> AppResult<Vec<Site>> {
        let sites = self.catalog.find_sites_by_type(site_type_id).await?;
        let overlapping = self.bookings.find_overlapping(site_type_id, stay).await?;
        Ok(free_sites(sites, &overlapping, &stay))
    }

    pub async fn site_available(&self, site_type_id: SiteTypeId, stay: StayRange) -> AppResult<bool> {
        Ok(!self.available_sites(site_type_id, stay).await?.is_empty())
    }

    /// 総在庫からピーク使用数を引いた残数
    pub async fn remaining_stock(&self, equipment: &Equipment, stay: StayRange) -> AppResult<i32> {
        let usages = self
            .bookings
            .find_equipment_usage(equipment.equipment_id, stay)
            .await?;
        Ok(equipment.total_stock - peak_usage(&usages, &stay))
    }

    pub async fn equipment_available(
        &self,
        equipment_id: EquipmentId,
        quantity: i32,
        stay: StayRange,
    ) -> AppResult<bool> {
        let equipment = self
            .catalog
            .find_equipment(equipment_id)
            .await?
            .ok_or_else(|| AppError::EquipmentNotFound(equipment_id.to_string()))?;
        Ok(self.remaining_stock(&equipment, stay).await? >= quantity)
    }

    /// 在庫が足りなければ要求数と残数を添えて InsufficientEquipmentStock を返す
    pub async fn ensure_equipment(
        &self,
        equipment: &Equipment,
        quantity: i32,
        stay: StayRange,
    ) -> AppResult<()> {
        let available = self.remaining_stock(equipment, stay).await?;
        if available < quantity {
            return Err(AppError::InsufficientEquipmentStock {
                equipment_id: equipment.equipment_id.to_string(),
                name: equipment.equipment_name.clone(),
                requested: quantity,
                available: available.max(0),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        model::{
            booking::BookingStatus,
            id::{BookingId, SiteId, UserId},
            site::SiteStatus,
        },
        repository::{booking::MockBookingRepository, catalog::MockCatalogRepository},
    };
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn stay(a: &str, b: &str) -> StayRange {
        StayRange::new(date(a), date(b)).unwrap()
    }

    fn usage(a: &str, b: &str, quantity: i32) -> EquipmentUsage {
        EquipmentUsage {
            booking_id: BookingId::new(),
            stay: stay(a, b),
            quantity,
        }
    }

    fn site(no: &str, status: SiteStatus) -> Site {
        Site {
            site_id: SiteId::new(),
            site_type_id: SiteTypeId::new(),
            site_no: no.into(),
            status,
        }
    }

    fn booking_on(site: &Site, stay: StayRange, status: BookingStatus) -> Booking {
        Booking {
            booking_id: BookingId::new(),
            user_id: UserId::new(),
            site_type_id: site.site_type_id,
            site_id: site.site_id,
            site_no: site.site_no.clone(),
            stay,
            guest_name: "guest".into(),
            guest_phone: "000".into(),
            total_price: Decimal::ZERO,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn peak_counts_only_nights_that_share_a_booking() {
        // 6/1-6/3 に 2 個、6/3-6/5 に 2 個。同じ夜には重ならない
        let usages = vec![
            usage("2024-06-01", "2024-06-03", 2),
            usage("2024-06-03", "2024-06-05", 2),
        ];
        assert_eq!(peak_usage(&usages, &stay("2024-06-01", "2024-06-05")), 2);
    }

    #[test]
    fn peak_sums_bookings_on_the_same_night() {
        let usages = vec![
            usage("2024-06-01", "2024-06-03", 2),
            usage("2024-06-02", "2024-06-04", 1),
        ];
        assert_eq!(peak_usage(&usages, &stay("2024-06-01", "2024-06-05")), 3);
    }

    #[test]
    fn peak_ignores_nights_outside_the_request() {
        let usages = vec![usage("2024-06-10", "2024-06-12", 4)];
        assert_eq!(peak_usage(&usages, &stay("2024-06-01", "2024-06-05")), 0);
    }

    #[test]
    fn maintenance_and_booked_sites_are_not_free() {
        let requested = stay("2024-06-01", "2024-06-03");
        let booked = site("A-1", SiteStatus::Normal);
        let maintenance = site("A-2", SiteStatus::Maintenance);
        let cancelled = site("A-3", SiteStatus::Normal);
        let idle = site("A-4", SiteStatus::Normal);
        let overlapping = vec![
            booking_on(&booked, stay("2024-06-02", "2024-06-04"), BookingStatus::Paid),
            booking_on(&cancelled, requested, BookingStatus::Cancelled),
        ];

        let free = free_sites(
            vec![booked, maintenance, cancelled.clone(), idle.clone()],
            &overlapping,
            &requested,
        );

        assert_eq!(free, vec![cancelled, idle]);
    }

    #[tokio::test]
    async fn insufficient_stock_names_the_equipment() {
        let equipment = Equipment {
            equipment_id: EquipmentId::new(),
            equipment_name: "Sleeping Bag".into(),
            unit_price: Decimal::new(2800, 2),
            total_stock: 5,
            category: "bedding".into(),
        };
        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_find_equipment_usage()
            .returning(|_, _| Ok(vec![usage("2024-06-01", "2024-06-03", 4)]));
        let checker =
            AvailabilityChecker::new(Arc::new(MockCatalogRepository::new()), Arc::new(bookings));

        let res = checker
            .ensure_equipment(&equipment, 2, stay("2024-06-01", "2024-06-03"))
            .await;

        match res {
            Err(AppError::InsufficientEquipmentStock {
                name,
                requested,
                available,
                ..
            }) => {
                assert_eq!(name, "Sleeping Bag");
                assert_eq!(requested, 2);
                assert_eq!(available, 1);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn equipment_is_available_up_to_the_remaining_stock() {
        let equipment_id = EquipmentId::new();
        let mut catalog = MockCatalogRepository::new();
        catalog
            .expect_find_equipment()
            .returning(move |id| {
                Ok((id == equipment_id).then(|| Equipment {
                    equipment_id,
                    equipment_name: "Lantern".into(),
                    unit_price: Decimal::new(800, 2),
                    total_stock: 5,
                    category: "lighting".into(),
                }))
            });
        let mut bookings = MockBookingRepository::new();
        bookings
            .expect_find_equipment_usage()
            .returning(|_, _| Ok(vec![usage("2024-06-01", "2024-06-03", 3)]));
        let checker = AvailabilityChecker::new(Arc::new(catalog), Arc::new(bookings));
        let requested = stay("2024-06-02", "2024-06-04");

        assert!(checker
            .equipment_available(equipment_id, 2, requested)
            .await
            .unwrap());
        assert!(!checker
            .equipment_available(equipment_id, 3, requested)
            .await
            .unwrap());
        assert!(matches!(
            checker
                .equipment_available(EquipmentId::new(), 1, requested)
                .await,
            Err(AppError::EquipmentNotFound(_))
        ));
    }
}
