//! 予約トランザクションの調整役。
//!
//! 予約の作成は「在庫確認 → サイト割り当て → 料金計算 → 保存」を一つの単位として実行する。
//! 確認と書き込みの間に他のリクエストが割り込まないよう、サイトタイプと装備ごとの
//! 名前付きロックを取得したうえで、書き込み直前に在庫を再検証する。

use std::{collections::BTreeMap, iter, sync::Arc};

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::{
    config::BookingConfig,
    error::{AppError, AppResult},
};

use crate::{
    model::{
        booking::{
            event::{CreateBooking, EquipmentRequest, NewBooking, UpdateBookingStatus},
            Booking, BookingEquipment, BookingEquipmentLine, BookingStatus,
        },
        equipment::Equipment,
        id::{BookingId, SiteTypeId, UserId},
        price::{DailyRate, PriceBreakdown},
        stay::StayRange,
    },
    repository::{booking::BookingRepository, catalog::CatalogRepository},
    service::{
        allocator::Allocator,
        availability::AvailabilityChecker,
        lock::{ResourceKey, ResourceLocks},
        pricing::PriceCalculator,
    },
};

/// 予約前の確認結果。何も確保しないので、作成時点では古くなっている可能性がある
#[derive(Debug)]
pub struct BookingCheck {
    pub unavailable: Option<AppError>,
    pub price: Option<PriceBreakdown>,
}

impl BookingCheck {
    pub fn is_available(&self) -> bool {
        self.unavailable.is_none()
    }

    pub fn message(&self) -> String {
        match &self.unavailable {
            None => "予約可能です。".to_string(),
            Some(reason) => reason.to_string(),
        }
    }

    fn rejected(reason: AppError) -> Self {
        Self {
            unavailable: Some(reason),
            price: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BookingReceipt {
    pub booking_id: BookingId,
    pub site_no: String,
    pub total_price: Decimal,
    pub status: BookingStatus,
}

pub struct BookingCoordinator {
    catalog: Arc<dyn CatalogRepository>,
    bookings: Arc<dyn BookingRepository>,
    pricing: PriceCalculator,
    availability: Arc<AvailabilityChecker>,
    allocator: Allocator,
    locks: ResourceLocks,
}

impl BookingCoordinator {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        bookings: Arc<dyn BookingRepository>,
        config: &BookingConfig,
    ) -> Self {
        let availability = Arc::new(AvailabilityChecker::new(catalog.clone(), bookings.clone()));
        Self {
            pricing: PriceCalculator::new(catalog.clone()),
            allocator: Allocator::new(availability.clone()),
            availability,
            locks: ResourceLocks::new(config.lock_timeout),
            catalog,
            bookings,
        }
    }

    pub fn availability(&self) -> &AvailabilityChecker {
        &self.availability
    }

    /// 空き状況と料金の試算。在庫は確保しない
    #[tracing::instrument(skip_all, fields(site_type_id = %site_type_id))]
    pub async fn check(
        &self,
        site_type_id: SiteTypeId,
        stay: StayRange,
        equipments: Vec<EquipmentRequest>,
    ) -> AppResult<BookingCheck> {
        let equipments = normalize_equipments(equipments)?;

        let Some(site_type) = self.catalog.find_site_type(site_type_id).await? else {
            return Ok(BookingCheck::rejected(AppError::SiteTypeNotFound(
                site_type_id.to_string(),
            )));
        };
        let items = match self.load_equipments(&equipments).await {
            Ok(items) => items,
            Err(e @ AppError::EquipmentNotFound(_)) => return Ok(BookingCheck::rejected(e)),
            Err(e) => return Err(e),
        };

        let price = self.pricing.quote(&site_type, &items, stay).await?;

        let mut unavailable = None;
        if !self.availability.site_available(site_type_id, stay).await? {
            unavailable = Some(AppError::NoSiteAvailable);
        } else {
            for (equipment, quantity) in &items {
                match self
                    .availability
                    .ensure_equipment(equipment, *quantity, stay)
                    .await
                {
                    Ok(()) => {}
                    Err(e @ AppError::InsufficientEquipmentStock { .. }) => {
                        unavailable = Some(e);
                        break;
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(BookingCheck {
            unavailable,
            price: Some(price),
        })
    }

    /// 予約を作成する。失敗時は予約行・装備行のどちらも残さない
    #[tracing::instrument(
        skip_all,
        fields(user_id = %event.user_id, site_type_id = %event.site_type_id)
    )]
    pub async fn create(&self, event: CreateBooking) -> AppResult<BookingReceipt> {
        let CreateBooking {
            user_id,
            site_type_id,
            stay,
            guest,
            equipments,
        } = event;
        let equipments = normalize_equipments(equipments)?;

        // 存在しないものはロックを取る前に弾く
        let site_type = self
            .catalog
            .find_site_type(site_type_id)
            .await?
            .ok_or_else(|| AppError::SiteTypeNotFound(site_type_id.to_string()))?;
        let items = self.load_equipments(&equipments).await?;

        let keys = iter::once(ResourceKey::SiteType(site_type_id)).chain(
            items
                .iter()
                .map(|(equipment, _)| ResourceKey::Equipment(equipment.equipment_id)),
        );
        let _guard = self.locks.acquire(keys).await?;

        // ロック取得後、書き込み直前に在庫を再検証する
        for (equipment, quantity) in &items {
            self.availability
                .ensure_equipment(equipment, *quantity, stay)
                .await
                .inspect_err(log_rejection)?;
        }
        let site = self
            .allocator
            .allocate(site_type_id, stay)
            .await
            .inspect_err(log_rejection)?;
        let price = self.pricing.quote(&site_type, &items, stay).await?;

        let booking_id = BookingId::new();
        let new_booking = NewBooking {
            booking_id,
            user_id,
            site_type_id,
            site_id: site.site_id,
            stay,
            guest_name: guest.guest_name,
            guest_phone: guest.guest_phone,
            total_price: price.total,
            equipments: items
                .iter()
                .map(|(equipment, quantity)| BookingEquipment {
                    booking_id,
                    equipment_id: equipment.equipment_id,
                    quantity: *quantity,
                })
                .collect(),
            created_at: Utc::now(),
        };
        let booking_id = self.bookings.insert_booking(new_booking).await?;

        tracing::info!(
            %booking_id,
            site_no = %site.site_no,
            total_price = %price.total,
            "booking created"
        );

        Ok(BookingReceipt {
            booking_id,
            site_no: site.site_no,
            total_price: price.total,
            status: BookingStatus::Pending,
        })
    }

    /// PENDING -> PAID
    #[tracing::instrument(skip(self))]
    pub async fn pay(&self, booking_id: BookingId) -> AppResult<()> {
        let booking = self.find_booking(booking_id).await?;
        let _guard = self
            .locks
            .acquire([ResourceKey::SiteType(booking.site_type_id)])
            .await?;

        // ロック中に最新の状態を読み直して遷移を判定する
        let current = self.find_booking(booking_id).await?.status;
        let next = current.pay()?;
        self.bookings
            .update_booking_status(UpdateBookingStatus::new(
                booking_id,
                current,
                next,
                Utc::now(),
            ))
            .await?;

        tracing::info!(%booking_id, "booking paid");
        Ok(())
    }

    /// PENDING / PAID -> CANCELLED。装備行を削除して在庫を解放する
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, booking_id: BookingId) -> AppResult<()> {
        let booking = self.find_booking(booking_id).await?;
        let reserved = self.bookings.find_booking_equipments(booking_id).await?;

        let keys = iter::once(ResourceKey::SiteType(booking.site_type_id)).chain(
            reserved
                .iter()
                .map(|line| ResourceKey::Equipment(line.equipment_id)),
        );
        let _guard = self.locks.acquire(keys).await?;

        let current = self.find_booking(booking_id).await?.status;
        let next = current.cancel()?;
        self.bookings
            .cancel_booking(UpdateBookingStatus::new(
                booking_id,
                current,
                next,
                Utc::now(),
            ))
            .await?;

        tracing::info!(%booking_id, released = reserved.len(), "booking cancelled");
        Ok(())
    }

    pub async fn find_booking(&self, booking_id: BookingId) -> AppResult<Booking> {
        self.bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| AppError::BookingNotFound(booking_id.to_string()))
    }

    pub async fn list_bookings(
        &self,
        user_id: UserId,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>> {
        self.bookings.find_by_user(user_id, status).await
    }

    /// 予約に紐づく装備の明細。小計は 1 泊あたり（単価 × 数量）
    pub async fn booking_equipments(
        &self,
        booking_id: BookingId,
    ) -> AppResult<Vec<BookingEquipmentLine>> {
        self.find_booking(booking_id).await?;
        let rows = self.bookings.find_booking_equipments(booking_id).await?;

        let mut lines = Vec::with_capacity(rows.len());
        for row in rows {
            // 装備マスタから消えた行は表示しない
            let Some(equipment) = self.catalog.find_equipment(row.equipment_id).await? else {
                continue;
            };
            lines.push(BookingEquipmentLine {
                equipment_id: row.equipment_id,
                equipment_name: equipment.equipment_name,
                unit_price: equipment.unit_price,
                quantity: row.quantity,
                subtotal: equipment.unit_price * Decimal::from(row.quantity),
            });
        }
        Ok(lines)
    }

    pub async fn price_calendar(
        &self,
        site_type_id: SiteTypeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<DailyRate>> {
        self.pricing.calendar(site_type_id, start, end).await
    }

    async fn load_equipments(
        &self,
        requests: &[EquipmentRequest],
    ) -> AppResult<Vec<(Equipment, i32)>> {
        let mut items = Vec::with_capacity(requests.len());
        for request in requests {
            let equipment = self
                .catalog
                .find_equipment(request.equipment_id)
                .await?
                .ok_or_else(|| AppError::EquipmentNotFound(request.equipment_id.to_string()))?;
            items.push((equipment, request.quantity));
        }
        Ok(items)
    }
}

fn log_rejection(e: &AppError) {
    tracing::info!(error.message = %e, "booking rejected");
}

/// 同じ装備の行をまとめ、数量 0 の行を除く。負の数量は不正な入力として扱う。
/// 結果は装備 ID の昇順。
pub fn normalize_equipments(requests: Vec<EquipmentRequest>) -> AppResult<Vec<EquipmentRequest>> {
    let mut merged = BTreeMap::new();
    for EquipmentRequest {
        equipment_id,
        quantity,
    } in requests
    {
        if quantity < 0 {
            return Err(AppError::ValidationError(format!(
                "装備（{equipment_id}）の数量が不正です: {quantity}"
            )));
        }
        if quantity == 0 {
            continue;
        }
        let total: &mut i32 = merged.entry(equipment_id).or_insert(0);
        *total = total.checked_add(quantity).ok_or_else(|| {
            AppError::ValidationError(format!("装備（{equipment_id}）の数量が大きすぎます。"))
        })?;
    }
    Ok(merged
        .into_iter()
        .map(|(equipment_id, quantity)| EquipmentRequest::new(equipment_id, quantity))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::id::EquipmentId;

    #[test]
    fn duplicate_lines_are_merged_and_zero_lines_dropped() {
        let tent = EquipmentId::new();
        let lamp = EquipmentId::new();

        let normalized = normalize_equipments(vec![
            EquipmentRequest::new(tent, 1),
            EquipmentRequest::new(lamp, 0),
            EquipmentRequest::new(tent, 2),
        ])
        .unwrap();

        assert_eq!(normalized, vec![EquipmentRequest::new(tent, 3)]);
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let res = normalize_equipments(vec![EquipmentRequest::new(EquipmentId::new(), -1)]);
        assert!(matches!(res, Err(AppError::ValidationError(_))));
    }
}
