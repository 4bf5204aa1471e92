use async_trait::async_trait;
use shared::error::AppResult;

use crate::model::{
    booking::{
        event::{NewBooking, UpdateBookingStatus},
        Booking, BookingEquipment, BookingStatus, EquipmentUsage,
    },
    id::{BookingId, EquipmentId, SiteTypeId, UserId},
    stay::StayRange,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    // 予約行と装備行を一つのトランザクションで保存する
    async fn insert_booking(&self, event: NewBooking) -> AppResult<BookingId>;
    // 現在の状態が event.expected の場合のみ更新する。一致しなければ NoRowsAffectedError
    async fn update_booking_status(&self, event: UpdateBookingStatus) -> AppResult<()>;
    // 状態を CANCELLED に変更し、装備行を削除して在庫を解放する
    async fn cancel_booking(&self, event: UpdateBookingStatus) -> AppResult<()>;
    // サイトタイプに属する有効な（PENDING / PAID）予約のうち、期間が重なるもの
    async fn find_overlapping(
        &self,
        site_type_id: SiteTypeId,
        stay: StayRange,
    ) -> AppResult<Vec<Booking>>;
    // 有効な予約のうち、期間が重なるものが確保している装備の数量
    async fn find_equipment_usage(
        &self,
        equipment_id: EquipmentId,
        stay: StayRange,
    ) -> AppResult<Vec<EquipmentUsage>>;
    async fn find_by_id(&self, booking_id: BookingId) -> AppResult<Option<Booking>>;
    // 作成日時の新しい順
    async fn find_by_user(
        &self,
        user_id: UserId,
        status: Option<BookingStatus>,
    ) -> AppResult<Vec<Booking>>;
    async fn find_booking_equipments(
        &self,
        booking_id: BookingId,
    ) -> AppResult<Vec<BookingEquipment>>;
}
