use chrono::{DateTime, Utc};
use derive_new::new;
use rust_decimal::Decimal;

use crate::model::{
    booking::{BookingEquipment, BookingStatus},
    id::{BookingId, EquipmentId, SiteId, SiteTypeId, UserId},
    stay::StayRange,
};

#[derive(Debug, Clone, PartialEq, Eq, new)]
pub struct EquipmentRequest {
    pub equipment_id: EquipmentId,
    pub quantity: i32,
}

#[derive(Debug, Clone, new)]
pub struct GuestInfo {
    pub guest_name: String,
    pub guest_phone: String,
}

// 予約作成の依頼。価格は含めず、必ずサーバー側で再計算する
#[derive(Debug, Clone, new)]
pub struct CreateBooking {
    pub user_id: UserId,
    pub site_type_id: SiteTypeId,
    pub stay: StayRange,
    pub guest: GuestInfo,
    pub equipments: Vec<EquipmentRequest>,
}

// ストアに書き込む確定済みの予約。予約行と装備行は一つのトランザクションで保存する
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub site_type_id: SiteTypeId,
    pub site_id: SiteId,
    pub stay: StayRange,
    pub guest_name: String,
    pub guest_phone: String,
    pub total_price: Decimal,
    pub equipments: Vec<BookingEquipment>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, new)]
pub struct UpdateBookingStatus {
    pub booking_id: BookingId,
    pub expected: BookingStatus,
    pub next: BookingStatus,
    pub updated_at: DateTime<Utc>,
}
