use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult};
use strum::{AsRefStr, Display, EnumString};

use crate::model::{
    id::{BookingId, EquipmentId, SiteId, SiteTypeId, UserId},
    stay::StayRange,
};

pub mod event;

/// 予約の状態。PENDING から始まり、CANCELLED は終端状態。
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Paid,
    Cancelled,
}

impl BookingStatus {
    /// サイトや装備の在庫を占有している状態か
    pub fn is_active(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Paid)
    }

    /// 支払い: PENDING -> PAID のみ許可する
    pub fn pay(self) -> AppResult<BookingStatus> {
        match self {
            BookingStatus::Pending => Ok(BookingStatus::Paid),
            from => Err(invalid_transition(from, BookingStatus::Paid)),
        }
    }

    /// キャンセル: PENDING / PAID -> CANCELLED。二重キャンセルはエラーとする
    pub fn cancel(self) -> AppResult<BookingStatus> {
        match self {
            BookingStatus::Pending | BookingStatus::Paid => Ok(BookingStatus::Cancelled),
            BookingStatus::Cancelled => Err(AppError::AlreadyCancelled),
        }
    }
}

fn invalid_transition(from: BookingStatus, to: BookingStatus) -> AppError {
    AppError::InvalidStateTransition {
        from: from.to_string(),
        to: to.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Booking {
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub site_type_id: SiteTypeId,
    pub site_id: SiteId,
    pub site_no: String,
    pub stay: StayRange,
    pub guest_name: String,
    pub guest_phone: String,
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingEquipment {
    pub booking_id: BookingId,
    pub equipment_id: EquipmentId,
    pub quantity: i32,
}

// 予約詳細画面向けの装備明細
#[derive(Debug, Clone, PartialEq)]
pub struct BookingEquipmentLine {
    pub equipment_id: EquipmentId,
    pub equipment_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
}

/// 有効な予約が確保している装備の数量と、その予約の宿泊期間
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EquipmentUsage {
    pub booking_id: BookingId,
    pub stay: StayRange,
    pub quantity: i32,
}
