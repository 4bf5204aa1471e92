use kernel::model::{
    booking::{Booking, BookingEquipment, BookingStatus, EquipmentUsage},
    id::{BookingId, EquipmentId, SiteId, SiteTypeId, UserId},
    stay::StayRange,
};
use rust_decimal::Decimal;
use shared::error::AppError;
use sqlx::types::chrono::{DateTime, NaiveDate, Utc};

// 予約一覧・詳細の取得に使う型。sites と JOIN してサイト番号も持つ
#[derive(sqlx::FromRow)]
pub struct BookingRow {
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub site_type_id: SiteTypeId,
    pub site_id: SiteId,
    pub site_no: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub guest_name: String,
    pub guest_phone: String,
    pub total_price: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = AppError;

    fn try_from(value: BookingRow) -> Result<Self, Self::Error> {
        let BookingRow {
            booking_id,
            user_id,
            site_type_id,
            site_id,
            site_no,
            check_in,
            check_out,
            guest_name,
            guest_phone,
            total_price,
            status,
            created_at,
            updated_at,
        } = value;
        Ok(Booking {
            booking_id,
            user_id,
            site_type_id,
            site_id,
            site_no,
            stay: stay_of(booking_id, check_in, check_out)?,
            guest_name,
            guest_phone,
            total_price,
            status: status_of(&status)?,
            created_at,
            updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct BookingEquipmentRow {
    pub booking_id: BookingId,
    pub equipment_id: EquipmentId,
    pub quantity: i32,
}

impl From<BookingEquipmentRow> for BookingEquipment {
    fn from(value: BookingEquipmentRow) -> Self {
        let BookingEquipmentRow {
            booking_id,
            equipment_id,
            quantity,
        } = value;
        Self {
            booking_id,
            equipment_id,
            quantity,
        }
    }
}

// 装備の使用状況を調べる際に使う型
#[derive(sqlx::FromRow)]
pub struct EquipmentUsageRow {
    pub booking_id: BookingId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub quantity: i32,
}

impl TryFrom<EquipmentUsageRow> for EquipmentUsage {
    type Error = AppError;

    fn try_from(value: EquipmentUsageRow) -> Result<Self, Self::Error> {
        let EquipmentUsageRow {
            booking_id,
            check_in,
            check_out,
            quantity,
        } = value;
        Ok(EquipmentUsage {
            booking_id,
            stay: stay_of(booking_id, check_in, check_out)?,
            quantity,
        })
    }
}

fn stay_of(booking_id: BookingId, check_in: NaiveDate, check_out: NaiveDate) -> Result<StayRange, AppError> {
    StayRange::new(check_in, check_out).map_err(|_| {
        AppError::ConversionEntityError(format!(
            "予約（{booking_id}）の宿泊期間が不正です: {check_in} - {check_out}"
        ))
    })
}

fn status_of(status: &str) -> Result<BookingStatus, AppError> {
    status
        .parse::<BookingStatus>()
        .map_err(|_| AppError::ConversionEntityError(format!("未知の予約状態です: {status}")))
}
