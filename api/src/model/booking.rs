use chrono::{DateTime, NaiveDate, Utc};
use garde::Validate;
use kernel::model::{
    booking::{
        event::{CreateBooking, EquipmentRequest, GuestInfo},
        Booking, BookingEquipmentLine, BookingStatus,
    },
    id::{BookingId, EquipmentId, SiteId, SiteTypeId, UserId},
    price::PriceBreakdown,
    stay::StayRange,
};
use kernel::service::coordinator::{BookingCheck, BookingReceipt};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::error::{AppError, AppResult};
use std::str::FromStr;

use crate::model::site_type::DailyPriceResponse;

// ID はボディ上では文字列で受け取り、変換時に検証する（不正な値は 400）
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentLineRequest {
    #[garde(length(min = 1))]
    pub equip_id: String,
    #[garde(range(min = 0))]
    pub count: i32,
}

impl TryFrom<EquipmentLineRequest> for EquipmentRequest {
    type Error = AppError;

    fn try_from(value: EquipmentLineRequest) -> Result<Self, Self::Error> {
        let EquipmentLineRequest { equip_id, count } = value;
        Ok(EquipmentRequest::new(EquipmentId::from_str(&equip_id)?, count))
    }
}

fn equipment_requests(lines: Vec<EquipmentLineRequest>) -> AppResult<Vec<EquipmentRequest>> {
    lines.into_iter().map(EquipmentRequest::try_from).collect()
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CheckBookingRequest {
    #[garde(length(min = 1))]
    pub type_id: String,
    #[garde(skip)]
    pub check_in: NaiveDate,
    #[garde(skip)]
    pub check_out: NaiveDate,
    #[serde(default)]
    #[garde(dive)]
    pub equipments: Vec<EquipmentLineRequest>,
}

// サービス層に渡す形へ変換した確認リクエスト
#[derive(Debug)]
pub struct CheckBookingQuery {
    pub site_type_id: SiteTypeId,
    pub stay: StayRange,
    pub equipments: Vec<EquipmentRequest>,
}

impl TryFrom<CheckBookingRequest> for CheckBookingQuery {
    type Error = AppError;

    fn try_from(value: CheckBookingRequest) -> Result<Self, Self::Error> {
        let CheckBookingRequest {
            type_id,
            check_in,
            check_out,
            equipments,
        } = value;
        Ok(Self {
            site_type_id: SiteTypeId::from_str(&type_id)?,
            stay: StayRange::new(check_in, check_out)?,
            equipments: equipment_requests(equipments)?,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceDetailResponse {
    pub site_price: Decimal,
    pub daily_prices: Vec<DailyPriceResponse>,
    pub equipment_price: Decimal,
    pub nights: i64,
}

impl From<PriceBreakdown> for PriceDetailResponse {
    fn from(value: PriceBreakdown) -> Self {
        let PriceBreakdown {
            site_price,
            daily_rates,
            equipment_price,
            nights,
            ..
        } = value;
        Self {
            site_price,
            daily_prices: daily_rates
                .into_iter()
                .map(DailyPriceResponse::from)
                .collect(),
            equipment_price,
            nights,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckBookingResponse {
    pub is_available: bool,
    pub msg: String,
    pub total_price: Option<Decimal>,
    pub price_detail: Option<PriceDetailResponse>,
}

impl From<BookingCheck> for CheckBookingResponse {
    fn from(value: BookingCheck) -> Self {
        let is_available = value.is_available();
        let msg = value.message();
        let total_price = value.price.as_ref().map(|p| p.total);
        Self {
            is_available,
            msg,
            total_price,
            price_detail: value.price.map(PriceDetailResponse::from),
        }
    }
}

// クライアントが送ってくる金額の項目は受け取らない（未知のフィールドとして無視される）
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[garde(length(min = 1))]
    pub user_id: String,
    #[garde(length(min = 1))]
    pub type_id: String,
    #[garde(skip)]
    pub check_in: NaiveDate,
    #[garde(skip)]
    pub check_out: NaiveDate,
    #[garde(length(min = 1, max = 100))]
    pub guest_name: String,
    #[garde(length(min = 1, max = 30))]
    pub guest_phone: String,
    #[serde(default)]
    #[garde(dive)]
    pub equipments: Vec<EquipmentLineRequest>,
}

impl TryFrom<CreateBookingRequest> for CreateBooking {
    type Error = AppError;

    fn try_from(value: CreateBookingRequest) -> Result<Self, Self::Error> {
        let CreateBookingRequest {
            user_id,
            type_id,
            check_in,
            check_out,
            guest_name,
            guest_phone,
            equipments,
        } = value;
        Ok(CreateBooking::new(
            UserId::from_str(&user_id)?,
            SiteTypeId::from_str(&type_id)?,
            StayRange::new(check_in, check_out)?,
            GuestInfo::new(guest_name, guest_phone),
            equipment_requests(equipments)?,
        ))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    pub booking_id: BookingId,
    pub site_no: String,
    pub total_price: Decimal,
    pub status: BookingStatus,
}

impl From<BookingReceipt> for CreateBookingResponse {
    fn from(value: BookingReceipt) -> Self {
        let BookingReceipt {
            booking_id,
            site_no,
            total_price,
            status,
        } = value;
        Self {
            booking_id,
            site_no,
            total_price,
            status,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BookingIdRequest {
    #[garde(length(min = 1))]
    pub booking_id: String,
}

impl TryFrom<BookingIdRequest> for BookingId {
    type Error = AppError;

    fn try_from(value: BookingIdRequest) -> Result<Self, Self::Error> {
        BookingId::from_str(&value.booking_id)
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MyBookingsQuery {
    #[garde(length(min = 1))]
    pub user_id: String,
    #[garde(skip)]
    pub status: Option<String>,
}

impl MyBookingsQuery {
    pub fn parse(self) -> AppResult<(UserId, Option<BookingStatus>)> {
        let user_id = UserId::from_str(&self.user_id)?;
        let status = self
            .status
            .filter(|s| !s.is_empty())
            .map(|s| {
                BookingStatus::from_str(&s.to_uppercase())
                    .map_err(|_| AppError::ValidationError(format!("予約状態が不正です: {s}")))
            })
            .transpose()?;
        Ok((user_id, status))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    pub booking_id: BookingId,
    pub user_id: UserId,
    pub site_type_id: SiteTypeId,
    pub site_id: SiteId,
    pub site_no: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i64,
    pub guest_name: String,
    pub guest_phone: String,
    pub total_price: Decimal,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(value: Booking) -> Self {
        let Booking {
            booking_id,
            user_id,
            site_type_id,
            site_id,
            site_no,
            stay,
            guest_name,
            guest_phone,
            total_price,
            status,
            created_at,
            updated_at,
        } = value;
        Self {
            booking_id,
            user_id,
            site_type_id,
            site_id,
            site_no,
            check_in: stay.check_in(),
            check_out: stay.check_out(),
            nights: stay.nights(),
            guest_name,
            guest_phone,
            total_price,
            status,
            created_at,
            updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingsResponse {
    pub items: Vec<BookingResponse>,
}

impl From<Vec<Booking>> for BookingsResponse {
    fn from(value: Vec<Booking>) -> Self {
        Self {
            items: value.into_iter().map(BookingResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingEquipmentResponse {
    pub equip_id: EquipmentId,
    pub equip_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
}

impl From<BookingEquipmentLine> for BookingEquipmentResponse {
    fn from(value: BookingEquipmentLine) -> Self {
        let BookingEquipmentLine {
            equipment_id,
            equipment_name,
            unit_price,
            quantity,
            subtotal,
        } = value;
        Self {
            equip_id: equipment_id,
            equip_name: equipment_name,
            unit_price,
            quantity,
            subtotal,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingEquipmentsResponse {
    pub items: Vec<BookingEquipmentResponse>,
}

impl From<Vec<BookingEquipmentLine>> for BookingEquipmentsResponse {
    fn from(value: Vec<BookingEquipmentLine>) -> Self {
        Self {
            items: value
                .into_iter()
                .map(BookingEquipmentResponse::from)
                .collect(),
        }
    }
}
