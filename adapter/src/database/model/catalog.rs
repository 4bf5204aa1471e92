use kernel::model::{
    equipment::Equipment,
    id::{EquipmentId, SiteId, SiteTypeId},
    site::{Site, SiteStatus},
    site_type::{DailyPrice, SiteType},
};
use rust_decimal::Decimal;
use shared::error::AppError;
use sqlx::types::chrono::NaiveDate;

#[derive(sqlx::FromRow)]
pub struct SiteTypeRow {
    pub site_type_id: SiteTypeId,
    pub type_name: String,
    pub base_price: Decimal,
    pub max_guests: i32,
    pub description: String,
    pub image_url: String,
}

impl From<SiteTypeRow> for SiteType {
    fn from(value: SiteTypeRow) -> Self {
        let SiteTypeRow {
            site_type_id,
            type_name,
            base_price,
            max_guests,
            description,
            image_url,
        } = value;
        Self {
            site_type_id,
            type_name,
            base_price,
            max_guests,
            description,
            image_url,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct SiteRow {
    pub site_id: SiteId,
    pub site_type_id: SiteTypeId,
    pub site_no: String,
    pub status: String,
}

impl TryFrom<SiteRow> for Site {
    type Error = AppError;

    fn try_from(value: SiteRow) -> Result<Self, Self::Error> {
        let SiteRow {
            site_id,
            site_type_id,
            site_no,
            status,
        } = value;
        let status = status
            .parse::<SiteStatus>()
            .map_err(|_| AppError::ConversionEntityError(format!("未知のサイト状態です: {status}")))?;
        Ok(Self {
            site_id,
            site_type_id,
            site_no,
            status,
        })
    }
}

#[derive(sqlx::FromRow)]
pub struct DailyPriceRow {
    pub site_type_id: SiteTypeId,
    pub specific_date: NaiveDate,
    pub price: Decimal,
}

impl From<DailyPriceRow> for DailyPrice {
    fn from(value: DailyPriceRow) -> Self {
        let DailyPriceRow {
            site_type_id,
            specific_date,
            price,
        } = value;
        Self {
            site_type_id,
            specific_date,
            price,
        }
    }
}

#[derive(sqlx::FromRow)]
pub struct EquipmentRow {
    pub equipment_id: EquipmentId,
    pub equipment_name: String,
    pub unit_price: Decimal,
    pub total_stock: i32,
    pub category: String,
}

impl From<EquipmentRow> for Equipment {
    fn from(value: EquipmentRow) -> Self {
        let EquipmentRow {
            equipment_id,
            equipment_name,
            unit_price,
            total_stock,
            category,
        } = value;
        Self {
            equipment_id,
            equipment_name,
            unit_price,
            total_stock,
            category,
        }
    }
}
