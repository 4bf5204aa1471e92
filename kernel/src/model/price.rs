use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::model::id::EquipmentId;

#[derive(Debug, Clone, PartialEq)]
pub struct DailyRate {
    pub date: NaiveDate,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SitePrice {
    pub total: Decimal,
    pub daily_rates: Vec<DailyRate>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentCharge {
    pub equipment_id: EquipmentId,
    pub equipment_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub amount: Decimal,
}

/// 見積もりの内訳。total は site_price と equipment_price の合計
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBreakdown {
    pub site_price: Decimal,
    pub daily_rates: Vec<DailyRate>,
    pub equipment_price: Decimal,
    pub equipment_charges: Vec<EquipmentCharge>,
    pub nights: i64,
    pub total: Decimal,
}

impl PriceBreakdown {
    pub fn new(site: SitePrice, equipment_charges: Vec<EquipmentCharge>, nights: i64) -> Self {
        let equipment_price = equipment_charges.iter().map(|c| c.amount).sum::<Decimal>();
        Self {
            site_price: site.total,
            total: site.total + equipment_price,
            daily_rates: site.daily_rates,
            equipment_price,
            equipment_charges,
            nights,
        }
    }
}
