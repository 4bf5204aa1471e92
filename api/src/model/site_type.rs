use chrono::NaiveDate;
use kernel::model::{id::SiteTypeId, price::DailyRate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceCalendarQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyPriceResponse {
    pub date: NaiveDate,
    pub price: Decimal,
}

impl From<DailyRate> for DailyPriceResponse {
    fn from(value: DailyRate) -> Self {
        let DailyRate { date, price } = value;
        Self { date, price }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceCalendarResponse {
    pub type_id: SiteTypeId,
    pub items: Vec<DailyPriceResponse>,
}
