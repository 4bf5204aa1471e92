use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::model::id::SiteTypeId;

#[derive(Debug, Clone, PartialEq)]
pub struct SiteType {
    pub site_type_id: SiteTypeId,
    pub type_name: String,
    pub base_price: Decimal,
    pub max_guests: i32,
    pub description: String,
    pub image_url: String,
}

// (サイトタイプ, 日付) ごとの価格の上書き。行が無い日は基本料金を使う
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPrice {
    pub site_type_id: SiteTypeId,
    pub specific_date: NaiveDate,
    pub price: Decimal,
}
