//! 料金計算。カタログの値だけから算出し、クライアントから送られた金額は使わない。

use std::{collections::HashMap, sync::Arc};

use chrono::NaiveDate;
use derive_new::new;
use rust_decimal::Decimal;
use shared::error::{AppError, AppResult};

use crate::{
    model::{
        equipment::Equipment,
        id::{EquipmentId, SiteTypeId},
        price::{DailyRate, EquipmentCharge, PriceBreakdown, SitePrice},
        site_type::{DailyPrice, SiteType},
        stay::StayRange,
    },
    repository::catalog::CatalogRepository,
};

// カレンダー表示で一度に取得できる最大日数
const MAX_CALENDAR_DAYS: i64 = 366;

/// 各夜の料金を、日別価格があればその値、無ければ基本料金として合計する。
/// チェックアウト日の夜は含まない。
pub fn price_site(site_type: &SiteType, overrides: &[DailyPrice], stay: &StayRange) -> SitePrice {
    let daily_rates = rates_for(site_type, overrides, stay.nights_iter());
    SitePrice {
        total: daily_rates.iter().map(|r| r.price).sum(),
        daily_rates,
    }
}

/// 単価 × 数量 × 泊数
pub fn price_equipment(unit_price: Decimal, quantity: i32, nights: i64) -> AppResult<Decimal> {
    if nights <= 0 {
        return Err(AppError::ValidationError(format!(
            "泊数は 1 以上である必要があります: {nights}"
        )));
    }
    if quantity <= 0 {
        return Err(AppError::ValidationError(format!(
            "装備の数量は 1 以上である必要があります: {quantity}"
        )));
    }
    Ok(unit_price * Decimal::from(quantity) * Decimal::from(nights))
}

fn rates_for(
    site_type: &SiteType,
    overrides: &[DailyPrice],
    nights: impl Iterator<Item = NaiveDate>,
) -> Vec<DailyRate> {
    let by_date: HashMap<NaiveDate, Decimal> = overrides
        .iter()
        .filter(|p| p.site_type_id == site_type.site_type_id)
        .map(|p| (p.specific_date, p.price))
        .collect();
    nights
        .map(|date| DailyRate {
            date,
            price: by_date.get(&date).copied().unwrap_or(site_type.base_price),
        })
        .collect()
}

#[derive(new)]
pub struct PriceCalculator {
    catalog: Arc<dyn CatalogRepository>,
}

impl PriceCalculator {
    pub async fn price_site(
        &self,
        site_type_id: SiteTypeId,
        stay: StayRange,
    ) -> AppResult<SitePrice> {
        let site_type = self
            .catalog
            .find_site_type(site_type_id)
            .await?
            .ok_or_else(|| AppError::SiteTypeNotFound(site_type_id.to_string()))?;
        self.price_site_of(&site_type, stay).await
    }

    pub async fn price_equipment(
        &self,
        equipment_id: EquipmentId,
        quantity: i32,
        nights: i64,
    ) -> AppResult<EquipmentCharge> {
        let equipment = self
            .catalog
            .find_equipment(equipment_id)
            .await?
            .ok_or_else(|| AppError::EquipmentNotFound(equipment_id.to_string()))?;
        charge_for(&equipment, quantity, nights)
    }

    /// 読み込み済みのサイトタイプと装備から見積もりを作る
    pub async fn quote(
        &self,
        site_type: &SiteType,
        items: &[(Equipment, i32)],
        stay: StayRange,
    ) -> AppResult<PriceBreakdown> {
        let site = self.price_site_of(site_type, stay).await?;
        let charges = items
            .iter()
            .map(|(equipment, quantity)| charge_for(equipment, *quantity, stay.nights()))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(PriceBreakdown::new(site, charges, stay.nights()))
    }

    /// [start, end) の日ごとの料金
    pub async fn calendar(
        &self,
        site_type_id: SiteTypeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<DailyRate>> {
        let range = StayRange::within(start, end, MAX_CALENDAR_DAYS)?;
        let site_type = self
            .catalog
            .find_site_type(site_type_id)
            .await?
            .ok_or_else(|| AppError::SiteTypeNotFound(site_type_id.to_string()))?;
        let overrides = self
            .catalog
            .find_daily_prices(site_type_id, start, end)
            .await?;
        Ok(rates_for(&site_type, &overrides, range.nights_iter()))
    }

    async fn price_site_of(&self, site_type: &SiteType, stay: StayRange) -> AppResult<SitePrice> {
        let overrides = self
            .catalog
            .find_daily_prices(site_type.site_type_id, stay.check_in(), stay.check_out())
            .await?;
        Ok(price_site(site_type, &overrides, &stay))
    }
}

fn charge_for(equipment: &Equipment, quantity: i32, nights: i64) -> AppResult<EquipmentCharge> {
    Ok(EquipmentCharge {
        equipment_id: equipment.equipment_id,
        equipment_name: equipment.equipment_name.clone(),
        unit_price: equipment.unit_price,
        quantity,
        amount: price_equipment(equipment.unit_price, quantity, nights)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::catalog::MockCatalogRepository;
    use mockall::predicate::eq;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn lake_view() -> SiteType {
        SiteType {
            site_type_id: SiteTypeId::new(),
            type_name: "Lake-View".into(),
            base_price: dec!(120.00),
            max_guests: 4,
            description: String::new(),
            image_url: String::new(),
        }
    }

    #[test]
    fn site_price_uses_override_when_present() {
        let site_type = lake_view();
        let overrides = vec![DailyPrice {
            site_type_id: site_type.site_type_id,
            specific_date: date("2024-06-02"),
            price: dec!(150.00),
        }];
        let stay = StayRange::new(date("2024-06-01"), date("2024-06-04")).unwrap();

        let price = price_site(&site_type, &overrides, &stay);

        assert_eq!(price.total, dec!(390.00));
        assert_eq!(price.daily_rates.len(), 3);
        assert_eq!(price.daily_rates[1].price, dec!(150.00));
    }

    #[test]
    fn override_on_checkout_date_is_not_charged() {
        let site_type = lake_view();
        let overrides = vec![DailyPrice {
            site_type_id: site_type.site_type_id,
            specific_date: date("2024-06-03"),
            price: dec!(999.00),
        }];
        let stay = StayRange::new(date("2024-06-01"), date("2024-06-03")).unwrap();

        assert_eq!(price_site(&site_type, &overrides, &stay).total, dec!(240.00));
    }

    #[test]
    fn equipment_price_is_unit_times_quantity_times_nights() {
        assert_eq!(price_equipment(dec!(28.00), 2, 3).unwrap(), dec!(168.00));
    }

    #[test]
    fn equipment_price_rejects_empty_span() {
        assert!(matches!(
            price_equipment(dec!(28.00), 1, 0),
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn price_site_reports_missing_site_type() {
        let mut catalog = MockCatalogRepository::new();
        catalog.expect_find_site_type().returning(|_| Ok(None));
        let calculator = PriceCalculator::new(Arc::new(catalog));
        let stay = StayRange::new(date("2024-06-01"), date("2024-06-03")).unwrap();

        let res = calculator.price_site(SiteTypeId::new(), stay).await;

        assert!(matches!(res, Err(AppError::SiteTypeNotFound(_))));
    }

    #[tokio::test]
    async fn calendar_fills_gaps_with_base_price() {
        let site_type = lake_view();
        let site_type_id = site_type.site_type_id;
        let mut catalog = MockCatalogRepository::new();
        catalog
            .expect_find_site_type()
            .with(eq(site_type_id))
            .returning(move |_| Ok(Some(site_type.clone())));
        catalog
            .expect_find_daily_prices()
            .returning(move |id, _, _| {
                Ok(vec![DailyPrice {
                    site_type_id: id,
                    specific_date: date("2024-06-01"),
                    price: dec!(100.00),
                }])
            });
        let calculator = PriceCalculator::new(Arc::new(catalog));

        let rates = calculator
            .calendar(site_type_id, date("2024-06-01"), date("2024-06-03"))
            .await
            .unwrap();

        assert_eq!(
            rates,
            vec![
                DailyRate {
                    date: date("2024-06-01"),
                    price: dec!(100.00)
                },
                DailyRate {
                    date: date("2024-06-02"),
                    price: dec!(120.00)
                },
            ]
        );
    }

    #[tokio::test]
    async fn equipment_charge_is_looked_up_by_id() {
        let equipment_id = EquipmentId::new();
        let mut catalog = MockCatalogRepository::new();
        catalog
            .expect_find_equipment()
            .with(eq(equipment_id))
            .returning(move |_| {
                Ok(Some(Equipment {
                    equipment_id,
                    equipment_name: "Sleeping Bag".into(),
                    unit_price: dec!(28.00),
                    total_stock: 40,
                    category: "bedding".into(),
                }))
            });
        let calculator = PriceCalculator::new(Arc::new(catalog));

        let charge = calculator
            .price_equipment(equipment_id, 1, 2)
            .await
            .unwrap();

        assert_eq!(charge.equipment_name, "Sleeping Bag");
        assert_eq!(charge.amount, dec!(56.00));
    }
}
