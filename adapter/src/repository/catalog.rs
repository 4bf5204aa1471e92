use async_trait::async_trait;
use chrono::NaiveDate;
use derive_new::new;
use kernel::{
    model::{
        equipment::Equipment,
        id::{EquipmentId, SiteTypeId},
        site::Site,
        site_type::{DailyPrice, SiteType},
    },
    repository::catalog::CatalogRepository,
};
use shared::error::{AppError, AppResult};

use crate::database::{
    model::catalog::{DailyPriceRow, EquipmentRow, SiteRow, SiteTypeRow},
    ConnectionPool,
};

#[derive(new)]
pub struct CatalogRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl CatalogRepository for CatalogRepositoryImpl {
    async fn find_site_type(&self, site_type_id: SiteTypeId) -> AppResult<Option<SiteType>> {
        let row: Option<SiteTypeRow> = sqlx::query_as(
            r#"
                SELECT
                    site_type_id,
                    type_name,
                    base_price,
                    max_guests,
                    description,
                    image_url
                FROM site_types
                WHERE site_type_id = $1
            "#,
        )
        .bind(site_type_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(row.map(SiteType::from))
    }

    async fn find_sites_by_type(&self, site_type_id: SiteTypeId) -> AppResult<Vec<Site>> {
        let rows: Vec<SiteRow> = sqlx::query_as(
            r#"
                SELECT site_id, site_type_id, site_no, status
                FROM sites
                WHERE site_type_id = $1
                ORDER BY site_no ASC, site_id ASC
            "#,
        )
        .bind(site_type_id)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        rows.into_iter().map(Site::try_from).collect()
    }

    async fn find_daily_prices(
        &self,
        site_type_id: SiteTypeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<DailyPrice>> {
        let rows: Vec<DailyPriceRow> = sqlx::query_as(
            r#"
                SELECT site_type_id, specific_date, price
                FROM daily_prices
                WHERE site_type_id = $1
                  AND specific_date >= $2
                  AND specific_date < $3
                ORDER BY specific_date ASC
            "#,
        )
        .bind(site_type_id)
        .bind(start)
        .bind(end)
        .fetch_all(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(rows.into_iter().map(DailyPrice::from).collect())
    }

    async fn find_equipment(&self, equipment_id: EquipmentId) -> AppResult<Option<Equipment>> {
        let row: Option<EquipmentRow> = sqlx::query_as(
            r#"
                SELECT equipment_id, equipment_name, unit_price, total_stock, category
                FROM equipments
                WHERE equipment_id = $1
            "#,
        )
        .bind(equipment_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(row.map(Equipment::from))
    }
}
