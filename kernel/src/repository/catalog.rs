use async_trait::async_trait;
use chrono::NaiveDate;
use shared::error::AppResult;

use crate::model::{
    equipment::Equipment,
    id::{EquipmentId, SiteTypeId},
    site::Site,
    site_type::{DailyPrice, SiteType},
};

// サイトタイプ・サイト・日別価格・装備の参照用リポジトリ。
// 管理画面からの登録・更新はこのエンジンの範囲外
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn find_site_type(&self, site_type_id: SiteTypeId) -> AppResult<Option<SiteType>>;
    // サイト番号の昇順で返す
    async fn find_sites_by_type(&self, site_type_id: SiteTypeId) -> AppResult<Vec<Site>>;
    // [start, end) に含まれる上書き価格を日付順で返す
    async fn find_daily_prices(
        &self,
        site_type_id: SiteTypeId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> AppResult<Vec<DailyPrice>>;
    async fn find_equipment(&self, equipment_id: EquipmentId) -> AppResult<Option<Equipment>>;
}
