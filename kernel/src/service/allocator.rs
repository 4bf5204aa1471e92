use std::sync::Arc;

use derive_new::new;
use shared::error::{AppError, AppResult};

use crate::{
    model::{id::SiteTypeId, site::Site, stay::StayRange},
    service::availability::AvailabilityChecker,
};

/// 候補からサイト番号（同じならサイト ID）の最も小さいものを選ぶ。
/// 同じデータに対しては常に同じサイトを返す。
pub fn pick_site(candidates: Vec<Site>) -> Option<Site> {
    candidates
        .into_iter()
        .min_by(|a, b| (a.site_no.as_str(), a.site_id).cmp(&(b.site_no.as_str(), b.site_id)))
}

#[derive(new)]
pub struct Allocator {
    availability: Arc<AvailabilityChecker>,
}

impl Allocator {
    pub async fn allocate(&self, site_type_id: SiteTypeId, stay: StayRange) -> AppResult<Site> {
        let candidates = self.availability.available_sites(site_type_id, stay).await?;
        pick_site(candidates).ok_or(AppError::NoSiteAvailable)
    }
}
