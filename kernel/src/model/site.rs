use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::model::id::{SiteId, SiteTypeId};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SiteStatus {
    Normal,
    Maintenance,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub site_id: SiteId,
    pub site_type_id: SiteTypeId,
    pub site_no: String,
    pub status: SiteStatus,
}

impl Site {
    // メンテナンス中のサイトは予約の重なりに関係なく割り当てない
    pub fn is_allocatable(&self) -> bool {
        self.status == SiteStatus::Normal
    }
}
