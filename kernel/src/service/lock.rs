use std::{collections::BTreeSet, sync::Arc, time::Duration};

use dashmap::DashMap;
use shared::error::{AppError, AppResult};
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::model::id::{EquipmentId, SiteTypeId};

/// 排他制御の単位。予約の作成・キャンセルはサイトタイプと装備ごとに直列化する
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKey {
    SiteType(SiteTypeId),
    Equipment(EquipmentId),
}

/// 資源キーごとの名前付きロック
pub struct ResourceLocks {
    locks: DashMap<ResourceKey, Arc<Mutex<()>>>,
    timeout: Duration,
}

/// 保持している間、取得したすべてのキーを占有する
#[derive(Debug)]
pub struct ResourceGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl ResourceLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            timeout,
        }
    }

    /// キーを昇順に取得する。キー集合が重なる呼び出し同士でもデッドロックしない。
    /// 全体で timeout を超えた場合は取得済みのロックを解放して Busy を返す。
    pub async fn acquire(
        &self,
        keys: impl IntoIterator<Item = ResourceKey>,
    ) -> AppResult<ResourceGuard> {
        let keys: BTreeSet<ResourceKey> = keys.into_iter().collect();
        let deadline = tokio::time::Instant::now() + self.timeout;
        let mut guards = Vec::with_capacity(keys.len());

        for key in keys {
            // DashMap のシャードロックを await をまたいで保持しないよう、先に Arc を取り出す
            let lock = self.locks.entry(key).or_default().value().clone();
            match tokio::time::timeout_at(deadline, lock.lock_owned()).await {
                Ok(guard) => guards.push(guard),
                Err(_) => {
                    tracing::warn!(?key, timeout = ?self.timeout, "resource lock wait timed out");
                    return Err(AppError::Busy);
                }
            }
        }

        Ok(ResourceGuard { _guards: guards })
    }
}
