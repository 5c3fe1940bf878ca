use async_trait::async_trait;

use crate::domain::entity::dispatch_log::DispatchLogEntry;

/// 配信監査ログは追記のみ。更新・削除の操作は持たない。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DispatchLogRepository: Send + Sync {
    async fn append(&self, entry: &DispatchLogEntry) -> anyhow::Result<()>;
    async fn find_by_recipient(&self, recipient: &str) -> anyhow::Result<Vec<DispatchLogEntry>>;
    async fn list_recent(&self, limit: u32) -> anyhow::Result<Vec<DispatchLogEntry>>;
}
