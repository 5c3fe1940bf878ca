use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entity::party::Party;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PartyRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> anyhow::Result<Option<Party>>;
    /// パスポート画像を持つ最初の管理者を返す。
    async fn find_administrator_with_image(&self) -> anyhow::Result<Option<Party>>;
    async fn create(&self, party: &Party) -> anyhow::Result<()>;
    async fn update(&self, party: &Party) -> anyhow::Result<()>;
}
