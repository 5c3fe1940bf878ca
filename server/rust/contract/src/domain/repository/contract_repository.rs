use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entity::contract::Contract;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContractRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> anyhow::Result<Option<Contract>>;
    async fn find_by_party_id(&self, party_id: &Uuid) -> anyhow::Result<Option<Contract>>;
    async fn create(&self, contract: &Contract) -> anyhow::Result<()>;
    /// 楽観ロックは行わない（後勝ち）。
    async fn update(&self, contract: &Contract) -> anyhow::Result<()>;
}
