use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entity::contract_template::ContractTemplate;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn find_by_id(&self, id: &Uuid) -> anyhow::Result<Option<ContractTemplate>>;
    async fn find_all(&self) -> anyhow::Result<Vec<ContractTemplate>>;
    /// active フラグが立っている全テンプレートを返す（0 件・複数件もあり得る）。
    async fn find_active(&self) -> anyhow::Result<Vec<ContractTemplate>>;
    async fn create(&self, template: &ContractTemplate) -> anyhow::Result<()>;
    async fn update(&self, template: &ContractTemplate) -> anyhow::Result<()>;
}
