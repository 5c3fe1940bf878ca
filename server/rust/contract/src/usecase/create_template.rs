use std::sync::Arc;

use crate::domain::entity::ContractTemplate;
use crate::domain::error::ContractEngineError;
use crate::domain::repository::TemplateRepository;

#[derive(Debug, Clone)]
pub struct CreateTemplateInput {
    pub name: String,
    pub body: String,
    pub active: bool,
}

/// CreateTemplateUseCase は契約テンプレートを登録する。
/// active = true で登録した場合、他の有効なテンプレートは無効化する。
pub struct CreateTemplateUseCase {
    template_repo: Arc<dyn TemplateRepository>,
}

impl CreateTemplateUseCase {
    pub fn new(template_repo: Arc<dyn TemplateRepository>) -> Self {
        Self { template_repo }
    }

    pub async fn execute(
        &self,
        input: CreateTemplateInput,
    ) -> Result<ContractTemplate, ContractEngineError> {
        let template = ContractTemplate::new(input.name.trim(), input.body, input.active);
        if template.active {
            deactivate_others(self.template_repo.as_ref(), &template).await?;
        }
        self.template_repo.create(&template).await?;
        tracing::info!(template_id = %template.id, name = %template.name, active = template.active, "contract template created");
        Ok(template)
    }
}

/// keep 以外の有効なテンプレートをすべて無効化する。
pub(crate) async fn deactivate_others(
    repo: &dyn TemplateRepository,
    keep: &ContractTemplate,
) -> anyhow::Result<()> {
    for mut other in repo.find_active().await? {
        if other.id == keep.id {
            continue;
        }
        other.deactivate();
        repo.update(&other).await?;
        tracing::info!(template_id = %other.id, "contract template deactivated");
    }
    Ok(())
}
