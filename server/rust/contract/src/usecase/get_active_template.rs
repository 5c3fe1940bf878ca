use std::sync::Arc;

use crate::domain::entity::ContractTemplate;
use crate::domain::error::ContractEngineError;
use crate::domain::repository::TemplateRepository;

/// GetActiveTemplateUseCase は現在有効な契約テンプレートを 1 件に決定する。
///
/// 有効なテンプレートが複数ある場合は作成日時が最新のものを採用し、警告ログを出す。
/// 1 件も無い場合は TemplateMissing を返して生成を中止する。
pub struct GetActiveTemplateUseCase {
    template_repo: Arc<dyn TemplateRepository>,
}

impl GetActiveTemplateUseCase {
    pub fn new(template_repo: Arc<dyn TemplateRepository>) -> Self {
        Self { template_repo }
    }

    pub async fn execute(&self) -> Result<ContractTemplate, ContractEngineError> {
        let active = self.template_repo.find_active().await?;
        let selected = ContractTemplate::select_current(&active)
            .cloned()
            .ok_or(ContractEngineError::TemplateMissing)?;

        let active_count = active.iter().filter(|t| t.active).count();
        if active_count > 1 {
            tracing::warn!(
                active_count,
                template_id = %selected.id,
                template_name = %selected.name,
                "multiple active contract templates; using the most recently created"
            );
        }
        Ok(selected)
    }
}
