use std::sync::Arc;

use uuid::Uuid;

use crate::domain::entity::ContractTemplate;
use crate::domain::error::ContractEngineError;
use crate::domain::repository::TemplateRepository;
use crate::usecase::create_template::deactivate_others;

/// ActivateTemplateUseCase は指定テンプレートを有効化し、他をすべて無効化する。
pub struct ActivateTemplateUseCase {
    template_repo: Arc<dyn TemplateRepository>,
}

impl ActivateTemplateUseCase {
    pub fn new(template_repo: Arc<dyn TemplateRepository>) -> Self {
        Self { template_repo }
    }

    pub async fn execute(&self, id: &Uuid) -> Result<ContractTemplate, ContractEngineError> {
        let mut template = self
            .template_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| ContractEngineError::template_not_found(id))?;

        deactivate_others(self.template_repo.as_ref(), &template).await?;
        if !template.active {
            template.activate();
            self.template_repo.update(&template).await?;
        }
        tracing::info!(template_id = %template.id, "contract template activated");
        Ok(template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::template_repository::MockTemplateRepository;

    #[tokio::test]
    async fn test_activate_template() {
        let target = ContractTemplate::new("NCNDA v2", "novo", false);
        let target_id = target.id;
        let current = ContractTemplate::new("NCNDA v1", "antigo", true);
        let current_id = current.id;

        let mut mock = MockTemplateRepository::new();
        mock.expect_find_by_id()
            .returning(move |_| Ok(Some(target.clone())));
        mock.expect_find_active()
            .returning(move || Ok(vec![current.clone()]));
        mock.expect_update()
            .withf(move |t| t.id == current_id && !t.active)
            .times(1)
            .returning(|_| Ok(()));
        mock.expect_update()
            .withf(move |t| t.id == target_id && t.active)
            .times(1)
            .returning(|_| Ok(()));

        let uc = ActivateTemplateUseCase::new(Arc::new(mock));
        let result = uc.execute(&target_id).await.unwrap();
        assert!(result.active);
    }

    #[tokio::test]
    async fn test_activate_unknown_template() {
        let mut mock = MockTemplateRepository::new();
        mock.expect_find_by_id().returning(|_| Ok(None));

        let uc = ActivateTemplateUseCase::new(Arc::new(mock));
        let result = uc.execute(&Uuid::new_v4()).await;
        assert!(matches!(
            result,
            Err(ContractEngineError::NotFound { kind: "template", .. })
        ));
    }
}
