use std::sync::Arc;

use crate::domain::entity::ContractTemplate;
use crate::domain::repository::TemplateRepository;

/// ListTemplatesUseCase は登録済みテンプレートを作成日時の新しい順に返す。
pub struct ListTemplatesUseCase {
    template_repo: Arc<dyn TemplateRepository>,
}

impl ListTemplatesUseCase {
    pub fn new(template_repo: Arc<dyn TemplateRepository>) -> Self {
        Self { template_repo }
    }

    pub async fn execute(&self) -> anyhow::Result<Vec<ContractTemplate>> {
        let mut templates = self.template_repo.find_all().await?;
        templates.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(templates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::template_repository::MockTemplateRepository;

    #[tokio::test]
    async fn test_list_templates_newest_first() {
        let mut older = ContractTemplate::new("v1", "a", false);
        older.created_at -= chrono::Duration::hours(1);
        let newer = ContractTemplate::new("v2", "b", true);

        let mut mock = MockTemplateRepository::new();
        mock.expect_find_all()
            .returning(move || Ok(vec![older.clone(), newer.clone()]));

        let uc = ListTemplatesUseCase::new(Arc::new(mock));
        let names: Vec<_> = uc
            .execute()
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, vec!["v2", "v1"]);
    }
}
