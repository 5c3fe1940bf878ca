use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entity::ContractTemplate;
use crate::domain::repository::TemplateRepository;

/// InMemoryTemplateRepository はインメモリのテンプレートリポジトリ。DB 未設定時に使う。
pub struct InMemoryTemplateRepository {
    templates: RwLock<HashMap<Uuid, ContractTemplate>>,
}

impl InMemoryTemplateRepository {
    pub fn new() -> Self {
        Self {
            templates: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryTemplateRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TemplateRepository for InMemoryTemplateRepository {
    async fn find_by_id(&self, id: &Uuid) -> anyhow::Result<Option<ContractTemplate>> {
        Ok(self.templates.read().await.get(id).cloned())
    }

    async fn find_all(&self) -> anyhow::Result<Vec<ContractTemplate>> {
        Ok(self.templates.read().await.values().cloned().collect())
    }

    async fn find_active(&self) -> anyhow::Result<Vec<ContractTemplate>> {
        Ok(self
            .templates
            .read()
            .await
            .values()
            .filter(|t| t.active)
            .cloned()
            .collect())
    }

    async fn create(&self, template: &ContractTemplate) -> anyhow::Result<()> {
        let mut templates = self.templates.write().await;
        if templates.contains_key(&template.id) {
            anyhow::bail!("template already exists: {}", template.id);
        }
        templates.insert(template.id, template.clone());
        Ok(())
    }

    async fn update(&self, template: &ContractTemplate) -> anyhow::Result<()> {
        let mut templates = self.templates.write().await;
        match templates.get_mut(&template.id) {
            Some(existing) => {
                *existing = template.clone();
                Ok(())
            }
            None => anyhow::bail!("template not found: {}", template.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_find_active_filters_inactive() {
        let repo = InMemoryTemplateRepository::new();
        repo.create(&ContractTemplate::new("a", "x", true)).await.unwrap();
        repo.create(&ContractTemplate::new("b", "y", false)).await.unwrap();

        let active = repo.find_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].name, "a");
        assert_eq!(repo.find_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_unknown_template_fails() {
        let repo = InMemoryTemplateRepository::new();
        let result = repo.update(&ContractTemplate::new("a", "x", true)).await;
        assert!(result.is_err());
    }
}
