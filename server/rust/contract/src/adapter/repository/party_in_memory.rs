use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entity::Party;
use crate::domain::repository::PartyRepository;

pub struct InMemoryPartyRepository {
    parties: RwLock<HashMap<Uuid, Party>>,
}

impl InMemoryPartyRepository {
    pub fn new() -> Self {
        Self {
            parties: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryPartyRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PartyRepository for InMemoryPartyRepository {
    async fn find_by_id(&self, id: &Uuid) -> anyhow::Result<Option<Party>> {
        Ok(self.parties.read().await.get(id).cloned())
    }

    /// 登録順が無いため、作成日時が最も古い管理者を「最初の管理者」とみなす。
    async fn find_administrator_with_image(&self) -> anyhow::Result<Option<Party>> {
        Ok(self
            .parties
            .read()
            .await
            .values()
            .filter(|p| p.is_administrator && p.has_passport_image())
            .min_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn create(&self, party: &Party) -> anyhow::Result<()> {
        self.parties.write().await.insert(party.id, party.clone());
        Ok(())
    }

    async fn update(&self, party: &Party) -> anyhow::Result<()> {
        let mut parties = self.parties.write().await;
        match parties.get_mut(&party.id) {
            Some(existing) => {
                *existing = party.clone();
                Ok(())
            }
            None => anyhow::bail!("party not found: {}", party.id),
        }
    }
}
