use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::entity::Contract;
use crate::domain::repository::ContractRepository;

pub struct InMemoryContractRepository {
    contracts: RwLock<HashMap<Uuid, Contract>>,
}

impl InMemoryContractRepository {
    pub fn new() -> Self {
        Self {
            contracts: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InMemoryContractRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ContractRepository for InMemoryContractRepository {
    async fn find_by_id(&self, id: &Uuid) -> anyhow::Result<Option<Contract>> {
        Ok(self.contracts.read().await.get(id).cloned())
    }

    async fn find_by_party_id(&self, party_id: &Uuid) -> anyhow::Result<Option<Contract>> {
        Ok(self
            .contracts
            .read()
            .await
            .values()
            .find(|c| c.party_id == *party_id)
            .cloned())
    }

    async fn create(&self, contract: &Contract) -> anyhow::Result<()> {
        let mut contracts = self.contracts.write().await;
        if contracts.values().any(|c| c.party_id == contract.party_id) {
            anyhow::bail!("contract already exists for party: {}", contract.party_id);
        }
        contracts.insert(contract.id, contract.clone());
        Ok(())
    }

    async fn update(&self, contract: &Contract) -> anyhow::Result<()> {
        let mut contracts = self.contracts.write().await;
        match contracts.get_mut(&contract.id) {
            Some(existing) => {
                *existing = contract.clone();
                Ok(())
            }
            None => anyhow::bail!("contract not found: {}", contract.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_one_contract_per_party() {
        let repo = InMemoryContractRepository::new();
        let party_id = Uuid::new_v4();
        repo.create(&Contract::new(party_id)).await.unwrap();
        assert!(repo.create(&Contract::new(party_id)).await.is_err());
        assert!(repo.find_by_party_id(&party_id).await.unwrap().is_some());
    }
}
