use std::sync::Arc;

use uuid::Uuid;

use crate::domain::entity::DispatchResult;
use crate::domain::error::ContractEngineError;
use crate::domain::repository::{ContractRepository, PartyRepository};
use crate::domain::service::BlobStore;
use crate::usecase::dispatch_document::{normalize_recipients, DispatchDocumentUseCase};

/// ResendDocumentUseCase は再生成せずに保存済みの契約書を再送する。
/// 新しいリンクを発行し、監査ログは初回配信と同じく宛先ごとに記録する。
pub struct ResendDocumentUseCase {
    contract_repo: Arc<dyn ContractRepository>,
    party_repo: Arc<dyn PartyRepository>,
    blob_store: Arc<dyn BlobStore>,
    dispatcher: Arc<DispatchDocumentUseCase>,
}

impl ResendDocumentUseCase {
    pub fn new(
        contract_repo: Arc<dyn ContractRepository>,
        party_repo: Arc<dyn PartyRepository>,
        blob_store: Arc<dyn BlobStore>,
        dispatcher: Arc<DispatchDocumentUseCase>,
    ) -> Self {
        Self {
            contract_repo,
            party_repo,
            blob_store,
            dispatcher,
        }
    }

    pub async fn execute(
        &self,
        contract_id: &Uuid,
        recipients: &[String],
    ) -> Result<DispatchResult, ContractEngineError> {
        let recipients = normalize_recipients(recipients)?;
        let contract = self
            .contract_repo
            .find_by_id(contract_id)
            .await?
            .ok_or_else(|| ContractEngineError::contract_not_found(contract_id))?;
        let artifact_ref = contract
            .artifact_ref
            .clone()
            .ok_or(ContractEngineError::ArtifactMissing(contract.id))?;
        let document = self
            .blob_store
            .get(&artifact_ref)
            .await?
            .ok_or(ContractEngineError::ArtifactMissing(contract.id))?;
        let partner_name = self
            .party_repo
            .find_by_id(&contract.party_id)
            .await?
            .map(|p| p.full_name)
            .unwrap_or_default();

        tracing::info!(
            contract_id = %contract.id,
            artifact_ref = %artifact_ref,
            recipients = recipients.len(),
            "resending stored contract artifact"
        );
        self.dispatcher
            .send_stored(contract.id, &partner_name, &artifact_ref, &document, &recipients)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::entity::{Contract, Party};
    use crate::domain::repository::contract_repository::MockContractRepository;
    use crate::domain::repository::dispatch_log_repository::MockDispatchLogRepository;
    use crate::domain::repository::party_repository::MockPartyRepository;
    use crate::domain::service::blob_store::MockBlobStore;
    use crate::domain::service::notifier::MockNotifier;
    use crate::domain::service::SignedLink;
    use crate::usecase::dispatch_document::DispatchSettings;

    fn stored_contract(party: &Party) -> Contract {
        let mut contract = Contract::new(party.id);
        contract.attach_artifact(format!("contracts/{}_1.pdf", party.id));
        contract
    }

    fn contract_repo(contract: Contract) -> Arc<MockContractRepository> {
        let mut mock = MockContractRepository::new();
        mock.expect_find_by_id()
            .returning(move |_| Ok(Some(contract.clone())));
        mock.expect_update().returning(|_| Ok(()));
        Arc::new(mock)
    }

    fn dispatcher(
        contracts: Arc<MockContractRepository>,
        store: Arc<MockBlobStore>,
        notifier: MockNotifier,
        logs: MockDispatchLogRepository,
    ) -> Arc<DispatchDocumentUseCase> {
        Arc::new(DispatchDocumentUseCase::new(
            contracts,
            Arc::new(logs),
            store,
            Arc::new(notifier),
            DispatchSettings::default(),
        ))
    }

    #[tokio::test]
    async fn test_resend_uses_stored_artifact() {
        let party = Party::new("Ana Silva", "12345678901", "ana@example.com");
        let contract = stored_contract(&party);
        let contract_id = contract.id;
        let contracts = contract_repo(contract);

        let mut store = MockBlobStore::new();
        store.expect_put().never();
        store
            .expect_get()
            .returning(|_| Ok(Some(b"%PDF-1.4 stored".to_vec())));
        store.expect_signed_url().times(1).returning(|r, ttl| {
            Ok(SignedLink {
                url: format!("https://files.example.com/{r}?sig=new"),
                expires_at: Utc::now() + ttl,
            })
        });
        let store = Arc::new(store);

        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .withf(|m| m.attachments[0].bytes == b"%PDF-1.4 stored".to_vec())
            .times(1)
            .returning(|_| Ok(()));
        let mut logs = MockDispatchLogRepository::new();
        logs.expect_append().times(1).returning(|_| Ok(()));
        let mut parties = MockPartyRepository::new();
        parties
            .expect_find_by_id()
            .returning(move |_| Ok(Some(party.clone())));

        let uc = ResendDocumentUseCase::new(
            contracts.clone(),
            Arc::new(parties),
            store.clone(),
            dispatcher(contracts, store, notifier, logs),
        );
        let result = uc
            .execute(&contract_id, &["c@example.com".to_string()])
            .await
            .unwrap();
        assert!(result.is_complete());
        assert!(result.artifact_link.ends_with("sig=new"));
    }

    #[tokio::test]
    async fn test_resend_without_artifact() {
        let contract = Contract::new(Uuid::new_v4());
        let contract_id = contract.id;
        let contracts = contract_repo(contract);
        let store = Arc::new(MockBlobStore::new());

        let uc = ResendDocumentUseCase::new(
            contracts.clone(),
            Arc::new(MockPartyRepository::new()),
            store.clone(),
            dispatcher(contracts, store, MockNotifier::new(), MockDispatchLogRepository::new()),
        );
        let result = uc.execute(&contract_id, &["c@example.com".to_string()]).await;
        assert!(matches!(result, Err(ContractEngineError::ArtifactMissing(id)) if id == contract_id));
    }

    #[tokio::test]
    async fn test_resend_when_blob_is_gone() {
        let party = Party::new("Ana Silva", "12345678901", "ana@example.com");
        let contract = stored_contract(&party);
        let contract_id = contract.id;
        let contracts = contract_repo(contract);
        let mut store = MockBlobStore::new();
        store.expect_get().returning(|_| Ok(None));
        let store = Arc::new(store);

        let uc = ResendDocumentUseCase::new(
            contracts.clone(),
            Arc::new(MockPartyRepository::new()),
            store.clone(),
            dispatcher(contracts, store, MockNotifier::new(), MockDispatchLogRepository::new()),
        );
        let result = uc.execute(&contract_id, &["c@example.com".to_string()]).await;
        assert!(matches!(result, Err(ContractEngineError::ArtifactMissing(_))));
    }
}
