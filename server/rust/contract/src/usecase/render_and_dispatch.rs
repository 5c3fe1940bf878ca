use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;

use crate::domain::entity::DispatchResult;
use crate::domain::error::ContractEngineError;
use crate::domain::repository::{ContractRepository, PartyRepository};
use crate::usecase::dispatch_document::{normalize_recipients, DispatchDocumentUseCase};
use crate::usecase::render_document::RenderDocumentUseCase;

/// RenderAndDispatchUseCase は契約書の生成から配信までを 1 回で行う。
///
/// timeout を指定した場合はパイプライン全体をその時間で打ち切る。打ち切り時点で
/// 書き込み済みの成果物・監査ログは残る。
pub struct RenderAndDispatchUseCase {
    contract_repo: Arc<dyn ContractRepository>,
    party_repo: Arc<dyn PartyRepository>,
    render: Arc<RenderDocumentUseCase>,
    dispatcher: Arc<DispatchDocumentUseCase>,
    timeout: Option<Duration>,
}

impl RenderAndDispatchUseCase {
    pub fn new(
        contract_repo: Arc<dyn ContractRepository>,
        party_repo: Arc<dyn PartyRepository>,
        render: Arc<RenderDocumentUseCase>,
        dispatcher: Arc<DispatchDocumentUseCase>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            contract_repo,
            party_repo,
            render,
            dispatcher,
            timeout,
        }
    }

    pub async fn execute(
        &self,
        contract_id: &Uuid,
        recipients: &[String],
    ) -> Result<DispatchResult, ContractEngineError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.run(contract_id, recipients))
                .await
                .map_err(|_| {
                    tracing::error!(contract_id = %contract_id, timeout = ?limit, "render and dispatch timed out");
                    ContractEngineError::Timeout(limit)
                })?,
            None => self.run(contract_id, recipients).await,
        }
    }

    async fn run(
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
        let party = self
            .party_repo
            .find_by_id(&contract.party_id)
            .await?
            .ok_or_else(|| ContractEngineError::party_not_found(&contract.party_id))?;

        let rendered = self
            .render
            .render_for(party.clone(), Utc::now().date_naive())
            .await?;
        self.dispatcher
            .execute(&contract, &party, &rendered.artifact.bytes, &recipients)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::document::PdfRenderer;
    use crate::domain::repository::contract_repository::MockContractRepository;
    use crate::domain::repository::dispatch_log_repository::MockDispatchLogRepository;
    use crate::domain::repository::party_repository::MockPartyRepository;
    use crate::domain::repository::template_repository::MockTemplateRepository;
    use crate::domain::service::blob_store::MockBlobStore;
    use crate::domain::service::image_fetcher::MockImageFetcher;
    use crate::domain::service::notifier::MockNotifier;
    use crate::usecase::dispatch_document::DispatchSettings;
    use crate::usecase::generate_document::{DocumentProfile, GenerateDocumentUseCase};

    fn pipeline(contracts: MockContractRepository) -> RenderAndDispatchUseCase {
        let contracts: Arc<dyn ContractRepository> = Arc::new(contracts);
        let parties: Arc<dyn PartyRepository> = Arc::new(MockPartyRepository::new());
        let render = Arc::new(RenderDocumentUseCase::new(
            Arc::new(GenerateDocumentUseCase::new(
                Arc::new(MockTemplateRepository::new()),
                parties.clone(),
            )),
            Arc::new(PdfRenderer::new(Arc::new(MockImageFetcher::new()))),
            DocumentProfile::default(),
        ));
        let dispatcher = Arc::new(DispatchDocumentUseCase::new(
            contracts.clone(),
            Arc::new(MockDispatchLogRepository::new()),
            Arc::new(MockBlobStore::new()),
            Arc::new(MockNotifier::new()),
            DispatchSettings::default(),
        ));
        RenderAndDispatchUseCase::new(
            contracts,
            parties,
            render,
            dispatcher,
            Some(Duration::from_secs(5)),
        )
    }

    #[tokio::test]
    async fn test_no_recipients_fails_before_loading() {
        let mut contracts = MockContractRepository::new();
        contracts.expect_find_by_id().never();

        let uc = pipeline(contracts);
        let result = uc.execute(&Uuid::new_v4(), &[]).await;
        assert!(matches!(result, Err(ContractEngineError::NoRecipients)));
    }

    #[tokio::test]
    async fn test_unknown_contract() {
        let mut contracts = MockContractRepository::new();
        contracts.expect_find_by_id().returning(|_| Ok(None));

        let uc = pipeline(contracts);
        let result = uc
            .execute(&Uuid::new_v4(), &["a@example.com".to_string()])
            .await;
        assert!(matches!(
            result,
            Err(ContractEngineError::NotFound { kind: "contract", .. })
        ));
    }
}
