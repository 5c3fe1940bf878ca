use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::entity::{Contract, ContractStep, TransitionPolicy};
use crate::domain::error::ContractEngineError;
use crate::domain::repository::{ContractRepository, PartyRepository};

/// ContractLifecycleUseCase はパートナー 1 名につき 1 件の契約レコードと、その 4 つの証跡フラグを管理する。
///
/// 証跡は一度記録されると取り消せない。同じ証跡を再度記録しても最初の日時・担当者が保持される。
/// 記録順序の検査は TransitionPolicy::Ordered の場合のみ行う。
///
/// 契約レコードにはロックを掛けないため、同一契約への同時更新は後勝ちになる。
pub struct ContractLifecycleUseCase {
    contract_repo: Arc<dyn ContractRepository>,
    party_repo: Arc<dyn PartyRepository>,
    policy: TransitionPolicy,
}

impl ContractLifecycleUseCase {
    pub fn new(
        contract_repo: Arc<dyn ContractRepository>,
        party_repo: Arc<dyn PartyRepository>,
        policy: TransitionPolicy,
    ) -> Self {
        Self {
            contract_repo,
            party_repo,
            policy,
        }
    }

    /// パートナーの契約を返す。まだ無ければ作成する。
    pub async fn ensure_contract(&self, party_id: &Uuid) -> Result<Contract, ContractEngineError> {
        if let Some(existing) = self.contract_repo.find_by_party_id(party_id).await? {
            return Ok(existing);
        }
        if self.party_repo.find_by_id(party_id).await?.is_none() {
            return Err(ContractEngineError::party_not_found(party_id));
        }

        let contract = Contract::new(*party_id);
        self.contract_repo.create(&contract).await?;
        tracing::info!(contract_id = %contract.id, party_id = %party_id, "contract created");
        Ok(contract)
    }

    pub async fn get(&self, contract_id: &Uuid) -> Result<Contract, ContractEngineError> {
        self.contract_repo
            .find_by_id(contract_id)
            .await?
            .ok_or_else(|| ContractEngineError::contract_not_found(contract_id))
    }

    /// パートナーの同意を記録し、パートナー側の contract_signed も立てる。
    pub async fn accept_by_partner(
        &self,
        contract_id: &Uuid,
        accepted_at: DateTime<Utc>,
    ) -> Result<Contract, ContractEngineError> {
        let (contract, changed) = self
            .record(contract_id, ContractStep::PartnerAccepted, None, accepted_at)
            .await?;

        if changed {
            match self.party_repo.find_by_id(&contract.party_id).await? {
                Some(mut party) if !party.contract_signed => {
                    party.mark_contract_signed();
                    self.party_repo.update(&party).await?;
                }
                Some(_) => {}
                None => tracing::warn!(
                    contract_id = %contract.id,
                    party_id = %contract.party_id,
                    "contract accepted but its party no longer exists"
                ),
            }
        }
        Ok(contract)
    }

    pub async fn validate_signature(
        &self,
        contract_id: &Uuid,
        validator: &str,
        at: DateTime<Utc>,
    ) -> Result<Contract, ContractEngineError> {
        self.record(contract_id, ContractStep::SignatureValidated, Some(validator), at)
            .await
            .map(|(contract, _)| contract)
    }

    pub async fn validate_by_admin(
        &self,
        contract_id: &Uuid,
        validator: &str,
        at: DateTime<Utc>,
    ) -> Result<Contract, ContractEngineError> {
        self.record(contract_id, ContractStep::AdminValidated, Some(validator), at)
            .await
            .map(|(contract, _)| contract)
    }

    pub async fn mark_email_sent(
        &self,
        contract_id: &Uuid,
        at: DateTime<Utc>,
    ) -> Result<Contract, ContractEngineError> {
        self.record(contract_id, ContractStep::EmailSent, None, at)
            .await
            .map(|(contract, _)| contract)
    }

    async fn record(
        &self,
        contract_id: &Uuid,
        step: ContractStep,
        actor: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<(Contract, bool), ContractEngineError> {
        let mut contract = self.get(contract_id).await?;

        if self.policy == TransitionPolicy::Ordered {
            if let Some(requires) = contract.unmet_prerequisite(step) {
                return Err(ContractEngineError::OutOfOrder { step, requires });
            }
        }

        let actor = actor.map(str::trim).unwrap_or_default().to_string();
        let changed = match step {
            ContractStep::PartnerAccepted => contract.accept_by_partner(at),
            ContractStep::SignatureValidated => contract.validate_signature(actor, at),
            ContractStep::AdminValidated => contract.validate_by_admin(actor, at),
            ContractStep::EmailSent => contract.mark_email_sent(at),
        };

        if changed {
            self.contract_repo.update(&contract).await?;
            tracing::info!(contract_id = %contract.id, step = %step, "contract step recorded");
        } else {
            tracing::debug!(contract_id = %contract.id, step = %step, "contract step already recorded");
        }
        Ok((contract, changed))
    }
}
