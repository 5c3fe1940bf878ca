use std::time::Duration;

use uuid::Uuid;

use crate::domain::entity::{ContractStep, DispatchResult};

/// ContractEngineError は契約書エンジン全体のエラー分類。
///
/// 画像取得の失敗（AssetUnavailable）はここに含まれない。レンダラー内で代替表示に置き換えられ、
/// 呼び出し元へは伝播しない。
#[derive(Debug, thiserror::Error)]
pub enum ContractEngineError {
    #[error("no active contract template")]
    TemplateMissing,

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("cannot record {step} before {requires}")]
    OutOfOrder {
        step: ContractStep,
        requires: ContractStep,
    },

    #[error("dispatch requires at least one recipient")]
    NoRecipients,

    #[error("contract {0} has no stored artifact")]
    ArtifactMissing(Uuid),

    #[error("notification failed for {count} recipient(s): {recipients}", count = .failed.len(), recipients = .failed.join(", "))]
    NotificationFailure {
        failed: Vec<String>,
        result: Box<DispatchResult>,
    },

    #[error("operation timed out after {0:?}")]
    Timeout(Duration),

    /// リポジトリ・ストレージ等のエラーはラップせずそのまま伝播する。
    #[error(transparent)]
    Persistence(#[from] anyhow::Error),
}

impl ContractEngineError {
    pub fn party_not_found(id: &Uuid) -> Self {
        Self::NotFound {
            kind: "party",
            id: id.to_string(),
        }
    }

    pub fn contract_not_found(id: &Uuid) -> Self {
        Self::NotFound {
            kind: "contract",
            id: id.to_string(),
        }
    }

    pub fn template_not_found(id: &Uuid) -> Self {
        Self::NotFound {
            kind: "template",
            id: id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::RecipientOutcome;

    #[test]
    fn persistence_error_is_transparent() {
        let err: ContractEngineError = anyhow::anyhow!("connection reset by peer").into();
        assert_eq!(err.to_string(), "connection reset by peer");
    }

    #[test]
    fn notification_failure_lists_recipients() {
        let err = ContractEngineError::NotificationFailure {
            failed: vec!["b@example.com".to_string()],
            result: Box::new(DispatchResult {
                artifact_ref: "r".to_string(),
                artifact_link: "l".to_string(),
                outcomes: vec![RecipientOutcome {
                    recipient: "b@example.com".to_string(),
                    success: false,
                    error_message: Some("x".to_string()),
                }],
            }),
        };
        assert_eq!(
            err.to_string(),
            "notification failed for 1 recipient(s): b@example.com"
        );
    }

    #[test]
    fn out_of_order_names_both_steps() {
        let err = ContractEngineError::OutOfOrder {
            step: ContractStep::SignatureValidated,
            requires: ContractStep::PartnerAccepted,
        };
        assert_eq!(
            err.to_string(),
            "cannot record signature_validated before partner_accepted"
        );
    }
}
