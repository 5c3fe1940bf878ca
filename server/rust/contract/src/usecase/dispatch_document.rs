use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::document::PDF_CONTENT_TYPE;
use crate::domain::entity::{
    Contract, DispatchLogEntry, DispatchPolicy, DispatchResult, Party, RecipientOutcome,
};
use crate::domain::error::ContractEngineError;
use crate::domain::repository::{ContractRepository, DispatchLogRepository};
use crate::domain::service::{Attachment, BlobStore, Notifier, OutgoingMessage};

/// 成果物リンクの既定の有効期間（日）
pub const DEFAULT_LINK_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq)]
pub struct DispatchSettings {
    pub subject: String,
    pub policy: DispatchPolicy,
    pub link_ttl: chrono::Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            subject: "Contrato NCNDA".to_string(),
            policy: DispatchPolicy::AllOrNothing,
            link_ttl: chrono::Duration::days(DEFAULT_LINK_TTL_DAYS),
        }
    }
}

/// Delivery は 1 回の配信で全宛先に共通する内容。
pub struct Delivery<'a> {
    pub contract_id: Uuid,
    pub partner_name: &'a str,
    pub artifact_ref: &'a str,
    pub artifact_link: &'a str,
    pub link_expires_at: DateTime<Utc>,
    pub bytes: &'a [u8],
}

/// DispatchDocumentUseCase は成果物の保存・リンク発行・宛先ごとの通知・監査ログ記録を行う。
///
/// 宛先は 1 件ずつ順に処理し、失敗しても残りの宛先への送信を続ける。監査ログは送信試行ごとに 1 行。
/// 配信全体の成否は DispatchPolicy で決まり、成功とみなされた場合のみ契約の email_sent を立てる。
pub struct DispatchDocumentUseCase {
    contract_repo: Arc<dyn ContractRepository>,
    log_repo: Arc<dyn DispatchLogRepository>,
    blob_store: Arc<dyn BlobStore>,
    notifier: Arc<dyn Notifier>,
    settings: DispatchSettings,
}

impl DispatchDocumentUseCase {
    pub fn new(
        contract_repo: Arc<dyn ContractRepository>,
        log_repo: Arc<dyn DispatchLogRepository>,
        blob_store: Arc<dyn BlobStore>,
        notifier: Arc<dyn Notifier>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            contract_repo,
            log_repo,
            blob_store,
            notifier,
            settings,
        }
    }

    /// 新しく生成した PDF を保存して全宛先へ送る。
    pub async fn execute(
        &self,
        contract: &Contract,
        party: &Party,
        document: &[u8],
        recipients: &[String],
    ) -> Result<DispatchResult, ContractEngineError> {
        let recipients = normalize_recipients(recipients)?;
        let mut stored_contract = self.load_contract(contract.id).await?;

        let key = Contract::artifact_key(&party.id, Utc::now());
        let artifact_ref = self
            .blob_store
            .put(&key, document, PDF_CONTENT_TYPE)
            .await?;
        // 参照は最初の送信より前に契約へ記録する
        stored_contract.attach_artifact(&artifact_ref);
        self.contract_repo.update(&stored_contract).await?;
        tracing::info!(
            contract_id = %contract.id,
            artifact_ref = %artifact_ref,
            bytes = document.len(),
            "contract artifact stored"
        );

        self.send_stored(contract.id, &party.full_name, &artifact_ref, document, &recipients)
            .await
    }

    /// 保存済みの成果物について新しいリンクを発行し、全宛先へ送る。
    pub async fn send_stored(
        &self,
        contract_id: Uuid,
        partner_name: &str,
        artifact_ref: &str,
        document: &[u8],
        recipients: &[String],
    ) -> Result<DispatchResult, ContractEngineError> {
        let recipients = normalize_recipients(recipients)?;
        let link = self
            .blob_store
            .signed_url(artifact_ref, self.settings.link_ttl)
            .await?;

        let delivery = Delivery {
            contract_id,
            partner_name,
            artifact_ref,
            artifact_link: &link.url,
            link_expires_at: link.expires_at,
            bytes: document,
        };
        let result = self.notify_all(&delivery, &recipients).await?;
        self.settle(contract_id, artifact_ref, result).await
    }

    /// 全宛先に通知し、宛先ごとに監査ログを 1 行書く。送信失敗は結果に記録し、中断しない。
    pub async fn notify_all(
        &self,
        delivery: &Delivery<'_>,
        recipients: &[String],
    ) -> Result<DispatchResult, ContractEngineError> {
        let body = message_body(delivery);
        let attachment = Attachment {
            filename: attachment_filename(delivery.artifact_ref),
            content_type: PDF_CONTENT_TYPE.to_string(),
            bytes: delivery.bytes.to_vec(),
        };

        let mut outcomes = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            let message = OutgoingMessage {
                recipient: recipient.clone(),
                subject: self.settings.subject.clone(),
                body: body.clone(),
                attachments: vec![attachment.clone()],
            };
            let link = Some(delivery.artifact_link.to_string());

            let (entry, outcome) = match self.notifier.send(&message).await {
                Ok(()) => {
                    tracing::info!(
                        contract_id = %delivery.contract_id,
                        recipient = %recipient,
                        "contract notification sent"
                    );
                    (
                        DispatchLogEntry::succeeded(
                            Some(delivery.contract_id),
                            recipient.as_str(),
                            self.settings.subject.as_str(),
                            link,
                        ),
                        RecipientOutcome {
                            recipient: recipient.clone(),
                            success: true,
                            error_message: None,
                        },
                    )
                }
                Err(e) => {
                    let reason = e.to_string();
                    tracing::error!(
                        contract_id = %delivery.contract_id,
                        recipient = %recipient,
                        error = %reason,
                        "contract notification failed"
                    );
                    (
                        DispatchLogEntry::failed(
                            Some(delivery.contract_id),
                            recipient.as_str(),
                            self.settings.subject.as_str(),
                            link,
                            reason.clone(),
                        ),
                        RecipientOutcome {
                            recipient: recipient.clone(),
                            success: false,
                            error_message: Some(reason),
                        },
                    )
                }
            };
            self.log_repo.append(&entry).await?;
            outcomes.push(outcome);
        }

        Ok(DispatchResult {
            artifact_ref: delivery.artifact_ref.to_string(),
            artifact_link: delivery.artifact_link.to_string(),
            outcomes,
        })
    }

    async fn load_contract(&self, contract_id: Uuid) -> Result<Contract, ContractEngineError> {
        self.contract_repo
            .find_by_id(&contract_id)
            .await?
            .ok_or_else(|| ContractEngineError::contract_not_found(&contract_id))
    }

    /// 契約に成果物参照を記録し、ポリシーに従って配信の成否を確定する。
    async fn settle(
        &self,
        contract_id: Uuid,
        artifact_ref: &str,
        result: DispatchResult,
    ) -> Result<DispatchResult, ContractEngineError> {
        let acceptable = result.is_acceptable(self.settings.policy);

        let mut contract = self.load_contract(contract_id).await?;
        contract.attach_artifact(artifact_ref);
        if acceptable {
            contract.mark_email_sent(Utc::now());
        }
        self.contract_repo.update(&contract).await?;

        if acceptable {
            Ok(result)
        } else {
            let failed = result.failed_recipients();
            tracing::error!(
                contract_id = %contract_id,
                failed = failed.len(),
                total = result.outcomes.len(),
                policy = ?self.settings.policy,
                "contract dispatch failed"
            );
            Err(ContractEngineError::NotificationFailure {
                failed,
                result: Box::new(result),
            })
        }
    }
}

/// 前後の空白を除き、空の宛先と重複を取り除く（順序は保持）。
pub fn normalize_recipients(recipients: &[String]) -> Result<Vec<String>, ContractEngineError> {
    let mut normalized: Vec<String> = Vec::with_capacity(recipients.len());
    for recipient in recipients.iter().map(|r| r.trim()) {
        if recipient.is_empty() || normalized.iter().any(|r| r.eq_ignore_ascii_case(recipient)) {
            continue;
        }
        normalized.push(recipient.to_string());
    }
    if normalized.is_empty() {
        return Err(ContractEngineError::NoRecipients);
    }
    Ok(normalized)
}

fn attachment_filename(artifact_ref: &str) -> String {
    artifact_ref
        .rsplit('/')
        .next()
        .filter(|name| !name.is_empty())
        .unwrap_or("contrato.pdf")
        .to_string()
}

fn message_body(delivery: &Delivery<'_>) -> String {
    format!(
        "Olá,\n\nSegue em anexo o contrato NCNDA de {}.\n\
         O documento também pode ser obtido pelo link abaixo até {}:\n{}\n",
        delivery.partner_name.trim(),
        delivery.link_expires_at.format("%d/%m/%Y"),
        delivery.artifact_link
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::contract_repository::MockContractRepository;
    use crate::domain::repository::dispatch_log_repository::MockDispatchLogRepository;
    use crate::domain::service::blob_store::MockBlobStore;
    use crate::domain::service::notifier::MockNotifier;
    use crate::domain::service::{NotifierError, SignedLink};

    fn blob_store() -> MockBlobStore {
        let mut mock = MockBlobStore::new();
        mock.expect_put()
            .returning(|key, _, _| Ok(key.to_string()));
        mock.expect_signed_url().returning(|storage_ref, ttl| {
            Ok(SignedLink {
                url: format!("https://files.example.com/{storage_ref}?sig=abc"),
                expires_at: Utc::now() + ttl,
            })
        });
        mock
    }

    fn contracts(contract: &Contract) -> MockContractRepository {
        let stored = contract.clone();
        let mut mock = MockContractRepository::new();
        mock.expect_find_by_id()
            .returning(move |_| Ok(Some(stored.clone())));
        mock
    }

    /// update された契約を順に記録する。
    fn capture_updates(
        repo: &mut MockContractRepository,
        times: usize,
    ) -> Arc<std::sync::Mutex<Vec<Contract>>> {
        let updates = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = updates.clone();
        repo.expect_update().times(times).returning(move |c| {
            sink.lock().unwrap().push(c.clone());
            Ok(())
        });
        updates
    }

    fn recipients(list: &[&str]) -> Vec<String> {
        list.iter().map(|r| r.to_string()).collect()
    }

    #[tokio::test]
    async fn test_dispatch_all_recipients_succeed() {
        let party = Party::new("Ana Silva", "12345678901", "ana@example.com");
        let contract = Contract::new(party.id);

        let mut contract_repo = contracts(&contract);
        let updates = capture_updates(&mut contract_repo, 2);
        let mut logs = MockDispatchLogRepository::new();
        logs.expect_append()
            .withf(|e| e.success && e.artifact_link.is_some())
            .times(2)
            .returning(|_| Ok(()));
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .withf(|m| m.attachments.len() == 1 && m.body.contains("https://files.example.com/"))
            .times(2)
            .returning(|_| Ok(()));

        let uc = DispatchDocumentUseCase::new(
            Arc::new(contract_repo),
            Arc::new(logs),
            Arc::new(blob_store()),
            Arc::new(notifier),
            DispatchSettings::default(),
        );
        let result = uc
            .execute(&contract, &party, b"%PDF-1.4", &recipients(&["a@example.com", "b@example.com"]))
            .await
            .unwrap();
        assert!(result.is_complete());
        assert_eq!(result.outcomes.len(), 2);
        assert!(result.artifact_ref.starts_with(&format!("contracts/{}_", party.id)));

        let updates = updates.lock().unwrap();
        assert_eq!(updates[0].artifact_ref.as_deref(), Some(result.artifact_ref.as_str()));
        assert!(!updates[0].email_sent);
        assert!(updates[1].email_sent);
        assert_eq!(updates[1].artifact_ref, updates[0].artifact_ref);
    }

    #[tokio::test]
    async fn test_dispatch_second_recipient_fails() {
        let party = Party::new("Ana Silva", "12345678901", "ana@example.com");
        let contract = Contract::new(party.id);

        let mut contract_repo = contracts(&contract);
        let updates = capture_updates(&mut contract_repo, 2);
        let mut logs = MockDispatchLogRepository::new();
        let mut seq = mockall::Sequence::new();
        logs.expect_append()
            .withf(|e| e.success && e.recipient == "a@example.com")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        logs.expect_append()
            .withf(|e| !e.success && e.recipient == "b@example.com" && e.error_message.is_some())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));
        let mut notifier = MockNotifier::new();
        notifier.expect_send().returning(|m| {
            if m.recipient == "b@example.com" {
                Err(NotifierError::Rejected("550 mailbox unavailable".to_string()))
            } else {
                Ok(())
            }
        });

        let uc = DispatchDocumentUseCase::new(
            Arc::new(contract_repo),
            Arc::new(logs),
            Arc::new(blob_store()),
            Arc::new(notifier),
            DispatchSettings::default(),
        );
        let err = uc
            .execute(&contract, &party, b"%PDF-1.4", &recipients(&["a@example.com", "b@example.com"]))
            .await
            .unwrap_err();
        match err {
            ContractEngineError::NotificationFailure { failed, result } => {
                assert_eq!(failed, vec!["b@example.com".to_string()]);
                assert_eq!(result.succeeded_count(), 1);
            }
            other => panic!("unexpected error: {other}"),
        }
        let updates = updates.lock().unwrap();
        assert!(updates.iter().all(|c| !c.email_sent && c.artifact_ref.is_some()));
    }

    #[tokio::test]
    async fn test_allow_partial_policy_accepts_partial_success() {
        let party = Party::new("Ana Silva", "12345678901", "ana@example.com");
        let contract = Contract::new(party.id);

        let mut contract_repo = contracts(&contract);
        let updates = capture_updates(&mut contract_repo, 2);
        let mut logs = MockDispatchLogRepository::new();
        logs.expect_append().times(2).returning(|_| Ok(()));
        let mut notifier = MockNotifier::new();
        notifier.expect_send().returning(|m| {
            if m.recipient == "b@example.com" {
                Err(NotifierError::ConnectionFailed("timeout".to_string()))
            } else {
                Ok(())
            }
        });

        let uc = DispatchDocumentUseCase::new(
            Arc::new(contract_repo),
            Arc::new(logs),
            Arc::new(blob_store()),
            Arc::new(notifier),
            DispatchSettings {
                policy: DispatchPolicy::AllowPartial,
                ..DispatchSettings::default()
            },
        );
        let result = uc
            .execute(&contract, &party, b"%PDF-1.4", &recipients(&["a@example.com", "b@example.com"]))
            .await
            .unwrap();
        assert!(!result.is_complete());
        assert_eq!(result.failed_recipients(), vec!["b@example.com".to_string()]);
        assert!(updates.lock().unwrap()[1].email_sent);
    }

    #[tokio::test]
    async fn test_dispatch_without_recipients_stores_nothing() {
        let party = Party::new("Ana Silva", "12345678901", "ana@example.com");
        let contract = Contract::new(party.id);

        let mut store = MockBlobStore::new();
        store.expect_put().never();

        let uc = DispatchDocumentUseCase::new(
            Arc::new(MockContractRepository::new()),
            Arc::new(MockDispatchLogRepository::new()),
            Arc::new(store),
            Arc::new(MockNotifier::new()),
            DispatchSettings::default(),
        );
        let result = uc
            .execute(&contract, &party, b"%PDF-1.4", &recipients(&["  ", ""]))
            .await;
        assert!(matches!(result, Err(ContractEngineError::NoRecipients)));
    }

    #[tokio::test]
    async fn test_storage_failure_is_propagated_before_sending() {
        let party = Party::new("Ana Silva", "12345678901", "ana@example.com");
        let contract = Contract::new(party.id);

        let mut store = MockBlobStore::new();
        store
            .expect_put()
            .returning(|_, _, _| Err(anyhow::anyhow!("disk full")));
        let mut notifier = MockNotifier::new();
        notifier.expect_send().never();

        let mut contract_repo = contracts(&contract);
        contract_repo.expect_update().never();

        let uc = DispatchDocumentUseCase::new(
            Arc::new(contract_repo),
            Arc::new(MockDispatchLogRepository::new()),
            Arc::new(store),
            Arc::new(notifier),
            DispatchSettings::default(),
        );
        let err = uc
            .execute(&contract, &party, b"%PDF-1.4", &recipients(&["a@example.com"]))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }

    #[tokio::test]
    async fn test_log_failure_after_send_keeps_artifact_reference() {
        let party = Party::new("Ana Silva", "12345678901", "ana@example.com");
        let contract = Contract::new(party.id);

        let mut contract_repo = contracts(&contract);
        let updates = capture_updates(&mut contract_repo, 1);
        let mut logs = MockDispatchLogRepository::new();
        logs.expect_append()
            .times(1)
            .returning(|_| Err(anyhow::anyhow!("log table down")));
        let mut notifier = MockNotifier::new();
        notifier.expect_send().times(1).returning(|_| Ok(()));

        let uc = DispatchDocumentUseCase::new(
            Arc::new(contract_repo),
            Arc::new(logs),
            Arc::new(blob_store()),
            Arc::new(notifier),
            DispatchSettings::default(),
        );
        let err = uc
            .execute(&contract, &party, b"%PDF-1.4", &recipients(&["a@example.com", "b@example.com"]))
            .await
            .unwrap_err();
        assert!(matches!(err, ContractEngineError::Persistence(_)));
        assert_eq!(err.to_string(), "log table down");

        let updates = updates.lock().unwrap();
        assert_eq!(updates.len(), 1);
        assert!(updates[0]
            .artifact_ref
            .as_deref()
            .is_some_and(|r| r.starts_with(&format!("contracts/{}_", party.id))));
        assert!(!updates[0].email_sent);
    }

    #[tokio::test]
    async fn test_unknown_contract_stores_nothing() {
        let party = Party::new("Ana Silva", "12345678901", "ana@example.com");
        let contract = Contract::new(party.id);

        let mut contract_repo = MockContractRepository::new();
        contract_repo.expect_find_by_id().returning(|_| Ok(None));
        let mut store = MockBlobStore::new();
        store.expect_put().never();

        let uc = DispatchDocumentUseCase::new(
            Arc::new(contract_repo),
            Arc::new(MockDispatchLogRepository::new()),
            Arc::new(store),
            Arc::new(MockNotifier::new()),
            DispatchSettings::default(),
        );
        let result = uc
            .execute(&contract, &party, b"%PDF-1.4", &recipients(&["a@example.com"]))
            .await;
        assert!(matches!(result, Err(ContractEngineError::NotFound { kind: "contract", .. })));
    }

    #[test]
    fn test_normalize_recipients_trims_and_dedupes() {
        let normalized =
            normalize_recipients(&recipients(&[" a@example.com", "A@example.com", "b@example.com", ""]))
                .unwrap();
        assert_eq!(normalized, vec!["a@example.com".to_string(), "b@example.com".to_string()]);
    }

    #[test]
    fn test_attachment_filename_uses_key_basename() {
        assert_eq!(attachment_filename("contracts/abc_1.pdf"), "abc_1.pdf");
        assert_eq!(attachment_filename("contracts/"), "contrato.pdf");
    }
}
