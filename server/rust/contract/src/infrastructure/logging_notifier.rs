use async_trait::async_trait;

use crate::domain::service::{Notifier, NotifierError, OutgoingMessage};

/// LoggingNotifier は SMTP 未設定の環境で使う通知。送信内容をログに出すだけで常に成功する。
#[derive(Debug, Default)]
pub struct LoggingNotifier;

impl LoggingNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), NotifierError> {
        let attachment_bytes: usize = message.attachments.iter().map(|a| a.bytes.len()).sum();
        tracing::info!(
            recipient = %message.recipient,
            subject = %message.subject,
            attachments = message.attachments.len(),
            attachment_bytes,
            "smtp not configured; notification logged instead of sent"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_logging_notifier_always_succeeds() {
        let notifier = LoggingNotifier::new();
        let message = OutgoingMessage {
            recipient: "ana@example.com".to_string(),
            subject: "Contrato NCNDA".to_string(),
            body: String::new(),
            attachments: vec![],
        };
        assert!(notifier.send(&message).await.is_ok());
    }
}
