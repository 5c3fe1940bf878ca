use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum NotifierError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("delivery rejected: {0}")]
    Rejected(String),

    #[error("delivery error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    pub attachments: Vec<Attachment>,
}

/// Notifier は添付付きメッセージを 1 宛先に送信する。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), NotifierError>;
}
