use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment as MailAttachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;

use crate::domain::service::{Notifier, NotifierError, OutgoingMessage};
use crate::infrastructure::config::SmtpConfig;

/// EmailNotifier は SMTP で契約書 PDF を添付したメールを送る。
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifierError> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
            .map_err(|e: lettre::transport::smtp::Error| {
                NotifierError::ConnectionFailed(e.to_string())
            })?
            .port(config.port);
        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.expose_secret().clone(),
            ));
        }

        Ok(Self {
            mailer: builder.build(),
            from_address: config.from_address.clone(),
        })
    }

    fn build_message(&self, message: &OutgoingMessage) -> Result<Message, NotifierError> {
        let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(message.body.clone()));
        for attachment in &message.attachments {
            let content_type = ContentType::parse(&attachment.content_type).map_err(|e| {
                NotifierError::Other(format!(
                    "invalid attachment content type {}: {}",
                    attachment.content_type, e
                ))
            })?;
            parts = parts.singlepart(
                MailAttachment::new(attachment.filename.clone())
                    .body(attachment.bytes.clone(), content_type),
            );
        }

        Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|e: lettre::address::AddressError| {
                        NotifierError::Other(format!("invalid from address: {}", e))
                    })?,
            )
            .to(message
                .recipient
                .parse()
                .map_err(|e: lettre::address::AddressError| {
                    NotifierError::InvalidRecipient(format!("{}: {}", message.recipient, e))
                })?)
            .subject(message.subject.clone())
            .multipart(parts)
            .map_err(|e| NotifierError::Other(format!("failed to build email: {}", e)))
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), NotifierError> {
        let email = self.build_message(message)?;

        self.mailer
            .send(email)
            .await
            .map_err(|e: lettre::transport::smtp::Error| {
                if e.is_permanent() {
                    NotifierError::Rejected(e.to_string())
                } else {
                    NotifierError::ConnectionFailed(e.to_string())
                }
            })?;

        tracing::debug!(recipient = %message.recipient, "email accepted by smtp relay");
        Ok(())
    }
}
