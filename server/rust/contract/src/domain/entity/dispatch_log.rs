use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// DispatchLogEntry は 1 宛先・1 配信試行ごとの監査記録。書き込み後は変更しない。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchLogEntry {
    pub id: Uuid,
    pub contract_id: Option<Uuid>,
    pub recipient: String,
    pub subject: String,
    pub success: bool,
    pub error_message: Option<String>,
    pub artifact_link: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DispatchLogEntry {
    pub fn succeeded(
        contract_id: Option<Uuid>,
        recipient: impl Into<String>,
        subject: impl Into<String>,
        artifact_link: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            contract_id,
            recipient: recipient.into(),
            subject: subject.into(),
            success: true,
            error_message: None,
            artifact_link,
            created_at: Utc::now(),
        }
    }

    pub fn failed(
        contract_id: Option<Uuid>,
        recipient: impl Into<String>,
        subject: impl Into<String>,
        artifact_link: Option<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            contract_id,
            recipient: recipient.into(),
            subject: subject.into(),
            success: false,
            error_message: Some(error_message.into()),
            artifact_link,
            created_at: Utc::now(),
        }
    }
}
