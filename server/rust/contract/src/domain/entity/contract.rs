use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// ContractStep は契約の承認フローにおける各証跡を表す。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStep {
    PartnerAccepted,
    SignatureValidated,
    AdminValidated,
    EmailSent,
}

impl fmt::Display for ContractStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractStep::PartnerAccepted => write!(f, "partner_accepted"),
            ContractStep::SignatureValidated => write!(f, "signature_validated"),
            ContractStep::AdminValidated => write!(f, "admin_validated"),
            ContractStep::EmailSent => write!(f, "email_sent"),
        }
    }
}

/// TransitionPolicy は証跡の記録順序をどこまで強制するかを表す。
/// Permissive は順序を検査しない（画面側のみで制御する）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionPolicy {
    #[default]
    Permissive,
    Ordered,
}

/// Contract はパートナー 1 名につき 1 件の契約レコード。
/// 4 つの状態フラグは互いに独立しており、一度 true になったら戻らない。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contract {
    pub id: Uuid,
    pub party_id: Uuid,
    pub artifact_ref: Option<String>,
    pub partner_accepted: bool,
    pub partner_accepted_at: Option<DateTime<Utc>>,
    pub signature_validated: bool,
    pub signature_validated_at: Option<DateTime<Utc>>,
    pub admin_validated: bool,
    pub admin_validated_at: Option<DateTime<Utc>>,
    pub email_sent: bool,
    pub email_sent_at: Option<DateTime<Utc>>,
    /// 管理者承認を行った担当者の表示名
    pub approved_by: Option<String>,
    /// 署名確認を行った担当者の表示名
    pub validated_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contract {
    pub fn new(party_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            party_id,
            artifact_ref: None,
            partner_accepted: false,
            partner_accepted_at: None,
            signature_validated: false,
            signature_validated_at: None,
            admin_validated: false,
            admin_validated_at: None,
            email_sent: false,
            email_sent_at: None,
            approved_by: None,
            validated_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_set(&self, step: ContractStep) -> bool {
        match step {
            ContractStep::PartnerAccepted => self.partner_accepted,
            ContractStep::SignatureValidated => self.signature_validated,
            ContractStep::AdminValidated => self.admin_validated,
            ContractStep::EmailSent => self.email_sent,
        }
    }

    /// 画面上の想定順序で step の前提となる証跡。
    pub fn prerequisite(step: ContractStep) -> Option<ContractStep> {
        match step {
            ContractStep::PartnerAccepted => None,
            ContractStep::SignatureValidated | ContractStep::AdminValidated => {
                Some(ContractStep::PartnerAccepted)
            }
            ContractStep::EmailSent => Some(ContractStep::AdminValidated),
        }
    }

    /// step の前提のうち、まだ記録されていないもの。記録済みの step は常に None。
    pub fn unmet_prerequisite(&self, step: ContractStep) -> Option<ContractStep> {
        if self.is_set(step) {
            return None;
        }
        Self::prerequisite(step).filter(|requires| !self.is_set(*requires))
    }

    pub fn can_record(&self, step: ContractStep) -> bool {
        self.unmet_prerequisite(step).is_none()
    }

    /// 戻り値はフラグが新たに立ったかどうか。既に立っている場合は最初の記録を保持する。
    pub fn accept_by_partner(&mut self, at: DateTime<Utc>) -> bool {
        if self.partner_accepted {
            return false;
        }
        self.partner_accepted = true;
        self.partner_accepted_at = Some(at);
        self.updated_at = Utc::now();
        true
    }

    pub fn validate_signature(&mut self, validator: impl Into<String>, at: DateTime<Utc>) -> bool {
        if self.signature_validated {
            return false;
        }
        self.signature_validated = true;
        self.signature_validated_at = Some(at);
        self.validated_by = Some(validator.into());
        self.updated_at = Utc::now();
        true
    }

    pub fn validate_by_admin(&mut self, validator: impl Into<String>, at: DateTime<Utc>) -> bool {
        if self.admin_validated {
            return false;
        }
        self.admin_validated = true;
        self.admin_validated_at = Some(at);
        self.approved_by = Some(validator.into());
        self.updated_at = Utc::now();
        true
    }

    pub fn mark_email_sent(&mut self, at: DateTime<Utc>) -> bool {
        if self.email_sent {
            return false;
        }
        self.email_sent = true;
        self.email_sent_at = Some(at);
        self.updated_at = Utc::now();
        true
    }

    /// 配信のたびに新しい成果物が保存されるため、参照は常に最新で上書きする。
    pub fn attach_artifact(&mut self, artifact_ref: impl Into<String>) {
        self.artifact_ref = Some(artifact_ref.into());
        self.updated_at = Utc::now();
    }

    /// 成果物の保存キー: contracts/{party_id}_{timestamp}.pdf
    pub fn artifact_key(party_id: &Uuid, at: DateTime<Utc>) -> String {
        format!("contracts/{}_{}.pdf", party_id, at.timestamp_millis())
    }
}
