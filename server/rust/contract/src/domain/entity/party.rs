use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Party は取引パートナー（または管理者）のプロフィールを表す。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Party {
    pub id: Uuid,
    pub full_name: String,
    pub tax_id: String,
    pub passport_number: String,
    pub email: String,
    pub phone: String,
    pub postal_address: String,
    /// 保存済みパスポート画像の取得 URL
    pub passport_image_url: Option<String>,
    pub is_administrator: bool,
    pub contract_signed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Party {
    pub fn new(full_name: impl Into<String>, tax_id: impl Into<String>, email: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            full_name: full_name.into(),
            tax_id: tax_id.into(),
            passport_number: String::new(),
            email: email.into(),
            phone: String::new(),
            postal_address: String::new(),
            passport_image_url: None,
            is_administrator: false,
            contract_signed: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_passport(mut self, number: impl Into<String>, image_url: Option<String>) -> Self {
        self.passport_number = number.into();
        self.passport_image_url = image_url;
        self
    }

    pub fn as_administrator(mut self) -> Self {
        self.is_administrator = true;
        self
    }

    pub fn has_passport_image(&self) -> bool {
        self.passport_image_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }

    pub fn mark_contract_signed(&mut self) {
        self.contract_signed = true;
        self.updated_at = Utc::now();
    }
}
