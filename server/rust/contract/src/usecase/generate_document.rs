use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::document::substitution::{format_passport, format_tax_id};
use crate::domain::document::{
    substitute, LayoutOptions, PageGeometry, Signatory, SignatureBlock, SubstitutionContext,
    Watermark,
};
use crate::domain::entity::Party;
use crate::domain::error::ContractEngineError;
use crate::domain::repository::{PartyRepository, TemplateRepository};
use crate::usecase::get_active_template::GetActiveTemplateUseCase;

/// DocumentProfile は本文以外の固定要素（用紙・ヘッダー・透かし・署名欄の相手方）。
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentProfile {
    pub geometry: PageGeometry,
    pub header_title: String,
    pub watermark_text: String,
    pub partner_label: String,
    pub counterparty_label: String,
    pub counterparty_name: String,
    pub counterparty_identifiers: Vec<String>,
}

impl Default for DocumentProfile {
    fn default() -> Self {
        Self {
            geometry: PageGeometry::a4(),
            header_title: "NCNDA - ACORDO DE NÃO CIRCUNVENÇÃO E NÃO DIVULGAÇÃO".to_string(),
            watermark_text: "CONFIDENCIAL".to_string(),
            partner_label: "PARCEIRO".to_string(),
            counterparty_label: "AGRO".to_string(),
            counterparty_name: "Agro Trading".to_string(),
            counterparty_identifiers: Vec::new(),
        }
    }
}

impl DocumentProfile {
    /// パートナーの識別情報を署名欄に埋め込んだレイアウト設定を返す。
    pub fn layout_for(&self, partner: &Party) -> LayoutOptions {
        let mut identifiers = Vec::new();
        if !partner.tax_id.trim().is_empty() {
            identifiers.push(format!("CPF: {}", format_tax_id(&partner.tax_id)));
        }
        if !partner.passport_number.trim().is_empty() {
            identifiers.push(format!(
                "Passaporte: {}",
                format_passport(&partner.passport_number)
            ));
        }
        if !partner.email.trim().is_empty() {
            identifiers.push(format!("E-mail: {}", partner.email.trim()));
        }

        LayoutOptions {
            geometry: self.geometry,
            header_title: self.header_title.clone(),
            watermark: Watermark::new(self.watermark_text.clone()),
            signatures: SignatureBlock {
                partner: Signatory {
                    label: self.partner_label.clone(),
                    name: partner.full_name.trim().to_string(),
                    identifiers,
                },
                counterparty: Signatory {
                    label: self.counterparty_label.clone(),
                    name: self.counterparty_name.clone(),
                    identifiers: self.counterparty_identifiers.clone(),
                },
            },
        }
    }
}

/// GeneratedDocument はトークン置換まで済んだ契約書本文。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedDocument {
    pub template_id: Uuid,
    pub template_name: String,
    pub partner: Party,
    pub text: String,
}

/// GenerateDocumentUseCase は有効テンプレートとパートナー情報から契約書本文を生成する。
pub struct GenerateDocumentUseCase {
    active_template: GetActiveTemplateUseCase,
    party_repo: Arc<dyn PartyRepository>,
}

impl GenerateDocumentUseCase {
    pub fn new(
        template_repo: Arc<dyn TemplateRepository>,
        party_repo: Arc<dyn PartyRepository>,
    ) -> Self {
        Self {
            active_template: GetActiveTemplateUseCase::new(template_repo),
            party_repo,
        }
    }

    pub async fn execute(&self, party_id: &Uuid) -> Result<GeneratedDocument, ContractEngineError> {
        self.execute_on(party_id, Utc::now().date_naive()).await
    }

    /// 日付トークンを today で解決する。
    pub async fn execute_on(
        &self,
        party_id: &Uuid,
        today: NaiveDate,
    ) -> Result<GeneratedDocument, ContractEngineError> {
        let partner = self
            .party_repo
            .find_by_id(party_id)
            .await?
            .ok_or_else(|| ContractEngineError::party_not_found(party_id))?;
        self.generate_for(partner, today).await
    }

    pub async fn generate_for(
        &self,
        partner: Party,
        today: NaiveDate,
    ) -> Result<GeneratedDocument, ContractEngineError> {
        let template = self.active_template.execute().await?;
        let administrator = self.party_repo.find_administrator_with_image().await?;
        if administrator.is_none() {
            tracing::warn!(
                party_id = %partner.id,
                "no administrator with passport image; administrator image slot left as placeholder"
            );
        }

        let ctx = SubstitutionContext {
            partner: &partner,
            administrator: administrator.as_ref(),
            today,
        };
        let text = substitute(&template.body, &ctx);

        tracing::debug!(
            party_id = %partner.id,
            template_id = %template.id,
            chars = text.chars().count(),
            "contract text generated"
        );

        Ok(GeneratedDocument {
            template_id: template.id,
            template_name: template.name,
            partner,
            text,
        })
    }
}
