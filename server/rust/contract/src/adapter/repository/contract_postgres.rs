use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::Contract;
use crate::domain::repository::ContractRepository;

/// ContractPostgresRepository は PostgreSQL 実装の契約リポジトリ。
/// 更新は行全体の上書きで、バージョン検査は行わない。
pub struct ContractPostgresRepository {
    pool: PgPool,
}

impl ContractPostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, party_id, artifact_ref,
           partner_accepted, partner_accepted_at, signature_validated, signature_validated_at,
           admin_validated, admin_validated_at, email_sent, email_sent_at,
           approved_by, validated_by, created_at, updated_at
    FROM contract.contracts"#;

#[async_trait]
impl ContractRepository for ContractPostgresRepository {
    async fn find_by_id(&self, id: &Uuid) -> anyhow::Result<Option<Contract>> {
        let row = sqlx::query_as::<_, ContractRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_by_party_id(&self, party_id: &Uuid) -> anyhow::Result<Option<Contract>> {
        let row =
            sqlx::query_as::<_, ContractRow>(&format!("{SELECT_COLUMNS} WHERE party_id = $1"))
                .bind(party_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Into::into))
    }

    async fn create(&self, contract: &Contract) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO contract.contracts
                (id, party_id, artifact_ref,
                 partner_accepted, partner_accepted_at, signature_validated, signature_validated_at,
                 admin_validated, admin_validated_at, email_sent, email_sent_at,
                 approved_by, validated_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(contract.id)
        .bind(contract.party_id)
        .bind(&contract.artifact_ref)
        .bind(contract.partner_accepted)
        .bind(contract.partner_accepted_at)
        .bind(contract.signature_validated)
        .bind(contract.signature_validated_at)
        .bind(contract.admin_validated)
        .bind(contract.admin_validated_at)
        .bind(contract.email_sent)
        .bind(contract.email_sent_at)
        .bind(&contract.approved_by)
        .bind(&contract.validated_by)
        .bind(contract.created_at)
        .bind(contract.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, contract: &Contract) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE contract.contracts
            SET artifact_ref = $2,
                partner_accepted = $3, partner_accepted_at = $4,
                signature_validated = $5, signature_validated_at = $6,
                admin_validated = $7, admin_validated_at = $8,
                email_sent = $9, email_sent_at = $10,
                approved_by = $11, validated_by = $12, updated_at = $13
            WHERE id = $1
            "#,
        )
        .bind(contract.id)
        .bind(&contract.artifact_ref)
        .bind(contract.partner_accepted)
        .bind(contract.partner_accepted_at)
        .bind(contract.signature_validated)
        .bind(contract.signature_validated_at)
        .bind(contract.admin_validated)
        .bind(contract.admin_validated_at)
        .bind(contract.email_sent)
        .bind(contract.email_sent_at)
        .bind(&contract.approved_by)
        .bind(&contract.validated_by)
        .bind(contract.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct ContractRow {
    id: Uuid,
    party_id: Uuid,
    artifact_ref: Option<String>,
    partner_accepted: bool,
    partner_accepted_at: Option<DateTime<Utc>>,
    signature_validated: bool,
    signature_validated_at: Option<DateTime<Utc>>,
    admin_validated: bool,
    admin_validated_at: Option<DateTime<Utc>>,
    email_sent: bool,
    email_sent_at: Option<DateTime<Utc>>,
    approved_by: Option<String>,
    validated_by: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ContractRow> for Contract {
    fn from(row: ContractRow) -> Self {
        Contract {
            id: row.id,
            party_id: row.party_id,
            artifact_ref: row.artifact_ref,
            partner_accepted: row.partner_accepted,
            partner_accepted_at: row.partner_accepted_at,
            signature_validated: row.signature_validated,
            signature_validated_at: row.signature_validated_at,
            admin_validated: row.admin_validated,
            admin_validated_at: row.admin_validated_at,
            email_sent: row.email_sent,
            email_sent_at: row.email_sent_at,
            approved_by: row.approved_by,
            validated_by: row.validated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
