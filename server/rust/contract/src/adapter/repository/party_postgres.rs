use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::Party;
use crate::domain::repository::PartyRepository;

/// PartyPostgresRepository は PostgreSQL 実装のパートナーリポジトリ。
pub struct PartyPostgresRepository {
    pool: PgPool,
}

impl PartyPostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, full_name, tax_id, passport_number, email, phone, postal_address,
           passport_image_url, is_administrator, contract_signed, created_at, updated_at
    FROM contract.parties"#;

#[async_trait]
impl PartyRepository for PartyPostgresRepository {
    async fn find_by_id(&self, id: &Uuid) -> anyhow::Result<Option<Party>> {
        let row = sqlx::query_as::<_, PartyRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_administrator_with_image(&self) -> anyhow::Result<Option<Party>> {
        let row = sqlx::query_as::<_, PartyRow>(&format!(
            "{SELECT_COLUMNS} WHERE is_administrator = TRUE \
             AND passport_image_url IS NOT NULL AND btrim(passport_image_url) <> '' \
             ORDER BY created_at, id LIMIT 1"
        ))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    async fn create(&self, party: &Party) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO contract.parties
                (id, full_name, tax_id, passport_number, email, phone, postal_address,
                 passport_image_url, is_administrator, contract_signed, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(party.id)
        .bind(&party.full_name)
        .bind(&party.tax_id)
        .bind(&party.passport_number)
        .bind(&party.email)
        .bind(&party.phone)
        .bind(&party.postal_address)
        .bind(&party.passport_image_url)
        .bind(party.is_administrator)
        .bind(party.contract_signed)
        .bind(party.created_at)
        .bind(party.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, party: &Party) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE contract.parties
            SET full_name = $2, tax_id = $3, passport_number = $4, email = $5, phone = $6,
                postal_address = $7, passport_image_url = $8, is_administrator = $9,
                contract_signed = $10, updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(party.id)
        .bind(&party.full_name)
        .bind(&party.tax_id)
        .bind(&party.passport_number)
        .bind(&party.email)
        .bind(&party.phone)
        .bind(&party.postal_address)
        .bind(&party.passport_image_url)
        .bind(party.is_administrator)
        .bind(party.contract_signed)
        .bind(party.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct PartyRow {
    id: Uuid,
    full_name: String,
    tax_id: String,
    passport_number: String,
    email: String,
    phone: String,
    postal_address: String,
    passport_image_url: Option<String>,
    is_administrator: bool,
    contract_signed: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<PartyRow> for Party {
    fn from(row: PartyRow) -> Self {
        Party {
            id: row.id,
            full_name: row.full_name,
            tax_id: row.tax_id,
            passport_number: row.passport_number,
            email: row.email,
            phone: row.phone,
            postal_address: row.postal_address,
            passport_image_url: row.passport_image_url,
            is_administrator: row.is_administrator,
            contract_signed: row.contract_signed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
