use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::ContractTemplate;
use crate::domain::repository::TemplateRepository;

/// TemplatePostgresRepository は PostgreSQL 実装のテンプレートリポジトリ。
pub struct TemplatePostgresRepository {
    pool: PgPool,
}

impl TemplatePostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = "SELECT id, name, body, active, created_at, updated_at FROM contract.contract_templates";

#[async_trait]
impl TemplateRepository for TemplatePostgresRepository {
    async fn find_by_id(&self, id: &Uuid) -> anyhow::Result<Option<ContractTemplate>> {
        let row = sqlx::query_as::<_, TemplateRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Into::into))
    }

    async fn find_all(&self) -> anyhow::Result<Vec<ContractTemplate>> {
        let rows = sqlx::query_as::<_, TemplateRow>(&format!(
            "{SELECT_COLUMNS} ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_active(&self) -> anyhow::Result<Vec<ContractTemplate>> {
        let rows = sqlx::query_as::<_, TemplateRow>(&format!(
            "{SELECT_COLUMNS} WHERE active = TRUE ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn create(&self, template: &ContractTemplate) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO contract.contract_templates (id, name, body, active, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(template.id)
        .bind(&template.name)
        .bind(&template.body)
        .bind(template.active)
        .bind(template.created_at)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update(&self, template: &ContractTemplate) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            UPDATE contract.contract_templates
            SET name = $2, body = $3, active = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(template.id)
        .bind(&template.name)
        .bind(&template.body)
        .bind(template.active)
        .bind(template.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct TemplateRow {
    id: Uuid,
    name: String,
    body: String,
    active: bool,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<TemplateRow> for ContractTemplate {
    fn from(row: TemplateRow) -> Self {
        ContractTemplate {
            id: row.id,
            name: row.name,
            body: row.body,
            active: row.active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
