use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::DispatchLogEntry;
use crate::domain::repository::DispatchLogRepository;

/// DispatchLogPostgresRepository は PostgreSQL 実装の配信監査ログ。INSERT と SELECT のみ。
pub struct DispatchLogPostgresRepository {
    pool: PgPool,
}

impl DispatchLogPostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, contract_id, recipient, subject, success, error_message, artifact_link, created_at
    FROM contract.dispatch_logs"#;

#[async_trait]
impl DispatchLogRepository for DispatchLogPostgresRepository {
    async fn append(&self, entry: &DispatchLogEntry) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO contract.dispatch_logs
                (id, contract_id, recipient, subject, success, error_message, artifact_link, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.id)
        .bind(entry.contract_id)
        .bind(&entry.recipient)
        .bind(&entry.subject)
        .bind(entry.success)
        .bind(&entry.error_message)
        .bind(&entry.artifact_link)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_recipient(&self, recipient: &str) -> anyhow::Result<Vec<DispatchLogEntry>> {
        let rows = sqlx::query_as::<_, DispatchLogRow>(&format!(
            "{SELECT_COLUMNS} WHERE lower(recipient) = lower($1) ORDER BY created_at DESC"
        ))
        .bind(recipient)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_recent(&self, limit: u32) -> anyhow::Result<Vec<DispatchLogEntry>> {
        let rows = sqlx::query_as::<_, DispatchLogRow>(&format!(
            "{SELECT_COLUMNS} ORDER BY created_at DESC LIMIT $1"
        ))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[derive(sqlx::FromRow)]
struct DispatchLogRow {
    id: Uuid,
    contract_id: Option<Uuid>,
    recipient: String,
    subject: String,
    success: bool,
    error_message: Option<String>,
    artifact_link: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<DispatchLogRow> for DispatchLogEntry {
    fn from(row: DispatchLogRow) -> Self {
        DispatchLogEntry {
            id: row.id,
            contract_id: row.contract_id,
            recipient: row.recipient,
            subject: row.subject,
            success: row.success,
            error_message: row.error_message,
            artifact_link: row.artifact_link,
            created_at: row.created_at,
        }
    }
}
