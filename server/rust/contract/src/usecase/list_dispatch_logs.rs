use std::sync::Arc;

use crate::domain::entity::DispatchLogEntry;
use crate::domain::repository::DispatchLogRepository;

pub const DEFAULT_LOG_LIMIT: u32 = 50;
pub const MAX_LOG_LIMIT: u32 = 500;

#[derive(Debug, Clone, Default)]
pub struct ListDispatchLogsInput {
    pub recipient: Option<String>,
    pub limit: Option<u32>,
}

/// ListDispatchLogsUseCase は配信監査ログを新しい順に返す。宛先で絞り込める。
pub struct ListDispatchLogsUseCase {
    log_repo: Arc<dyn DispatchLogRepository>,
}

impl ListDispatchLogsUseCase {
    pub fn new(log_repo: Arc<dyn DispatchLogRepository>) -> Self {
        Self { log_repo }
    }

    pub async fn execute(
        &self,
        input: ListDispatchLogsInput,
    ) -> anyhow::Result<Vec<DispatchLogEntry>> {
        let limit = input
            .limit
            .unwrap_or(DEFAULT_LOG_LIMIT)
            .clamp(1, MAX_LOG_LIMIT);

        match input.recipient.as_deref().map(str::trim) {
            Some(recipient) if !recipient.is_empty() => {
                let mut entries = self.log_repo.find_by_recipient(recipient).await?;
                entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                entries.truncate(limit as usize);
                Ok(entries)
            }
            _ => self.log_repo.list_recent(limit).await,
        }
    }
}
