use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::entity::DispatchLogEntry;
use crate::domain::repository::DispatchLogRepository;

/// InMemoryDispatchLogRepository は追記のみのインメモリ監査ログ。
pub struct InMemoryDispatchLogRepository {
    entries: RwLock<Vec<DispatchLogEntry>>,
}

impl InMemoryDispatchLogRepository {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// 追記順の全件。
    pub async fn all(&self) -> Vec<DispatchLogEntry> {
        self.entries.read().await.clone()
    }
}

impl Default for InMemoryDispatchLogRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DispatchLogRepository for InMemoryDispatchLogRepository {
    async fn append(&self, entry: &DispatchLogEntry) -> anyhow::Result<()> {
        self.entries.write().await.push(entry.clone());
        Ok(())
    }

    async fn find_by_recipient(&self, recipient: &str) -> anyhow::Result<Vec<DispatchLogEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .rev()
            .filter(|e| e.recipient.eq_ignore_ascii_case(recipient))
            .cloned()
            .collect())
    }

    async fn list_recent(&self, limit: u32) -> anyhow::Result<Vec<DispatchLogEntry>> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_recent_newest_first() {
        let repo = InMemoryDispatchLogRepository::new();
        for r in ["a@example.com", "b@example.com", "c@example.com"] {
            repo.append(&DispatchLogEntry::succeeded(None, r, "s", None))
                .await
                .unwrap();
        }
        let recent = repo.list_recent(2).await.unwrap();
        let recipients: Vec<_> = recent.iter().map(|e| e.recipient.as_str()).collect();
        assert_eq!(recipients, vec!["c@example.com", "b@example.com"]);
    }

    #[tokio::test]
    async fn test_find_by_recipient_is_case_insensitive() {
        let repo = InMemoryDispatchLogRepository::new();
        repo.append(&DispatchLogEntry::failed(None, "A@Example.com", "s", None, "x"))
            .await
            .unwrap();
        assert_eq!(repo.find_by_recipient("a@example.com").await.unwrap().len(), 1);
    }
}
