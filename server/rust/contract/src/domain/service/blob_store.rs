use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// SignedLink は有効期限付きで成果物を取得できる URL。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedLink {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// BlobStore は成果物（契約書 PDF）の保存先。転送プロトコルは実装側に委ねる。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// key に bytes を保存し、以後の取得に使うストレージ参照を返す。
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> anyhow::Result<String>;
    async fn get(&self, storage_ref: &str) -> anyhow::Result<Option<Vec<u8>>>;
    async fn signed_url(
        &self,
        storage_ref: &str,
        ttl: chrono::Duration,
    ) -> anyhow::Result<SignedLink>;
}
