use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::Url;

use crate::domain::service::{BlobStore, SignedLink};

type HmacSha256 = Hmac<Sha256>;

/// LocalBlobStore は成果物をローカルディスクに保存し、署名付きの公開 URL を発行する。
/// 公開 URL の配信（署名検証を含む）は前段のファイルサーバー側で verify と同じ規則で行う。
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: Url,
    signing_secret: SecretString,
}

impl LocalBlobStore {
    pub fn new(
        root: impl Into<PathBuf>,
        public_base_url: &str,
        signing_secret: SecretString,
    ) -> anyhow::Result<Self> {
        let public_base_url = Url::parse(public_base_url)
            .map_err(|e| anyhow::anyhow!("invalid public_base_url {}: {}", public_base_url, e))?;
        if public_base_url.cannot_be_a_base() {
            anyhow::bail!("public_base_url cannot be a base: {}", public_base_url);
        }
        Ok(Self {
            root: root.into(),
            public_base_url,
            signing_secret,
        })
    }

    /// ストレージ参照をルート配下のパスに変換する。ルート外を指す参照は拒否する。
    fn resolve(&self, storage_ref: &str) -> anyhow::Result<PathBuf> {
        let relative = Path::new(storage_ref);
        let is_plain = !storage_ref.is_empty()
            && relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if !is_plain {
            anyhow::bail!("invalid storage reference: {}", storage_ref);
        }
        Ok(self.root.join(relative))
    }

    /// 署名対象は `{storage_ref}\n{expires}`。鍵は署名用シークレット。
    fn mac(&self, storage_ref: &str, expires: i64) -> anyhow::Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.expose_secret().as_bytes())
            .map_err(|e| anyhow::anyhow!("invalid signing secret: {}", e))?;
        mac.update(storage_ref.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }

    fn signature(&self, storage_ref: &str, expires: i64) -> anyhow::Result<String> {
        let mac = self.mac(storage_ref, expires)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// 署名付き URL のクエリを検証する。期限切れ・署名不一致はいずれも false。
    /// 署名の比較は定数時間で行う。
    pub fn verify(&self, storage_ref: &str, expires: i64, signature: &str, now: DateTime<Utc>) -> bool {
        if expires < now.timestamp() {
            return false;
        }
        let Ok(provided) = hex::decode(signature) else {
            return false;
        };
        self.mac(storage_ref, expires)
            .is_ok_and(|mac| mac.verify_slice(&provided).is_ok())
    }

    fn link(&self, storage_ref: &str, expires_at: DateTime<Utc>) -> anyhow::Result<Url> {
        let expires = expires_at.timestamp();
        let mut url = self.public_base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow::anyhow!("public_base_url cannot be a base"))?
            .pop_if_empty()
            .extend(storage_ref.split('/'));
        url.query_pairs_mut()
            .append_pair("expires", &expires.to_string())
            .append_pair("signature", &self.signature(storage_ref, expires)?);
        Ok(url)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, key: &str, bytes: &[u8], content_type: &str) -> anyhow::Result<String> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        tracing::debug!(
            storage_ref = %key,
            content_type = %content_type,
            bytes = bytes.len(),
            "artifact written to local storage"
        );
        Ok(key.to_string())
    }

    async fn get(&self, storage_ref: &str) -> anyhow::Result<Option<Vec<u8>>> {
        let path = self.resolve(storage_ref)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn signed_url(
        &self,
        storage_ref: &str,
        ttl: chrono::Duration,
    ) -> anyhow::Result<SignedLink> {
        self.resolve(storage_ref)?;
        // URL に載るのは秒単位なので、比較対象の期限も秒で切り捨てる
        let expires_at = DateTime::from_timestamp((Utc::now() + ttl).timestamp(), 0)
            .ok_or_else(|| anyhow::anyhow!("link expiry out of range"))?;
        let url = self.link(storage_ref, expires_at)?;
        Ok(SignedLink {
            url: url.to_string(),
            expires_at,
        })
    }
}
