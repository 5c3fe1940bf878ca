use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum ImageFetchError {
    #[error("asset unavailable: {url}: {reason}")]
    AssetUnavailable { url: String, reason: String },
}

impl ImageFetchError {
    pub fn unavailable(url: &str, reason: impl Into<String>) -> Self {
        Self::AssetUnavailable {
            url: url.to_string(),
            reason: reason.into(),
        }
    }
}

/// ImageFetcher は URL から画像バイト列を取得する。ネットワーク I/O はレンダラーからのみ行う。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageFetchError>;
}
