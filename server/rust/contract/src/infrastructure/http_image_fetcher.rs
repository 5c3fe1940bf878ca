use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use crate::domain::service::{ImageFetchError, ImageFetcher};
use crate::infrastructure::config::ImageFetchConfig;

/// HttpImageFetcher は http/https の URL からパスポート画像を取得する。
pub struct HttpImageFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpImageFetcher {
    pub fn new(config: &ImageFetchConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            max_bytes: config.max_bytes,
        })
    }
}

/// 取得対象として許可する URL か検査する。
fn parse_source(url: &str) -> Result<Url, ImageFetchError> {
    let parsed = Url::parse(url).map_err(|e| ImageFetchError::unavailable(url, e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ImageFetchError::unavailable(
            url,
            format!("unsupported scheme: {other}"),
        )),
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageFetchError> {
        let source = parse_source(url)?;
        let response = self
            .client
            .get(source)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ImageFetchError::unavailable(url, e.to_string()))?;

        if let Some(length) = response.content_length() {
            if length > self.max_bytes as u64 {
                return Err(ImageFetchError::unavailable(
                    url,
                    format!("image too large: {length} bytes"),
                ));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ImageFetchError::unavailable(url, e.to_string()))?;
        if bytes.len() > self.max_bytes {
            return Err(ImageFetchError::unavailable(
                url,
                format!("image too large: {} bytes", bytes.len()),
            ));
        }
        Ok(bytes.to_vec())
    }
}
