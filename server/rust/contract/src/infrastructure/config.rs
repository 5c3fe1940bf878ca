use secrecy::SecretString;
use serde::Deserialize;

use crate::domain::document::PageGeometry;
use crate::domain::entity::{DispatchPolicy, TransitionPolicy};
use crate::infrastructure::database::DatabaseConfig;
use crate::usecase::dispatch_document::{DispatchSettings, DEFAULT_LINK_TTL_DAYS};
use crate::usecase::DocumentProfile;

/// Config はアプリケーション全体の設定。
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
    #[serde(default)]
    pub images: ImageFetchConfig,
    #[serde(default)]
    pub document: DocumentConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
}

/// AppConfig はアプリケーション設定。
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default = "default_environment")]
    pub environment: String,
}

fn default_version() -> String {
    "0.1.0".to_string()
}

fn default_environment() -> String {
    "dev".to_string()
}

/// ServerConfig はサーバー設定。
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// TelemetryConfig はログ出力の設定。format は "text" か "json"。
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

/// StorageConfig は成果物の保存先と署名付きリンクの設定。
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_root_dir")]
    pub root_dir: String,
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
    #[serde(default = "default_signing_secret")]
    pub signing_secret: SecretString,
    #[serde(default = "default_link_ttl_days")]
    pub link_ttl_days: i64,
}

fn default_root_dir() -> String {
    "data/artifacts".to_string()
}

fn default_public_base_url() -> String {
    "http://localhost:8080/artifacts".to_string()
}

fn default_signing_secret() -> SecretString {
    SecretString::new(String::new())
}

fn default_link_ttl_days() -> i64 {
    DEFAULT_LINK_TTL_DAYS
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: default_root_dir(),
            public_base_url: default_public_base_url(),
            signing_secret: default_signing_secret(),
            link_ttl_days: default_link_ttl_days(),
        }
    }
}

/// SmtpConfig はメール送信の設定。未設定の場合はログ出力のみの通知に切り替わる。
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default = "default_signing_secret")]
    pub password: SecretString,
    pub from_address: String,
}

fn default_smtp_port() -> u16 {
    587
}

/// ImageFetchConfig はパスポート画像取得の制限。
#[derive(Debug, Clone, Deserialize)]
pub struct ImageFetchConfig {
    #[serde(default = "default_image_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_image_max_bytes")]
    pub max_bytes: usize,
}

fn default_image_timeout_secs() -> u64 {
    10
}

fn default_image_max_bytes() -> usize {
    5 * 1024 * 1024
}

impl Default for ImageFetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_image_timeout_secs(),
            max_bytes: default_image_max_bytes(),
        }
    }
}

/// DocumentConfig は契約書の固定要素（用紙・ヘッダー・透かし・署名欄）の設定。
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentConfig {
    #[serde(default = "PageGeometry::a4")]
    pub page: PageGeometry,
    #[serde(default)]
    pub header_title: Option<String>,
    #[serde(default)]
    pub watermark_text: Option<String>,
    #[serde(default)]
    pub partner_label: Option<String>,
    #[serde(default)]
    pub counterparty_label: Option<String>,
    #[serde(default)]
    pub counterparty_name: Option<String>,
    #[serde(default)]
    pub counterparty_identifiers: Vec<String>,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            page: PageGeometry::a4(),
            header_title: None,
            watermark_text: None,
            partner_label: None,
            counterparty_label: None,
            counterparty_name: None,
            counterparty_identifiers: Vec::new(),
        }
    }
}

impl DocumentConfig {
    /// 未指定の項目は DocumentProfile の既定値を使う。
    pub fn to_profile(&self) -> DocumentProfile {
        let defaults = DocumentProfile::default();
        DocumentProfile {
            geometry: self.page,
            header_title: self.header_title.clone().unwrap_or(defaults.header_title),
            watermark_text: self
                .watermark_text
                .clone()
                .unwrap_or(defaults.watermark_text),
            partner_label: self.partner_label.clone().unwrap_or(defaults.partner_label),
            counterparty_label: self
                .counterparty_label
                .clone()
                .unwrap_or(defaults.counterparty_label),
            counterparty_name: self
                .counterparty_name
                .clone()
                .unwrap_or(defaults.counterparty_name),
            counterparty_identifiers: self.counterparty_identifiers.clone(),
        }
    }
}

/// LifecycleConfig は証跡の記録順序ポリシー。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LifecycleConfig {
    #[serde(default)]
    pub policy: TransitionPolicy,
}

/// DispatchConfig は配信の件名・成否判定・パイプライン全体のタイムアウト。
#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_subject")]
    pub subject: String,
    #[serde(default)]
    pub policy: DispatchPolicy,
    /// 0 はタイムアウトなし
    #[serde(default = "default_pipeline_timeout_secs")]
    pub pipeline_timeout_secs: u64,
}

fn default_subject() -> String {
    "Contrato NCNDA".to_string()
}

fn default_pipeline_timeout_secs() -> u64 {
    120
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            subject: default_subject(),
            policy: DispatchPolicy::default(),
            pipeline_timeout_secs: default_pipeline_timeout_secs(),
        }
    }
}

impl DispatchConfig {
    pub fn to_settings(&self, link_ttl_days: i64) -> DispatchSettings {
        DispatchSettings {
            subject: self.subject.clone(),
            policy: self.policy,
            link_ttl: chrono::Duration::days(link_ttl_days),
        }
    }

    pub fn pipeline_timeout(&self) -> Option<std::time::Duration> {
        (self.pipeline_timeout_secs > 0)
            .then(|| std::time::Duration::from_secs(self.pipeline_timeout_secs))
    }
}

impl Config {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file {}: {}", path, e))?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file: {}", e))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_config_deserialization() {
        let yaml = r#"
app:
  name: "agro-contract-server"
  version: "0.1.0"
  environment: "dev"
server:
  host: "0.0.0.0"
  port: 8080
telemetry:
  level: "debug"
  format: "text"
storage:
  root_dir: "/var/lib/contracts"
  public_base_url: "https://files.example.com/contracts"
  signing_secret: "s3cr3t"
  link_ttl_days: 3
smtp:
  host: "smtp.example.com"
  username: "mailer"
  password: "hunter2"
  from_address: "contratos@example.com"
lifecycle:
  policy: ordered
dispatch:
  subject: "NCNDA para assinatura"
  policy: allow_partial
  pipeline_timeout_secs: 0
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.app.name, "agro-contract-server");
        assert_eq!(config.telemetry.format, "text");
        assert_eq!(config.storage.signing_secret.expose_secret(), "s3cr3t");
        assert_eq!(config.storage.link_ttl_days, 3);
        let smtp = config.smtp.unwrap();
        assert_eq!(smtp.port, 587);
        assert_eq!(smtp.password.expose_secret(), "hunter2");
        assert_eq!(config.lifecycle.policy, TransitionPolicy::Ordered);
        assert_eq!(config.dispatch.policy, DispatchPolicy::AllowPartial);
        assert!(config.dispatch.pipeline_timeout().is_none());
    }

    #[test]
    fn test_config_defaults() {
        let yaml = r#"
app:
  name: "agro-contract-server"
server: {}
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.app.version, "0.1.0");
        assert_eq!(config.app.environment, "dev");
        assert_eq!(config.server.port, 8080);
        assert!(config.database.is_none());
        assert!(config.smtp.is_none());
        assert_eq!(config.telemetry.level, "info");
        assert_eq!(config.storage.link_ttl_days, 7);
        assert_eq!(config.lifecycle.policy, TransitionPolicy::Permissive);
        assert_eq!(config.dispatch.policy, DispatchPolicy::AllOrNothing);
        assert_eq!(
            config.dispatch.pipeline_timeout(),
            Some(std::time::Duration::from_secs(120))
        );
        assert_eq!(config.document.to_profile(), DocumentProfile::default());
    }

    #[test]
    fn test_document_config_overrides_profile() {
        let yaml = r#"
watermark_text: "RASCUNHO"
counterparty_name: "Agro Trading Ltda"
counterparty_identifiers:
  - "CNPJ: 12.345.678/0001-90"
"#;
        let document: DocumentConfig = serde_yaml::from_str(yaml).unwrap();
        let profile = document.to_profile();
        assert_eq!(profile.watermark_text, "RASCUNHO");
        assert_eq!(profile.counterparty_name, "Agro Trading Ltda");
        assert_eq!(profile.counterparty_label, "AGRO");
        assert_eq!(profile.counterparty_identifiers.len(), 1);
        assert_eq!(profile.geometry, PageGeometry::a4());
    }

    #[test]
    fn test_dispatch_settings_from_config() {
        let settings = DispatchConfig::default().to_settings(7);
        assert_eq!(settings, DispatchSettings::default());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(Config::load("/nonexistent/config.yaml").is_err());
    }
}
