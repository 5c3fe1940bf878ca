//! テスト用インメモリ実装とヘルパー。
//! 統合テスト（tests/）とユニットテストから利用する。

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::adapter::handler::AppState;
use crate::adapter::repository::contract_in_memory::InMemoryContractRepository;
use crate::adapter::repository::dispatch_log_in_memory::InMemoryDispatchLogRepository;
use crate::adapter::repository::party_in_memory::InMemoryPartyRepository;
use crate::adapter::repository::template_in_memory::InMemoryTemplateRepository;
use crate::domain::document::PdfRenderer;
use crate::domain::entity::{ContractTemplate, Party, TransitionPolicy};
use crate::domain::repository::{PartyRepository, TemplateRepository};
use crate::domain::service::{
    BlobStore, ImageFetchError, ImageFetcher, Notifier, NotifierError, OutgoingMessage,
    SignedLink,
};
use crate::usecase::{
    ActivateTemplateUseCase, ContractLifecycleUseCase, CreateTemplateUseCase,
    DispatchDocumentUseCase, DispatchSettings, DocumentProfile, GenerateDocumentUseCase,
    ListDispatchLogsUseCase, ListTemplatesUseCase, RenderAndDispatchUseCase,
    RenderDocumentUseCase, ResendDocumentUseCase,
};

/// SOF0 だけを持つ最小の JPEG 風バイト列。レンダラーが寸法を読み取れる。
pub fn sample_jpeg(width: u16, height: u16, components: u8) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8];
    bytes.extend_from_slice(&[0xFF, 0xE0, 0x00, 0x04, 0x4A, 0x46]);
    let len: u16 = 8 + 3 * u16::from(components);
    bytes.extend_from_slice(&[0xFF, 0xC0]);
    bytes.extend_from_slice(&len.to_be_bytes());
    bytes.push(8);
    bytes.extend_from_slice(&height.to_be_bytes());
    bytes.extend_from_slice(&width.to_be_bytes());
    bytes.push(components);
    for c in 0..components {
        bytes.extend_from_slice(&[c + 1, 0x11, 0x00]);
    }
    bytes.extend_from_slice(&[0xFF, 0xD9]);
    bytes
}

// ---------------------------------------------------------------------------
// InMemoryBlobStore
// ---------------------------------------------------------------------------

/// テスト用インメモリ BlobStore 実装。
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.blobs.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn remove(&self, storage_ref: &str) {
        self.blobs.write().await.remove(storage_ref);
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(&self, key: &str, bytes: &[u8], _content_type: &str) -> anyhow::Result<String> {
        self.blobs
            .write()
            .await
            .insert(key.to_string(), bytes.to_vec());
        Ok(key.to_string())
    }

    async fn get(&self, storage_ref: &str) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().await.get(storage_ref).cloned())
    }

    async fn signed_url(
        &self,
        storage_ref: &str,
        ttl: chrono::Duration,
    ) -> anyhow::Result<SignedLink> {
        let expires_at = Utc::now() + ttl;
        Ok(SignedLink {
            url: format!("memory://{}?expires={}", storage_ref, expires_at.timestamp()),
            expires_at,
        })
    }
}

// ---------------------------------------------------------------------------
// FakeNotifier
// ---------------------------------------------------------------------------

/// テスト用 Notifier。指定した宛先への送信だけ失敗させ、成功した送信を記録する。
#[derive(Default)]
pub struct FakeNotifier {
    failing: HashSet<String>,
    delay: Option<Duration>,
    sent: RwLock<Vec<OutgoingMessage>>,
}

impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_for(mut self, recipient: &str) -> Self {
        self.failing.insert(recipient.to_lowercase());
        self
    }

    /// 送信ごとに待ち時間を入れる（タイムアウトの検証用）。
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub async fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Notifier for FakeNotifier {
    async fn send(&self, message: &OutgoingMessage) -> Result<(), NotifierError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.contains(&message.recipient.to_lowercase()) {
            return Err(NotifierError::Rejected(format!(
                "mailbox unavailable: {}",
                message.recipient
            )));
        }
        self.sent.write().await.push(message.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeImageFetcher
// ---------------------------------------------------------------------------

/// テスト用 ImageFetcher。登録されていない URL は取得失敗になる。
#[derive(Default)]
pub struct FakeImageFetcher {
    images: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

impl FakeImageFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.images.insert(url.to_string(), bytes);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageFetcher for FakeImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, ImageFetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| ImageFetchError::unavailable(url, "404 Not Found"))
    }
}

// ---------------------------------------------------------------------------
// TestContext
// ---------------------------------------------------------------------------

/// 統合テスト用の依存一式。フィールドを差し替えてから app_state / 各ユースケースを組み立てる。
pub struct TestContext {
    pub templates: Arc<InMemoryTemplateRepository>,
    pub parties: Arc<InMemoryPartyRepository>,
    pub contracts: Arc<InMemoryContractRepository>,
    pub logs: Arc<InMemoryDispatchLogRepository>,
    pub blob_store: Arc<InMemoryBlobStore>,
    pub notifier: Arc<FakeNotifier>,
    pub fetcher: Arc<FakeImageFetcher>,
    pub profile: DocumentProfile,
    pub policy: TransitionPolicy,
    pub dispatch_settings: DispatchSettings,
    pub pipeline_timeout: Option<Duration>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            templates: Arc::new(InMemoryTemplateRepository::new()),
            parties: Arc::new(InMemoryPartyRepository::new()),
            contracts: Arc::new(InMemoryContractRepository::new()),
            logs: Arc::new(InMemoryDispatchLogRepository::new()),
            blob_store: Arc::new(InMemoryBlobStore::new()),
            notifier: Arc::new(FakeNotifier::new()),
            fetcher: Arc::new(FakeImageFetcher::new()),
            profile: DocumentProfile::default(),
            policy: TransitionPolicy::Permissive,
            dispatch_settings: DispatchSettings::default(),
            pipeline_timeout: None,
        }
    }

    pub fn with_notifier(mut self, notifier: FakeNotifier) -> Self {
        self.notifier = Arc::new(notifier);
        self
    }

    pub fn with_fetcher(mut self, fetcher: FakeImageFetcher) -> Self {
        self.fetcher = Arc::new(fetcher);
        self
    }

    pub async fn seed_template(&self, name: &str, body: &str) -> anyhow::Result<ContractTemplate> {
        let template = ContractTemplate::new(name, body, true);
        self.templates.create(&template).await?;
        Ok(template)
    }

    pub async fn seed_party(&self, party: Party) -> anyhow::Result<Party> {
        self.parties.create(&party).await?;
        Ok(party)
    }

    pub fn generate_document_uc(&self) -> Arc<GenerateDocumentUseCase> {
        Arc::new(GenerateDocumentUseCase::new(
            self.templates.clone(),
            self.parties.clone(),
        ))
    }

    pub fn render_document_uc(&self) -> Arc<RenderDocumentUseCase> {
        Arc::new(RenderDocumentUseCase::new(
            self.generate_document_uc(),
            Arc::new(PdfRenderer::new(self.fetcher.clone())),
            self.profile.clone(),
        ))
    }

    pub fn dispatch_document_uc(&self) -> Arc<DispatchDocumentUseCase> {
        Arc::new(DispatchDocumentUseCase::new(
            self.contracts.clone(),
            self.logs.clone(),
            self.blob_store.clone(),
            self.notifier.clone(),
            self.dispatch_settings.clone(),
        ))
    }

    pub fn lifecycle_uc(&self) -> Arc<ContractLifecycleUseCase> {
        Arc::new(ContractLifecycleUseCase::new(
            self.contracts.clone(),
            self.parties.clone(),
            self.policy,
        ))
    }

    pub fn render_and_dispatch_uc(&self) -> Arc<RenderAndDispatchUseCase> {
        Arc::new(RenderAndDispatchUseCase::new(
            self.contracts.clone(),
            self.parties.clone(),
            self.render_document_uc(),
            self.dispatch_document_uc(),
            self.pipeline_timeout,
        ))
    }

    pub fn resend_document_uc(&self) -> Arc<ResendDocumentUseCase> {
        Arc::new(ResendDocumentUseCase::new(
            self.contracts.clone(),
            self.parties.clone(),
            self.blob_store.clone(),
            self.dispatch_document_uc(),
        ))
    }

    pub fn app_state(&self) -> AppState {
        AppState {
            generate_document_uc: self.generate_document_uc(),
            render_document_uc: self.render_document_uc(),
            lifecycle_uc: self.lifecycle_uc(),
            render_and_dispatch_uc: self.render_and_dispatch_uc(),
            resend_document_uc: self.resend_document_uc(),
            create_template_uc: Arc::new(CreateTemplateUseCase::new(self.templates.clone())),
            activate_template_uc: Arc::new(ActivateTemplateUseCase::new(self.templates.clone())),
            list_templates_uc: Arc::new(ListTemplatesUseCase::new(self.templates.clone())),
            list_dispatch_logs_uc: Arc::new(ListDispatchLogsUseCase::new(self.logs.clone())),
        }
    }
}

/// テスト用 AppState を生成するヘルパー。
pub fn make_test_app_state(ctx: &TestContext) -> AppState {
    ctx.app_state()
}
