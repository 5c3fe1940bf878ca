use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use agro_contract_server::adapter::handler::{self, AppState};
use agro_contract_server::adapter::repository::contract_in_memory::InMemoryContractRepository;
use agro_contract_server::adapter::repository::contract_postgres::ContractPostgresRepository;
use agro_contract_server::adapter::repository::dispatch_log_in_memory::InMemoryDispatchLogRepository;
use agro_contract_server::adapter::repository::dispatch_log_postgres::DispatchLogPostgresRepository;
use agro_contract_server::adapter::repository::party_in_memory::InMemoryPartyRepository;
use agro_contract_server::adapter::repository::party_postgres::PartyPostgresRepository;
use agro_contract_server::adapter::repository::template_in_memory::InMemoryTemplateRepository;
use agro_contract_server::adapter::repository::template_postgres::TemplatePostgresRepository;
use agro_contract_server::domain::document::PdfRenderer;
use agro_contract_server::domain::repository::{
    ContractRepository, DispatchLogRepository, PartyRepository, TemplateRepository,
};
use agro_contract_server::domain::service::{BlobStore, ImageFetcher, Notifier};
use agro_contract_server::infrastructure::config::Config;
use agro_contract_server::infrastructure::database;
use agro_contract_server::infrastructure::email_notifier::EmailNotifier;
use agro_contract_server::infrastructure::http_image_fetcher::HttpImageFetcher;
use agro_contract_server::infrastructure::local_blob_store::LocalBlobStore;
use agro_contract_server::infrastructure::logging_notifier::LoggingNotifier;
use agro_contract_server::infrastructure::telemetry::init_telemetry;
use agro_contract_server::usecase;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Config
    let config_path =
        std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/config.yaml".to_string());
    let cfg = Config::load(&config_path)?;

    // Telemetry
    init_telemetry(&cfg.telemetry);

    info!(
        app_name = %cfg.app.name,
        version = %cfg.app.version,
        environment = %cfg.app.environment,
        "starting contract server"
    );

    // Database pool (optional)
    let db_pool = if let Some(ref db_config) = cfg.database {
        info!("connecting to database");
        let pool = database::connect(db_config).await?;
        info!("database connection pool established");
        Some(pool)
    } else if let Ok(url) = std::env::var("DATABASE_URL") {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(25)
            .connect(&url)
            .await?;
        info!("database connection pool established from DATABASE_URL");
        Some(pool)
    } else {
        info!("no database configured, using in-memory repositories");
        None
    };

    // Repositories
    let (template_repo, party_repo, contract_repo, log_repo): (
        Arc<dyn TemplateRepository>,
        Arc<dyn PartyRepository>,
        Arc<dyn ContractRepository>,
        Arc<dyn DispatchLogRepository>,
    ) = if let Some(ref pool) = db_pool {
        (
            Arc::new(TemplatePostgresRepository::new(pool.clone())),
            Arc::new(PartyPostgresRepository::new(pool.clone())),
            Arc::new(ContractPostgresRepository::new(pool.clone())),
            Arc::new(DispatchLogPostgresRepository::new(pool.clone())),
        )
    } else {
        (
            Arc::new(InMemoryTemplateRepository::new()),
            Arc::new(InMemoryPartyRepository::new()),
            Arc::new(InMemoryContractRepository::new()),
            Arc::new(InMemoryDispatchLogRepository::new()),
        )
    };

    // Collaborators
    let blob_store: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(
        &cfg.storage.root_dir,
        &cfg.storage.public_base_url,
        cfg.storage.signing_secret.clone(),
    )?);
    info!(root_dir = %cfg.storage.root_dir, "local artifact storage configured");

    let notifier: Arc<dyn Notifier> = if let Some(ref smtp) = cfg.smtp {
        let client = EmailNotifier::new(smtp)?;
        info!(host = %smtp.host, port = smtp.port, "smtp notifier initialized");
        Arc::new(client)
    } else {
        tracing::warn!("no smtp configured, notifications will only be logged");
        Arc::new(LoggingNotifier::new())
    };

    let image_fetcher: Arc<dyn ImageFetcher> = Arc::new(HttpImageFetcher::new(&cfg.images)?);

    // Use cases
    let generate_document_uc = Arc::new(usecase::GenerateDocumentUseCase::new(
        template_repo.clone(),
        party_repo.clone(),
    ));
    let render_document_uc = Arc::new(usecase::RenderDocumentUseCase::new(
        generate_document_uc.clone(),
        Arc::new(PdfRenderer::new(image_fetcher)),
        cfg.document.to_profile(),
    ));
    let lifecycle_uc = Arc::new(usecase::ContractLifecycleUseCase::new(
        contract_repo.clone(),
        party_repo.clone(),
        cfg.lifecycle.policy,
    ));
    let dispatch_document_uc = Arc::new(usecase::DispatchDocumentUseCase::new(
        contract_repo.clone(),
        log_repo.clone(),
        blob_store.clone(),
        notifier,
        cfg.dispatch.to_settings(cfg.storage.link_ttl_days),
    ));
    let render_and_dispatch_uc = Arc::new(usecase::RenderAndDispatchUseCase::new(
        contract_repo.clone(),
        party_repo.clone(),
        render_document_uc.clone(),
        dispatch_document_uc.clone(),
        cfg.dispatch.pipeline_timeout(),
    ));
    let resend_document_uc = Arc::new(usecase::ResendDocumentUseCase::new(
        contract_repo.clone(),
        party_repo.clone(),
        blob_store,
        dispatch_document_uc,
    ));
    let create_template_uc = Arc::new(usecase::CreateTemplateUseCase::new(template_repo.clone()));
    let activate_template_uc =
        Arc::new(usecase::ActivateTemplateUseCase::new(template_repo.clone()));
    let list_templates_uc = Arc::new(usecase::ListTemplatesUseCase::new(template_repo));
    let list_dispatch_logs_uc = Arc::new(usecase::ListDispatchLogsUseCase::new(log_repo));

    info!(
        lifecycle_policy = ?cfg.lifecycle.policy,
        dispatch_policy = ?cfg.dispatch.policy,
        "contract engine use cases initialized"
    );

    // AppState (REST handler用)
    let state = AppState {
        generate_document_uc,
        render_document_uc,
        lifecycle_uc,
        render_and_dispatch_uc,
        resend_document_uc,
        create_template_uc,
        activate_template_uc,
        list_templates_uc,
        list_dispatch_logs_uc,
    };

    let app = handler::router(state);

    // REST server
    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;
    info!("REST server starting on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
