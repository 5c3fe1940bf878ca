pub mod contract_handler;
pub mod error;
pub mod template_handler;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::usecase::{
    ActivateTemplateUseCase, ContractLifecycleUseCase, CreateTemplateUseCase,
    GenerateDocumentUseCase, ListDispatchLogsUseCase, ListTemplatesUseCase,
    RenderAndDispatchUseCase, RenderDocumentUseCase, ResendDocumentUseCase,
};

/// AppState はアプリケーション全体の共有状態を表す。
#[derive(Clone)]
pub struct AppState {
    pub generate_document_uc: Arc<GenerateDocumentUseCase>,
    pub render_document_uc: Arc<RenderDocumentUseCase>,
    pub lifecycle_uc: Arc<ContractLifecycleUseCase>,
    pub render_and_dispatch_uc: Arc<RenderAndDispatchUseCase>,
    pub resend_document_uc: Arc<ResendDocumentUseCase>,
    pub create_template_uc: Arc<CreateTemplateUseCase>,
    pub activate_template_uc: Arc<ActivateTemplateUseCase>,
    pub list_templates_uc: Arc<ListTemplatesUseCase>,
    pub list_dispatch_logs_uc: Arc<ListDispatchLogsUseCase>,
}

/// REST API ルーターを構築する。
pub fn router(state: AppState) -> Router {
    Router::new()
        // Health / Readiness
        .route("/healthz", get(contract_handler::healthz))
        .route("/readyz", get(contract_handler::readyz))
        // Document endpoints
        .route(
            "/api/v1/parties/{party_id}/document",
            get(contract_handler::preview_document),
        )
        .route(
            "/api/v1/parties/{party_id}/document.pdf",
            get(contract_handler::download_document),
        )
        .route(
            "/api/v1/parties/{party_id}/contract",
            post(contract_handler::ensure_contract),
        )
        // Contract lifecycle endpoints
        .route(
            "/api/v1/contracts/{contract_id}",
            get(contract_handler::get_contract),
        )
        .route(
            "/api/v1/contracts/{contract_id}/acceptance",
            post(contract_handler::accept_contract),
        )
        .route(
            "/api/v1/contracts/{contract_id}/signature-validation",
            post(contract_handler::validate_signature),
        )
        .route(
            "/api/v1/contracts/{contract_id}/admin-validation",
            post(contract_handler::validate_by_admin),
        )
        // Dispatch endpoints
        .route(
            "/api/v1/contracts/{contract_id}/dispatch",
            post(contract_handler::dispatch_contract),
        )
        .route(
            "/api/v1/contracts/{contract_id}/resend",
            post(contract_handler::resend_contract),
        )
        .route(
            "/api/v1/dispatch-logs",
            get(contract_handler::list_dispatch_logs),
        )
        // Template endpoints
        .route(
            "/api/v1/templates",
            post(template_handler::create_template).get(template_handler::list_templates),
        )
        .route(
            "/api/v1/templates/{template_id}/activate",
            post(template_handler::activate_template),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// ErrorResponse は統一エラーレスポンス。
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, serde::Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub request_id: String,
    pub details: Vec<String>,
}

impl ErrorResponse {
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            error: ErrorBody {
                code: code.to_string(),
                message: message.to_string(),
                request_id: uuid::Uuid::new_v4().to_string(),
                details: vec![],
            },
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.error.details = details;
        self
    }
}
