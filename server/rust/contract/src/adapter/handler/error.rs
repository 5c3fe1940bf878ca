use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::ErrorResponse;
use crate::domain::error::ContractEngineError;

/// ContractApiError は REST 層のエラー型。ドメインのエラーはここで HTTP ステータスとコードに対応付ける。
#[derive(Debug, thiserror::Error)]
pub enum ContractApiError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Engine(#[from] ContractEngineError),
}

impl From<anyhow::Error> for ContractApiError {
    fn from(e: anyhow::Error) -> Self {
        ContractApiError::Engine(ContractEngineError::Persistence(e))
    }
}

impl IntoResponse for ContractApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, code, details) = match &self {
            ContractApiError::Validation(_) => (
                StatusCode::BAD_REQUEST,
                "SYS_CONTRACT_VALIDATION_ERROR",
                vec![],
            ),
            ContractApiError::Engine(e) => match e {
                ContractEngineError::TemplateMissing => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "SYS_CONTRACT_TEMPLATE_MISSING",
                    vec![],
                ),
                ContractEngineError::NotFound { .. } => {
                    (StatusCode::NOT_FOUND, "SYS_CONTRACT_NOT_FOUND", vec![])
                }
                ContractEngineError::OutOfOrder { .. } => {
                    (StatusCode::CONFLICT, "SYS_CONTRACT_OUT_OF_ORDER", vec![])
                }
                ContractEngineError::NoRecipients => (
                    StatusCode::BAD_REQUEST,
                    "SYS_CONTRACT_NO_RECIPIENTS",
                    vec![],
                ),
                ContractEngineError::ArtifactMissing(_) => (
                    StatusCode::CONFLICT,
                    "SYS_CONTRACT_ARTIFACT_MISSING",
                    vec![],
                ),
                ContractEngineError::NotificationFailure { result, .. } => (
                    StatusCode::BAD_GATEWAY,
                    "SYS_CONTRACT_NOTIFICATION_FAILED",
                    result
                        .outcomes
                        .iter()
                        .filter(|o| !o.success)
                        .map(|o| {
                            format!(
                                "{}: {}",
                                o.recipient,
                                o.error_message.as_deref().unwrap_or("unknown error")
                            )
                        })
                        .collect(),
                ),
                ContractEngineError::Timeout(_) => (
                    StatusCode::GATEWAY_TIMEOUT,
                    "SYS_CONTRACT_TIMEOUT",
                    vec![],
                ),
                ContractEngineError::Persistence(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SYS_CONTRACT_PERSISTENCE_ERROR",
                    vec![],
                ),
            },
        };

        if status.is_server_error() {
            tracing::error!(code, error = %message, "request failed");
        }
        let body = ErrorResponse::new(code, &message).with_details(details);
        (status, Json(body)).into_response()
    }
}
