use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ContractApiError;
use super::AppState;
use crate::domain::document::PDF_CONTENT_TYPE;
use crate::domain::entity::{Contract, DispatchLogEntry, DispatchResult};
use crate::usecase::ListDispatchLogsInput;

// --- Request / Response DTOs ---

#[derive(Debug, Serialize)]
pub struct DocumentPreviewResponse {
    pub party_id: Uuid,
    pub template_id: Uuid,
    pub template_name: String,
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct AcceptContractRequest {
    pub accepted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ValidationRequest {
    pub validator: String,
    pub at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct DispatchRequest {
    pub recipients: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListDispatchLogsQuery {
    pub recipient: Option<String>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ListDispatchLogsResponse {
    pub entries: Vec<DispatchLogEntry>,
}

// --- Handlers ---

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn readyz() -> &'static str {
    "ok"
}

/// 置換済みの本文を返す（PDF 化はしない）。
pub async fn preview_document(
    State(state): State<AppState>,
    Path(party_id): Path<Uuid>,
) -> Result<Json<DocumentPreviewResponse>, ContractApiError> {
    let doc = state.generate_document_uc.execute(&party_id).await?;
    Ok(Json(DocumentPreviewResponse {
        party_id: doc.partner.id,
        template_id: doc.template_id,
        template_name: doc.template_name,
        text: doc.text,
    }))
}

pub async fn download_document(
    State(state): State<AppState>,
    Path(party_id): Path<Uuid>,
) -> Result<Response, ContractApiError> {
    let rendered = state.render_document_uc.execute(&party_id).await?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, PDF_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"ncnda_{party_id}.pdf\""),
            ),
        ],
        rendered.artifact.bytes,
    )
        .into_response())
}

pub async fn ensure_contract(
    State(state): State<AppState>,
    Path(party_id): Path<Uuid>,
) -> Result<Json<Contract>, ContractApiError> {
    let contract = state.lifecycle_uc.ensure_contract(&party_id).await?;
    Ok(Json(contract))
}

pub async fn get_contract(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
) -> Result<Json<Contract>, ContractApiError> {
    let contract = state.lifecycle_uc.get(&contract_id).await?;
    Ok(Json(contract))
}

pub async fn accept_contract(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
    body: Option<Json<AcceptContractRequest>>,
) -> Result<Json<Contract>, ContractApiError> {
    let req = body.map(|Json(r)| r).unwrap_or_default();
    let contract = state
        .lifecycle_uc
        .accept_by_partner(&contract_id, req.accepted_at.unwrap_or_else(Utc::now))
        .await?;
    Ok(Json(contract))
}

pub async fn validate_signature(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
    Json(req): Json<ValidationRequest>,
) -> Result<Json<Contract>, ContractApiError> {
    let validator = required_validator(&req)?;
    let contract = state
        .lifecycle_uc
        .validate_signature(&contract_id, validator, req.at.unwrap_or_else(Utc::now))
        .await?;
    Ok(Json(contract))
}

pub async fn validate_by_admin(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
    Json(req): Json<ValidationRequest>,
) -> Result<Json<Contract>, ContractApiError> {
    let validator = required_validator(&req)?;
    let contract = state
        .lifecycle_uc
        .validate_by_admin(&contract_id, validator, req.at.unwrap_or_else(Utc::now))
        .await?;
    Ok(Json(contract))
}

fn required_validator(req: &ValidationRequest) -> Result<&str, ContractApiError> {
    let validator = req.validator.trim();
    if validator.is_empty() {
        return Err(ContractApiError::Validation(
            "validator is required".to_string(),
        ));
    }
    Ok(validator)
}

pub async fn dispatch_contract(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
    Json(req): Json<DispatchRequest>,
) -> Result<Json<DispatchResult>, ContractApiError> {
    let result = state
        .render_and_dispatch_uc
        .execute(&contract_id, &req.recipients)
        .await?;
    Ok(Json(result))
}

pub async fn resend_contract(
    State(state): State<AppState>,
    Path(contract_id): Path<Uuid>,
    Json(req): Json<DispatchRequest>,
) -> Result<Json<DispatchResult>, ContractApiError> {
    let result = state
        .resend_document_uc
        .execute(&contract_id, &req.recipients)
        .await?;
    Ok(Json(result))
}

pub async fn list_dispatch_logs(
    State(state): State<AppState>,
    Query(query): Query<ListDispatchLogsQuery>,
) -> Result<Json<ListDispatchLogsResponse>, ContractApiError> {
    let entries = state
        .list_dispatch_logs_uc
        .execute(ListDispatchLogsInput {
            recipient: query.recipient,
            limit: query.limit,
        })
        .await?;
    Ok(Json(ListDispatchLogsResponse { entries }))
}
