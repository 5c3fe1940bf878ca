use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ContractApiError;
use super::AppState;
use crate::domain::entity::ContractTemplate;
use crate::usecase::CreateTemplateInput;

#[derive(Debug, Deserialize)]
pub struct CreateTemplateRequest {
    pub name: String,
    pub body: String,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct ListTemplatesResponse {
    pub templates: Vec<ContractTemplate>,
}

pub async fn create_template(
    State(state): State<AppState>,
    Json(req): Json<CreateTemplateRequest>,
) -> Result<(StatusCode, Json<ContractTemplate>), ContractApiError> {
    if req.name.trim().is_empty() {
        return Err(ContractApiError::Validation("name is required".to_string()));
    }
    if req.body.trim().is_empty() {
        return Err(ContractApiError::Validation("body is required".to_string()));
    }

    let template = state
        .create_template_uc
        .execute(CreateTemplateInput {
            name: req.name,
            body: req.body,
            active: req.active,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(template)))
}

pub async fn list_templates(
    State(state): State<AppState>,
) -> Result<Json<ListTemplatesResponse>, ContractApiError> {
    let templates = state.list_templates_uc.execute().await?;
    Ok(Json(ListTemplatesResponse { templates }))
}

pub async fn activate_template(
    State(state): State<AppState>,
    Path(template_id): Path<Uuid>,
) -> Result<Json<ContractTemplate>, ContractApiError> {
    let template = state.activate_template_uc.execute(&template_id).await?;
    Ok(Json(template))
}
