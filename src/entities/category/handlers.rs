//! Category HTTP handlers

use super::model::{CategoryInput, CategoryUpdate};
use super::service::CategoryService;
use crate::core::error::{ApiError, parse_id};
use crate::core::response::{self, DataEnvelope, MessageEnvelope};
use crate::core::tree::CategoryTree;
use crate::core::validation::ValidatedJson;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{Value, json};

#[derive(Clone)]
pub struct CategoryAppState {
    pub service: CategoryService,
}

pub async fn list_categories(
    State(state): State<CategoryAppState>,
) -> Result<Json<DataEnvelope<CategoryTree>>, ApiError> {
    Ok(response::ok(state.service.tree().await?))
}

pub async fn get_category(
    State(state): State<CategoryAppState>,
    Path(id): Path<String>,
) -> Result<Json<DataEnvelope<Value>>, ApiError> {
    let category = state.service.get(&parse_id(&id)?).await?;
    Ok(response::ok(json!({ "category": category })))
}

pub async fn create_category(
    State(state): State<CategoryAppState>,
    ValidatedJson(input): ValidatedJson<CategoryInput>,
) -> Result<(StatusCode, Json<DataEnvelope<Value>>), ApiError> {
    let category = state.service.create(input).await?;
    Ok(response::created(json!({ "category": category })))
}

pub async fn update_category(
    State(state): State<CategoryAppState>,
    Path(id): Path<String>,
    ValidatedJson(update): ValidatedJson<CategoryUpdate>,
) -> Result<Json<DataEnvelope<Value>>, ApiError> {
    let category = state.service.update(&parse_id(&id)?, update).await?;
    Ok(response::ok(json!({ "category": category })))
}

pub async fn delete_category(
    State(state): State<CategoryAppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageEnvelope>, ApiError> {
    state.service.delete(&parse_id(&id)?).await?;
    Ok(response::message("Catégorie supprimée avec succès"))
}
