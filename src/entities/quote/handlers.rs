//! Quote HTTP handlers

use super::model::{QuoteInput, QuoteStatusUpdate};
use super::service::{QuoteQuery, QuoteService};
use crate::core::error::{ApiError, parse_id};
use crate::core::response::{self, DataEnvelope};
use crate::core::validation::ValidatedJson;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{Value, json};

#[derive(Clone)]
pub struct QuoteAppState {
    pub service: QuoteService,
}

pub async fn create_quote(
    State(state): State<QuoteAppState>,
    ValidatedJson(input): ValidatedJson<QuoteInput>,
) -> Result<(StatusCode, Json<DataEnvelope<Value>>), ApiError> {
    let quote = state.service.create(input).await?;
    Ok(response::created(json!({ "quote": quote })))
}

pub async fn list_quotes(
    State(state): State<QuoteAppState>,
    Query(query): Query<QuoteQuery>,
) -> Result<Json<DataEnvelope<Value>>, ApiError> {
    let page = state.service.list(&query).await?;
    Ok(response::ok(json!({
        "quotes": page.quotes,
        "pagination": page.pagination,
    })))
}

pub async fn get_quote(
    State(state): State<QuoteAppState>,
    Path(id): Path<String>,
) -> Result<Json<DataEnvelope<Value>>, ApiError> {
    let quote = state.service.get(&parse_id(&id)?).await?;
    Ok(response::ok(json!({ "quote": quote })))
}

pub async fn update_quote_status(
    State(state): State<QuoteAppState>,
    Path(id): Path<String>,
    ValidatedJson(update): ValidatedJson<QuoteStatusUpdate>,
) -> Result<Json<DataEnvelope<Value>>, ApiError> {
    let quote = state.service.update_status(&parse_id(&id)?, update).await?;
    Ok(response::ok(json!({ "quote": quote })))
}
