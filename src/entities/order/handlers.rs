//! Order HTTP handlers

use super::model::{OrderInput, OrderStatusUpdate};
use super::service::{OrderQuery, OrderService};
use crate::core::error::{ApiError, parse_id};
use crate::core::response::{self, DataEnvelope};
use crate::core::validation::ValidatedJson;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde_json::{Value, json};

#[derive(Clone)]
pub struct OrderAppState {
    pub service: OrderService,
}

pub async fn create_order(
    State(state): State<OrderAppState>,
    ValidatedJson(input): ValidatedJson<OrderInput>,
) -> Result<(StatusCode, Json<DataEnvelope<Value>>), ApiError> {
    let order = state.service.create(input).await?;
    Ok(response::created(json!({ "order": order })))
}

pub async fn list_orders(
    State(state): State<OrderAppState>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<DataEnvelope<Value>>, ApiError> {
    let page = state.service.list(&query).await?;
    Ok(response::ok(json!({
        "orders": page.orders,
        "pagination": page.pagination,
    })))
}

pub async fn get_order(
    State(state): State<OrderAppState>,
    Path(id): Path<String>,
) -> Result<Json<DataEnvelope<Value>>, ApiError> {
    let order = state.service.get(&parse_id(&id)?).await?;
    Ok(response::ok(json!({ "order": order })))
}

pub async fn update_order_status(
    State(state): State<OrderAppState>,
    Path(id): Path<String>,
    ValidatedJson(update): ValidatedJson<OrderStatusUpdate>,
) -> Result<Json<DataEnvelope<Value>>, ApiError> {
    let order = state
        .service
        .update_status(&parse_id(&id)?, update.statut.as_deref())
        .await?;
    Ok(response::ok(json!({ "order": order })))
}
