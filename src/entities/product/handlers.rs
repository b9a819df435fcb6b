//! Product HTTP handlers

use super::model::{ProductInput, ProductUpdate};
use super::service::{ProductQuery, ProductService};
use crate::core::error::{ApiError, parse_id};
use crate::core::response::{self, DataEnvelope, MessageEnvelope};
use crate::core::validation::ValidatedJson;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Clone)]
pub struct ProductAppState {
    pub service: ProductService,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SubcategoryQuery {
    #[serde(rename = "sousCategorie")]
    pub subcategory: Option<String>,
}

pub async fn list_products(
    State(state): State<ProductAppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<DataEnvelope<Value>>, ApiError> {
    let page = state.service.list(&query).await?;
    Ok(response::ok(json!({
        "products": page.products,
        "pagination": page.pagination,
    })))
}

pub async fn list_products_by_category(
    State(state): State<ProductAppState>,
    Path(category): Path<String>,
    Query(query): Query<SubcategoryQuery>,
) -> Result<Json<DataEnvelope<Value>>, ApiError> {
    let products = state
        .service
        .list_by_category(&category, query.subcategory.as_deref())
        .await?;
    Ok(response::ok(json!({ "products": products })))
}

pub async fn get_product(
    State(state): State<ProductAppState>,
    Path(id): Path<String>,
) -> Result<Json<DataEnvelope<Value>>, ApiError> {
    let product = state.service.get(&parse_id(&id)?).await?;
    Ok(response::ok(json!({ "product": product })))
}

pub async fn create_product(
    State(state): State<ProductAppState>,
    ValidatedJson(input): ValidatedJson<ProductInput>,
) -> Result<(StatusCode, Json<DataEnvelope<Value>>), ApiError> {
    let product = state.service.create(input).await?;
    Ok(response::created(json!({ "product": product })))
}

pub async fn update_product(
    State(state): State<ProductAppState>,
    Path(id): Path<String>,
    ValidatedJson(update): ValidatedJson<ProductUpdate>,
) -> Result<Json<DataEnvelope<Value>>, ApiError> {
    let product = state.service.update(&parse_id(&id)?, update).await?;
    Ok(response::ok(json!({ "product": product })))
}

pub async fn delete_product(
    State(state): State<ProductAppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageEnvelope>, ApiError> {
    state.service.delete(&parse_id(&id)?).await?;
    Ok(response::message("Produit supprimé avec succès"))
}
