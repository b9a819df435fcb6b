//! Health and diagnostic routes

use super::state::AppState;
use crate::core::error::ApiError;
use crate::entities::Product;
use crate::storage::{Filter, FindOptions, Repositories, Sort};
use axum::extract::State;
use axum::response::Json;
use axum::Router;
use axum::routing::get;
use serde_json::{Value, json};

const SAMPLE_SIZE: u64 = 5;

/// `/health`, plus `/debug/db` when `server.debug_routes` is on
pub fn health_routes(state: &AppState) -> Router {
    let mut router = Router::new().route("/health", get(health_check));
    if state.config.server.debug_routes {
        tracing::warn!("debug routes are enabled");
        router = router.route("/debug/db", get(debug_db));
    }
    router.with_state(state.repositories.clone())
}

async fn storage_status(repositories: &Repositories) -> Value {
    let backend = &repositories.backend;
    let state = match backend.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "health check: storage unreachable");
            "disconnected"
        }
    };
    json!({
        "backend": backend.name(),
        "state": state,
        "database": backend.database(),
    })
}

async fn health_check(State(repositories): State<Repositories>) -> Json<Value> {
    Json(json!({
        "status": "OK",
        "message": "Yooreed Event API is running",
        "storage": storage_status(&repositories).await,
    }))
}

async fn debug_db(State(repositories): State<Repositories>) -> Result<Json<Value>, ApiError> {
    let all = Filter::new();
    let products = repositories.products.count(&all).await?;
    let categories = repositories.categories.count(&all).await?;
    let sample: Vec<Product> = repositories
        .products
        .find_many(&all, &FindOptions::page(Sort::desc("createdAt"), 0, SAMPLE_SIZE))
        .await?;
    let sample: Vec<Value> = sample
        .iter()
        .map(|p| json!({ "id": p.id, "nom": p.name, "categorie": p.category }))
        .collect();

    Ok(Json(json!({
        "success": true,
        "storage": storage_status(&repositories).await,
        "collections": {
            "products": { "total": products, "sample": sample },
            "categories": { "total": categories },
        },
    })))
}
