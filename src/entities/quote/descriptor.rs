//! Route table for quotes

use super::handlers::{QuoteAppState, create_quote, get_quote, list_quotes, update_quote_status};
use super::service::QuoteService;
use crate::core::auth::{ADMIN_ROLES, AccessPolicy, AuthGate, enforce_access};
use crate::entities::EntityDescriptor;
use crate::entities::product::ProductService;
use crate::server::AppState;
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use std::sync::Arc;

pub struct QuoteDescriptor {
    service: QuoteService,
    gate: Arc<AuthGate>,
}

impl QuoteDescriptor {
    pub fn new(state: &AppState) -> Self {
        Self {
            service: QuoteService::new(
                state.repositories.quotes.clone(),
                ProductService::new(state.repositories.products.clone()),
                state.codes.clone(),
                state.notifier.clone(),
            ),
            gate: state.gate.clone(),
        }
    }
}

impl EntityDescriptor for QuoteDescriptor {
    fn entity_type(&self) -> &str {
        "quote"
    }

    fn plural(&self) -> &str {
        "quotes"
    }

    fn build_routes(&self) -> Router {
        let state = QuoteAppState {
            service: self.service.clone(),
        };

        let public = Router::new().route("/quotes", post(create_quote));

        let admin = Router::new()
            .route("/quotes", get(list_quotes))
            .route("/quotes/{id}", get(get_quote))
            .route("/quotes/{id}/status", put(update_quote_status))
            .route_layer(from_fn_with_state(
                AccessPolicy::roles(self.gate.clone(), ADMIN_ROLES),
                enforce_access,
            ));

        public.merge(admin).with_state(state)
    }
}
