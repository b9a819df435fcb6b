//! Route table for orders

use super::handlers::{OrderAppState, create_order, get_order, list_orders, update_order_status};
use super::service::OrderService;
use crate::core::auth::{ADMIN_ROLES, AccessPolicy, AuthGate, enforce_access};
use crate::entities::EntityDescriptor;
use crate::entities::product::ProductService;
use crate::server::AppState;
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use std::sync::Arc;

pub struct OrderDescriptor {
    service: OrderService,
    gate: Arc<AuthGate>,
}

impl OrderDescriptor {
    pub fn new(state: &AppState) -> Self {
        Self {
            service: OrderService::new(
                state.repositories.orders.clone(),
                ProductService::new(state.repositories.products.clone()),
                state.codes.clone(),
                state.notifier.clone(),
            ),
            gate: state.gate.clone(),
        }
    }
}

impl EntityDescriptor for OrderDescriptor {
    fn entity_type(&self) -> &str {
        "order"
    }

    fn plural(&self) -> &str {
        "orders"
    }

    fn build_routes(&self) -> Router {
        let state = OrderAppState {
            service: self.service.clone(),
        };

        let public = Router::new().route("/orders", post(create_order));

        let admin = Router::new()
            .route("/orders", get(list_orders))
            .route("/orders/{id}", get(get_order))
            .route("/orders/{id}/status", put(update_order_status))
            .route_layer(from_fn_with_state(
                AccessPolicy::roles(self.gate.clone(), ADMIN_ROLES),
                enforce_access,
            ));

        public.merge(admin).with_state(state)
    }
}
