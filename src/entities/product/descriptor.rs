//! Route table for products

use super::handlers::{
    ProductAppState, create_product, delete_product, get_product, list_products,
    list_products_by_category, update_product,
};
use super::service::ProductService;
use crate::core::auth::{ADMIN_ROLES, AccessPolicy, AuthGate, enforce_access};
use crate::entities::EntityDescriptor;
use crate::server::AppState;
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use std::sync::Arc;

pub struct ProductDescriptor {
    service: ProductService,
    gate: Arc<AuthGate>,
}

impl ProductDescriptor {
    pub fn new(state: &AppState) -> Self {
        Self {
            service: ProductService::new(state.repositories.products.clone()),
            gate: state.gate.clone(),
        }
    }
}

impl EntityDescriptor for ProductDescriptor {
    fn entity_type(&self) -> &str {
        "product"
    }

    fn plural(&self) -> &str {
        "products"
    }

    fn build_routes(&self) -> Router {
        let state = ProductAppState {
            service: self.service.clone(),
        };

        let public = Router::new()
            .route("/products", get(list_products))
            .route("/products/category/{category}", get(list_products_by_category))
            .route("/products/{id}", get(get_product));

        let admin = Router::new()
            .route("/products", post(create_product))
            .route("/products/{id}", put(update_product).delete(delete_product))
            .route_layer(from_fn_with_state(
                AccessPolicy::roles(self.gate.clone(), ADMIN_ROLES),
                enforce_access,
            ));

        public.merge(admin).with_state(state)
    }
}
