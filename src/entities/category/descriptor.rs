//! Route table for categories

use super::handlers::{
    CategoryAppState, create_category, delete_category, get_category, list_categories,
    update_category,
};
use super::service::CategoryService;
use crate::core::auth::{ADMIN_ROLES, AccessPolicy, AuthGate, enforce_access};
use crate::entities::EntityDescriptor;
use crate::server::AppState;
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use std::sync::Arc;

pub struct CategoryDescriptor {
    service: CategoryService,
    gate: Arc<AuthGate>,
}

impl CategoryDescriptor {
    pub fn new(state: &AppState) -> Self {
        Self {
            service: CategoryService::new(state.repositories.categories.clone()),
            gate: state.gate.clone(),
        }
    }
}

impl EntityDescriptor for CategoryDescriptor {
    fn entity_type(&self) -> &str {
        "category"
    }

    fn plural(&self) -> &str {
        "categories"
    }

    fn build_routes(&self) -> Router {
        let state = CategoryAppState {
            service: self.service.clone(),
        };

        let public = Router::new()
            .route("/categories", get(list_categories))
            .route("/categories/{id}", get(get_category));

        let admin = Router::new()
            .route("/categories", post(create_category))
            .route("/categories/{id}", put(update_category).delete(delete_category))
            .route_layer(from_fn_with_state(
                AccessPolicy::roles(self.gate.clone(), ADMIN_ROLES),
                enforce_access,
            ));

        public.merge(admin).with_state(state)
    }
}
