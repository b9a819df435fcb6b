//! Route table for `/auth`

use super::handlers::{AuthAppState, login, logout, me, update_password, update_profile};
use super::service::AdminService;
use crate::core::auth::{AccessPolicy, AuthGate, enforce_access};
use crate::entities::EntityDescriptor;
use crate::server::AppState;
use crate::server::rate_limit::{ClientRateLimiter, rate_limit};
use axum::Router;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use std::sync::Arc;

pub struct AuthDescriptor {
    service: AdminService,
    gate: Arc<AuthGate>,
    login_limiter: Option<ClientRateLimiter>,
}

impl AuthDescriptor {
    pub fn new(state: &AppState) -> Self {
        Self {
            service: AdminService::new(
                state.repositories.admins.clone(),
                state.gate.tokens().clone(),
            ),
            gate: state.gate.clone(),
            login_limiter: login_limiter(state),
        }
    }
}

fn login_limiter(state: &AppState) -> Option<ClientRateLimiter> {
    if !state.config.rate_limit_active() {
        return None;
    }
    ClientRateLimiter::login(&state.config.rate_limit)
        .inspect_err(|e| tracing::error!(error = %e, "login rate limit not applied"))
        .ok()
}

impl EntityDescriptor for AuthDescriptor {
    fn entity_type(&self) -> &str {
        "admin"
    }

    fn plural(&self) -> &str {
        "auth"
    }

    fn build_routes(&self) -> Router {
        let state = AuthAppState {
            service: self.service.clone(),
        };

        let mut public = Router::new().route("/auth/login", post(login));
        if let Some(limiter) = &self.login_limiter {
            public = public.route_layer(from_fn_with_state(limiter.clone(), rate_limit));
        }

        let authenticated = Router::new()
            .route("/auth/logout", post(logout))
            .route("/auth/me", get(me))
            .route("/auth/profile", put(update_profile))
            .route("/auth/password", put(update_password))
            .route_layer(from_fn_with_state(
                AccessPolicy::authenticated(self.gate.clone()),
                enforce_access,
            ));

        public.merge(authenticated).with_state(state)
    }
}
