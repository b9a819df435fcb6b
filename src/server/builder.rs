//! ServerBuilder: assembles the `/api` router from resource descriptors

use super::entity_registry::{EntityDescriptor, EntityRegistry};
use super::health::health_routes;
use super::middleware::{cors_layer, require_storage, route_not_found, security_headers};
use super::rate_limit::{ClientRateLimiter, rate_limit};
use super::state::AppState;
use crate::entities;
use anyhow::Result;
use axum::Router;
use axum::middleware::from_fn_with_state;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

/// Builder for the HTTP application
///
/// # Example
///
/// ```ignore
/// let state = AppState::from_config(config, repositories)?;
/// ServerBuilder::new(state)
///     .register_all()
///     .serve("0.0.0.0:5000")
///     .await?;
/// ```
pub struct ServerBuilder {
    state: AppState,
    registry: EntityRegistry,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            registry: EntityRegistry::new(),
            custom_routes: Vec::new(),
        }
    }

    /// Register one resource
    pub fn register(mut self, descriptor: Box<dyn EntityDescriptor>) -> Self {
        self.registry.register(descriptor);
        self
    }

    /// Register every resource of the application
    pub fn register_all(mut self) -> Self {
        for descriptor in entities::descriptors(&self.state) {
            self.registry.register(descriptor);
        }
        self
    }

    /// Extra routes merged under `/api` next to the resources
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Build the router with its middleware stack
    pub fn build(self) -> Result<Router> {
        let server = &self.state.config.server;

        let mut api = health_routes(&self.state).merge(self.registry.build_routes());
        for routes in self.custom_routes {
            api = api.merge(routes);
        }
        if server.check_storage_per_request {
            api = api.layer(from_fn_with_state(
                self.state.repositories.backend.clone(),
                require_storage,
            ));
        }
        if self.state.config.rate_limit_active() {
            api = api.layer(from_fn_with_state(
                ClientRateLimiter::api(&self.state.config.rate_limit)?,
                rate_limit,
            ));
        }

        let mut app = Router::new()
            .nest("/api", api)
            .fallback(route_not_found)
            .layer(CompressionLayer::new())
            .layer(cors_layer(&server.frontend_url)?);
        for header in security_headers() {
            app = app.layer(header);
        }

        tracing::info!(
            resources = ?self.registry.entity_types(),
            storage = self.state.repositories.backend.name(),
            "router built"
        );
        Ok(app.layer(TraceLayer::new_for_http()))
    }

    /// Serve the application until SIGINT or SIGTERM
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Server listening on {}", addr);

        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM signal, initiating graceful shutdown...");
        },
    }
}
