//! Shared harness for running the same test suites against every storage
//! backend
//!
//! Provides fixtures (sample records and request payloads) and [`TestApp`],
//! a full application served by `axum_test::TestServer` with an in-memory
//! outbox mailer and media host.
//!
//! # Usage
//!
//! From any integration test file in `tests/`:
//! ```rust,ignore
//! #[macro_use]
//! mod storage_harness;
//! use storage_harness::*;
//!
//! repository_tests!(Repositories::in_memory());
//! api_tests!(Repositories::in_memory());
//! ```

#![allow(dead_code)]

#[macro_use]
pub mod repository_tests;

#[macro_use]
pub mod api_tests;

use axum_test::TestServer;
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;
use yooreed::config::AppConfig;
use yooreed::core::auth::{JwtTokenService, Role};
use yooreed::entities::admin::{AdminService, NewAdmin};
use yooreed::entities::order::OrderLine;
use yooreed::entities::{Category, Client, Order};
use yooreed::media::MemoryHost;
use yooreed::notify::{Notifier, OutboxMailer};
use yooreed::server::{AppState, ServerBuilder};
use yooreed::storage::Repositories;

pub const ADMIN_PASSWORD: &str = "correct-horse";

// ---------------------------------------------------------------------------
// Record fixtures
// ---------------------------------------------------------------------------

pub fn category(name: &str, parent: Option<Uuid>) -> Category {
    Category::new(name, "", parent, "", Utc::now())
}

pub fn client() -> Client {
    Client {
        name: "Alice".to_string(),
        company: String::new(),
        email: "alice@example.com".to_string(),
        phone: "+216 20 000 000".to_string(),
        address: "Tunis".to_string(),
    }
}

/// An order without a code, one line of 2 x 45
pub fn order() -> Order {
    Order::new(
        client(),
        vec![OrderLine {
            product_id: Uuid::new_v4(),
            quantity: 2,
            unit_price: 45.0,
            customization: String::new(),
        }],
        String::new(),
        Utc::now(),
    )
}

// ---------------------------------------------------------------------------
// Payload fixtures
// ---------------------------------------------------------------------------

pub fn product_payload(name: &str, price: f64, stock: i64) -> Value {
    json!({
        "nom": name,
        "categorie": "decoration",
        "sousCategorie": "vases",
        "description": format!("{} fait main", name),
        "prix": price,
        "stock": stock,
    })
}

pub fn client_payload() -> Value {
    json!({
        "nom": "Alice",
        "email": "Alice@Example.com",
        "telephone": "+216 20 000 000",
        "adresse": "Tunis",
    })
}

// ---------------------------------------------------------------------------
// Application under test
// ---------------------------------------------------------------------------

pub struct TestApp {
    pub server: TestServer,
    pub state: AppState,
    pub outbox: OutboxMailer,
    pub media: MemoryHost,
}

/// Full application on `repositories`, emails and uploads kept in memory,
/// without rate limits
pub fn test_app(repositories: Repositories) -> TestApp {
    test_app_with(repositories, |config| config.rate_limit.enabled = false)
}

/// Same as [`test_app`], with `configure` applied to the configuration
pub fn test_app_with(repositories: Repositories, configure: impl FnOnce(&mut AppConfig)) -> TestApp {
    let mut config = AppConfig::default();
    config.auth.jwt_secret = Some("test-secret".to_string());
    config.server.debug_routes = true;
    config.server.check_storage_per_request = true;
    configure(&mut config);

    let outbox = OutboxMailer::new();
    let media = MemoryHost::new();
    let notifier = Notifier::new(
        Arc::new(outbox.clone()),
        Some("contact@yooreed-event.com".to_string()),
    )
    .unwrap();
    let tokens = Arc::new(JwtTokenService::new(
        b"test-secret",
        chrono::Duration::days(7),
    ));

    let state = AppState::new(
        config,
        repositories,
        tokens,
        notifier,
        Arc::new(media.clone()),
    );
    let router = ServerBuilder::new(state.clone())
        .register_all()
        .build()
        .unwrap();

    TestApp {
        server: TestServer::new(router),
        state,
        outbox,
        media,
    }
}

impl TestApp {
    pub fn admins(&self) -> AdminService {
        AdminService::new(
            self.state.repositories.admins.clone(),
            self.state.gate.tokens().clone(),
        )
    }

    /// Create an admin with `username` and [`ADMIN_PASSWORD`]
    pub async fn create_admin(&self, username: &str, role: Role) {
        self.admins()
            .create_admin(NewAdmin {
                username: username.to_string(),
                email: format!("{}@yooreed-event.com", username.to_lowercase()),
                password: ADMIN_PASSWORD.to_string(),
                role,
            })
            .await
            .unwrap()
            .unwrap();
    }

    /// Bearer token of a freshly created admin
    pub async fn admin_token(&self) -> String {
        let username = format!("admin-{}", Uuid::new_v4().simple());
        self.create_admin(&username, Role::Admin).await;
        let response = self
            .server
            .post("/api/auth/login")
            .json(&json!({ "username": username, "password": ADMIN_PASSWORD }))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        body["data"]["token"].as_str().unwrap().to_string()
    }

    /// Create a product through the API and return its JSON
    pub async fn create_product(&self, token: &str, name: &str, price: f64, stock: i64) -> Value {
        let response = self
            .server
            .post("/api/products")
            .authorization_bearer(token)
            .json(&product_payload(name, price, stock))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        let body: Value = response.json();
        body["data"]["product"].clone()
    }
}
