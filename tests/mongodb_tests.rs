//! Integration tests for the MongoDB repositories using the storage test harness.
//!
//! Invokes `repository_tests!` and `api_tests!` to validate that the MongoDB
//! backend (unique indexes, counters, filters, duplicate-key mapping) behaves
//! like the in-memory one.
//!
//! # Requirements
//!
//! - Docker must be running (testcontainers launches a MongoDB container)
//! - Feature flag `mongodb_backend` must be enabled
//!
//! # Running
//!
//! ```sh
//! cargo test --features mongodb_backend --test mongodb_tests -- --test-threads=1
//! ```
//!
//! # Test isolation
//!
//! All tests share a single MongoDB container (via `OnceLock`). Each test
//! gets its own database, so collections, indexes and counters start empty.

#![cfg(feature = "mongodb_backend")]

#[macro_use]
mod storage_harness;

use mongodb::Client;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use storage_harness::*;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::mongo::Mongo;
use yooreed::storage::Repositories;

// ---------------------------------------------------------------------------
// Shared test environment (single container, fresh client per test)
// ---------------------------------------------------------------------------

/// Holds the testcontainer handle (keeps it alive) and the connection URL.
struct MongoTestEnv {
    /// Container handle; dropping it stops the MongoDB container.
    _container: testcontainers::ContainerAsync<Mongo>,
    /// Connection URL for creating per-test clients.
    connection_url: String,
}

/// Global test environment, initialized once per test binary.
static TEST_ENV: OnceLock<MongoTestEnv> = OnceLock::new();

/// Initialize the shared MongoDB container (if not already started).
async fn init_mongo_env() -> &'static MongoTestEnv {
    if let Some(env) = TEST_ENV.get() {
        return env;
    }

    let container = Mongo::default()
        .start()
        .await
        .expect("Failed to start MongoDB container (is Docker running?)");

    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(27017).await.unwrap();
    let url = format!("mongodb://{}:{}", host, port);

    let env = MongoTestEnv {
        _container: container,
        connection_url: url,
    };

    let _ = TEST_ENV.set(env);
    TEST_ENV.get().unwrap()
}

/// Atomic counter to generate unique database names per test.
static DB_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Create a fresh MongoDB client with a unique database for test isolation.
///
/// Each call returns a **different** database so tests can safely run in
/// parallel without interfering with each other.
async fn mongo_database() -> mongodb::Database {
    let env = init_mongo_env().await;
    let client = Client::with_uri_str(&env.connection_url)
        .await
        .expect("Failed to connect to MongoDB");
    let db_num = DB_COUNTER.fetch_add(1, Ordering::SeqCst);
    client.database(&format!("yooreed_test_{}", db_num))
}

// ---------------------------------------------------------------------------
// Factory helpers
// ---------------------------------------------------------------------------

/// Repositories on a fresh database, indexes and counters created.
async fn mongo_repositories() -> Repositories {
    Repositories::mongodb(mongo_database().await)
        .await
        .expect("Failed to initialize MongoDB repositories")
}

// ---------------------------------------------------------------------------
// Test suites via macros
// ---------------------------------------------------------------------------

repository_tests!(mongo_repositories().await);
api_tests!(mongo_repositories().await);
