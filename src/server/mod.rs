//! HTTP server assembly
//!
//! [`ServerBuilder`] collects resource descriptors, nests their routes under
//! `/api` next to the health routes and wraps everything in the middleware
//! stack (tracing, CORS, compression, security headers, per-client rate
//! limits, optional storage check, JSON 404 fallback).

pub mod builder;
pub mod entity_registry;
pub mod health;
pub mod middleware;
pub mod rate_limit;
pub mod state;

pub use builder::ServerBuilder;
pub use entity_registry::{EntityDescriptor, EntityRegistry};
pub use state::{AppState, open_repositories};
