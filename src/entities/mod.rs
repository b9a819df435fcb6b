//! Domain entities
//!
//! Each entity lives in its own module with the same layout:
//!
//! - `model`: the stored record and its request payloads
//! - `service`: business rules on top of the repositories
//! - `handlers`: axum handlers
//! - `descriptor`: route table registered with the
//!   [`ServerBuilder`](crate::server::ServerBuilder)

pub mod admin;
pub mod category;
pub mod client;
pub mod contact;
pub mod order;
pub mod product;
pub mod quote;

pub use admin::Admin;
pub use category::Category;
pub use client::Client;
pub use order::Order;
pub use product::{Product, ProductSummary};
pub use quote::Quote;

pub use crate::server::EntityDescriptor;

use crate::server::AppState;

/// Descriptors for every resource, wired to the shared state
pub fn descriptors(state: &AppState) -> Vec<Box<dyn EntityDescriptor>> {
    vec![
        Box::new(admin::AuthDescriptor::new(state)),
        Box::new(product::ProductDescriptor::new(state)),
        Box::new(category::CategoryDescriptor::new(state)),
        Box::new(order::OrderDescriptor::new(state)),
        Box::new(quote::QuoteDescriptor::new(state)),
        Box::new(contact::ContactDescriptor::new(state)),
        Box::new(crate::media::UploadDescriptor::new(state)),
    ]
}
