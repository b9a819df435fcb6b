//! Product entity module

pub mod descriptor;
pub mod handlers;
pub mod model;
pub mod service;

pub use descriptor::ProductDescriptor;
pub use model::{Product, ProductInput, ProductSummary, ProductUpdate};
pub use service::ProductService;
