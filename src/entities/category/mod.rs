//! Category entity module

pub mod descriptor;
pub mod handlers;
pub mod model;
pub mod service;

pub use descriptor::CategoryDescriptor;
pub use model::{Category, CategoryInput, CategoryUpdate};
pub use service::CategoryService;
