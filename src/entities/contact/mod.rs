//! Contact form

pub mod descriptor;
pub mod handlers;
pub mod model;

pub use descriptor::ContactDescriptor;
pub use model::ContactMessage;
