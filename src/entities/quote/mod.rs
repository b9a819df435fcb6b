//! Quote entity module

pub mod descriptor;
pub mod handlers;
pub mod model;
pub mod service;

pub use descriptor::QuoteDescriptor;
pub use model::{Quote, QuoteInput, QuoteLine, QuoteStatus};
pub use service::QuoteService;
