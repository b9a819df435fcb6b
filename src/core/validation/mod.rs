//! Request body validation
//!
//! Request payloads are typed structs deriving `serde::Deserialize` and
//! `validator::Validate`. The [`ValidatedJson`] extractor deserializes the
//! body, normalizes it (trim, lowercase) and validates it before the handler
//! runs.

pub mod extractor;
pub mod filters;

pub use extractor::{ValidatedJson, flatten_errors};

/// In-place cleanup applied before validation
pub trait Normalize {
    fn normalize(&mut self) {}
}
