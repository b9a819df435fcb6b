//! Core building blocks shared by every resource

pub mod auth;
pub mod code;
pub mod error;
pub mod field;
pub mod query;
pub mod response;
pub mod slug;
pub mod timestamp;
pub mod tree;
pub mod validation;

pub use auth::{AuthContext, AuthError, AuthGate, Role};
pub use code::{CodeGenerator, CodeKind, SequenceStrategy};
pub use error::ApiError;
pub use field::FieldValue;
