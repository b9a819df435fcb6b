//! Admin accounts and the `/auth` routes

pub mod descriptor;
pub mod handlers;
pub mod model;
pub mod service;

pub use descriptor::AuthDescriptor;
pub use model::{Admin, AdminProfile, NewAdmin};
pub use service::{AdminService, LoginResponse};
