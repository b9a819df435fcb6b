//! # Yooreed Event API
//!
//! REST backend of the Yooreed Event catalog: products, a category tree,
//! orders and quotes placed from the storefront, contact messages, admin
//! authentication and media upload.
//!
//! ## Layout
//!
//! - [`core`]: code generation, category tree, auth gate, errors, validation
//! - [`storage`]: repository traits with in-memory and MongoDB backends
//! - [`entities`]: one module per resource (model, service, handlers, routes)
//! - [`notify`]: transactional emails
//! - [`media`]: uploads to the media host
//! - [`server`]: router assembly and middleware
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use yooreed::prelude::*;
//!
//! let config = AppConfig::load(None)?;
//! let repositories = open_repositories(&config).await?;
//! let addr = config.bind_address();
//! let state = AppState::from_config(config, repositories)?;
//!
//! ServerBuilder::new(state).register_all().serve(&addr).await?;
//! ```

pub mod config;
pub mod core;
pub mod entities;
pub mod media;
pub mod notify;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        auth::{AuthContext, AuthError, AuthGate, JwtTokenService, Passwords, Role, TokenService},
        code::{CodeGenerator, CodeKind, SequenceStrategy},
        error::ApiError,
        tree::{CategoryTree, build_category_tree},
    };

    // === Entities ===
    pub use crate::entities::{Admin, Category, Client, Order, Product, Quote};

    // === Storage ===
    pub use crate::storage::{Filter, Repositories, Repository, StoreError};

    // === Services ===
    pub use crate::media::{MediaHost, MemoryHost};
    pub use crate::notify::{Mailer, Notifier, OutboxMailer};

    // === Config & server ===
    pub use crate::config::AppConfig;
    pub use crate::server::{AppState, EntityDescriptor, ServerBuilder, open_repositories};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use uuid::Uuid;
}
