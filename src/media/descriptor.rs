//! Route table for `/upload`

use super::MediaHost;
use super::filter::{MAX_FILE_SIZE, MAX_FILES};
use super::handlers::{UploadAppState, upload_image, upload_images, upload_video};
use crate::core::auth::{ADMIN_ROLES, AccessPolicy, AuthGate, enforce_access};
use crate::entities::EntityDescriptor;
use crate::server::AppState;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::post;
use std::sync::Arc;

/// Room for multipart boundaries and headers on top of the file bytes
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub struct UploadDescriptor {
    host: Arc<dyn MediaHost>,
    gate: Arc<AuthGate>,
}

impl UploadDescriptor {
    pub fn new(state: &AppState) -> Self {
        Self {
            host: state.media.clone(),
            gate: state.gate.clone(),
        }
    }
}

impl EntityDescriptor for UploadDescriptor {
    fn entity_type(&self) -> &str {
        "upload"
    }

    fn plural(&self) -> &str {
        "upload"
    }

    fn build_routes(&self) -> Router {
        let state = UploadAppState {
            host: self.host.clone(),
        };
        let single = DefaultBodyLimit::max(MAX_FILE_SIZE + MULTIPART_OVERHEAD);
        let many = DefaultBodyLimit::max(MAX_FILES * MAX_FILE_SIZE + MULTIPART_OVERHEAD);

        Router::new()
            .route("/upload/image", post(upload_image).layer(single))
            .route("/upload/images", post(upload_images).layer(many))
            .route("/upload/video", post(upload_video).layer(single))
            .route_layer(from_fn_with_state(
                AccessPolicy::roles(self.gate.clone(), ADMIN_ROLES),
                enforce_access,
            ))
            .with_state(state)
    }
}
