//! Route table for the contact form

use super::handlers::{ContactAppState, send_contact_message};
use crate::entities::EntityDescriptor;
use crate::notify::Notifier;
use crate::server::AppState;
use axum::Router;
use axum::routing::post;

pub struct ContactDescriptor {
    notifier: Notifier,
}

impl ContactDescriptor {
    pub fn new(state: &AppState) -> Self {
        Self {
            notifier: state.notifier.clone(),
        }
    }
}

impl EntityDescriptor for ContactDescriptor {
    fn entity_type(&self) -> &str {
        "contact"
    }

    fn plural(&self) -> &str {
        "contact"
    }

    fn build_routes(&self) -> Router {
        Router::new()
            .route("/contact", post(send_contact_message))
            .with_state(ContactAppState {
                notifier: self.notifier.clone(),
            })
    }
}
