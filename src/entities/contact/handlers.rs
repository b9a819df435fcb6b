//! Contact form handler

use super::model::ContactMessage;
use crate::core::error::ApiError;
use crate::core::response::{self, MessageEnvelope};
use crate::core::validation::ValidatedJson;
use crate::notify::Notifier;
use axum::extract::State;
use axum::response::Json;

#[derive(Clone)]
pub struct ContactAppState {
    pub notifier: Notifier,
}

pub async fn send_contact_message(
    State(state): State<ContactAppState>,
    ValidatedJson(message): ValidatedJson<ContactMessage>,
) -> Result<Json<MessageEnvelope>, ApiError> {
    tracing::info!(sujet = message.subject_or_default(), "contact message received");
    state.notifier.contact(&message).await;
    Ok(response::message("Message envoyé avec succès"))
}
