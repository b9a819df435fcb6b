//! Authentication HTTP handlers

use super::model::{LoginRequest, PasswordChange, ProfileUpdate};
use super::service::AdminService;
use crate::core::auth::AuthContext;
use crate::core::error::ApiError;
use crate::core::response::{self, DataEnvelope, MessageEnvelope};
use crate::core::validation::ValidatedJson;
use axum::extract::State;
use axum::response::Json;
use serde_json::{Value, json};

#[derive(Clone)]
pub struct AuthAppState {
    pub service: AdminService,
}

pub async fn login(
    State(state): State<AuthAppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<Json<DataEnvelope<Value>>, ApiError> {
    let login = state.service.login(request).await?;
    Ok(response::ok(json!({
        "token": login.token,
        "admin": login.admin,
    })))
}

/// Tokens are stateless; the client discards its copy
pub async fn logout(auth: AuthContext) -> Json<MessageEnvelope> {
    tracing::debug!(admin = %auth.username, "logout");
    response::message("Déconnexion réussie")
}

pub async fn me(
    State(state): State<AuthAppState>,
    auth: AuthContext,
) -> Result<Json<DataEnvelope<Value>>, ApiError> {
    let admin = state.service.profile(&auth.id).await?;
    Ok(response::ok(json!({ "admin": admin })))
}

pub async fn update_profile(
    State(state): State<AuthAppState>,
    auth: AuthContext,
    ValidatedJson(update): ValidatedJson<ProfileUpdate>,
) -> Result<Json<DataEnvelope<Value>>, ApiError> {
    let admin = state.service.update_profile(&auth.id, update).await?;
    Ok(response::ok(json!({ "admin": admin })))
}

pub async fn update_password(
    State(state): State<AuthAppState>,
    auth: AuthContext,
    ValidatedJson(change): ValidatedJson<PasswordChange>,
) -> Result<Json<MessageEnvelope>, ApiError> {
    state.service.update_password(&auth.id, change).await?;
    Ok(response::message("Mot de passe modifié avec succès"))
}
