//! Admin login and account management

use super::model::{Admin, AdminProfile, LoginRequest, MIN_PASSWORD_LEN, NewAdmin, PasswordChange, ProfileUpdate};
use crate::core::auth::{AuthContext, AuthError, Passwords, TokenService};
use crate::core::error::ApiError;
use crate::storage::{Filter, Repository, StoreError};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

const NOT_FOUND: &str = "Admin non trouvé";
const EMAIL_TAKEN: &str = "Cet email est déjà utilisé";

/// Result of a successful login
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub admin: AuthContext,
}

#[derive(Clone)]
pub struct AdminService {
    admins: Arc<dyn Repository<Admin>>,
    tokens: Arc<dyn TokenService>,
}

impl AdminService {
    pub fn new(admins: Arc<dyn Repository<Admin>>, tokens: Arc<dyn TokenService>) -> Self {
        Self { admins, tokens }
    }

    /// Check credentials and issue a bearer token
    ///
    /// Unknown usernames and wrong passwords get the same answer.
    pub async fn login(&self, request: LoginRequest) -> Result<LoginResponse, ApiError> {
        let (Some(username), Some(password)) = (
            request.username.filter(|u| !u.is_empty()),
            request.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(ApiError::bad_request("Nom d'utilisateur et mot de passe requis"));
        };

        let Some(mut admin) = self
            .admins
            .find_one(&Filter::new().eq("username", username.as_str()))
            .await?
        else {
            tracing::info!(%username, "login failed: unknown username");
            return Err(AuthError::InvalidCredentials.into());
        };

        if !Passwords::verify_blocking(password, admin.password_hash.clone()).await? {
            tracing::info!(%username, "login failed: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let now = Utc::now();
        admin.last_login = Some(now);
        admin.updated_at = now;
        let id = admin.id;
        let admin = self
            .admins
            .update_by_id(&id, admin)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let token = self
            .tokens
            .issue(admin.id)
            .map_err(|e| ApiError::internal(e.to_string()))?;
        tracing::info!(admin = %admin.username, "admin logged in");

        Ok(LoginResponse {
            token,
            admin: AuthContext::from(&admin),
        })
    }

    pub async fn profile(&self, id: &Uuid) -> Result<AdminProfile, ApiError> {
        Ok(self.find(id).await?.profile())
    }

    pub async fn update_profile(
        &self,
        id: &Uuid,
        update: ProfileUpdate,
    ) -> Result<AdminProfile, ApiError> {
        let mut admin = self.find(id).await?;

        if let Some(email) = update.email.clone().filter(|e| *e != admin.email) {
            let taken = self
                .admins
                .find_one(&Filter::new().eq("email", email.as_str()).ne("_id", *id))
                .await?;
            if taken.is_some() {
                return Err(ApiError::bad_request(EMAIL_TAKEN));
            }
            admin.email = email;
        }

        update.apply(&mut admin);
        admin.updated_at = Utc::now();

        let admin = self
            .admins
            .update_by_id(id, admin)
            .await
            .map_err(email_taken)?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
        tracing::info!(admin = %admin.username, "profile updated");
        Ok(admin.profile())
    }

    pub async fn update_password(&self, id: &Uuid, change: PasswordChange) -> Result<(), ApiError> {
        let (Some(current), Some(new)) = (
            change.current_password.filter(|p| !p.is_empty()),
            change.new_password.filter(|p| !p.is_empty()),
        ) else {
            return Err(ApiError::bad_request(
                "Mot de passe actuel et nouveau mot de passe requis",
            ));
        };
        if new.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::bad_request(format!(
                "Le nouveau mot de passe doit contenir au moins {} caractères",
                MIN_PASSWORD_LEN
            )));
        }

        let mut admin = self.find(id).await?;
        if !Passwords::verify_blocking(current, admin.password_hash.clone()).await? {
            return Err(AuthError::WrongPassword.into());
        }

        admin.password_hash = Passwords::hash_blocking(new).await?;
        admin.updated_at = Utc::now();
        self.admins
            .update_by_id(id, admin)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
        tracing::info!(%id, "password changed");
        Ok(())
    }

    /// Create an account; `Ok(None)` when the username is already taken
    pub async fn create_admin(&self, new: NewAdmin) -> Result<Option<Admin>, ApiError> {
        let username = new.username.trim().to_lowercase();
        if self
            .admins
            .find_one(&Filter::new().eq("username", username.as_str()))
            .await?
            .is_some()
        {
            return Ok(None);
        }
        if new.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ApiError::validation(format!(
                "Le mot de passe doit contenir au moins {} caractères",
                MIN_PASSWORD_LEN
            )));
        }

        let hash = Passwords::hash_blocking(new.password).await?;
        let admin = Admin::new(&username, &new.email, &hash, new.role, Utc::now());
        let admin = self.admins.insert(admin).await.map_err(email_taken)?;
        tracing::info!(admin = %admin.username, role = %admin.role, "admin account created");
        Ok(Some(admin))
    }

    async fn find(&self, id: &Uuid) -> Result<Admin, ApiError> {
        self.admins
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))
    }
}

fn email_taken(err: StoreError) -> ApiError {
    if err.is_duplicate_of("email") {
        ApiError::bad_request(EMAIL_TAKEN)
    } else {
        err.into()
    }
}
