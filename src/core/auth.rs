//! Admin authentication and role-based authorization
//!
//! A request moves through three states:
//!
//! - **Unauthenticated**: no bearer token, or a token that fails verification
//!   (401)
//! - **Authenticated**: the token verifies and the admin it names still exists;
//!   the request carries an [`AuthContext`]
//! - **Unauthorized**: the admin's role is not in the route's allowed set (403)
//!
//! Tokens are stateless HS256 JWTs, so logout is client-side only.

use crate::core::error::ApiError;
use crate::entities::Admin;
use crate::storage::Repository;
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use axum::extract::{FromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::Response;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

// =============================================================================
// Roles and context
// =============================================================================

/// Admin role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Admin,
    SuperAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::SuperAdmin => "super_admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Roles allowed on every administration route
///
/// Membership is exact, so `super_admin` is listed explicitly.
pub const ADMIN_ROLES: &[Role] = &[Role::Admin, Role::SuperAdmin];

/// Identity of the authenticated admin, attached to the request
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthContext {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
}

impl From<&Admin> for AuthContext {
    fn from(admin: &Admin) -> Self {
        Self {
            id: admin.id,
            username: admin.username.clone(),
            email: admin.email.clone(),
            role: admin.role,
        }
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthContext {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ApiError::forbidden("Non autorisé"))
    }
}

// =============================================================================
// Errors
// =============================================================================

/// Authentication failures (all answered with 401)
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Token d'authentification manquant")]
    MissingToken,

    #[error("Token invalide")]
    InvalidToken,

    #[error("Admin non trouvé")]
    AdminNotFound,

    #[error("Identifiants invalides")]
    InvalidCredentials,

    #[error("Mot de passe actuel incorrect")]
    WrongPassword,
}

impl AuthError {
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::AdminNotFound => "ADMIN_NOT_FOUND",
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::WrongPassword => "WRONG_PASSWORD",
        }
    }
}

/// Token verification failures, distinguished for logging only
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("token signature mismatch")]
    InvalidSignature,

    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("failed to sign token: {0}")]
    Signing(String),
}

// =============================================================================
// Tokens
// =============================================================================

/// JWT claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Admin id
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    pub fn subject(&self) -> Result<Uuid, TokenError> {
        Uuid::parse_str(&self.sub).map_err(|e| TokenError::Malformed(e.to_string()))
    }
}

/// Issues and verifies bearer tokens
pub trait TokenService: Send + Sync {
    fn issue(&self, admin_id: Uuid) -> Result<String, TokenError>;

    fn verify(&self, token: &str) -> Result<TokenClaims, TokenError>;
}

/// HS256 JWT implementation
pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl JwtTokenService {
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Issue a token as if the current time were `issued_at`
    pub fn issue_at(&self, admin_id: Uuid, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = TokenClaims {
            sub: admin_id.to_string(),
            iat: issued_at.timestamp(),
            exp: (issued_at + self.ttl).timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, admin_id: Uuid) -> Result<String, TokenError> {
        self.issue_at(admin_id, Utc::now())
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        jsonwebtoken::decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => TokenError::Expired,
                JwtErrorKind::InvalidSignature => TokenError::InvalidSignature,
                _ => TokenError::Malformed(e.to_string()),
            })
    }
}

// =============================================================================
// Passwords
// =============================================================================

/// Salted argon2 password hashing
pub struct Passwords;

impl Passwords {
    /// Hash a clear-text password into a PHC string
    pub fn hash(password: &str) -> Result<String, ApiError> {
        let salt = SaltString::generate(&mut rand::rngs::OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ApiError::internal(format!("password hashing failed: {}", e)))
    }

    /// Check a clear-text password against a stored hash
    ///
    /// An unparsable hash never verifies.
    pub fn verify(password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!(error = %e, "stored password hash is not a valid PHC string");
                false
            }
        }
    }

    /// Hash off the async runtime
    pub async fn hash_blocking(password: String) -> Result<String, ApiError> {
        tokio::task::spawn_blocking(move || Self::hash(&password))
            .await
            .map_err(|e| ApiError::internal(format!("hashing task failed: {}", e)))?
    }

    /// Verify off the async runtime
    pub async fn verify_blocking(password: String, hash: String) -> Result<bool, ApiError> {
        tokio::task::spawn_blocking(move || Self::verify(&password, &hash))
            .await
            .map_err(|e| ApiError::internal(format!("verification task failed: {}", e)))
    }
}

// =============================================================================
// Gate
// =============================================================================

/// Resolves bearer tokens to admins and checks roles
#[derive(Clone)]
pub struct AuthGate {
    tokens: Arc<dyn TokenService>,
    admins: Arc<dyn Repository<Admin>>,
}

impl AuthGate {
    pub fn new(tokens: Arc<dyn TokenService>, admins: Arc<dyn Repository<Admin>>) -> Self {
        Self { tokens, admins }
    }

    pub fn tokens(&self) -> &Arc<dyn TokenService> {
        &self.tokens
    }

    /// Resolve the `Authorization` header value to an authenticated admin
    pub async fn authenticate(&self, authorization: Option<&str>) -> Result<AuthContext, ApiError> {
        let token = authorization
            .map(|value| value.strip_prefix("Bearer ").unwrap_or(value).trim())
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingToken)?;

        let claims = self.tokens.verify(token).map_err(|e| {
            tracing::debug!(reason = %e, "bearer token rejected");
            AuthError::InvalidToken
        })?;
        let admin_id = claims.subject().map_err(|e| {
            tracing::debug!(reason = %e, "bearer token subject rejected");
            AuthError::InvalidToken
        })?;

        let admin = self
            .admins
            .find_by_id(&admin_id)
            .await?
            .ok_or(AuthError::AdminNotFound)?;

        Ok(AuthContext::from(&admin))
    }

    /// Check that the context's role is one of `allowed`
    pub fn authorize(&self, context: &AuthContext, allowed: &[Role]) -> Result<(), ApiError> {
        authorize(context, allowed)
    }
}

/// Exact role membership check
pub fn authorize(context: &AuthContext, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&context.role) {
        Ok(())
    } else {
        tracing::debug!(admin = %context.username, role = %context.role, "role not allowed");
        Err(ApiError::forbidden("Accès refusé. Rôle insuffisant."))
    }
}

/// Route-level access requirement used by [`enforce_access`]
#[derive(Clone)]
pub struct AccessPolicy {
    gate: Arc<AuthGate>,
    roles: Option<&'static [Role]>,
}

impl AccessPolicy {
    /// Any authenticated admin
    pub fn authenticated(gate: Arc<AuthGate>) -> Self {
        Self { gate, roles: None }
    }

    /// Authenticated admin holding one of `roles`
    pub fn roles(gate: Arc<AuthGate>, roles: &'static [Role]) -> Self {
        Self {
            gate,
            roles: Some(roles),
        }
    }
}

/// Middleware that authenticates the request and attaches its [`AuthContext`]
///
/// Use with `axum::middleware::from_fn_with_state(policy, enforce_access)`.
pub async fn enforce_access(
    State(policy): State<AccessPolicy>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let context = policy.gate.authenticate(header).await?;
    if let Some(roles) = policy.roles {
        policy.gate.authorize(&context, roles)?;
    }

    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}
