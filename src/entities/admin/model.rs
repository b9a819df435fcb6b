//! Admin account model and request payloads

use crate::core::auth::Role;
use crate::core::field::FieldValue;
use crate::core::timestamp;
use crate::core::validation::{Normalize, filters};
use crate::storage::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_COUNTRY: &str = "Tunisie";
pub const MIN_PASSWORD_LEN: usize = 6;

/// A back-office account
///
/// Only the argon2 hash of the password is stored. Responses use
/// [`AdminProfile`] or [`AuthContext`](crate::core::auth::AuthContext), never
/// this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admin {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(rename = "passwordHash")]
    pub password_hash: String,
    #[serde(default)]
    pub role: Role,
    #[serde(rename = "nomComplet", default)]
    pub full_name: Option<String>,
    #[serde(rename = "telephone", default)]
    pub phone: Option<String>,
    #[serde(rename = "adresse", default)]
    pub address: Option<String>,
    #[serde(rename = "ville", default)]
    pub city: Option<String>,
    #[serde(rename = "codePostal", default)]
    pub postal_code: Option<String>,
    #[serde(rename = "pays", default = "default_country")]
    pub country: String,
    #[serde(rename = "lastLogin", default, with = "timestamp::option")]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt", with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

impl Admin {
    /// New account; `username` and `email` are stored lowercased
    pub fn new(
        username: &str,
        email: &str,
        password_hash: &str,
        role: Role,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.trim().to_lowercase(),
            email: email.trim().to_lowercase(),
            password_hash: password_hash.to_string(),
            role,
            full_name: None,
            phone: None,
            address: None,
            city: None,
            postal_code: None,
            country: default_country(),
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn profile(&self) -> AdminProfile {
        AdminProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            role: self.role,
            last_login: self.last_login,
            full_name: self.full_name.clone(),
            phone: self.phone.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            postal_code: self.postal_code.clone(),
            country: self.country.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl Record for Admin {
    fn collection() -> &'static str {
        "admins"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_fields() -> &'static [&'static str] {
        &["username", "email"]
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "_id" | "id" => Some(self.id.into()),
            "username" => Some(self.username.as_str().into()),
            "email" => Some(self.email.as_str().into()),
            "role" => Some(self.role.as_str().into()),
            "createdAt" => Some(self.created_at.into()),
            "updatedAt" => Some(self.updated_at.into()),
            _ => None,
        }
    }
}

/// Admin account as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
    #[serde(with = "timestamp::option")]
    pub last_login: Option<DateTime<Utc>>,
    #[serde(rename = "nomComplet")]
    pub full_name: Option<String>,
    #[serde(rename = "telephone")]
    pub phone: Option<String>,
    #[serde(rename = "adresse")]
    pub address: Option<String>,
    #[serde(rename = "ville")]
    pub city: Option<String>,
    #[serde(rename = "codePostal")]
    pub postal_code: Option<String>,
    #[serde(rename = "pays")]
    pub country: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Normalize for LoginRequest {
    fn normalize(&mut self) {
        filters::trim_lowercase_opt(&mut self.username);
    }
}

/// Body of `PUT /auth/profile`; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub nom_complet: Option<String>,
    pub telephone: Option<String>,
    pub adresse: Option<String>,
    pub ville: Option<String>,
    pub code_postal: Option<String>,
    pub pays: Option<String>,
    #[validate(email(message = "Email invalide"))]
    pub email: Option<String>,
}

impl Normalize for ProfileUpdate {
    fn normalize(&mut self) {
        filters::trim_opt(&mut self.nom_complet);
        filters::trim_opt(&mut self.telephone);
        filters::trim_opt(&mut self.adresse);
        filters::trim_opt(&mut self.ville);
        filters::trim_opt(&mut self.code_postal);
        filters::trim_opt(&mut self.pays);
        filters::trim_lowercase_opt(&mut self.email);
    }
}

impl ProfileUpdate {
    /// Copy the profile fields onto `admin`; the email is handled separately
    pub fn apply(self, admin: &mut Admin) {
        if let Some(v) = self.nom_complet {
            admin.full_name = Some(v);
        }
        if let Some(v) = self.telephone {
            admin.phone = Some(v);
        }
        if let Some(v) = self.adresse {
            admin.address = Some(v);
        }
        if let Some(v) = self.ville {
            admin.city = Some(v);
        }
        if let Some(v) = self.code_postal {
            admin.postal_code = Some(v);
        }
        if let Some(v) = self.pays {
            admin.country = v;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

impl Normalize for PasswordChange {}

/// Input of [`AdminService::create_admin`](super::AdminService::create_admin)
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}
