//! Contact form payload

use crate::core::validation::{Normalize, filters};
use serde::Deserialize;
use validator::Validate;

/// A message sent through the contact form; it is emailed, never stored
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ContactMessage {
    #[serde(rename = "nom")]
    #[validate(length(min = 1, message = "Le nom est requis"))]
    pub name: String,
    #[validate(email(message = "Email invalide"))]
    pub email: String,
    #[serde(rename = "telephone")]
    pub phone: Option<String>,
    #[serde(rename = "sujet")]
    pub subject: Option<String>,
    #[validate(length(min = 1, message = "Le message est requis"))]
    pub message: String,
}

impl ContactMessage {
    pub fn subject_or_default(&self) -> &str {
        self.subject
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or("Sans sujet")
    }
}

impl Normalize for ContactMessage {
    fn normalize(&mut self) {
        filters::trim(&mut self.name);
        filters::trim_lowercase(&mut self.email);
        filters::trim_opt(&mut self.phone);
        filters::trim_opt(&mut self.subject);
        filters::trim(&mut self.message);
        if self.phone.as_deref() == Some("") {
            self.phone = None;
        }
    }
}
