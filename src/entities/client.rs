//! Customer details attached to orders and quotes

use crate::core::validation::{Normalize, filters};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Customer contact block, stored inside the order or quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "societe", default)]
    pub company: String,
    pub email: String,
    #[serde(rename = "telephone")]
    pub phone: String,
    #[serde(rename = "adresse")]
    pub address: String,
}

/// Customer block as submitted by the storefront
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ClientInput {
    #[validate(length(min = 1, message = "Le nom du client est requis"))]
    pub nom: String,
    pub societe: Option<String>,
    #[validate(email(message = "Email invalide"))]
    pub email: String,
    #[validate(length(min = 1, message = "Le téléphone est requis"))]
    pub telephone: String,
    #[validate(length(min = 1, message = "L'adresse est requise"))]
    pub adresse: String,
}

impl Normalize for ClientInput {
    fn normalize(&mut self) {
        filters::trim(&mut self.nom);
        filters::trim_opt(&mut self.societe);
        filters::trim_lowercase(&mut self.email);
        filters::trim(&mut self.telephone);
        filters::trim(&mut self.adresse);
    }
}

impl From<ClientInput> for Client {
    fn from(input: ClientInput) -> Self {
        Self {
            name: input.nom,
            company: input.societe.unwrap_or_default(),
            email: input.email,
            phone: input.telephone,
            address: input.adresse,
        }
    }
}
