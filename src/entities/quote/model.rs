//! Quote request model and payloads

use crate::core::code::{CodeKind, Coded};
use crate::core::field::FieldValue;
use crate::core::timestamp;
use crate::core::validation::{Normalize, filters};
use crate::entities::client::{Client, ClientInput};
use crate::storage::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum QuoteStatus {
    #[default]
    #[serde(rename = "en_cours")]
    InProgress,
    #[serde(rename = "traite")]
    Processed,
}

impl QuoteStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuoteStatus::InProgress => "en_cours",
            QuoteStatus::Processed => "traite",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        [QuoteStatus::InProgress, QuoteStatus::Processed]
            .into_iter()
            .find(|status| status.as_str() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteLine {
    #[serde(rename = "produitId")]
    pub product_id: Uuid,
    #[serde(rename = "quantite")]
    pub quantity: u32,
    #[serde(rename = "besoinsSpecifiques", default)]
    pub requirements: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub id: Uuid,
    #[serde(rename = "numeroDevis", default)]
    pub code: Option<String>,
    pub client: Client,
    #[serde(rename = "produits")]
    pub lines: Vec<QuoteLine>,
    #[serde(rename = "statut", default)]
    pub status: QuoteStatus,
    #[serde(default)]
    pub notes: String,
    #[serde(rename = "createdAt", with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Quote {
    pub fn new(client: Client, lines: Vec<QuoteLine>, notes: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: None,
            client,
            lines,
            status: QuoteStatus::InProgress,
            notes,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for Quote {
    fn collection() -> &'static str {
        "quotes"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_fields() -> &'static [&'static str] {
        &["numeroDevis"]
    }

    fn sortable_fields() -> &'static [&'static str] {
        &["createdAt", "updatedAt", "numeroDevis", "statut"]
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "_id" | "id" => Some(self.id.into()),
            "numeroDevis" => Some(
                self.code
                    .as_deref()
                    .map(FieldValue::from)
                    .unwrap_or(FieldValue::Null),
            ),
            "statut" => Some(self.status.as_str().into()),
            "client.email" => Some(self.client.email.as_str().into()),
            "createdAt" => Some(self.created_at.into()),
            "updatedAt" => Some(self.updated_at.into()),
            _ => None,
        }
    }
}

impl Coded for Quote {
    const KIND: CodeKind = CodeKind::Quote;

    fn code_field() -> &'static str {
        "numeroDevis"
    }

    fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    fn set_code(&mut self, code: Option<String>) {
        self.code = code;
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct QuoteLineInput {
    #[validate(required(message = "ID produit manquant"))]
    pub produit_id: Option<Uuid>,
    /// Defaults to 1
    #[validate(range(min = 1, message = "La quantité doit être au moins 1"))]
    pub quantite: Option<u32>,
    pub besoins_specifiques: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct QuoteInput {
    #[validate(nested)]
    pub client: ClientInput,
    #[validate(length(min = 1, message = "Au moins un produit est requis"), nested)]
    pub produits: Vec<QuoteLineInput>,
    pub notes: Option<String>,
}

impl Normalize for QuoteInput {
    fn normalize(&mut self) {
        self.client.normalize();
        filters::trim_opt(&mut self.notes);
    }
}

/// Body of `PUT /quotes/{id}/status`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct QuoteStatusUpdate {
    pub statut: Option<String>,
    pub notes: Option<String>,
}

impl Normalize for QuoteStatusUpdate {
    fn normalize(&mut self) {
        filters::trim_opt(&mut self.statut);
    }
}
