//! Order model and request payloads

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

/// Order lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "en_attente")]
    Pending,
    #[serde(rename = "en_traitement")]
    Processing,
    #[serde(rename = "expediee")]
    Shipped,
    #[serde(rename = "annulee")]
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "en_attente",
            OrderStatus::Processing => "en_traitement",
            OrderStatus::Shipped => "expediee",
            OrderStatus::Cancelled => "annulee",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }

    /// Sentence sent to the customer when the order moves to this status
    pub fn customer_message(&self) -> Option<&'static str> {
        match self {
            OrderStatus::Pending => None,
            OrderStatus::Processing => Some("Votre commande est en cours de traitement"),
            OrderStatus::Shipped => Some("Votre commande a été expédiée"),
            OrderStatus::Cancelled => Some("Votre commande a été annulée"),
        }
    }
}

/// One ordered product, priced when the order was placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderLine {
    #[serde(rename = "produitId")]
    pub product_id: Uuid,
    #[serde(rename = "quantite")]
    pub quantity: u32,
    #[serde(rename = "prixUnitaire")]
    pub unit_price: f64,
    #[serde(rename = "personnalisation", default)]
    pub customization: String,
}

impl OrderLine {
    pub fn subtotal(&self) -> f64 {
        self.unit_price * f64::from(self.quantity)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    /// Assigned once, right before the first insert
    #[serde(rename = "numeroCommande", default)]
    pub code: Option<String>,
    pub client: Client,
    #[serde(rename = "produits")]
    pub lines: Vec<OrderLine>,
    pub total: f64,
    #[serde(rename = "statut", default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub instructions: String,
    #[serde(rename = "createdAt", with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// New pending order; the total is computed from the lines
    pub fn new(client: Client, lines: Vec<OrderLine>, instructions: String, now: DateTime<Utc>) -> Self {
        let total = lines.iter().map(OrderLine::subtotal).sum();
        Self {
            id: Uuid::new_v4(),
            code: None,
            client,
            lines,
            total,
            status: OrderStatus::Pending,
            instructions,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for Order {
    fn collection() -> &'static str {
        "orders"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_fields() -> &'static [&'static str] {
        &["numeroCommande"]
    }

    fn sortable_fields() -> &'static [&'static str] {
        &["createdAt", "updatedAt", "numeroCommande", "total", "statut"]
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "_id" | "id" => Some(self.id.into()),
            "numeroCommande" => Some(
                self.code
                    .as_deref()
                    .map(FieldValue::from)
                    .unwrap_or(FieldValue::Null),
            ),
            "statut" => Some(self.status.as_str().into()),
            "total" => Some(self.total.into()),
            "client.email" => Some(self.client.email.as_str().into()),
            "createdAt" => Some(self.created_at.into()),
            "updatedAt" => Some(self.updated_at.into()),
            _ => None,
        }
    }
}

impl Coded for Order {
    const KIND: CodeKind = CodeKind::Order;

    fn code_field() -> &'static str {
        "numeroCommande"
    }

    fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    fn set_code(&mut self, code: Option<String>) {
        self.code = code;
    }
}

/// A requested line; the price is looked up, never taken from the client
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct OrderLineInput {
    #[validate(required(message = "ID produit manquant"))]
    pub produit_id: Option<Uuid>,
    #[validate(
        required(message = "La quantité est requise"),
        range(min = 1, message = "La quantité doit être au moins 1")
    )]
    pub quantite: Option<u32>,
    pub personnalisation: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct OrderInput {
    #[validate(nested)]
    pub client: ClientInput,
    #[validate(length(min = 1, message = "Au moins un produit est requis"), nested)]
    pub produits: Vec<OrderLineInput>,
    pub instructions: Option<String>,
}

impl Normalize for OrderInput {
    fn normalize(&mut self) {
        self.client.normalize();
        filters::trim_opt(&mut self.instructions);
    }
}

/// Body of `PUT /orders/{id}/status`
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct OrderStatusUpdate {
    pub statut: Option<String>,
}

impl Normalize for OrderStatusUpdate {
    fn normalize(&mut self) {
        filters::trim_opt(&mut self.statut);
    }
}

#[cfg(test)]
pub(crate) fn sample_order() -> Order {
    Order::new(
        Client {
            name: "Alice".into(),
            company: String::new(),
            email: "alice@example.com".into(),
            phone: "+216 20 000 000".into(),
            address: "Tunis".into(),
        },
        vec![OrderLine {
            product_id: Uuid::new_v4(),
            quantity: 2,
            unit_price: 45.0,
            customization: String::new(),
        }],
        String::new(),
        Utc::now(),
    )
}
