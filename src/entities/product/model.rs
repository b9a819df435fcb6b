//! Product model and request payloads

use crate::core::field::FieldValue;
use crate::core::timestamp;
use crate::core::validation::{Normalize, filters};
use crate::storage::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_DELIVERY_DELAY: &str = "Sur demande";

/// A catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    #[serde(rename = "nom")]
    pub name: String,
    #[serde(rename = "categorie")]
    pub category: String,
    #[serde(rename = "sousCategorie")]
    pub subcategory: String,
    pub description: String,
    #[serde(rename = "descriptionTechnique", default)]
    pub technical_description: String,
    #[serde(rename = "prix")]
    pub price: f64,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(rename = "materiaux", default)]
    pub materials: Vec<String>,
    #[serde(rename = "personnalisation", default)]
    pub customization: Vec<String>,
    #[serde(rename = "recommandations", default)]
    pub recommendations: Vec<Uuid>,
    #[serde(default)]
    pub stock: i64,
    #[serde(rename = "delaiLivraison", default = "default_delivery_delay")]
    pub delivery_delay: String,
    #[serde(rename = "gravureLaser", default)]
    pub laser_engraving: bool,
    #[serde(rename = "resine", default)]
    pub resin: bool,
    #[serde(rename = "createdAt", with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

fn default_delivery_delay() -> String {
    DEFAULT_DELIVERY_DELAY.to_string()
}

impl Product {
    /// Build a new product from a validated create payload
    pub fn from_input(input: ProductInput, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: input.nom,
            category: input.categorie,
            subcategory: input.sous_categorie,
            description: input.description,
            technical_description: input.description_technique.unwrap_or_default(),
            price: input.prix.unwrap_or_default(),
            images: input.images.unwrap_or_default(),
            videos: input.videos.unwrap_or_default(),
            materials: input.materiaux.unwrap_or_default(),
            customization: input.personnalisation.unwrap_or_default(),
            recommendations: input.recommandations.unwrap_or_default(),
            stock: input.stock.unwrap_or_default(),
            delivery_delay: input
                .delai_livraison
                .filter(|d| !d.is_empty())
                .unwrap_or_else(default_delivery_delay),
            laser_engraving: input.gravure_laser.unwrap_or(false),
            resin: input.resine.unwrap_or(false),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply a partial update; absent fields are left untouched
    pub fn apply(&mut self, update: ProductUpdate, now: DateTime<Utc>) {
        if let Some(v) = update.nom {
            self.name = v;
        }
        if let Some(v) = update.categorie {
            self.category = v;
        }
        if let Some(v) = update.sous_categorie {
            self.subcategory = v;
        }
        if let Some(v) = update.description {
            self.description = v;
        }
        if let Some(v) = update.description_technique {
            self.technical_description = v;
        }
        if let Some(v) = update.prix {
            self.price = v;
        }
        if let Some(v) = update.images {
            self.images = v;
        }
        if let Some(v) = update.videos {
            self.videos = v;
        }
        if let Some(v) = update.materiaux {
            self.materials = v;
        }
        if let Some(v) = update.personnalisation {
            self.customization = v;
        }
        if let Some(v) = update.recommandations {
            self.recommendations = v;
        }
        if let Some(v) = update.stock {
            self.stock = v;
        }
        if let Some(v) = update.delai_livraison {
            self.delivery_delay = v;
        }
        if let Some(v) = update.gravure_laser {
            self.laser_engraving = v;
        }
        if let Some(v) = update.resine {
            self.resin = v;
        }
        self.updated_at = now;
    }

    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            name: self.name.clone(),
            images: self.images.clone(),
            price: self.price,
        }
    }
}

impl Record for Product {
    fn collection() -> &'static str {
        "products"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn text_fields() -> &'static [&'static str] {
        &["nom", "description"]
    }

    fn sortable_fields() -> &'static [&'static str] {
        &["createdAt", "updatedAt", "nom", "prix", "stock"]
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "_id" | "id" => Some(self.id.into()),
            "nom" => Some(self.name.as_str().into()),
            "categorie" => Some(self.category.as_str().into()),
            "sousCategorie" => Some(self.subcategory.as_str().into()),
            "description" => Some(self.description.as_str().into()),
            "prix" => Some(self.price.into()),
            "stock" => Some(self.stock.into()),
            "gravureLaser" => Some(self.laser_engraving.into()),
            "resine" => Some(self.resin.into()),
            "createdAt" => Some(self.created_at.into()),
            "updatedAt" => Some(self.updated_at.into()),
            _ => None,
        }
    }
}

/// Fields of a referenced product shown inside other records
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: Uuid,
    #[serde(rename = "nom")]
    pub name: String,
    pub images: Vec<String>,
    #[serde(rename = "prix")]
    pub price: f64,
}

/// Create payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductInput {
    #[validate(length(min = 1, message = "Le nom est requis"))]
    pub nom: String,
    #[validate(length(min = 1, message = "La catégorie est requise"))]
    pub categorie: String,
    #[validate(length(min = 1, message = "La sous-catégorie est requise"))]
    pub sous_categorie: String,
    #[validate(length(min = 1, message = "La description est requise"))]
    pub description: String,
    pub description_technique: Option<String>,
    #[validate(
        required(message = "Le prix doit être un nombre"),
        range(min = 0.0, message = "Le prix ne peut pas être négatif")
    )]
    pub prix: Option<f64>,
    pub images: Option<Vec<String>>,
    pub videos: Option<Vec<String>>,
    pub materiaux: Option<Vec<String>>,
    pub personnalisation: Option<Vec<String>>,
    pub recommandations: Option<Vec<Uuid>>,
    #[validate(
        required(message = "Le stock doit être un entier positif"),
        range(min = 0, message = "Le stock doit être un entier positif")
    )]
    pub stock: Option<i64>,
    pub delai_livraison: Option<String>,
    pub gravure_laser: Option<bool>,
    pub resine: Option<bool>,
}

impl Normalize for ProductInput {
    fn normalize(&mut self) {
        filters::trim(&mut self.nom);
        filters::trim(&mut self.categorie);
        filters::trim(&mut self.sous_categorie);
        filters::trim(&mut self.description);
        filters::trim_opt(&mut self.delai_livraison);
    }
}

/// Partial update payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductUpdate {
    #[validate(length(min = 1, message = "Le nom est requis"))]
    pub nom: Option<String>,
    #[validate(length(min = 1, message = "La catégorie est requise"))]
    pub categorie: Option<String>,
    #[validate(length(min = 1, message = "La sous-catégorie est requise"))]
    pub sous_categorie: Option<String>,
    #[validate(length(min = 1, message = "La description est requise"))]
    pub description: Option<String>,
    pub description_technique: Option<String>,
    #[validate(range(min = 0.0, message = "Le prix ne peut pas être négatif"))]
    pub prix: Option<f64>,
    pub images: Option<Vec<String>>,
    pub videos: Option<Vec<String>>,
    pub materiaux: Option<Vec<String>>,
    pub personnalisation: Option<Vec<String>>,
    pub recommandations: Option<Vec<Uuid>>,
    #[validate(range(min = 0, message = "Le stock ne peut pas être négatif"))]
    pub stock: Option<i64>,
    pub delai_livraison: Option<String>,
    pub gravure_laser: Option<bool>,
    pub resine: Option<bool>,
}

impl Normalize for ProductUpdate {
    fn normalize(&mut self) {
        filters::trim_opt(&mut self.nom);
        filters::trim_opt(&mut self.categorie);
        filters::trim_opt(&mut self.sous_categorie);
        filters::trim_opt(&mut self.description);
        filters::trim_opt(&mut self.delai_livraison);
    }
}

#[cfg(test)]
pub(crate) fn sample_product(name: &str, price: f64, stock: i64) -> Product {
    Product::from_input(
        ProductInput {
            nom: name.to_string(),
            categorie: "decoration".into(),
            sous_categorie: "vases".into(),
            description: format!("{} fait main", name),
            prix: Some(price),
            stock: Some(stock),
            ..Default::default()
        },
        Utc::now(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_on_create() {
        let product = sample_product("Vase", 45.0, 3);
        assert_eq!(product.delivery_delay, DEFAULT_DELIVERY_DELAY);
        assert!(!product.laser_engraving);
        assert!(product.recommendations.is_empty());
        assert_eq!(product.created_at, product.updated_at);
    }

    #[test]
    fn test_missing_price_and_stock_rejected() {
        let input = ProductInput {
            nom: "Vase".into(),
            categorie: "decoration".into(),
            sous_categorie: "vases".into(),
            description: "Vase".into(),
            ..Default::default()
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("prix"));
        assert!(fields.contains_key("stock"));
    }

    #[test]
    fn test_negative_values_rejected() {
        let update = ProductUpdate {
            prix: Some(-1.0),
            stock: Some(-2),
            ..Default::default()
        };
        assert_eq!(update.validate().unwrap_err().field_errors().len(), 2);
    }

    #[test]
    fn test_apply_partial_update() {
        let mut product = sample_product("Vase", 45.0, 3);
        let later = product.updated_at + chrono::Duration::seconds(5);
        product.apply(
            ProductUpdate {
                prix: Some(50.0),
                gravure_laser: Some(true),
                ..Default::default()
            },
            later,
        );
        assert_eq!(product.price, 50.0);
        assert!(product.laser_engraving);
        assert_eq!(product.name, "Vase");
        assert_eq!(product.updated_at, later);
    }

    #[test]
    fn test_wire_names() {
        let json = serde_json::to_value(sample_product("Vase", 45.0, 3)).unwrap();
        assert_eq!(json["nom"], "Vase");
        assert_eq!(json["sousCategorie"], "vases");
        assert_eq!(json["delaiLivraison"], "Sur demande");
        assert_eq!(json["gravureLaser"], false);
        assert!(json["createdAt"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn test_camel_case_payload() {
        let input: ProductInput = serde_json::from_value(serde_json::json!({
            "nom": "Vase",
            "sousCategorie": "vases",
            "gravureLaser": true,
            "prix": 12.5
        }))
        .unwrap();
        assert_eq!(input.sous_categorie, "vases");
        assert_eq!(input.gravure_laser, Some(true));
    }
}
