//! Category model and request payloads

use crate::core::field::FieldValue;
use crate::core::slug::slugify;
use crate::core::timestamp;
use crate::core::validation::{Normalize, filters};
use crate::storage::Record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A node of the category hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    #[serde(rename = "nom")]
    pub name: String,
    pub slug: String,
    /// `null` for top-level categories
    #[serde(rename = "parentId", default)]
    pub parent_id: Option<Uuid>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    #[serde(rename = "createdAt", with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt", with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// New category with its slug derived from `name`
    pub fn new(
        name: &str,
        description: &str,
        parent_id: Option<Uuid>,
        image: &str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: slugify(name),
            parent_id,
            description: description.to_string(),
            image: image.to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Rename, re-deriving the slug
    pub fn rename(&mut self, name: &str) {
        self.name = name.to_string();
        self.slug = slugify(name);
    }
}

impl Record for Category {
    fn collection() -> &'static str {
        "categories"
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn unique_fields() -> &'static [&'static str] {
        &["nom", "slug"]
    }

    fn sortable_fields() -> &'static [&'static str] {
        &["nom", "createdAt", "updatedAt"]
    }

    fn field_value(&self, field: &str) -> Option<FieldValue> {
        match field {
            "_id" | "id" => Some(self.id.into()),
            "nom" => Some(self.name.as_str().into()),
            "slug" => Some(self.slug.as_str().into()),
            "parentId" => Some(self.parent_id.into()),
            "createdAt" => Some(self.created_at.into()),
            "updatedAt" => Some(self.updated_at.into()),
            _ => None,
        }
    }
}

/// Create payload
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct CategoryInput {
    #[validate(length(min = 1, message = "Le nom est requis"))]
    pub nom: String,
    pub description: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub parent_id: Option<Uuid>,
    pub image: Option<String>,
}

impl Normalize for CategoryInput {
    fn normalize(&mut self) {
        filters::trim(&mut self.nom);
    }
}

/// Partial update payload
///
/// `parentId` distinguishes an absent field (keep the parent) from `null` or
/// `""` (detach to top level).
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct CategoryUpdate {
    #[validate(length(min = 1, message = "Le nom est requis"))]
    pub nom: Option<String>,
    pub description: Option<String>,
    #[serde(deserialize_with = "present_blank_as_none")]
    pub parent_id: Option<Option<Uuid>>,
    pub image: Option<String>,
}

impl Normalize for CategoryUpdate {
    fn normalize(&mut self) {
        filters::trim_opt(&mut self.nom);
    }
}

/// `null`, `""` and missing all mean "no parent"
fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Uuid>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => Uuid::parse_str(value)
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("parentId invalide: {}", value))),
    }
}

fn present_blank_as_none<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Option<Uuid>>, D::Error> {
    blank_as_none(deserializer).map(Some)
}
