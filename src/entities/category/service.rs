//! Category hierarchy service

use super::model::{Category, CategoryInput, CategoryUpdate};
use crate::core::error::ApiError;
use crate::core::slug::slugify;
use crate::core::tree::{CategoryTree, build_category_tree};
use crate::storage::{Filter, FindOptions, Repository, Sort, StoreError};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

const NOT_FOUND: &str = "Catégorie non trouvée";
const DUPLICATE_NAME: &str = "Une catégorie avec ce nom existe déjà";
const HAS_CHILDREN: &str = "Impossible de supprimer une catégorie qui a des sous-catégories";
const PARENT_NOT_FOUND: &str = "Catégorie parente non trouvée";
const CYCLE: &str = "Une catégorie ne peut pas être placée sous elle-même ou sous une de ses sous-catégories";
const EMPTY_SLUG: &str = "Le nom de la catégorie doit contenir au moins une lettre ou un chiffre";

#[derive(Clone)]
pub struct CategoryService {
    categories: Arc<dyn Repository<Category>>,
}

impl CategoryService {
    pub fn new(categories: Arc<dyn Repository<Category>>) -> Self {
        Self { categories }
    }

    /// The whole hierarchy, plus the flat list sorted by name
    pub async fn tree(&self) -> Result<CategoryTree, ApiError> {
        let all = self
            .categories
            .find_many(&Filter::new(), &FindOptions::sorted(Sort::asc("nom")))
            .await?;
        let tree = build_category_tree(all);

        let orphans = tree.flat.len() - tree.node_count();
        if orphans > 0 {
            tracing::warn!(orphans, "categories unreachable from a root were left out of the tree");
        }
        Ok(tree)
    }

    pub async fn get(&self, id: &Uuid) -> Result<Category, ApiError> {
        self.categories
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))
    }

    pub async fn create(&self, input: CategoryInput) -> Result<Category, ApiError> {
        let slug = slugify(&input.nom);
        if slug.is_empty() {
            return Err(ApiError::validation(EMPTY_SLUG));
        }
        self.ensure_slug_free(&slug, None).await?;
        if let Some(parent_id) = input.parent_id {
            self.ensure_parent_exists(&parent_id).await?;
        }

        let category = Category::new(
            &input.nom,
            input.description.as_deref().unwrap_or_default(),
            input.parent_id,
            input.image.as_deref().unwrap_or_default(),
            Utc::now(),
        );

        let category = self
            .categories
            .insert(category)
            .await
            .map_err(duplicate_name)?;
        tracing::info!(id = %category.id, slug = %category.slug, "category created");
        Ok(category)
    }

    pub async fn update(&self, id: &Uuid, update: CategoryUpdate) -> Result<Category, ApiError> {
        let mut category = self.get(id).await?;

        if let Some(name) = update.nom.filter(|name| *name != category.name) {
            let slug = slugify(&name);
            if slug.is_empty() {
                return Err(ApiError::validation(EMPTY_SLUG));
            }
            self.ensure_slug_free(&slug, Some(id)).await?;
            category.rename(&name);
        }
        if let Some(description) = update.description {
            category.description = description;
        }
        if let Some(image) = update.image {
            category.image = image;
        }
        if let Some(parent_id) = update.parent_id {
            if let Some(parent_id) = parent_id {
                self.ensure_parent_exists(&parent_id).await?;
                self.ensure_not_descendant(id, parent_id).await?;
            }
            category.parent_id = parent_id;
        }
        category.updated_at = Utc::now();

        self.categories
            .update_by_id(id, category)
            .await
            .map_err(duplicate_name)?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))
    }

    /// Delete a leaf category
    pub async fn delete(&self, id: &Uuid) -> Result<(), ApiError> {
        let children = self
            .categories
            .count(&Filter::new().eq("parentId", *id))
            .await?;
        if children > 0 {
            return Err(ApiError::bad_request(HAS_CHILDREN));
        }

        self.categories
            .delete_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
        tracing::info!(%id, "category deleted");
        Ok(())
    }

    async fn ensure_slug_free(&self, slug: &str, except: Option<&Uuid>) -> Result<(), ApiError> {
        let mut filter = Filter::new().eq("slug", slug);
        if let Some(id) = except {
            filter = filter.ne("_id", *id);
        }

        match self.categories.find_one(&filter).await? {
            Some(_) => Err(ApiError::duplicate(DUPLICATE_NAME)),
            None => Ok(()),
        }
    }

    async fn ensure_parent_exists(&self, parent_id: &Uuid) -> Result<(), ApiError> {
        match self.categories.find_by_id(parent_id).await? {
            Some(_) => Ok(()),
            None => Err(ApiError::bad_request(PARENT_NOT_FOUND)),
        }
    }

    /// Reject moving `id` under itself or under one of its descendants
    async fn ensure_not_descendant(&self, id: &Uuid, new_parent: Uuid) -> Result<(), ApiError> {
        let mut visited = HashSet::new();
        let mut cursor = Some(new_parent);

        while let Some(current) = cursor {
            if current == *id {
                return Err(ApiError::bad_request(CYCLE));
            }
            // A pre-existing cycle elsewhere must not hang the walk.
            if !visited.insert(current) {
                break;
            }
            cursor = self
                .categories
                .find_by_id(&current)
                .await?
                .and_then(|category| category.parent_id);
        }
        Ok(())
    }
}

fn duplicate_name(err: StoreError) -> ApiError {
    if err.is_duplicate_of("nom") || err.is_duplicate_of("slug") {
        ApiError::duplicate(DUPLICATE_NAME)
    } else {
        err.into()
    }
}
