//! Product catalog service

use super::model::{Product, ProductInput, ProductSummary, ProductUpdate};
use crate::core::error::ApiError;
use crate::core::query::{ListParams, PaginationMeta};
use crate::storage::{Filter, FindOptions, Record, Repository, Sort};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: u64 = 12;
const NOT_FOUND: &str = "Produit non trouvé";

/// Query string of `GET /products`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProductQuery {
    #[serde(flatten)]
    pub list: ListParams,
    pub category: Option<String>,
    #[serde(rename = "sousCategorie")]
    pub subcategory: Option<String>,
    pub search: Option<String>,
}

impl ProductQuery {
    fn filter(&self) -> Filter {
        let mut filter = Filter::new();
        if let Some(category) = non_empty(&self.category) {
            filter = filter.eq("categorie", category);
        }
        if let Some(subcategory) = non_empty(&self.subcategory) {
            filter = filter.eq("sousCategorie", subcategory);
        }
        if let Some(search) = non_empty(&self.search) {
            filter = filter.text(search);
        }
        filter
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// One page of products with their recommendations resolved
#[derive(Debug, Serialize)]
pub struct ProductPage {
    pub products: Vec<Value>,
    pub pagination: PaginationMeta,
}

#[derive(Clone)]
pub struct ProductService {
    products: Arc<dyn Repository<Product>>,
}

impl ProductService {
    pub fn new(products: Arc<dyn Repository<Product>>) -> Self {
        Self { products }
    }

    pub async fn list(&self, query: &ProductQuery) -> Result<ProductPage, ApiError> {
        let filter = query.filter();
        let page = query.list.page();
        let limit = query.list.limit(DEFAULT_PAGE_SIZE);
        let options = FindOptions::page(
            query.list.sort(Product::sortable_fields()),
            query.list.skip(DEFAULT_PAGE_SIZE),
            limit,
        );

        let total = self.products.count(&filter).await?;
        let products = self.products.find_many(&filter, &options).await?;
        tracing::debug!(total, returned = products.len(), "products listed");

        Ok(ProductPage {
            products: self.populate_all(&products).await?,
            pagination: PaginationMeta::new(page, limit, total),
        })
    }

    pub async fn list_by_category(
        &self,
        category: &str,
        subcategory: Option<&str>,
    ) -> Result<Vec<Value>, ApiError> {
        let mut filter = Filter::new().eq("categorie", category);
        if let Some(subcategory) = subcategory.filter(|s| !s.is_empty()) {
            filter = filter.eq("sousCategorie", subcategory);
        }

        let products = self
            .products
            .find_many(&filter, &FindOptions::sorted(Sort::desc("createdAt")))
            .await?;
        self.populate_all(&products).await
    }

    pub async fn get(&self, id: &Uuid) -> Result<Value, ApiError> {
        let product = self.find(id).await?;
        self.populate(&product).await
    }

    pub async fn create(&self, input: ProductInput) -> Result<Value, ApiError> {
        let product = Product::from_input(input, Utc::now());
        let product = self.products.insert(product).await?;
        tracing::info!(id = %product.id, nom = %product.name, "product created");
        self.populate(&product).await
    }

    pub async fn update(&self, id: &Uuid, update: ProductUpdate) -> Result<Value, ApiError> {
        let mut product = self.find(id).await?;
        product.apply(update, Utc::now());

        let product = self
            .products
            .update_by_id(id, product)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
        self.populate(&product).await
    }

    pub async fn delete(&self, id: &Uuid) -> Result<(), ApiError> {
        self.products
            .delete_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))?;
        tracing::info!(%id, "product deleted");
        Ok(())
    }

    pub async fn find(&self, id: &Uuid) -> Result<Product, ApiError> {
        self.products
            .find_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(NOT_FOUND))
    }

    /// Summaries of the given products, keyed by id, fetched in one query;
    /// unknown ids are skipped
    pub async fn summaries(
        &self,
        mut ids: Vec<Uuid>,
    ) -> Result<HashMap<Uuid, ProductSummary>, ApiError> {
        ids.sort_unstable();
        ids.dedup();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let filter = Filter::new().is_in("_id", ids);
        let products = self
            .products
            .find_many(&filter, &FindOptions::default())
            .await?;
        Ok(products
            .into_iter()
            .map(|product| (product.id, product.summary()))
            .collect())
    }

    async fn populate(&self, product: &Product) -> Result<Value, ApiError> {
        let summaries = self.summaries(product.recommendations.clone()).await?;
        with_recommendations(product, &summaries)
    }

    async fn populate_all(&self, products: &[Product]) -> Result<Vec<Value>, ApiError> {
        let ids: Vec<Uuid> = products
            .iter()
            .flat_map(|p| p.recommendations.iter().copied())
            .collect();
        let summaries = self.summaries(ids).await?;
        products
            .iter()
            .map(|product| with_recommendations(product, &summaries))
            .collect()
    }
}

/// Serialize a product with `recommandations` replaced by product summaries
///
/// Recommendations pointing at deleted products are dropped.
fn with_recommendations(
    product: &Product,
    summaries: &HashMap<Uuid, ProductSummary>,
) -> Result<Value, ApiError> {
    let mut value = serde_json::to_value(product)
        .map_err(|e| ApiError::internal(format!("product serialization failed: {}", e)))?;

    let resolved: Vec<&ProductSummary> = product
        .recommendations
        .iter()
        .filter_map(|id| summaries.get(id))
        .collect();
    let resolved = serde_json::to_value(resolved)
        .map_err(|e| ApiError::internal(format!("summary serialization failed: {}", e)))?;

    if let Some(object) = value.as_object_mut() {
        object.insert("recommandations".to_string(), resolved);
    }
    Ok(value)
}

/// Serialize an order or quote with each `produits[].produitId` replaced by
/// the product summary, or `null` when the product no longer exists
pub fn with_line_products<T: Serialize>(
    record: &T,
    summaries: &HashMap<Uuid, ProductSummary>,
) -> Result<Value, ApiError> {
    let mut value = serde_json::to_value(record)
        .map_err(|e| ApiError::internal(format!("record serialization failed: {}", e)))?;

    if let Some(lines) = value.get_mut("produits").and_then(Value::as_array_mut) {
        for line in lines {
            let Some(reference) = line.get_mut("produitId") else {
                continue;
            };
            let summary = reference
                .as_str()
                .and_then(|raw| Uuid::parse_str(raw).ok())
                .and_then(|id| summaries.get(&id));
            *reference = match summary {
                Some(summary) => serde_json::to_value(summary).map_err(|e| {
                    ApiError::internal(format!("summary serialization failed: {}", e))
                })?,
                None => Value::Null,
            };
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::product::model::sample_product;
    use crate::storage::{InMemoryRepository, StoreResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts lookups before delegating to an in-memory repository
    #[derive(Default)]
    struct CountingRepository {
        inner: InMemoryRepository<Product>,
        by_id: AtomicUsize,
        many: AtomicUsize,
    }

    #[async_trait]
    impl Repository<Product> for CountingRepository {
        async fn count(&self, filter: &Filter) -> StoreResult<u64> {
            self.inner.count(filter).await
        }

        async fn find_many(&self, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Product>> {
            self.many.fetch_add(1, Ordering::SeqCst);
            self.inner.find_many(filter, options).await
        }

        async fn find_one(&self, filter: &Filter) -> StoreResult<Option<Product>> {
            self.inner.find_one(filter).await
        }

        async fn find_by_id(&self, id: &Uuid) -> StoreResult<Option<Product>> {
            self.by_id.fetch_add(1, Ordering::SeqCst);
            self.inner.find_by_id(id).await
        }

        async fn insert(&self, record: Product) -> StoreResult<Product> {
            self.inner.insert(record).await
        }

        async fn update_by_id(&self, id: &Uuid, record: Product) -> StoreResult<Option<Product>> {
            self.inner.update_by_id(id, record).await
        }

        async fn delete_by_id(&self, id: &Uuid) -> StoreResult<Option<Product>> {
            self.inner.delete_by_id(id).await
        }
    }

    async fn service_with(products: Vec<Product>) -> ProductService {
        let repo = Arc::new(InMemoryRepository::<Product>::new());
        for product in products {
            repo.insert(product).await.unwrap();
        }
        ProductService::new(repo)
    }

    #[tokio::test]
    async fn test_recommendations_are_populated() {
        let bougie = sample_product("Bougie", 12.0, 5);
        let mut vase = sample_product("Vase", 45.0, 3);
        vase.recommendations = vec![bougie.id, Uuid::new_v4()];
        let vase_id = vase.id;

        let service = service_with(vec![bougie.clone(), vase]).await;
        let json = service.get(&vase_id).await.unwrap();

        let recommendations = json["recommandations"].as_array().unwrap();
        assert_eq!(recommendations.len(), 1);
        assert_eq!(recommendations[0]["nom"], "Bougie");
        assert_eq!(recommendations[0]["prix"], 12.0);
        assert_eq!(recommendations[0]["id"], bougie.id.to_string());
        assert!(recommendations[0].get("stock").is_none());
    }

    #[tokio::test]
    async fn test_list_paginates_with_default_size() {
        let products = (0..15)
            .map(|i| sample_product(&format!("Produit {}", i), 10.0, 1))
            .collect();
        let service = service_with(products).await;

        let page = service.list(&ProductQuery::default()).await.unwrap();
        assert_eq!(page.products.len(), 12);
        assert_eq!(page.pagination.total, 15);
        assert_eq!(page.pagination.total_pages, 2);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive() {
        let service = service_with(vec![
            sample_product("Vase en verre", 45.0, 3),
            sample_product("Bougie", 12.0, 5),
        ])
        .await;

        let query = ProductQuery {
            search: Some("VERRE".into()),
            ..Default::default()
        };
        let page = service.list(&query).await.unwrap();
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.products[0]["nom"], "Vase en verre");
    }

    #[tokio::test]
    async fn test_list_by_category_and_subcategory() {
        let mut other = sample_product("Plateau", 30.0, 2);
        other.subcategory = "plateaux".into();
        let service = service_with(vec![sample_product("Vase", 45.0, 3), other]).await;

        assert_eq!(service.list_by_category("decoration", None).await.unwrap().len(), 2);
        assert_eq!(
            service
                .list_by_category("decoration", Some("plateaux"))
                .await
                .unwrap()
                .len(),
            1
        );
        assert!(service.list_by_category("mariage", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_summaries_use_a_single_query() {
        let repo = Arc::new(CountingRepository::default());
        let products: Vec<Product> = (0..5)
            .map(|i| sample_product(&format!("Produit {}", i), 10.0, 1))
            .collect();
        for product in &products {
            repo.insert(product.clone()).await.unwrap();
        }
        let service = ProductService::new(repo.clone());

        let mut ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
        ids.push(products[0].id);
        ids.push(Uuid::new_v4());
        let summaries = service.summaries(ids).await.unwrap();

        assert_eq!(summaries.len(), 5);
        assert_eq!(repo.many.load(Ordering::SeqCst), 1);
        assert_eq!(repo.by_id.load(Ordering::SeqCst), 0);

        assert!(service.summaries(Vec::new()).await.unwrap().is_empty());
        assert_eq!(repo.many.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_line_products_replaced_by_summaries() {
        let vase = sample_product("Vase", 45.0, 3);
        let gone = Uuid::new_v4();
        let record = serde_json::json!({
            "produits": [
                {"produitId": vase.id.to_string(), "quantite": 1},
                {"produitId": gone.to_string(), "quantite": 2},
            ]
        });
        let summaries = HashMap::from([(vase.id, vase.summary())]);

        let value = with_line_products(&record, &summaries).unwrap();
        assert_eq!(value["produits"][0]["produitId"]["nom"], "Vase");
        assert_eq!(value["produits"][0]["quantite"], 1);
        assert!(value["produits"][1]["produitId"].is_null());
    }

    #[tokio::test]
    async fn test_missing_product_is_not_found() {
        let service = service_with(vec![]).await;
        let err = service.get(&Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.to_string(), NOT_FOUND);
        assert!(matches!(
            service.delete(&Uuid::new_v4()).await,
            Err(ApiError::NotFound(_))
        ));
    }
}
