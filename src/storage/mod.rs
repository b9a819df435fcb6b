//! Storage traits and backends
//!
//! The application never talks to a database directly. Every entity is
//! persisted through a [`Repository`], generated codes are backed by a
//! [`SequenceStore`], and the whole set is bundled in [`Repositories`], which
//! is built once at startup and handed down to the request handlers.

pub mod in_memory;
#[cfg(feature = "mongodb_backend")]
pub mod mongodb;

use crate::core::field::FieldValue;
use crate::entities::{Admin, Category, Order, Product, Quote};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::cmp::Ordering;
use std::sync::Arc;
use uuid::Uuid;

pub use in_memory::{InMemoryBackend, InMemoryRepository, InMemorySequenceStore};
#[cfg(feature = "mongodb_backend")]
pub use self::mongodb::{MongoBackend, MongoRepository, MongoSequenceStore};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by storage backends
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique constraint rejected the write
    #[error("duplicate value for '{field}' in {collection}")]
    DuplicateKey { collection: String, field: String },

    /// The backend could not execute the query
    #[error("{backend} query error: {message}")]
    Query { backend: String, message: String },

    /// A record could not be converted to or from its stored form
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backend is not reachable
    #[error("storage backend '{backend}' is unavailable: {message}")]
    Unavailable { backend: String, message: String },
}

impl StoreError {
    /// True when the error is a unique-constraint violation on `field`
    pub fn is_duplicate_of(&self, field: &str) -> bool {
        matches!(self, StoreError::DuplicateKey { field: f, .. } if f == field)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A persisted entity
///
/// Field names passed to [`Record::field_value`], [`Filter`] and [`Sort`] are
/// the stored (wire) names, e.g. `nom`, `createdAt`, `parentId`.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection the record lives in
    fn collection() -> &'static str;

    /// Unique identifier
    fn id(&self) -> Uuid;

    /// Fields backed by a unique index
    fn unique_fields() -> &'static [&'static str] {
        &[]
    }

    /// Fields matched by [`Condition::Text`] searches
    fn text_fields() -> &'static [&'static str] {
        &[]
    }

    /// Fields a listing may be sorted by
    fn sortable_fields() -> &'static [&'static str] {
        &["createdAt", "updatedAt"]
    }

    /// Get the value of a stored field by name
    fn field_value(&self, field: &str) -> Option<FieldValue>;
}

// ---------------------------------------------------------------------------
// Filters and options
// ---------------------------------------------------------------------------

/// A single filter condition
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Field equals value (`Null` matches missing or null fields)
    Eq(String, FieldValue),
    /// Field differs from value
    Ne(String, FieldValue),
    /// Field equals one of the values; an empty list matches nothing
    In(String, Vec<FieldValue>),
    /// Case-insensitive substring match over the record's text fields
    Text(String),
}

/// Conjunction of conditions; the empty filter matches everything
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.conditions
            .push(Condition::Eq(field.to_string(), value.into()));
        self
    }

    pub fn ne(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.conditions
            .push(Condition::Ne(field.to_string(), value.into()));
        self
    }

    pub fn is_in<V: Into<FieldValue>>(
        mut self,
        field: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.conditions.push(Condition::In(
            field.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn text(mut self, query: &str) -> Self {
        self.conditions.push(Condition::Text(query.to_string()));
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Evaluate the filter against a record in memory
    pub fn matches<T: Record>(&self, record: &T) -> bool {
        self.conditions.iter().all(|condition| match condition {
            Condition::Eq(field, expected) => {
                let actual = record.field_value(field).unwrap_or(FieldValue::Null);
                &actual == expected
            }
            Condition::Ne(field, expected) => {
                let actual = record.field_value(field).unwrap_or(FieldValue::Null);
                &actual != expected
            }
            Condition::In(field, candidates) => {
                let actual = record.field_value(field).unwrap_or(FieldValue::Null);
                candidates.contains(&actual)
            }
            Condition::Text(query) => {
                let needle = query.to_lowercase();
                T::text_fields().iter().any(|field| {
                    record
                        .field_value(field)
                        .and_then(|v| v.as_string().map(str::to_lowercase))
                        .is_some_and(|haystack| haystack.contains(&needle))
                })
            }
        })
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Parse `asc`/`desc`; anything other than `asc` is descending
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("asc") {
            SortDirection::Asc
        } else {
            SortDirection::Desc
        }
    }
}

/// Sort on a single stored field
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

impl Sort {
    pub fn asc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Asc,
        }
    }

    pub fn desc(field: &str) -> Self {
        Self {
            field: field.to_string(),
            direction: SortDirection::Desc,
        }
    }

    /// Compare two records on this sort key
    pub fn compare<T: Record>(&self, a: &T, b: &T) -> Ordering {
        let left = a.field_value(&self.field).unwrap_or(FieldValue::Null);
        let right = b.field_value(&self.field).unwrap_or(FieldValue::Null);
        let ordering = left.compare(&right);
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Options for [`Repository::find_many`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Option<Sort>,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn sorted(sort: Sort) -> Self {
        Self {
            sort: Some(sort),
            ..Self::default()
        }
    }

    pub fn page(sort: Sort, skip: u64, limit: u64) -> Self {
        Self {
            sort: Some(sort),
            skip,
            limit: Some(limit),
        }
    }
}

// ---------------------------------------------------------------------------
// Services
// ---------------------------------------------------------------------------

/// Persistence service for one record type
#[async_trait]
pub trait Repository<T: Record>: Send + Sync {
    /// Count records matching the filter
    async fn count(&self, filter: &Filter) -> StoreResult<u64>;

    /// Find records matching the filter, sorted and paginated
    async fn find_many(&self, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<T>>;

    /// Find the first record matching the filter
    async fn find_one(&self, filter: &Filter) -> StoreResult<Option<T>>;

    /// Fetch a record by id
    async fn find_by_id(&self, id: &Uuid) -> StoreResult<Option<T>>;

    /// Insert a new record, enforcing unique fields
    async fn insert(&self, record: T) -> StoreResult<T>;

    /// Replace an existing record; `Ok(None)` when no record has that id
    async fn update_by_id(&self, id: &Uuid, record: T) -> StoreResult<Option<T>>;

    /// Delete a record, returning it; `Ok(None)` when no record has that id
    async fn delete_by_id(&self, id: &Uuid) -> StoreResult<Option<T>>;
}

/// Atomic named counters
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Create the counter with `value` if it does not exist yet
    async fn seed(&self, name: &str, value: u64) -> StoreResult<()>;

    /// Atomically increment the counter and return the new value
    ///
    /// A counter that was never seeded starts from zero.
    async fn increment(&self, name: &str) -> StoreResult<u64>;
}

/// Connection-level operations of a backend
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Human-readable backend name
    fn name(&self) -> &str;

    /// Database name, when the backend has one
    fn database(&self) -> Option<&str> {
        None
    }

    /// Round-trip check that the backend answers
    async fn ping(&self) -> StoreResult<()>;
}

/// Every repository the application uses
#[derive(Clone)]
pub struct Repositories {
    pub products: Arc<dyn Repository<Product>>,
    pub categories: Arc<dyn Repository<Category>>,
    pub orders: Arc<dyn Repository<Order>>,
    pub quotes: Arc<dyn Repository<Quote>>,
    pub admins: Arc<dyn Repository<Admin>>,
    pub sequences: Arc<dyn SequenceStore>,
    pub backend: Arc<dyn StorageBackend>,
}

impl Repositories {
    /// Fresh, empty in-memory storage
    pub fn in_memory() -> Self {
        Self {
            products: Arc::new(InMemoryRepository::<Product>::new()),
            categories: Arc::new(InMemoryRepository::<Category>::new()),
            orders: Arc::new(InMemoryRepository::<Order>::new()),
            quotes: Arc::new(InMemoryRepository::<Quote>::new()),
            admins: Arc::new(InMemoryRepository::<Admin>::new()),
            sequences: Arc::new(InMemorySequenceStore::new()),
            backend: Arc::new(InMemoryBackend),
        }
    }

    /// MongoDB storage on the given database, with indexes ensured
    #[cfg(feature = "mongodb_backend")]
    pub async fn mongodb(database: ::mongodb::Database) -> StoreResult<Self> {
        let products = MongoRepository::<Product>::new(database.clone());
        let categories = MongoRepository::<Category>::new(database.clone());
        let orders = MongoRepository::<Order>::new(database.clone());
        let quotes = MongoRepository::<Quote>::new(database.clone());
        let admins = MongoRepository::<Admin>::new(database.clone());

        products.ensure_indexes().await?;
        categories.ensure_indexes().await?;
        orders.ensure_indexes().await?;
        quotes.ensure_indexes().await?;
        admins.ensure_indexes().await?;

        Ok(Self {
            products: Arc::new(products),
            categories: Arc::new(categories),
            orders: Arc::new(orders),
            quotes: Arc::new(quotes),
            admins: Arc::new(admins),
            sequences: Arc::new(MongoSequenceStore::new(database.clone())),
            backend: Arc::new(MongoBackend::new(database)),
        })
    }
}
