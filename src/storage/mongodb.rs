//! MongoDB storage backend using the official MongoDB async driver.
//!
//! # Feature flag
//!
//! This module is gated behind the `mongodb_backend` feature flag.
//!
//! # Storage model
//!
//! Each record type lives in its own collection (`Record::collection()`), and
//! every field listed in `Record::unique_fields()` gets a unique index.
//! Generated-code counters live in a single `counters` collection keyed by
//! counter name.
//!
//! # Serialization strategy
//!
//! Records are serialized via `serde_json::Value` as an intermediate format,
//! then converted to BSON documents. UUIDs are stored as strings and
//! timestamps as fixed-width ISO 8601 strings, so range ordering on them is
//! plain string ordering. The `id` field is mapped to MongoDB's `_id`.

use super::{
    Condition, Filter, FindOptions, Record, Repository, SequenceStore, SortDirection,
    StorageBackend, StoreError, StoreResult,
};
use crate::core::field::FieldValue;
use crate::core::timestamp;
use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};
use regex::Regex;
use std::marker::PhantomData;
use std::sync::OnceLock;
use uuid::Uuid;

const BACKEND: &str = "mongodb";
const COUNTERS_COLLECTION: &str = "counters";
const DUPLICATE_KEY_CODE: i32 = 11000;

// ---------------------------------------------------------------------------
// Conversion helpers
// ---------------------------------------------------------------------------

/// Convert a serde_json::Value (expected to be an Object) into a BSON Document,
/// renaming `id` → `_id` for MongoDB convention.
fn json_to_document(json: serde_json::Value) -> StoreResult<Document> {
    let bson_val = mongodb::bson::to_bson(&json)
        .map_err(|e| StoreError::Serialization(format!("Failed to convert JSON to BSON: {}", e)))?;

    let mut doc = match bson_val {
        Bson::Document(d) => d,
        _ => {
            return Err(StoreError::Serialization(
                "Expected BSON document, got non-object".to_string(),
            ));
        }
    };

    if let Some(id) = doc.remove("id") {
        doc.insert("_id", id);
    }

    Ok(doc)
}

/// Convert a BSON Document back into a serde_json::Value,
/// renaming `_id` → `id` for the domain convention.
fn document_to_json(mut doc: Document) -> serde_json::Value {
    if let Some(id) = doc.remove("_id") {
        doc.insert("id", id);
    }

    Bson::Document(doc).into_relaxed_extjson()
}

fn uuid_bson(id: &Uuid) -> Bson {
    Bson::String(id.to_string())
}

fn field_bson(value: &FieldValue) -> Bson {
    match value {
        FieldValue::String(s) => Bson::String(s.clone()),
        FieldValue::Integer(i) => Bson::Int64(*i),
        FieldValue::Float(f) => Bson::Double(*f),
        FieldValue::Boolean(b) => Bson::Boolean(*b),
        FieldValue::Uuid(u) => uuid_bson(u),
        FieldValue::DateTime(dt) => Bson::String(timestamp::format(dt)),
        FieldValue::Null => Bson::Null,
    }
}

/// Translate a [`Filter`] into a MongoDB query document
fn filter_document<T: Record>(filter: &Filter) -> Document {
    let mut clauses: Vec<Document> = filter
        .conditions()
        .iter()
        .map(|condition| match condition {
            Condition::Eq(field, value) => doc! { field.as_str(): field_bson(value) },
            Condition::Ne(field, value) => {
                doc! { field.as_str(): { "$ne": field_bson(value) } }
            }
            Condition::In(field, values) => {
                let values: Vec<Bson> = values.iter().map(field_bson).collect();
                doc! { field.as_str(): { "$in": values } }
            }
            Condition::Text(query) => {
                let pattern = regex::escape(query);
                let alternatives: Vec<Document> = T::text_fields()
                    .iter()
                    .map(|field| doc! { *field: { "$regex": &pattern, "$options": "i" } })
                    .collect();
                doc! { "$or": alternatives }
            }
        })
        .collect();

    match clauses.len() {
        0 => doc! {},
        1 => clauses.remove(0),
        _ => doc! { "$and": clauses },
    }
}

fn query_error(context: &str, e: mongodb::error::Error) -> StoreError {
    match e.kind.as_ref() {
        ErrorKind::ServerSelection { .. } => StoreError::Unavailable {
            backend: BACKEND.to_string(),
            message: format!("{}: {}", context, e),
        },
        _ => StoreError::Query {
            backend: BACKEND.to_string(),
            message: format!("{}: {}", context, e),
        },
    }
}

/// Extract the offending field from an E11000 message
///
/// Messages look like `... index: slug_1 dup key: { slug: "vases" }`.
fn duplicate_field(message: &str) -> Option<String> {
    static DUP_KEY: OnceLock<Option<Regex>> = OnceLock::new();
    static INDEX: OnceLock<Option<Regex>> = OnceLock::new();

    let dup_key = DUP_KEY.get_or_init(|| Regex::new(r"dup key: \{ ?([A-Za-z0-9_.]+):").ok());
    if let Some(caps) = dup_key.as_ref().and_then(|re| re.captures(message)) {
        return Some(caps[1].to_string());
    }

    let index = INDEX.get_or_init(|| Regex::new(r"index: ([A-Za-z0-9_.]+?)_-?1\b").ok());
    index
        .as_ref()
        .and_then(|re| re.captures(message))
        .map(|caps| caps[1].to_string())
}

/// Map a write error, recognising unique-index violations
fn write_error<T: Record>(context: &str, e: mongodb::error::Error) -> StoreError {
    if let ErrorKind::Write(WriteFailure::WriteError(failure)) = e.kind.as_ref()
        && failure.code == DUPLICATE_KEY_CODE
    {
        return StoreError::DuplicateKey {
            collection: T::collection().to_string(),
            field: duplicate_field(&failure.message).unwrap_or_else(|| "_id".to_string()),
        };
    }
    query_error(context, e)
}

// ---------------------------------------------------------------------------
// MongoRepository<T>
// ---------------------------------------------------------------------------

/// Repository backed by one MongoDB collection
#[derive(Clone, Debug)]
pub struct MongoRepository<T> {
    database: Database,
    _marker: PhantomData<T>,
}

impl<T> MongoRepository<T> {
    pub fn new(database: Database) -> Self {
        Self {
            database,
            _marker: PhantomData,
        }
    }

    pub fn database(&self) -> &Database {
        &self.database
    }
}

impl<T: Record> MongoRepository<T> {
    fn collection(&self) -> Collection<Document> {
        self.database.collection(T::collection())
    }

    fn record_to_document(record: &T) -> StoreResult<Document> {
        let json = serde_json::to_value(record)
            .map_err(|e| StoreError::Serialization(format!("Failed to serialize record: {}", e)))?;
        json_to_document(json)
    }

    fn document_to_record(doc: Document) -> StoreResult<T> {
        serde_json::from_value(document_to_json(doc)).map_err(|e| {
            StoreError::Serialization(format!(
                "Failed to deserialize {} document: {}",
                T::collection(),
                e
            ))
        })
    }

    /// Create the unique indexes declared by the record type
    ///
    /// Idempotent: MongoDB ignores indexes that already exist with the same keys and options.
    pub async fn ensure_indexes(&self) -> StoreResult<()> {
        let indexes: Vec<IndexModel> = T::unique_fields()
            .iter()
            .map(|field| {
                IndexModel::builder()
                    .keys(doc! { *field: 1 })
                    .options(IndexOptions::builder().unique(true).build())
                    .build()
            })
            .collect();

        if indexes.is_empty() {
            return Ok(());
        }

        self.collection()
            .create_indexes(indexes)
            .await
            .map_err(|e| {
                query_error(
                    &format!("Failed to create indexes on {}", T::collection()),
                    e,
                )
            })?;

        Ok(())
    }
}

#[async_trait]
impl<T: Record> Repository<T> for MongoRepository<T> {
    async fn count(&self, filter: &Filter) -> StoreResult<u64> {
        self.collection()
            .count_documents(filter_document::<T>(filter))
            .await
            .map_err(|e| query_error("Failed to count documents", e))
    }

    async fn find_many(&self, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<T>> {
        let collection = self.collection();
        let mut find = collection
            .find(filter_document::<T>(filter))
            .skip(options.skip);

        if let Some(sort) = &options.sort {
            let direction = match sort.direction {
                SortDirection::Asc => 1,
                SortDirection::Desc => -1,
            };
            find = find.sort(doc! { sort.field.as_str(): direction });
        }
        if let Some(limit) = options.limit {
            find = find.limit(i64::try_from(limit).unwrap_or(i64::MAX));
        }

        let docs: Vec<Document> = find
            .await
            .map_err(|e| query_error("Failed to query documents", e))?
            .try_collect()
            .await
            .map_err(|e| query_error("Failed to collect documents", e))?;

        docs.into_iter().map(Self::document_to_record).collect()
    }

    async fn find_one(&self, filter: &Filter) -> StoreResult<Option<T>> {
        let doc = self
            .collection()
            .find_one(filter_document::<T>(filter))
            .await
            .map_err(|e| query_error("Failed to find document", e))?;

        doc.map(Self::document_to_record).transpose()
    }

    async fn find_by_id(&self, id: &Uuid) -> StoreResult<Option<T>> {
        let doc = self
            .collection()
            .find_one(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| query_error("Failed to get document", e))?;

        doc.map(Self::document_to_record).transpose()
    }

    async fn insert(&self, record: T) -> StoreResult<T> {
        let doc = Self::record_to_document(&record)?;

        self.collection()
            .insert_one(doc)
            .await
            .map_err(|e| write_error::<T>("Failed to insert document", e))?;

        Ok(record)
    }

    async fn update_by_id(&self, id: &Uuid, record: T) -> StoreResult<Option<T>> {
        let doc = Self::record_to_document(&record)?;

        let result = self
            .collection()
            .replace_one(doc! { "_id": uuid_bson(id) }, doc)
            .await
            .map_err(|e| write_error::<T>("Failed to update document", e))?;

        if result.matched_count == 0 {
            return Ok(None);
        }
        Ok(Some(record))
    }

    async fn delete_by_id(&self, id: &Uuid) -> StoreResult<Option<T>> {
        let doc = self
            .collection()
            .find_one_and_delete(doc! { "_id": uuid_bson(id) })
            .await
            .map_err(|e| query_error("Failed to delete document", e))?;

        doc.map(Self::document_to_record).transpose()
    }
}

// ---------------------------------------------------------------------------
// MongoSequenceStore
// ---------------------------------------------------------------------------

/// Named counters stored as `{ _id: <name>, value: <i64> }`
#[derive(Clone, Debug)]
pub struct MongoSequenceStore {
    database: Database,
}

impl MongoSequenceStore {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    fn collection(&self) -> Collection<Document> {
        self.database.collection(COUNTERS_COLLECTION)
    }
}

#[async_trait]
impl SequenceStore for MongoSequenceStore {
    async fn seed(&self, name: &str, value: u64) -> StoreResult<()> {
        let value = i64::try_from(value)
            .map_err(|_| StoreError::Serialization(format!("counter seed {} overflows", value)))?;

        self.collection()
            .update_one(
                doc! { "_id": name },
                doc! { "$setOnInsert": { "value": value } },
            )
            .upsert(true)
            .await
            .map_err(|e| query_error("Failed to seed counter", e))?;

        Ok(())
    }

    async fn increment(&self, name: &str) -> StoreResult<u64> {
        let doc = self
            .collection()
            .find_one_and_update(doc! { "_id": name }, doc! { "$inc": { "value": 1_i64 } })
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|e| query_error("Failed to increment counter", e))?
            .ok_or_else(|| StoreError::Query {
                backend: BACKEND.to_string(),
                message: format!("counter '{}' missing after upsert", name),
            })?;

        let value = match doc.get("value") {
            Some(Bson::Int64(v)) => *v,
            Some(Bson::Int32(v)) => i64::from(*v),
            other => {
                return Err(StoreError::Serialization(format!(
                    "counter '{}' has non-integer value {:?}",
                    name, other
                )));
            }
        };

        u64::try_from(value)
            .map_err(|_| StoreError::Serialization(format!("counter '{}' is negative", name)))
    }
}

// ---------------------------------------------------------------------------
// MongoBackend
// ---------------------------------------------------------------------------

/// Connection-level handle used for health checks
#[derive(Clone, Debug)]
pub struct MongoBackend {
    database: Database,
}

impl MongoBackend {
    pub fn new(database: Database) -> Self {
        Self { database }
    }
}

#[async_trait]
impl StorageBackend for MongoBackend {
    fn name(&self) -> &str {
        BACKEND
    }

    fn database(&self) -> Option<&str> {
        Some(self.database.name())
    }

    async fn ping(&self) -> StoreResult<()> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StoreError::Unavailable {
                backend: BACKEND.to_string(),
                message: e.to_string(),
            })?;
        Ok(())
    }
}
