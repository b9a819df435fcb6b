//! In-memory storage backend for tests and local development

use super::{
    FindOptions, Filter, Record, Repository, SequenceStore, StorageBackend, StoreError,
    StoreResult,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

fn lock_error(kind: &str, e: impl std::fmt::Display) -> StoreError {
    StoreError::Query {
        backend: "in-memory".to_string(),
        message: format!("Failed to acquire {} lock: {}", kind, e),
    }
}

/// In-memory repository
///
/// Uses RwLock for thread-safe access and enforces the record's unique
/// fields on every write, like a unique index would.
#[derive(Clone)]
pub struct InMemoryRepository<T> {
    records: Arc<RwLock<HashMap<Uuid, T>>>,
    _marker: PhantomData<T>,
}

impl<T> InMemoryRepository<T> {
    /// Create a new empty repository
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            _marker: PhantomData,
        }
    }
}

impl<T> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> InMemoryRepository<T> {
    /// Reject `record` if another record already holds one of its unique values
    fn check_unique(records: &HashMap<Uuid, T>, record: &T) -> StoreResult<()> {
        for field in T::unique_fields() {
            let value = match record.field_value(field) {
                Some(value) if !value.is_null() => value,
                _ => continue,
            };

            let taken = records.values().any(|other| {
                other.id() != record.id() && other.field_value(field).as_ref() == Some(&value)
            });

            if taken {
                return Err(StoreError::DuplicateKey {
                    collection: T::collection().to_string(),
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Record> Repository<T> for InMemoryRepository<T> {
    async fn count(&self, filter: &Filter) -> StoreResult<u64> {
        let records = self.records.read().map_err(|e| lock_error("read", e))?;
        Ok(records.values().filter(|r| filter.matches(*r)).count() as u64)
    }

    async fn find_many(&self, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<T>> {
        let records = self.records.read().map_err(|e| lock_error("read", e))?;

        let mut matched: Vec<T> = records
            .values()
            .filter(|r| filter.matches(*r))
            .cloned()
            .collect();

        // HashMap order is arbitrary, so ties fall back to the id
        match &options.sort {
            Some(sort) => matched.sort_by(|a, b| sort.compare(a, b).then(a.id().cmp(&b.id()))),
            None => matched.sort_by_key(|r| r.id()),
        }

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let iter = matched.into_iter().skip(skip);
        Ok(match options.limit {
            Some(limit) => iter.take(usize::try_from(limit).unwrap_or(usize::MAX)).collect(),
            None => iter.collect(),
        })
    }

    async fn find_one(&self, filter: &Filter) -> StoreResult<Option<T>> {
        let records = self.records.read().map_err(|e| lock_error("read", e))?;
        Ok(records.values().find(|r| filter.matches(*r)).cloned())
    }

    async fn find_by_id(&self, id: &Uuid) -> StoreResult<Option<T>> {
        let records = self.records.read().map_err(|e| lock_error("read", e))?;
        Ok(records.get(id).cloned())
    }

    async fn insert(&self, record: T) -> StoreResult<T> {
        let mut records = self.records.write().map_err(|e| lock_error("write", e))?;

        if records.contains_key(&record.id()) {
            return Err(StoreError::DuplicateKey {
                collection: T::collection().to_string(),
                field: "_id".to_string(),
            });
        }
        Self::check_unique(&records, &record)?;

        records.insert(record.id(), record.clone());
        Ok(record)
    }

    async fn update_by_id(&self, id: &Uuid, record: T) -> StoreResult<Option<T>> {
        let mut records = self.records.write().map_err(|e| lock_error("write", e))?;

        if !records.contains_key(id) {
            return Ok(None);
        }
        Self::check_unique(&records, &record)?;

        records.insert(*id, record.clone());
        Ok(Some(record))
    }

    async fn delete_by_id(&self, id: &Uuid) -> StoreResult<Option<T>> {
        let mut records = self.records.write().map_err(|e| lock_error("write", e))?;
        Ok(records.remove(id))
    }
}

/// In-memory named counters
#[derive(Clone, Default)]
pub struct InMemorySequenceStore {
    counters: Arc<RwLock<HashMap<String, u64>>>,
}

impl InMemorySequenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SequenceStore for InMemorySequenceStore {
    async fn seed(&self, name: &str, value: u64) -> StoreResult<()> {
        let mut counters = self.counters.write().map_err(|e| lock_error("write", e))?;
        counters.entry(name.to_string()).or_insert(value);
        Ok(())
    }

    async fn increment(&self, name: &str) -> StoreResult<u64> {
        let mut counters = self.counters.write().map_err(|e| lock_error("write", e))?;
        let counter = counters.entry(name.to_string()).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}

/// Connection handle of the in-memory backend; always reachable
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryBackend;

#[async_trait]
impl StorageBackend for InMemoryBackend {
    fn name(&self) -> &str {
        "in-memory"
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
