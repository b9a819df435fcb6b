//! Human-readable order and quote codes
//!
//! Codes look like `CMD-1718000000000-000042`: a prefix per record kind, the
//! epoch milliseconds at generation time and a six-digit sequence number.
//! When the sequence cannot be obtained the suffix falls back to six random
//! base-36 characters, so code generation never blocks record creation.
//!
//! Uniqueness is ultimately enforced by the unique index on the code field;
//! [`CodeGenerator::insert_with_code`] retries once with a fresh code when that
//! index rejects an insert.

use crate::storage::{Filter, Record, Repository, SequenceStore, StoreError};
use chrono::Utc;
use rand::Rng;
use std::sync::Arc;
use tokio::sync::OnceCell;

const BASE36: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const RANDOM_SUFFIX_LEN: usize = 6;

/// Record kinds that carry a generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeKind {
    Order,
    Quote,
}

impl CodeKind {
    pub fn prefix(&self) -> &'static str {
        match self {
            CodeKind::Order => "CMD",
            CodeKind::Quote => "DEV",
        }
    }

    /// Name of the persisted counter for this kind
    pub fn counter_name(&self) -> &'static str {
        match self {
            CodeKind::Order => "orders",
            CodeKind::Quote => "quotes",
        }
    }

    fn index(&self) -> usize {
        match self {
            CodeKind::Order => 0,
            CodeKind::Quote => 1,
        }
    }
}

/// A record whose code is assigned once, before its first insert
pub trait Coded: Record {
    const KIND: CodeKind;

    /// Stored name of the code field
    fn code_field() -> &'static str;

    fn code(&self) -> Option<&str>;

    fn set_code(&mut self, code: Option<String>);
}

/// Source of the millisecond timestamp embedded in codes
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Clock frozen at a given instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0
    }
}

/// How the sequence number is obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceStrategy {
    /// Number of existing records plus one; racy under concurrent creation
    Count,
    /// Persisted counter incremented atomically, seeded from the record count
    #[default]
    Counter,
}

/// Generates codes for orders and quotes
pub struct CodeGenerator {
    sequences: Arc<dyn SequenceStore>,
    clock: Arc<dyn Clock>,
    strategy: SequenceStrategy,
    seeded: [OnceCell<()>; 2],
}

impl CodeGenerator {
    pub fn new(sequences: Arc<dyn SequenceStore>, strategy: SequenceStrategy) -> Self {
        Self::with_clock(sequences, strategy, Arc::new(SystemClock))
    }

    pub fn with_clock(
        sequences: Arc<dyn SequenceStore>,
        strategy: SequenceStrategy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sequences,
            clock,
            strategy,
            seeded: [OnceCell::new(), OnceCell::new()],
        }
    }

    pub fn strategy(&self) -> SequenceStrategy {
        self.strategy
    }

    /// Produce a fresh code for records of type `T`
    pub async fn generate_code<T: Coded>(&self, records: &dyn Repository<T>) -> String {
        let kind = T::KIND;
        let millis = self.clock.now_millis();

        match self.next_sequence(kind, records).await {
            Ok(sequence) => format!("{}-{}-{:06}", kind.prefix(), millis, sequence),
            Err(e) => {
                tracing::warn!(
                    kind = kind.prefix(),
                    error = %e,
                    "sequence unavailable, falling back to a random code suffix"
                );
                format!("{}-{}-{}", kind.prefix(), millis, random_suffix())
            }
        }
    }

    /// Assign a code unless the record already has one
    pub async fn prepare_for_insert<T: Coded>(&self, record: &mut T, records: &dyn Repository<T>) {
        if record.code().is_none_or(str::is_empty) {
            let code = self.generate_code(records).await;
            record.set_code(Some(code));
        }
    }

    /// Insert a record, assigning its code first
    ///
    /// A duplicate code regenerates the code and retries exactly once.
    pub async fn insert_with_code<T: Coded>(
        &self,
        mut record: T,
        records: &dyn Repository<T>,
    ) -> Result<T, StoreError> {
        self.prepare_for_insert(&mut record, records).await;

        match records.insert(record.clone()).await {
            Err(e) if e.is_duplicate_of(T::code_field()) => {
                tracing::warn!(
                    code = record.code().unwrap_or_default(),
                    "generated code already taken, retrying with a fresh code"
                );
                record.set_code(None);
                self.prepare_for_insert(&mut record, records).await;
                records.insert(record).await
            }
            other => other,
        }
    }

    async fn next_sequence<T: Coded>(
        &self,
        kind: CodeKind,
        records: &dyn Repository<T>,
    ) -> Result<u64, StoreError> {
        match self.strategy {
            SequenceStrategy::Count => Ok(records.count(&Filter::new()).await? + 1),
            SequenceStrategy::Counter => {
                self.seeded[kind.index()]
                    .get_or_try_init(|| async {
                        let existing = records.count(&Filter::new()).await?;
                        self.sequences.seed(kind.counter_name(), existing).await
                    })
                    .await?;
                self.sequences.increment(kind.counter_name()).await
            }
        }
    }
}

/// Six uppercase base-36 characters
fn random_suffix() -> String {
    let mut rng = rand::thread_rng();
    (0..RANDOM_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}
