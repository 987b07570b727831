//! Document store: batched upsert-by-key
//!
//! Every write is an independent `$set` on the document whose `uid` equals
//! the record's identity key. A failing write is logged and counted; it never
//! stops the rest of the batch.

pub mod memory;
pub mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

use crate::types::UpsertOp;
use async_trait::async_trait;
use std::ops::AddAssign;
use thiserror::Error;

/// Errors that make the store unusable as a whole
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to connect to document store: {0}")]
    Connection(String),

    #[error("document store operation failed: {0}")]
    Operation(String),

    #[error("document for key {key} cannot be encoded: {message}")]
    Encoding { key: String, message: String },
}

/// Outcome of one batch of upserts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpsertSummary {
    /// Documents that did not exist before
    pub created: u64,
    /// Existing documents whose stored value changed
    pub modified: u64,
    /// Writes that failed and were skipped
    pub failed: u64,
}

impl UpsertSummary {
    /// Documents newly created plus documents whose stored value changed
    pub fn written(&self) -> u64 {
        self.created + self.modified
    }
}

impl AddAssign for UpsertSummary {
    fn add_assign(&mut self, other: Self) {
        self.created += other.created;
        self.modified += other.modified;
        self.failed += other.failed;
    }
}

/// A collection-oriented store supporting unordered upsert-by-key batches
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Apply every op as an independent upsert, in batch order, so a key
    /// repeated within one batch ends up as one document carrying its last
    /// row. Only store-wide failures return `Err`; per-document failures are
    /// counted in the summary.
    async fn upsert_many(
        &self,
        collection: &str,
        ops: Vec<UpsertOp>,
    ) -> Result<UpsertSummary, StoreError>;

    /// Make sure the unique index on the identity field exists
    async fn ensure_identity_index(&self, _collection: &str) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<S> {
    async fn upsert_many(
        &self,
        collection: &str,
        ops: Vec<UpsertOp>,
    ) -> Result<UpsertSummary, StoreError> {
        (**self).upsert_many(collection, ops).await
    }

    async fn ensure_identity_index(&self, collection: &str) -> Result<(), StoreError> {
        (**self).ensure_identity_index(collection).await
    }
}
