//! In-process document store

use super::{DocumentStore, StoreError, UpsertSummary};
use crate::types::UpsertOp;
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};

type Collection = BTreeMap<String, Map<String, Value>>;

/// Keeps every collection in memory, keyed by identity key.
///
/// Used for dry runs and tests. Merges fields the same way `$set` does:
/// fields in the new document overwrite, fields absent from it are kept.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .get(collection)
            .map(|c| c.len())
            .unwrap_or(0)
    }

    pub fn get(&self, collection: &str, key: &str) -> Option<Map<String, Value>> {
        self.collections
            .lock()
            .get(collection)
            .and_then(|c| c.get(key).cloned())
    }

    /// Identity keys of a collection, sorted
    pub fn keys(&self, collection: &str) -> Vec<String> {
        self.collections
            .lock()
            .get(collection)
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn upsert_many(
        &self,
        collection: &str,
        ops: Vec<UpsertOp>,
    ) -> Result<UpsertSummary, StoreError> {
        let mut collections = self.collections.lock();
        let docs = collections.entry(collection.to_string()).or_default();
        let mut summary = UpsertSummary::default();

        for op in ops {
            match docs.get_mut(&op.key) {
                None => {
                    docs.insert(op.key, op.document);
                    summary.created += 1;
                }
                Some(existing) => {
                    let mut changed = false;
                    for (field, value) in op.document {
                        if existing.get(&field) != Some(&value) {
                            existing.insert(field, value);
                            changed = true;
                        }
                    }
                    if changed {
                        summary.modified += 1;
                    }
                }
            }
        }
        Ok(summary)
    }
}
