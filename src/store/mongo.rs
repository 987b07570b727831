//! MongoDB-backed document store

use super::{DocumentStore, StoreError, UpsertSummary};
use crate::types::{UpsertOp, IDENTITY_FIELD};
use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, Database, IndexModel};
use tracing::{debug, info, warn};

/// Outcome of a single upsert
enum WriteOutcome {
    Created,
    Modified,
    Unchanged,
    Failed,
}

pub struct MongoStore {
    database: Database,
}

impl MongoStore {
    /// Connect and verify the server answers a ping
    pub async fn connect(url: &str, database: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        let database = client.database(database);

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        info!("Connected to MongoDB database '{}'", database.name());
        Ok(Self { database })
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection::<Document>(name)
    }
}

/// Encode a batch in order. Ops that cannot be encoded are logged and
/// counted, the rest keep their relative order.
fn encode_ops(ops: Vec<UpsertOp>) -> (Vec<(String, Document)>, u64) {
    let mut encoded = Vec::with_capacity(ops.len());
    let mut failed = 0;
    for op in ops {
        match mongodb::bson::to_document(&op.document) {
            Ok(document) => encoded.push((op.key, document)),
            Err(e) => {
                warn!("Skipping document {} that cannot be encoded: {}", op.key, e);
                failed += 1;
            }
        }
    }
    (encoded, failed)
}

async fn upsert_one(collection: &Collection<Document>, key: &str, document: Document) -> WriteOutcome {
    let result = collection
        .update_one(doc! { IDENTITY_FIELD: key }, doc! { "$set": document })
        .upsert(true)
        .await;

    match result {
        Ok(res) if res.upserted_id.is_some() => WriteOutcome::Created,
        Ok(res) if res.modified_count > 0 => WriteOutcome::Modified,
        Ok(_) => WriteOutcome::Unchanged,
        Err(e) => {
            warn!("Failed to upsert document {}: {}", key, e);
            WriteOutcome::Failed
        }
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn upsert_many(
        &self,
        collection: &str,
        ops: Vec<UpsertOp>,
    ) -> Result<UpsertSummary, StoreError> {
        let coll = self.collection(collection);
        let (encoded, failed) = encode_ops(ops);
        let mut summary = UpsertSummary {
            failed,
            ..UpsertSummary::default()
        };

        // Strictly one op at a time, so a key repeated within the batch
        // lands on one document holding its last row, index or not
        for (key, document) in encoded {
            match upsert_one(&coll, &key, document).await {
                WriteOutcome::Created => summary.created += 1,
                WriteOutcome::Modified => summary.modified += 1,
                WriteOutcome::Unchanged => {}
                WriteOutcome::Failed => summary.failed += 1,
            }
        }

        debug!(
            "{}: {} created, {} modified, {} failed",
            collection, summary.created, summary.modified, summary.failed
        );
        Ok(summary)
    }

    async fn ensure_identity_index(&self, collection: &str) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { IDENTITY_FIELD: 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection(collection)
            .create_index(index)
            .await
            .map_err(|e| StoreError::Operation(e.to_string()))?;
        debug!("Unique index on {}.{} ensured", collection, IDENTITY_FIELD);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn op(key: &str, value: Value) -> UpsertOp {
        let Value::Object(document) = value else {
            panic!("expected object")
        };
        UpsertOp {
            key: key.to_string(),
            document,
        }
    }

    #[test]
    fn test_encode_keeps_batch_order_for_repeated_keys() {
        let (encoded, failed) = encode_ops(vec![
            op("k", json!({"v": "first"})),
            op("other", json!({"v": "x"})),
            op("k", json!({"v": "second"})),
        ]);
        assert_eq!(failed, 0);
        let keys: Vec<&str> = encoded.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["k", "other", "k"]);
        assert_eq!(encoded[2].1.get_str("v").unwrap(), "second");
    }

    #[test]
    fn test_encode_counts_unencodable_documents() {
        // u64 beyond i64 range has no BSON representation
        let (encoded, failed) = encode_ops(vec![
            op("big", json!({"v": u64::MAX})),
            op("ok", json!({"v": "fine"})),
        ]);
        assert_eq!(failed, 1);
        assert_eq!(encoded.len(), 1);
        assert_eq!(encoded[0].0, "ok");
    }
}
