//! Top-level error taxonomy for an ingestion run

use crate::fetch::FetchError;
use crate::store::StoreError;
use thiserror::Error;

/// Errors that abort an ingestion run.
///
/// Per-document write failures never appear here; the store reports them in
/// its [`crate::store::UpsertSummary`] and the run carries on.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Bad date range, malformed date, missing access key and the like.
    /// Raised before any network traffic.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A page could not be fetched: either a fatal failure or retries ran out
    #[error("fetch failed for partition {partition}: {source}")]
    Fetch {
        partition: String,
        #[source]
        source: FetchError,
    },

    /// The store could not be reached at all
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IngestError {
    pub fn configuration(message: impl Into<String>) -> Self {
        IngestError::Configuration(message.into())
    }

    pub fn fetch(partition: impl Into<String>, source: FetchError) -> Self {
        IngestError::Fetch {
            partition: partition.into(),
            source,
        }
    }
}
