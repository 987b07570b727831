//! animal-ingest: partitioned, retry-driven ingestion of public-sector
//! animal records into a document store.
//!
//! - Partition enumeration: monthly date slices, flat region lists, and a
//!   lazily listed region → sub-region hierarchy
//! - Paginated fetching with linear backoff and envelope validation
//! - Per-collector normalization through alias tables, with deterministic
//!   identity keys
//! - Unordered upsert-by-key batches, safe to re-run

pub mod collectors;
pub mod config;
pub mod error;
pub mod fetch;
pub mod normalize;
pub mod partition;
pub mod pipeline;
pub mod store;
pub mod types;
pub mod util;

pub use config::Config;
pub use error::IngestError;
pub use types::*;
