//! Paginated fetching with retry and response validation
//!
//! ```text
//!   PageRequest ──▶ Transport (HTTP GET) ──▶ status check ──▶ Envelope::parse
//!        ▲                                                        │
//!        └──────── RetryPolicy (transient → sleep attempt×base) ◀─┘
//! ```
//!
//! A page either comes back as rows plus an optional total, or the fetch
//! fails with a [`FetchError`]. Error payloads are never reported as an
//! empty page.

pub mod envelope;
pub mod fetcher;
pub mod retry;
pub mod transport;

pub use envelope::{Envelope, GridEnvelope};
pub use fetcher::PageFetcher;
pub use retry::{ClientErrorPolicy, FailureClass, RetryPolicy};
pub use transport::{HttpResponse, PageRequest, ReqwestTransport, Transport};

use crate::types::RawRecord;
use thiserror::Error;

/// Errors that can occur while fetching one page
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response body: {0}")]
    Malformed(String),

    #[error("response is missing the `{0}` container")]
    MissingContainer(String),

    #[error("service result code {code}: {message}")]
    Service {
        code: String,
        message: String,
        transient: bool,
    },

    #[error("unexpected response shape: {0}")]
    Shape(String),

    #[error("giving up after {attempts} attempts, last error: {last}")]
    Exhausted {
        attempts: u32,
        #[source]
        last: Box<FetchError>,
    },
}

/// reqwest's message embeds the request URL, which carries the access key.
/// Strip it; callers name the request through [`PageRequest::describe`].
impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Network(e.without_url().to_string())
    }
}

/// One successfully fetched page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub rows: Vec<RawRecord>,
    /// Total row count for the whole query, when the service reports one
    pub total: Option<u64>,
    /// Attempts it took to get this page
    pub attempts: u32,
}

impl Page {
    pub fn new(rows: Vec<RawRecord>, total: Option<u64>) -> Self {
        Self {
            rows,
            total,
            attempts: 0,
        }
    }

    /// Documented "no data" answer
    pub fn empty() -> Self {
        Self::new(Vec::new(), Some(0))
    }
}
