//! Per-service collectors
//!
//! A collector is data, not control flow: it says how to address one page of
//! one partition, where the rows live in the response, how to normalize a
//! row, and where the documents go. [`crate::pipeline::Pipeline`] does the
//! rest for all of them.

pub mod abandonment;
pub mod directory;
pub mod registration;
pub mod shelter;

pub use abandonment::AbandonmentCollector;
pub use directory::PortalRegionDirectory;
pub use registration::RegistrationCollector;
pub use shelter::ShelterCollector;

use crate::error::IngestError;
use crate::fetch::{Envelope, PageRequest};
use crate::normalize::Normalizer;
use crate::types::{PageWindow, Partition};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Response type requested from portal services
pub(crate) const PORTAL_FORMAT: &str = "json";

/// Everything the pipeline needs to know about one data service
pub trait Collector: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Target collection
    fn collection(&self) -> &str;

    /// Rows requested per page
    fn page_size(&self) -> u64;

    /// Pause between two page requests of the same partition
    fn page_delay(&self) -> Duration;

    /// Request for one page window of one partition
    fn request(&self, partition: &Partition, window: PageWindow) -> PageRequest;

    fn envelope(&self) -> &Envelope;

    fn normalizer(&self) -> &dyn Normalizer;
}

/// The collectors a run can target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectorKind {
    Abandonments,
    Registrations,
    Shelters,
}

impl CollectorKind {
    pub const ALL: [CollectorKind; 3] = [
        CollectorKind::Abandonments,
        CollectorKind::Registrations,
        CollectorKind::Shelters,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CollectorKind::Abandonments => "abandonments",
            CollectorKind::Registrations => "registrations",
            CollectorKind::Shelters => "shelters",
        }
    }
}

impl fmt::Display for CollectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectorKind {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "abandonments" | "abandonment" => Ok(CollectorKind::Abandonments),
            "registrations" | "registration" => Ok(CollectorKind::Registrations),
            "shelters" | "shelter" => Ok(CollectorKind::Shelters),
            other => Err(IngestError::configuration(format!(
                "unknown collector '{}'",
                other
            ))),
        }
    }
}

/// Reject a missing or blank access key before any network traffic
pub(crate) fn require_key(key: Option<&str>, what: &str, env: &str) -> Result<String, IngestError> {
    match key.map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key.to_string()),
        _ => Err(IngestError::configuration(format!(
            "{} is not configured (set it in the config file or {})",
            what, env
        ))),
    }
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
