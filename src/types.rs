//! Core types shared by partitioning, fetching, normalization and storage

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Name of the identity field on every stored document
pub const IDENTITY_FIELD: &str = "uid";

/// Name of the field that keeps the original record verbatim
pub const RAW_FIELD: &str = "raw";

/// Separator between identity key components
pub const KEY_SEPARATOR: &str = "|";

/// Placeholder for an identity key component the record does not carry
pub const KEY_PLACEHOLDER: &str = "NA";

// ============================================================================
// Partition Types
// ============================================================================

/// A region code as issued by the remote service, with its display name if known
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionCode {
    /// Code sent to the service (e.g. "6110000"), or the region name for
    /// services that filter by name
    pub code: String,
    /// Human-readable name (e.g. "서울특별시")
    pub name: Option<String>,
}

impl RegionCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl fmt::Display for RegionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}({})", name, self.code),
            None => f.write_str(&self.code),
        }
    }
}

/// Inclusive calendar-day range, always contained in a single calendar month
/// when produced by [`crate::partition::build_monthly_ranges`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Month label of the range start, e.g. "2024-02"
    pub fn label(&self) -> String {
        format!("{:04}-{:02}", self.start.year(), self.start.month())
    }

    /// Start date in the service's compact form (YYYYMMDD)
    pub fn start_compact(&self) -> String {
        self.start.format("%Y%m%d").to_string()
    }

    /// End date in the service's compact form (YYYYMMDD)
    pub fn end_compact(&self) -> String {
        self.end.format("%Y%m%d").to_string()
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}..{})", self.label(), self.start, self.end)
    }
}

/// Immutable query scope. Every field is optional; all `None` is the single
/// global partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Partition {
    pub region: Option<RegionCode>,
    pub sub_region: Option<RegionCode>,
    pub period: Option<DateRange>,
}

impl Partition {
    /// The single global partition
    pub fn global() -> Self {
        Self::default()
    }

    pub fn for_region(region: RegionCode) -> Self {
        Self {
            region: Some(region),
            ..Self::default()
        }
    }

    pub fn for_period(period: DateRange) -> Self {
        Self {
            period: Some(period),
            ..Self::default()
        }
    }

    pub fn with_sub_region(mut self, sub_region: RegionCode) -> Self {
        self.sub_region = Some(sub_region);
        self
    }

    pub fn with_period(mut self, period: DateRange) -> Self {
        self.period = Some(period);
        self
    }

    pub fn is_global(&self) -> bool {
        self.region.is_none() && self.sub_region.is_none() && self.period.is_none()
    }

    /// Short label used in logs and accounting
    pub fn label(&self) -> String {
        if self.is_global() {
            return "global".to_string();
        }
        let mut parts = Vec::with_capacity(3);
        if let Some(region) = &self.region {
            parts.push(region.to_string());
        }
        if let Some(sub) = &self.sub_region {
            parts.push(sub.to_string());
        }
        if let Some(period) = &self.period {
            parts.push(period.label());
        }
        parts.join("/")
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// One page window, expressed as a zero-based offset and a size.
///
/// Services address pages differently; the window converts to either
/// idiom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub offset: u64,
    pub size: u64,
}

impl PageWindow {
    /// 1-based page number for page-number APIs
    pub fn page_number(&self) -> u64 {
        if self.size == 0 {
            return 1;
        }
        self.offset / self.size + 1
    }

    /// 1-based inclusive first row index for index-range APIs
    pub fn start_index(&self) -> u64 {
        self.offset + 1
    }

    /// 1-based inclusive last row index for index-range APIs
    pub fn end_index(&self) -> u64 {
        self.offset + self.size
    }
}

/// Per-partition page loop state. Discarded when the partition is done.
#[derive(Debug, Clone)]
pub struct PageCursor {
    pub offset: u64,
    pub page_size: u64,
    /// Attempts spent on the most recent page
    pub attempts: u32,
    /// Rows retrieved so far in this partition
    pub retrieved: u64,
    pages_fetched: u64,
    observed_total: Option<u64>,
}

impl PageCursor {
    pub fn new(page_size: u64) -> Self {
        Self {
            offset: 0,
            page_size,
            attempts: 0,
            retrieved: 0,
            pages_fetched: 0,
            observed_total: None,
        }
    }

    pub fn window(&self) -> PageWindow {
        PageWindow {
            offset: self.offset,
            size: self.page_size,
        }
    }

    /// Record a successful page. The total is only taken from the first page
    /// of the partition; later totals are ignored.
    pub fn record_page(&mut self, rows: usize, total: Option<u64>, attempts: u32) {
        if self.pages_fetched == 0 {
            self.observed_total = total;
        }
        self.pages_fetched += 1;
        self.attempts = attempts;
        self.retrieved += rows as u64;
    }

    pub fn observed_total(&self) -> Option<u64> {
        self.observed_total
    }

    pub fn pages_fetched(&self) -> u64 {
        self.pages_fetched
    }

    /// Whether the current window's upper bound has reached the observed total
    pub fn reached_total(&self) -> bool {
        match self.observed_total {
            Some(total) => self.offset + self.page_size >= total,
            None => false,
        }
    }

    pub fn advance(&mut self) {
        self.offset += self.page_size;
        self.attempts = 0;
    }
}

// ============================================================================
// Records
// ============================================================================

/// A record exactly as the remote service returned it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRecord(pub Map<String, Value>);

impl RawRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Look up the first alias carrying a non-null value.
    ///
    /// Aliases are tried in order by exact name, then again ignoring ASCII
    /// case, so `CTPV` and `ctpv` resolve the same field.
    pub fn lookup(&self, aliases: &[&str]) -> Option<&Value> {
        for alias in aliases {
            if let Some(value) = self.0.get(*alias).filter(|v| !v.is_null()) {
                return Some(value);
            }
        }
        for alias in aliases {
            let found = self
                .0
                .iter()
                .find(|(k, v)| k.eq_ignore_ascii_case(alias) && !v.is_null());
            if let Some((_, value)) = found {
                return Some(value);
            }
        }
        None
    }

    /// Text value of the first matching alias; blank strings count as absent
    pub fn text(&self, aliases: &[&str]) -> Option<String> {
        match self.lookup(aliases)? {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for RawRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

/// Build an identity key from ordered components
pub fn compose_identity_key<I>(parts: I) -> String
where
    I: IntoIterator<Item = Option<String>>,
{
    parts
        .into_iter()
        .map(|part| part.unwrap_or_else(|| KEY_PLACEHOLDER.to_string()))
        .collect::<Vec<_>>()
        .join(KEY_SEPARATOR)
}

/// Canonical document ready for persistence
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRecord {
    /// Deterministic identity key, the sole deduplication key
    pub identity_key: String,
    /// Collector-specific typed fields, absent values stored as null
    pub fields: Map<String, Value>,
    /// Original record
    pub raw: RawRecord,
}

impl NormalizedRecord {
    /// Build from a serializable typed record
    pub fn from_typed<T: Serialize>(identity_key: String, typed: &T, raw: RawRecord) -> Self {
        let fields = match serde_json::to_value(typed) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self {
            identity_key,
            fields,
            raw,
        }
    }

    /// True when every key component fell back to the placeholder. All such
    /// rows of a collection share one key, so they collapse into a single
    /// document.
    pub fn is_keyless(&self) -> bool {
        self.identity_key
            .split(KEY_SEPARATOR)
            .all(|part| part == KEY_PLACEHOLDER)
    }

    /// Full stored document: identity field, typed fields, raw record
    pub fn into_document(self) -> Map<String, Value> {
        let mut doc = self.fields;
        doc.insert(
            IDENTITY_FIELD.to_string(),
            Value::String(self.identity_key),
        );
        doc.insert(RAW_FIELD.to_string(), self.raw.into_value());
        doc
    }
}

/// A single upsert-by-key write
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertOp {
    pub key: String,
    pub document: Map<String, Value>,
}

impl From<NormalizedRecord> for UpsertOp {
    fn from(record: NormalizedRecord) -> Self {
        Self {
            key: record.identity_key.clone(),
            document: record.into_document(),
        }
    }
}
