//! Record normalization
//!
//! A [`Normalizer`] turns one raw service record into a canonical document
//! with a deterministic identity key. Canonical fields are resolved through
//! [`FieldAlias`] tables: each field lists the source names it may arrive
//! under, tried in priority order (exact name first, then ignoring case).
//!
//! Normalization is total: a missing or unreadable field becomes an absent
//! value, never an error.

pub mod abandonment;
pub mod numeric;
pub mod registration;
pub mod shelter;

pub use abandonment::AbandonmentNormalizer;
pub use registration::RegistrationNormalizer;
pub use shelter::ShelterNormalizer;

use crate::types::{NormalizedRecord, RawRecord};

/// Maps raw records of one collector to canonical documents
pub trait Normalizer: Send + Sync {
    fn normalize(&self, raw: RawRecord) -> NormalizedRecord;
}

/// A canonical field and its source aliases, in priority order
#[derive(Debug, Clone, Copy)]
pub struct FieldAlias {
    pub canonical: &'static str,
    pub aliases: &'static [&'static str],
}

impl FieldAlias {
    pub const fn new(canonical: &'static str, aliases: &'static [&'static str]) -> Self {
        Self { canonical, aliases }
    }

    pub fn text(&self, raw: &RawRecord) -> Option<String> {
        raw.text(self.aliases)
    }

    pub fn integer(&self, raw: &RawRecord) -> Option<i64> {
        raw.lookup(self.aliases).and_then(numeric::parse_integer)
    }

    pub fn decimal(&self, raw: &RawRecord) -> Option<f64> {
        raw.lookup(self.aliases).and_then(numeric::parse_decimal)
    }

    pub fn year(&self, raw: &RawRecord) -> Option<i32> {
        self.text(raw).as_deref().and_then(numeric::first_year)
    }

    /// Date as ISO `YYYY-MM-DD`
    pub fn date(&self, raw: &RawRecord) -> Option<String> {
        self.text(raw)
            .as_deref()
            .and_then(numeric::parse_date)
            .map(|d| d.format("%Y-%m-%d").to_string())
    }
}

/// Split an address-like text ("서울특별시 강남구 ...") into its first two
/// administrative units
pub fn split_region(text: Option<&str>) -> (Option<String>, Option<String>) {
    let Some(text) = text else {
        return (None, None);
    };
    let mut parts = text.split_whitespace();
    let first = parts.next().map(str::to_string);
    let second = parts.next().map(str::to_string);
    (first, second)
}
