//! Lenient value parsing
//!
//! Services return numbers as JSON numbers, as localized strings with group
//! separators ("1,234"), or with units attached ("6.8(Kg)"). Anything that
//! cannot be read becomes `None`; nothing here panics or errors.

use chrono::NaiveDate;
use serde_json::Value;

/// Parse an integer, stripping group separators and whitespace
pub fn parse_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => parse_integer_str(s),
        _ => None,
    }
}

/// String form of [`parse_integer`]
pub fn parse_integer_str(s: &str) -> Option<i64> {
    let cleaned: String = s
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<i64>().ok().or_else(|| {
        cleaned
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite() && f.fract() == 0.0)
            .map(|f| f as i64)
    })
}

/// Parse a decimal, dropping parenthesised units, separators and whitespace
pub fn parse_decimal(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()),
        Value::String(s) => parse_decimal_str(s),
        _ => None,
    }
}

/// String form of [`parse_decimal`]
pub fn parse_decimal_str(s: &str) -> Option<f64> {
    let mut cleaned = String::with_capacity(s.len());
    let mut depth = 0usize;
    for c in s.chars() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' => {}
            c if c.is_whitespace() => {}
            c if depth == 0 => cleaned.push(c),
            _ => {}
        }
    }
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|f| f.is_finite())
}

/// First run of four ASCII digits, read as a year ("2016(년생)" -> 2016)
pub fn first_year(s: &str) -> Option<i32> {
    let bytes = s.as_bytes();
    let mut run = 0usize;
    for (i, b) in bytes.iter().enumerate() {
        if b.is_ascii_digit() {
            run += 1;
            if run == 4 {
                return s[i + 1 - 4..=i].parse().ok();
            }
        } else {
            run = 0;
        }
    }
    None
}

/// Parse a date in compact (YYYYMMDD) or ISO (YYYY-MM-DD) form
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .ok()
}
