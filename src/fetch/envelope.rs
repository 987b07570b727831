//! Response envelopes
//!
//! Each service family wraps its rows differently. An envelope knows where
//! the container, result code, total and rows live, and refuses to read an
//! error payload as an empty page.

use super::{FetchError, Page};
use crate::normalize::numeric::parse_integer;
use crate::types::RawRecord;
use serde_json::Value;

/// Result code signalling success on the public-data portal
const PORTAL_SUCCESS: &str = "00";
/// Portal result code for "no data"
const PORTAL_NO_DATA: &str = "03";
/// Portal result codes that retrying cannot fix (bad service, access
/// denied, unregistered or expired key, unregistered IP)
const PORTAL_FATAL_CODES: &[&str] = &["12", "20", "30", "31", "32"];

/// Result code signalling success on grid-style open APIs
const GRID_SUCCESS: &str = "INFO-000";
/// Grid result code for "no data"
const GRID_NO_DATA: &str = "INFO-200";

/// Longest body excerpt kept in error messages
const BODY_EXCERPT: usize = 200;

/// Where a service family keeps its rows
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// `{ response: { header: { resultCode, resultMsg }, body: { totalCount, items: { item } } } }`
    Portal,
    /// `{ <service>: { totalCnt, result: { code, message }, row: [...] } }`
    Grid(GridEnvelope),
}

/// Container description for grid-style responses
#[derive(Debug, Clone, PartialEq)]
pub struct GridEnvelope {
    /// Name of the container field (the service name)
    pub container: String,
}

impl GridEnvelope {
    pub fn new(container: impl Into<String>) -> Self {
        Self {
            container: container.into(),
        }
    }
}

impl Envelope {
    /// Human-readable container path, for logs
    pub fn container_name(&self) -> &str {
        match self {
            Envelope::Portal => "response",
            Envelope::Grid(grid) => &grid.container,
        }
    }

    /// Validate a response body and extract its rows
    pub fn parse(&self, body: &str) -> Result<Page, FetchError> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| FetchError::Malformed(format!("{} (body: {})", e, excerpt(body))))?;
        match self {
            Envelope::Portal => parse_portal(&value),
            Envelope::Grid(grid) => parse_grid(&value, &grid.container),
        }
    }
}

fn parse_portal(value: &Value) -> Result<Page, FetchError> {
    let container = value
        .get("response")
        .filter(|v| v.is_object())
        .ok_or_else(|| FetchError::MissingContainer("response".to_string()))?;

    if let Some(code) = container.pointer("/header/resultCode").and_then(code_text) {
        if code == PORTAL_NO_DATA {
            return Ok(Page::empty());
        }
        if code != PORTAL_SUCCESS {
            let message = container
                .pointer("/header/resultMsg")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            return Err(FetchError::Service {
                transient: !PORTAL_FATAL_CODES.contains(&code.as_str()),
                code,
                message,
            });
        }
    }

    let body = container
        .get("body")
        .filter(|v| v.is_object())
        .ok_or_else(|| FetchError::MissingContainer("response.body".to_string()))?;

    let total = body.get("totalCount").and_then(parse_total);

    let rows = match body.get("items") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) if s.trim().is_empty() => Vec::new(),
        Some(Value::Object(items)) => match items.get("item") {
            None | Some(Value::Null) => Vec::new(),
            Some(item) => collect_rows(item, "response.body.items.item")?,
        },
        Some(other) => {
            return Err(FetchError::Shape(format!(
                "response.body.items is {}",
                type_name(other)
            )))
        }
    };

    Ok(Page::new(rows, total))
}

fn parse_grid(value: &Value, container_name: &str) -> Result<Page, FetchError> {
    let Some(container) = lookup_ci(value, &[container_name]).filter(|v| v.is_object()) else {
        // No container: some grid services answer "no data" with a bare result object
        if let Some((code, message)) = grid_result(value) {
            if code == GRID_NO_DATA {
                return Ok(Page::empty());
            }
            return Err(grid_service_error(code, message));
        }
        return Err(FetchError::MissingContainer(container_name.to_string()));
    };

    if let Some((code, message)) = grid_result(container) {
        if code == GRID_NO_DATA {
            return Ok(Page::empty());
        }
        if code != GRID_SUCCESS {
            return Err(grid_service_error(code, message));
        }
    }

    let total = lookup_ci(container, &["totalCnt", "list_total_count"]).and_then(parse_total);

    let rows = match lookup_ci(container, &["row"]) {
        None | Some(Value::Null) => Vec::new(),
        Some(row) => collect_rows(row, &format!("{}.row", container_name))?,
    };

    Ok(Page::new(rows, total))
}

fn grid_result(value: &Value) -> Option<(String, String)> {
    let result = lookup_ci(value, &["result"])?;
    let code = lookup_ci(result, &["code"]).and_then(code_text)?;
    let message = lookup_ci(result, &["message"])
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    Some((code, message))
}

/// Authentication and request-shape errors are permanent; server-side
/// errors are worth retrying.
fn grid_service_error(code: String, message: String) -> FetchError {
    let fatal = code.starts_with("INFO-1") || code.starts_with("ERROR-3");
    FetchError::Service {
        code,
        message,
        transient: !fatal,
    }
}

/// Rows may come as an array of objects or as a single object
fn collect_rows(value: &Value, path: &str) -> Result<Vec<RawRecord>, FetchError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Object(map) => Ok(RawRecord::new(map.clone())),
                other => Err(FetchError::Shape(format!(
                    "{} contains {}",
                    path,
                    type_name(other)
                ))),
            })
            .collect(),
        Value::Object(map) => Ok(vec![RawRecord::new(map.clone())]),
        other => Err(FetchError::Shape(format!("{} is {}", path, type_name(other)))),
    }
}

fn parse_total(value: &Value) -> Option<u64> {
    parse_integer(value).and_then(|n| u64::try_from(n).ok())
}

fn code_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn lookup_ci<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let map = value.as_object()?;
    for key in keys {
        if let Some(v) = map.get(*key) {
            return Some(v);
        }
    }
    for key in keys {
        if let Some((_, v)) = map.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
            return Some(v);
        }
    }
    None
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn excerpt(body: &str) -> String {
    crate::util::truncate_str(body, BODY_EXCERPT)
}
