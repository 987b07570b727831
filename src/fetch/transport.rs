//! HTTP transport
//!
//! The fetcher only needs "GET this, give me status and body". Keeping that
//! behind [`Transport`] lets tests script responses without a server.

use super::FetchError;
use crate::config::HttpConfig;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// A GET request against a data service
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    secrets: Vec<String>,
}

impl PageRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            secrets: Vec::new(),
        }
    }

    /// Add a query parameter
    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Add a query parameter whose value must not appear in logs
    pub fn secret_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let value = value.into();
        self.secrets.push(value.clone());
        self.query.push((key.into(), value));
        self
    }

    /// Mark a value embedded in the URL itself as secret
    pub fn redact(mut self, secret: impl Into<String>) -> Self {
        self.secrets.push(secret.into());
        self
    }

    /// Value of a query parameter, if set
    pub fn get(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// URL and parameters with secrets masked
    pub fn describe(&self) -> String {
        let mut out = self.url.clone();
        if !self.query.is_empty() {
            let params: Vec<String> = self
                .query
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            out.push('?');
            out.push_str(&params.join("&"));
        }
        for secret in self.secrets.iter().filter(|s| !s.is_empty()) {
            out = out.replace(secret.as_str(), "***");
        }
        out
    }
}

/// Status and body of an HTTP response
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Issues one HTTP GET. Failing to get any response is a
/// [`FetchError::Network`]; any status code is returned as a response.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, request: &PageRequest) -> Result<HttpResponse, FetchError>;
}

/// Production transport on `reqwest`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: &HttpConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, request: &PageRequest) -> Result<HttpResponse, FetchError> {
        debug!("GET {}", request.describe());
        let response = self
            .client
            .get(&request.url)
            .query(&request.query)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}
