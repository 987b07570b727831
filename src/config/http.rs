//! HTTP client and retry configuration

use crate::fetch::{ClientErrorPolicy, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default user agent for every request to the data services
pub const DEFAULT_USER_AGENT: &str = concat!("animal-ingest/", env!("CARGO_PKG_VERSION"));

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Page retry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per page, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Base delay; the n-th retry waits n × this
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// `fatal` abandons a page on any 4xx, `retry` retries it
    #[serde(default)]
    pub client_errors: ClientErrorPolicy,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            client_errors: ClientErrorPolicy::default(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
            .with_client_errors(self.client_errors)
    }
}
