//! Configuration for animal-ingest

mod http;
mod logging;
mod sources;
mod store;

pub use http::{HttpConfig, RetryConfig, DEFAULT_USER_AGENT};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use sources::{AbandonmentConfig, RegistrationConfig, ShelterConfig};
pub use store::{StoreConfig, DEFAULT_MONGO_URL};

use crate::partition::parse_compact_date;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "animal-ingest.toml";

/// Portal service key, shared by the abandonment and shelter services
pub const ENV_SERVICE_KEY: &str = "DATA_GO_KR_SERVICE_KEY";
/// Grid open API key for the registration service
pub const ENV_API_KEY: &str = "MAFRA_API_KEY";
/// MongoDB connection string
pub const ENV_MONGO_URL: &str = "MONGO_URL";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub abandonment: AbandonmentConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub shelter: ShelterConfig,
}

impl Config {
    /// Load configuration from a TOML file, fill secrets from the
    /// environment, and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path.display(), e))?;
        let mut config: Config = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path.display(), e))?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise start from defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        let mut config = Config::default();
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Fill secrets missing from the file from process environment variables
    pub fn apply_env(&mut self) {
        self.apply_env_with(|name| std::env::var(name).ok());
    }

    /// Fill secrets missing from the file using `lookup`. Values already set
    /// in the file win.
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if self.abandonment.service_key.is_none() {
            self.abandonment.service_key = lookup(ENV_SERVICE_KEY);
        }
        if self.shelter.service_key.is_none() {
            self.shelter.service_key = lookup(ENV_SERVICE_KEY);
        }
        if self.registration.api_key.is_none() {
            self.registration.api_key = lookup(ENV_API_KEY);
        }
        if self.store.url.is_none() {
            self.store.url = lookup(ENV_MONGO_URL);
        }
    }

    /// Validate all configuration fields.
    ///
    /// Collects every error and reports them together. Access keys are not
    /// checked here: only the collector being run needs its key.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        // Retry
        if self.retry.max_attempts == 0 {
            errors.push("retry.max_attempts must be positive".to_string());
        }

        // HTTP
        if self.http.timeout_secs == 0 {
            errors.push("http.timeout_secs must be positive".to_string());
        }

        // Store
        if self.store.database.trim().is_empty() {
            errors.push("store.database must not be empty".to_string());
        }

        // Abandonment
        let ab = &self.abandonment;
        check_url(&mut errors, "abandonment.base_url", &ab.base_url);
        check_page_size(&mut errors, "abandonment.page_size", ab.page_size);
        check_collection(&mut errors, "abandonment.collection", &ab.collection);
        let start = parse_compact_date(&ab.start_date)
            .map_err(|e| errors.push(format!("abandonment.start_date: {}", e)))
            .ok();
        let end = parse_compact_date(&ab.end_date)
            .map_err(|e| errors.push(format!("abandonment.end_date: {}", e)))
            .ok();
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                errors.push(format!(
                    "abandonment.start_date ({}) is after abandonment.end_date ({})",
                    ab.start_date, ab.end_date
                ));
            }
        }

        // Registration
        let reg = &self.registration;
        check_url(&mut errors, "registration.endpoint", &reg.endpoint);
        check_page_size(&mut errors, "registration.page_size", reg.page_size);
        check_collection(&mut errors, "registration.collection", &reg.collection);
        if reg.service.trim().is_empty() {
            errors.push("registration.service must not be empty".to_string());
        }
        if reg.region_param.trim().is_empty() {
            errors.push("registration.region_param must not be empty".to_string());
        }

        // Shelter
        let sh = &self.shelter;
        check_url(&mut errors, "shelter.base_url", &sh.base_url);
        check_page_size(&mut errors, "shelter.page_size", sh.page_size);
        check_collection(&mut errors, "shelter.collection", &sh.collection);

        if errors.is_empty() {
            Ok(())
        } else {
            anyhow::bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            );
        }
    }
}

fn check_url(errors: &mut Vec<String>, field: &str, value: &str) {
    if let Err(e) = url::Url::parse(value) {
        errors.push(format!("{} is not a valid URL ('{}'): {}", field, value, e));
    }
}

fn check_page_size(errors: &mut Vec<String>, field: &str, value: u64) {
    if value == 0 {
        errors.push(format!("{} must be positive", field));
    }
}

fn check_collection(errors: &mut Vec<String>, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(format!("{} must not be empty", field));
    }
}
