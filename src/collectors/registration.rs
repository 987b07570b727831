//! Registration statistics: flat region list, 1-based index-range paging

use super::{require_key, Collector};
use crate::config::{RegistrationConfig, ENV_API_KEY};
use crate::error::IngestError;
use crate::fetch::{Envelope, GridEnvelope, PageRequest};
use crate::normalize::{Normalizer, RegistrationNormalizer};
use crate::partition::StaticPartitions;
use crate::types::{PageWindow, Partition, RegionCode};
use std::time::Duration;

/// Grid services only speak this type in the path
const GRID_FORMAT: &str = "json";

pub struct RegistrationCollector {
    api_key: String,
    endpoint: String,
    service: String,
    region_param: String,
    regions: Vec<String>,
    page_size: u64,
    page_delay: Duration,
    collection: String,
    envelope: Envelope,
    normalizer: RegistrationNormalizer,
}

impl RegistrationCollector {
    pub fn from_config(config: &RegistrationConfig) -> Result<Self, IngestError> {
        let api_key = require_key(config.api_key.as_deref(), "registration.api_key", ENV_API_KEY)?;
        Ok(Self {
            api_key,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            service: config.service.clone(),
            region_param: config.region_param.clone(),
            regions: config.regions.clone(),
            page_size: config.page_size,
            page_delay: Duration::from_millis(config.page_delay_ms),
            collection: config.collection.clone(),
            envelope: Envelope::Grid(GridEnvelope::new(config.service.clone())),
            normalizer: RegistrationNormalizer,
        })
    }

    /// One partition per configured region name, or the global partition
    pub fn partitions(&self) -> StaticPartitions {
        StaticPartitions::regions(self.regions.iter().map(RegionCode::new))
    }
}

impl Collector for RegistrationCollector {
    fn name(&self) -> &'static str {
        "registrations"
    }

    fn collection(&self) -> &str {
        &self.collection
    }

    fn page_size(&self) -> u64 {
        self.page_size
    }

    fn page_delay(&self) -> Duration {
        self.page_delay
    }

    fn request(&self, partition: &Partition, window: PageWindow) -> PageRequest {
        let url = format!(
            "{}/{}/{}/{}/{}/{}",
            self.endpoint,
            self.api_key,
            GRID_FORMAT,
            self.service,
            window.start_index(),
            window.end_index()
        );
        let request = PageRequest::new(url).redact(self.api_key.as_str());
        match &partition.region {
            Some(region) => request.param(&self.region_param, &region.code),
            None => request,
        }
    }

    fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    fn normalizer(&self) -> &dyn Normalizer {
        &self.normalizer
    }
}
