//! Shelter directory: one global partition, page-number paging

use super::{join_url, require_key, Collector, PORTAL_FORMAT};
use crate::config::{ShelterConfig, ENV_SERVICE_KEY};
use crate::error::IngestError;
use crate::fetch::{Envelope, PageRequest};
use crate::normalize::{Normalizer, ShelterNormalizer};
use crate::partition::StaticPartitions;
use crate::types::{PageWindow, Partition};
use std::time::Duration;

pub struct ShelterCollector {
    service_key: String,
    url: String,
    page_size: u64,
    page_delay: Duration,
    collection: String,
    envelope: Envelope,
    normalizer: ShelterNormalizer,
}

impl ShelterCollector {
    pub fn from_config(config: &ShelterConfig) -> Result<Self, IngestError> {
        let service_key =
            require_key(config.service_key.as_deref(), "shelter.service_key", ENV_SERVICE_KEY)?;
        Ok(Self {
            service_key,
            url: join_url(&config.base_url, &config.path),
            page_size: config.page_size,
            page_delay: Duration::from_millis(config.page_delay_ms),
            collection: config.collection.clone(),
            envelope: Envelope::Portal,
            normalizer: ShelterNormalizer,
        })
    }

    pub fn partitions(&self) -> StaticPartitions {
        StaticPartitions::global()
    }
}

impl Collector for ShelterCollector {
    fn name(&self) -> &'static str {
        "shelters"
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

    fn request(&self, _partition: &Partition, window: PageWindow) -> PageRequest {
        PageRequest::new(self.url.clone())
            .secret_param("serviceKey", self.service_key.as_str())
            .param("_type", PORTAL_FORMAT)
            .param("pageNo", window.page_number())
            .param("numOfRows", window.size)
    }

    fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    fn normalizer(&self) -> &dyn Normalizer {
        &self.normalizer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shelter_request() {
        let cfg = ShelterConfig {
            service_key: Some("k".into()),
            page_size: 100,
            ..ShelterConfig::default()
        };
        let collector = ShelterCollector::from_config(&cfg).unwrap();
        let request = collector.request(&Partition::global(), PageWindow { offset: 100, size: 100 });
        assert!(request.url.ends_with("/animalShelterSrvc_v2/shelterInfo_v2"));
        assert_eq!(request.get("pageNo"), Some("2"));
        assert_eq!(request.get("numOfRows"), Some("100"));
        assert_eq!(collector.partitions().len(), 1);
    }

    #[test]
    fn test_missing_key() {
        assert!(matches!(
            ShelterCollector::from_config(&ShelterConfig::default()),
            Err(IngestError::Configuration(_))
        ));
    }
}
