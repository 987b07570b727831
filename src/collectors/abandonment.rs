//! Abandoned-animal notices: region × sub-region × month, page-number paging

use super::{join_url, require_key, Collector, PortalRegionDirectory, PORTAL_FORMAT};
use crate::config::{AbandonmentConfig, ENV_SERVICE_KEY};
use crate::error::IngestError;
use crate::fetch::{Envelope, PageFetcher, PageRequest, Transport};
use crate::normalize::{AbandonmentNormalizer, Normalizer};
use crate::partition::{build_monthly_ranges, PartitionSource, RegionHierarchy, StaticPartitions};
use crate::types::{DateRange, PageWindow, Partition};
use std::time::Duration;

const RECORDS_PATH: &str = "abandonmentPublic_v2";

pub struct AbandonmentCollector {
    service_key: String,
    base_url: String,
    months: Vec<DateRange>,
    use_regions: bool,
    regions: Vec<String>,
    page_size: u64,
    page_delay: Duration,
    collection: String,
    envelope: Envelope,
    normalizer: AbandonmentNormalizer,
}

impl AbandonmentCollector {
    /// Fails on a missing service key or a bad date window
    pub fn from_config(config: &AbandonmentConfig) -> Result<Self, IngestError> {
        let service_key = require_key(
            config.service_key.as_deref(),
            "abandonment.service_key",
            ENV_SERVICE_KEY,
        )?;
        let months = build_monthly_ranges(&config.start_date, &config.end_date)?;

        Ok(Self {
            service_key,
            base_url: config.base_url.clone(),
            months,
            use_regions: config.use_regions,
            regions: config.regions.clone(),
            page_size: config.page_size,
            page_delay: Duration::from_millis(config.page_delay_ms),
            collection: config.collection.clone(),
            envelope: Envelope::Portal,
            normalizer: AbandonmentNormalizer,
        })
    }

    pub fn months(&self) -> &[DateRange] {
        &self.months
    }

    /// Partitions for this run. With regions enabled the hierarchy is listed
    /// through `fetcher` as the run reaches each region.
    pub fn partitions<T: Transport + 'static>(
        &self,
        fetcher: PageFetcher<T>,
    ) -> Box<dyn PartitionSource> {
        if !self.use_regions {
            return Box::new(StaticPartitions::periods(self.months.clone()));
        }
        let directory = PortalRegionDirectory::new(fetcher, &self.base_url, &self.service_key);
        Box::new(
            RegionHierarchy::new(directory)
                .with_periods(self.months.clone())
                .only_regions(self.regions.clone()),
        )
    }
}

impl Collector for AbandonmentCollector {
    fn name(&self) -> &'static str {
        "abandonments"
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
        let mut request = PageRequest::new(join_url(&self.base_url, RECORDS_PATH))
            .secret_param("serviceKey", self.service_key.as_str())
            .param("_type", PORTAL_FORMAT);
        if let Some(period) = &partition.period {
            request = request
                .param("bgnde", period.start_compact())
                .param("endde", period.end_compact());
        }
        if let Some(region) = &partition.region {
            request = request.param("upr_cd", &region.code);
        }
        if let Some(sub) = &partition.sub_region {
            request = request.param("org_cd", &sub.code);
        }
        request
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
