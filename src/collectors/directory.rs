//! Region listings served by the public-data portal

use super::{join_url, PORTAL_FORMAT};
use crate::error::IngestError;
use crate::fetch::{Envelope, PageFetcher, PageRequest, Transport};
use crate::partition::RegionDirectory;
use crate::types::{RawRecord, RegionCode};
use async_trait::async_trait;

const REGIONS_PATH: &str = "sido_v2";
const SUB_REGIONS_PATH: &str = "sigungu_v2";
/// Both listings fit comfortably in one page
const LISTING_ROWS: u64 = 1000;

const CODE_FIELDS: &[&str] = &["orgCd", "org_cd"];
const NAME_FIELDS: &[&str] = &["orgdownNm", "orgNm"];

/// `sido_v2` / `sigungu_v2` listing over the regular page fetcher, so
/// listings get the same retry policy as record pages
pub struct PortalRegionDirectory<T: Transport> {
    fetcher: PageFetcher<T>,
    base_url: String,
    service_key: String,
}

impl<T: Transport> PortalRegionDirectory<T> {
    pub fn new(fetcher: PageFetcher<T>, base_url: &str, service_key: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.to_string(),
            service_key: service_key.to_string(),
        }
    }

    fn listing(&self, path: &str) -> PageRequest {
        PageRequest::new(join_url(&self.base_url, path))
            .secret_param("serviceKey", self.service_key.as_str())
            .param("_type", PORTAL_FORMAT)
            .param("numOfRows", LISTING_ROWS)
            .param("pageNo", 1)
    }

    async fn list(&self, request: PageRequest, scope: &str) -> Result<Vec<RegionCode>, IngestError> {
        let page = self
            .fetcher
            .fetch(&request, &Envelope::Portal)
            .await
            .map_err(|e| IngestError::fetch(scope, e))?;
        Ok(page.rows.iter().filter_map(region_from_row).collect())
    }
}

fn region_from_row(row: &RawRecord) -> Option<RegionCode> {
    let code = row.text(CODE_FIELDS)?;
    Some(match row.text(NAME_FIELDS) {
        Some(name) => RegionCode::new(code).with_name(name),
        None => RegionCode::new(code),
    })
}

#[async_trait]
impl<T: Transport> RegionDirectory for PortalRegionDirectory<T> {
    async fn regions(&self) -> Result<Vec<RegionCode>, IngestError> {
        self.list(self.listing(REGIONS_PATH), "region listing").await
    }

    async fn sub_regions(&self, parent: &RegionCode) -> Result<Vec<RegionCode>, IngestError> {
        let request = self.listing(SUB_REGIONS_PATH).param("upr_cd", &parent.code);
        self.list(request, &format!("sub-regions of {}", parent)).await
    }
}
