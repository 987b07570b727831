//! Per-collector data source configuration

use serde::{Deserialize, Serialize};

fn default_page_size() -> u64 {
    1000
}

fn default_page_delay_ms() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

/// Lost and abandoned animal notices (public-data portal)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbandonmentConfig {
    /// Portal service key; falls back to `DATA_GO_KR_SERVICE_KEY`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_key: Option<String>,
    #[serde(default = "default_abandonment_base_url")]
    pub base_url: String,
    /// First day of the notice window (YYYYMMDD)
    #[serde(default = "default_start_date")]
    pub start_date: String,
    /// Last day of the notice window (YYYYMMDD)
    #[serde(default = "default_end_date")]
    pub end_date: String,
    /// Walk regions and sub-regions; when off, partitions are months only
    #[serde(default = "default_true")]
    pub use_regions: bool,
    /// Restrict to these first-level region codes or names (empty = all)
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default = "default_abandonment_collection")]
    pub collection: String,
}

fn default_abandonment_base_url() -> String {
    "https://apis.data.go.kr/1543061/abandonmentPublicService_v2".to_string()
}

fn default_start_date() -> String {
    "20240101".to_string()
}

fn default_end_date() -> String {
    "20241231".to_string()
}

fn default_abandonment_collection() -> String {
    "abandonments".to_string()
}

impl Default for AbandonmentConfig {
    fn default() -> Self {
        Self {
            service_key: None,
            base_url: default_abandonment_base_url(),
            start_date: default_start_date(),
            end_date: default_end_date(),
            use_regions: true,
            regions: Vec::new(),
            page_size: default_page_size(),
            page_delay_ms: default_page_delay_ms(),
            collection: default_abandonment_collection(),
        }
    }
}

/// Companion-animal registration statistics (grid-style open API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Open API key; falls back to `MAFRA_API_KEY`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base of `{endpoint}/{api_key}/json/{service}/{start}/{end}`
    #[serde(default = "default_registration_endpoint")]
    pub endpoint: String,
    /// Grid service name, also the response container name
    #[serde(default = "default_registration_service")]
    pub service: String,
    /// Query parameter carrying the region filter
    #[serde(default = "default_region_param")]
    pub region_param: String,
    /// First-level region names to query one by one (empty = everything at once)
    #[serde(default)]
    pub regions: Vec<String>,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default = "default_registration_collection")]
    pub collection: String,
}

fn default_registration_endpoint() -> String {
    "http://211.237.50.150:7080/openapi".to_string()
}

fn default_registration_service() -> String {
    "Grid_20210806000000000612_1".to_string()
}

fn default_region_param() -> String {
    "CTPV".to_string()
}

fn default_registration_collection() -> String {
    "registrations".to_string()
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_registration_endpoint(),
            service: default_registration_service(),
            region_param: default_region_param(),
            regions: Vec::new(),
            page_size: default_page_size(),
            page_delay_ms: default_page_delay_ms(),
            collection: default_registration_collection(),
        }
    }
}

/// Animal shelter directory (public-data portal)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelterConfig {
    /// Portal service key; falls back to `DATA_GO_KR_SERVICE_KEY`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_key: Option<String>,
    #[serde(default = "default_shelter_base_url")]
    pub base_url: String,
    #[serde(default = "default_shelter_path")]
    pub path: String,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default = "default_shelter_collection")]
    pub collection: String,
}

fn default_shelter_base_url() -> String {
    "https://apis.data.go.kr/1543061/animalShelterSrvc_v2".to_string()
}

fn default_shelter_path() -> String {
    "shelterInfo_v2".to_string()
}

fn default_shelter_collection() -> String {
    "shelters".to_string()
}

impl Default for ShelterConfig {
    fn default() -> Self {
        Self {
            service_key: None,
            base_url: default_shelter_base_url(),
            path: default_shelter_path(),
            page_size: default_page_size(),
            page_delay_ms: default_page_delay_ms(),
            collection: default_shelter_collection(),
        }
    }
}
