//! Animal shelters

use super::{split_region, FieldAlias, Normalizer};
use crate::types::{compose_identity_key, NormalizedRecord, RawRecord};
use serde::Serialize;

const CARE_REG_NO: FieldAlias = FieldAlias::new("careRegNo", &["careRegNo", "CARE_REG_NO"]);
const CARE_NM: FieldAlias = FieldAlias::new("careNm", &["careNm", "CARE_NM"]);
const CARE_ADDR: FieldAlias = FieldAlias::new("careAddr", &["careAddr", "CARE_ADDR", "jibunAddr"]);
const LAT: FieldAlias = FieldAlias::new("lat", &["lat", "LAT", "latitude"]);
const LNG: FieldAlias = FieldAlias::new("lng", &["lng", "LNG", "lon", "longitude"]);
const DIVISION: FieldAlias = FieldAlias::new("divisionNm", &["divisionNm", "DIVISION_NM"]);
const DESIGNATED: FieldAlias =
    FieldAlias::new("designationDate", &["dsignationDate", "designationDate", "DSIGNATION_DATE"]);
const CARE_TEL: FieldAlias = FieldAlias::new("careTel", &["careTel", "CARE_TEL"]);
const ORG_NM: FieldAlias = FieldAlias::new("orgNm", &["orgNm", "ORG_NM"]);
const SAVE_TARGET: FieldAlias = FieldAlias::new("saveTrgtAnimal", &["saveTrgtAnimal", "SAVE_TRGT_ANIMAL"]);
const DATA_STD_DT: FieldAlias = FieldAlias::new("dataStdDt", &["dataStdDt", "DATA_STD_DT"]);

/// Canonical shelter document (without `uid` and `raw`)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shelter {
    pub care_reg_no: Option<String>,
    pub care_nm: Option<String>,
    pub care_addr: Option<String>,
    pub sido: Option<String>,
    pub sigungu: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub division_nm: Option<String>,
    pub designation_date: Option<String>,
    pub care_tel: Option<String>,
    pub org_nm: Option<String>,
    pub save_trgt_animal: Option<String>,
    pub data_std_dt: Option<String>,
}

/// Keyed by the shelter's registration number (`careRegNo`)
#[derive(Debug, Clone, Copy, Default)]
pub struct ShelterNormalizer;

impl Normalizer for ShelterNormalizer {
    fn normalize(&self, raw: RawRecord) -> NormalizedRecord {
        let care_addr = CARE_ADDR.text(&raw);
        let (sido, sigungu) = split_region(care_addr.as_deref());

        let record = Shelter {
            care_reg_no: CARE_REG_NO.text(&raw),
            care_nm: CARE_NM.text(&raw),
            care_addr,
            sido,
            sigungu,
            lat: LAT.decimal(&raw),
            lng: LNG.decimal(&raw),
            division_nm: DIVISION.text(&raw),
            designation_date: DESIGNATED.date(&raw),
            care_tel: CARE_TEL.text(&raw),
            org_nm: ORG_NM.text(&raw),
            save_trgt_animal: SAVE_TARGET.text(&raw),
            data_std_dt: DATA_STD_DT.date(&raw),
        };

        let key = compose_identity_key([record.care_reg_no.clone()]);
        NormalizedRecord::from_typed(key, &record, raw)
    }
}
