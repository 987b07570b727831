//! Companion-animal registration counts

use super::{FieldAlias, Normalizer};
use crate::types::{compose_identity_key, NormalizedRecord, RawRecord};
use serde::Serialize;

const SIDO: FieldAlias = FieldAlias::new("sido", &["CTPV", "CTPV_NM", "sido"]);
const SIGUNGU: FieldAlias = FieldAlias::new("sigungu", &["SGG", "SGG_NM", "sigungu"]);
const BIRTH: FieldAlias = FieldAlias::new("birthYear", &["BRDT", "BIRTH_YEAR", "birthYear"]);
const RFID: FieldAlias = FieldAlias::new("rfidType", &["RFID_SE", "RFID_CD", "rfidType"]);
const KIND: FieldAlias = FieldAlias::new("kind", &["LVSTCK_KND", "LVSTCK_KND_NM", "kind"]);
const SPECIES: FieldAlias = FieldAlias::new("species", &["SPCS", "SPCS_NM", "species"]);
const COUNT: FieldAlias = FieldAlias::new("count", &["CNT", "REG_CNT", "count"]);

/// Canonical registration document (without `uid` and `raw`)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub sido: Option<String>,
    pub sigungu: Option<String>,
    pub birth_year: Option<i32>,
    pub rfid_type: Option<String>,
    pub kind: Option<String>,
    pub species: Option<String>,
    pub count: Option<i64>,
}

/// Rows carry no service identifier; the key is the row's full dimension
/// tuple: region, sub-region, birth year, tag type, kind, species.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegistrationNormalizer;

impl Normalizer for RegistrationNormalizer {
    fn normalize(&self, raw: RawRecord) -> NormalizedRecord {
        let record = Registration {
            sido: SIDO.text(&raw),
            sigungu: SIGUNGU.text(&raw),
            birth_year: BIRTH.year(&raw),
            rfid_type: RFID.text(&raw),
            kind: KIND.text(&raw),
            species: SPECIES.text(&raw),
            count: COUNT.integer(&raw),
        };

        // An unreadable birth year still distinguishes rows by its raw text
        let born = record
            .birth_year
            .map(|y| y.to_string())
            .or_else(|| BIRTH.text(&raw));

        let key = compose_identity_key([
            record.sido.clone(),
            record.sigungu.clone(),
            born,
            record.rfid_type.clone(),
            record.kind.clone(),
            record.species.clone(),
        ]);
        NormalizedRecord::from_typed(key, &record, raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn normalize(value: Value) -> NormalizedRecord {
        RegistrationNormalizer.normalize(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_registration_fields_and_key() {
        let record = normalize(json!({
            "CTPV": "서울특별시",
            "SGG": "강남구",
            "BRDT": "2019",
            "RFID_SE": "내장형",
            "LVSTCK_KND": "개",
            "SPCS": "말티즈",
            "CNT": "1,234"
        }));
        assert_eq!(record.identity_key, "서울특별시|강남구|2019|내장형|개|말티즈");
        assert_eq!(record.fields["count"], json!(1234));
        assert_eq!(record.fields["birthYear"], json!(2019));
    }

    #[test]
    fn test_key_ignores_field_order_and_casing() {
        let a = normalize(json!({
            "CTPV": "부산광역시", "SGG": "해운대구", "BRDT": "2020",
            "RFID_SE": "외장형", "LVSTCK_KND": "고양이", "SPCS": "페르시안", "CNT": "3"
        }));
        let b = normalize(json!({
            "cnt": "3", "spcs": "페르시안", "lvstck_knd": "고양이",
            "rfid_se": "외장형", "brdt": "2020", "sgg": "해운대구", "ctpv": "부산광역시"
        }));
        assert_eq!(a.identity_key, b.identity_key);
        assert_eq!(a.fields, b.fields);
    }

    #[test]
    fn test_missing_components_use_placeholder() {
        let record = normalize(json!({"CTPV": "세종특별자치시", "CNT": ""}));
        assert_eq!(record.identity_key, "세종특별자치시|NA|NA|NA|NA|NA");
        assert_eq!(record.fields["count"], Value::Null);
    }

    #[test]
    fn test_unparsable_birth_year_keeps_raw_text_in_key() {
        let record = normalize(json!({"CTPV": "a", "SGG": "b", "BRDT": "미상"}));
        assert_eq!(record.fields["birthYear"], Value::Null);
        assert!(record.identity_key.contains("|미상|"));
    }
}
