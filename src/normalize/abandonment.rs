//! Abandoned-animal notices

use super::{split_region, FieldAlias, Normalizer};
use crate::types::{compose_identity_key, NormalizedRecord, RawRecord};
use serde::Serialize;

const DESERTION_NO: FieldAlias = FieldAlias::new("desertionNo", &["desertionNo", "DESERTION_NO"]);
const HAPPEN_DT: FieldAlias = FieldAlias::new("happenDt", &["happenDt", "HAPPEN_DT"]);
const HAPPEN_PLACE: FieldAlias = FieldAlias::new("happenPlace", &["happenPlace", "HAPPEN_PLACE"]);
const KIND_FULL: FieldAlias = FieldAlias::new("kindFullNm", &["kindFullNm", "kindCd"]);
const UP_KIND: FieldAlias = FieldAlias::new("species", &["upKindNm"]);
const KIND: FieldAlias = FieldAlias::new("breed", &["kindNm"]);
const SEX: FieldAlias = FieldAlias::new("sex", &["sexCd", "SEX_CD"]);
const NEUTER: FieldAlias = FieldAlias::new("neuter", &["neuterYn", "NEUTER_YN"]);
const WEIGHT: FieldAlias = FieldAlias::new("weight", &["weight", "WEIGHT"]);
const AGE: FieldAlias = FieldAlias::new("birthYear", &["age", "ageRaw", "AGE"]);
const COLOR: FieldAlias = FieldAlias::new("colorCd", &["colorCd", "COLOR_CD"]);
const PROCESS_STATE: FieldAlias = FieldAlias::new("processState", &["processState", "PROCESS_STATE"]);
const NOTICE_NO: FieldAlias = FieldAlias::new("noticeNo", &["noticeNo", "NOTICE_NO"]);
const NOTICE_START: FieldAlias = FieldAlias::new("noticeSdt", &["noticeSdt", "NOTICE_SDT"]);
const NOTICE_END: FieldAlias = FieldAlias::new("noticeEdt", &["noticeEdt", "NOTICE_EDT"]);
const CARE_NM: FieldAlias = FieldAlias::new("careNm", &["careNm", "CARE_NM"]);
const CARE_TEL: FieldAlias = FieldAlias::new("careTel", &["careTel", "CARE_TEL"]);
const CARE_ADDR: FieldAlias = FieldAlias::new("careAddr", &["careAddr", "CARE_ADDR"]);
const ORG_NM: FieldAlias = FieldAlias::new("orgNm", &["orgNm", "ORG_NM"]);
const SPECIAL_MARK: FieldAlias = FieldAlias::new("specialMark", &["specialMark", "SPECIAL_MARK"]);
const POPFILE: FieldAlias = FieldAlias::new("popfile", &["popfile1", "popfile", "POPFILE"]);
const UPDATED: FieldAlias = FieldAlias::new("updTm", &["updTm", "UPD_TM"]);

/// Canonical abandonment document (without `uid` and `raw`)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Abandonment {
    pub desertion_no: Option<String>,
    pub happen_dt: Option<String>,
    pub happen_place: Option<String>,
    pub species: Option<String>,
    pub breed: Option<String>,
    pub sex: Option<String>,
    pub neuter: Option<bool>,
    pub weight: Option<f64>,
    pub birth_year: Option<i32>,
    pub color_cd: Option<String>,
    pub process_state: Option<String>,
    pub notice_no: Option<String>,
    pub notice_sdt: Option<String>,
    pub notice_edt: Option<String>,
    pub care_nm: Option<String>,
    pub care_tel: Option<String>,
    pub care_addr: Option<String>,
    pub org_nm: Option<String>,
    pub sido: Option<String>,
    pub sigungu: Option<String>,
    pub special_mark: Option<String>,
    pub popfile: Option<String>,
    pub upd_tm: Option<String>,
}

/// Keyed by the service's notice number (`desertionNo`)
#[derive(Debug, Clone, Copy, Default)]
pub struct AbandonmentNormalizer;

impl Normalizer for AbandonmentNormalizer {
    fn normalize(&self, raw: RawRecord) -> NormalizedRecord {
        let (species, breed) = species_and_breed(&raw);
        let org_nm = ORG_NM.text(&raw);
        let (sido, sigungu) = split_region(org_nm.as_deref());

        let record = Abandonment {
            desertion_no: DESERTION_NO.text(&raw),
            happen_dt: HAPPEN_DT.date(&raw),
            happen_place: HAPPEN_PLACE.text(&raw),
            species,
            breed,
            sex: SEX.text(&raw).as_deref().and_then(sex_label).map(str::to_string),
            neuter: NEUTER.text(&raw).as_deref().and_then(neuter_flag),
            weight: WEIGHT.decimal(&raw),
            birth_year: AGE.year(&raw),
            color_cd: COLOR.text(&raw),
            process_state: PROCESS_STATE.text(&raw),
            notice_no: NOTICE_NO.text(&raw),
            notice_sdt: NOTICE_START.date(&raw),
            notice_edt: NOTICE_END.date(&raw),
            care_nm: CARE_NM.text(&raw),
            care_tel: CARE_TEL.text(&raw),
            care_addr: CARE_ADDR.text(&raw),
            org_nm,
            sido,
            sigungu,
            special_mark: SPECIAL_MARK.text(&raw),
            popfile: POPFILE.text(&raw),
            upd_tm: UPDATED.text(&raw),
        };

        let key = compose_identity_key([record.desertion_no.clone()]);
        NormalizedRecord::from_typed(key, &record, raw)
    }
}

/// Species and breed, from the dedicated fields or split out of
/// `kindFullNm` ("[개] 믹스견")
fn species_and_breed(raw: &RawRecord) -> (Option<String>, Option<String>) {
    let species = UP_KIND.text(raw);
    let breed = KIND.text(raw);
    if species.is_some() && breed.is_some() {
        return (species, breed);
    }

    let (full_species, full_breed) = match KIND_FULL.text(raw) {
        Some(full) => split_kind_full(&full),
        None => (None, None),
    };
    (species.or(full_species), breed.or(full_breed))
}

fn split_kind_full(full: &str) -> (Option<String>, Option<String>) {
    let Some(rest) = full.trim().strip_prefix('[') else {
        let breed = full.trim();
        return (None, (!breed.is_empty()).then(|| breed.to_string()));
    };
    match rest.split_once(']') {
        Some((species, breed)) => {
            let species = species.trim();
            let breed = breed.trim();
            (
                (!species.is_empty()).then(|| species.to_string()),
                (!breed.is_empty()).then(|| breed.to_string()),
            )
        }
        None => (None, None),
    }
}

fn sex_label(code: &str) -> Option<&'static str> {
    match code.to_ascii_uppercase().as_str() {
        "M" => Some("Male"),
        "F" => Some("Female"),
        "Q" => Some("Unknown"),
        _ => None,
    }
}

fn neuter_flag(code: &str) -> Option<bool> {
    match code.to_ascii_uppercase().as_str() {
        "Y" => Some(true),
        "N" => Some(false),
        _ => None,
    }
}
