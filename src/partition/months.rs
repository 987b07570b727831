//! Calendar-month slicing of a date range

use crate::error::IngestError;
use crate::types::DateRange;
use chrono::{Datelike, NaiveDate};

/// Parse a compact `YYYYMMDD` date
pub fn parse_compact_date(s: &str) -> Result<NaiveDate, IngestError> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(IngestError::configuration(format!(
            "date must be 8 digits (YYYYMMDD), got '{}'",
            s
        )));
    }
    NaiveDate::parse_from_str(s, "%Y%m%d")
        .map_err(|e| IngestError::configuration(format!("invalid date '{}': {}", s, e)))
}

/// One range per calendar month touched by `start..=end` (both `YYYYMMDD`),
/// with the first and last ranges clipped to the given dates.
pub fn build_monthly_ranges(start: &str, end: &str) -> Result<Vec<DateRange>, IngestError> {
    let start = parse_compact_date(start)?;
    let end = parse_compact_date(end)?;
    monthly_ranges(start, end)
}

/// Date form of [`build_monthly_ranges`]
pub fn monthly_ranges(start: NaiveDate, end: NaiveDate) -> Result<Vec<DateRange>, IngestError> {
    if start > end {
        return Err(IngestError::configuration(format!(
            "start date {} is after end date {}",
            start, end
        )));
    }

    let mut ranges = Vec::new();
    let mut cursor = start;
    while cursor <= end {
        let month_end = last_day_of_month(cursor).ok_or_else(|| {
            IngestError::configuration(format!("cannot compute month end for {}", cursor))
        })?;
        let range_end = month_end.min(end);
        ranges.push(DateRange::new(cursor, range_end));
        match month_end.succ_opt() {
            Some(next) => cursor = next,
            None => break,
        }
    }
    Ok(ranges)
}

fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monthly_ranges_clip_ends() {
        let ranges = build_monthly_ranges("20240115", "20240410").unwrap();
        let labels: Vec<String> = ranges.iter().map(|r| r.label()).collect();
        assert_eq!(labels, vec!["2024-01", "2024-02", "2024-03", "2024-04"]);
        assert_eq!(ranges[0], DateRange::new(ymd(2024, 1, 15), ymd(2024, 1, 31)));
        assert_eq!(ranges[1], DateRange::new(ymd(2024, 2, 1), ymd(2024, 2, 29)));
        assert_eq!(ranges[2], DateRange::new(ymd(2024, 3, 1), ymd(2024, 3, 31)));
        assert_eq!(ranges[3], DateRange::new(ymd(2024, 4, 1), ymd(2024, 4, 10)));
    }

    #[test]
    fn test_single_day_range() {
        let ranges = build_monthly_ranges("20231231", "20231231").unwrap();
        assert_eq!(ranges, vec![DateRange::new(ymd(2023, 12, 31), ymd(2023, 12, 31))]);
    }

    #[test]
    fn test_range_across_year_boundary() {
        let ranges = build_monthly_ranges("20231201", "20240131").unwrap();
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0].end, ymd(2023, 12, 31));
        assert_eq!(ranges[1].start, ymd(2024, 1, 1));
        assert_eq!(ranges[1].start_compact(), "20240101");
        assert_eq!(ranges[1].end_compact(), "20240131");
    }

    #[test]
    fn test_non_leap_february() {
        let ranges = build_monthly_ranges("20230201", "20230228").unwrap();
        assert_eq!(ranges, vec![DateRange::new(ymd(2023, 2, 1), ymd(2023, 2, 28))]);
    }

    #[test]
    fn test_start_after_end_is_configuration_error() {
        let err = build_monthly_ranges("20240410", "20240115").unwrap_err();
        assert!(matches!(err, IngestError::Configuration(_)));
    }

    #[test]
    fn test_bad_date_strings_are_configuration_errors() {
        for bad in ["2024011", "202401150", "2024-01-15", "2024011a", "20241345"] {
            let err = build_monthly_ranges(bad, "20241231").unwrap_err();
            assert!(
                matches!(err, IngestError::Configuration(_)),
                "expected configuration error for {}",
                bad
            );
        }
    }
}
