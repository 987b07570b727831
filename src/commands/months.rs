use animal_ingest::partition::build_monthly_ranges;
use anyhow::Result;

/// Print the monthly slicing of `start..=end` (YYYYMMDD)
pub fn print_months(start: &str, end: &str) -> Result<()> {
    let ranges = build_monthly_ranges(start, end)?;
    for range in &ranges {
        println!(
            "{}  {} .. {}",
            range.label(),
            range.start_compact(),
            range.end_compact()
        );
    }
    println!("{} partitions", ranges.len());
    Ok(())
}
