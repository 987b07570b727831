//! Console progress for ingestion runs

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Spinner showing the current partition and running totals.
/// Silent in quiet mode; logging carries the same information.
pub struct RunProgress {
    /// Progress bar (None if running in quiet mode)
    progress_bar: Option<ProgressBar>,
    start_time: Instant,
    /// Rows fetched over the whole run, across partitions
    rows: AtomicU64,
}

impl RunProgress {
    pub fn new(collector: &str, quiet: bool) -> Self {
        let progress_bar = if !quiet {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} [{elapsed_precise}] {prefix:.bold} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_prefix(collector.to_string());
            pb.enable_steady_tick(Duration::from_millis(120));
            Some(pb)
        } else {
            None
        };

        Self {
            progress_bar,
            start_time: Instant::now(),
            rows: AtomicU64::new(0),
        }
    }

    /// Quiet tracker, for tests and library callers
    pub fn hidden() -> Self {
        Self::new("", true)
    }

    /// Update after a page has been written. `page_rows` is the size of
    /// that page; `written` is the run total so far.
    pub fn page_done(&self, partition: &str, page_rows: u64, written: u64) {
        let rows = self.rows.fetch_add(page_rows, Ordering::Relaxed) + page_rows;
        if let Some(ref pb) = self.progress_bar {
            let rate = rows_per_sec(rows, self.start_time.elapsed());
            pb.set_message(format!(
                "{} | {} rows, {} written | {:.1} rows/s",
                partition, rows, written, rate
            ));
        }
    }

    /// Rows fetched so far in this run
    pub fn rows(&self) -> u64 {
        self.rows.load(Ordering::Relaxed)
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Finish the spinner
    pub fn finish(&self, written: u64) {
        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(format!("Done! {} documents written", written));
        }
    }

    pub fn abandon(&self) {
        if let Some(ref pb) = self.progress_bar {
            pb.abandon_with_message("Failed");
        }
    }
}

fn rows_per_sec(rows: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        rows as f64 / secs
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_progress_is_inert() {
        let progress = RunProgress::hidden();
        progress.page_done("global", 10, 5);
        progress.finish(5);
        assert!(progress.progress_bar.is_none());
    }

    #[test]
    fn test_rows_accumulate_across_partitions() {
        let progress = RunProgress::hidden();
        progress.page_done("서울특별시/2024-01", 1000, 1000);
        progress.page_done("서울특별시/2024-01", 500, 1500);
        progress.page_done("부산광역시/2024-01", 200, 1700);
        assert_eq!(progress.rows(), 1700);
    }

    #[test]
    fn test_rate_uses_run_rows() {
        assert_eq!(rows_per_sec(1700, Duration::from_secs(10)), 170.0);
        assert_eq!(rows_per_sec(10, Duration::ZERO), 0.0);
    }
}
