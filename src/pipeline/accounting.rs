//! Run accounting, folded through the driver and returned at the end

use crate::store::UpsertSummary;
use std::time::Duration;

/// Counts for one partition's page loop
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionTally {
    pub label: String,
    pub pages: u64,
    pub fetched: u64,
    /// Total reported by the first page of the partition
    pub observed_total: Option<u64>,
    pub writes: UpsertSummary,
    /// Attempts spent beyond the first, over all pages
    pub retries: u64,
    /// Rows that carried no identifier and were stored under the placeholder key
    pub keyless: u64,
}

impl PartitionTally {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn record_page(&mut self, rows: usize, attempts: u32) {
        self.pages += 1;
        self.fetched += rows as u64;
        self.retries += u64::from(attempts.saturating_sub(1));
    }

    pub fn record_writes(&mut self, summary: UpsertSummary) {
        self.writes += summary;
    }

    /// Documents created or changed in this partition
    pub fn written(&self) -> u64 {
        self.writes.written()
    }
}

/// Counts for a whole run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunAccounting {
    pub collector: String,
    pub partitions: Vec<PartitionTally>,
    pub elapsed: Duration,
}

impl RunAccounting {
    pub fn new(collector: impl Into<String>) -> Self {
        Self {
            collector: collector.into(),
            ..Self::default()
        }
    }

    /// Fold one finished partition in
    pub fn with_partition(mut self, tally: PartitionTally) -> Self {
        self.partitions.push(tally);
        self
    }

    pub fn with_elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = elapsed;
        self
    }

    /// Documents created or changed over the run
    pub fn written(&self) -> u64 {
        self.partitions.iter().map(PartitionTally::written).sum()
    }

    pub fn fetched(&self) -> u64 {
        self.partitions.iter().map(|p| p.fetched).sum()
    }

    pub fn pages(&self) -> u64 {
        self.partitions.iter().map(|p| p.pages).sum()
    }

    pub fn failed_writes(&self) -> u64 {
        self.partitions.iter().map(|p| p.writes.failed).sum()
    }

    pub fn retries(&self) -> u64 {
        self.partitions.iter().map(|p| p.retries).sum()
    }

    pub fn keyless(&self) -> u64 {
        self.partitions.iter().map(|p| p.keyless).sum()
    }

    /// Write counts merged over every partition
    pub fn writes(&self) -> UpsertSummary {
        let mut total = UpsertSummary::default();
        for partition in &self.partitions {
            total += partition.writes;
        }
        total
    }

    /// Merge runs of several collectors (for `all`)
    pub fn merge(mut self, other: RunAccounting) -> Self {
        if self.collector.is_empty() {
            self.collector = other.collector;
        } else {
            self.collector = format!("{}+{}", self.collector, other.collector);
        }
        self.partitions.extend(other.partitions);
        self.elapsed += other.elapsed;
        self
    }

    /// Print summary to console
    pub fn print_summary(&self) {
        let writes = self.writes();
        println!("\n{} summary", self.collector);
        println!("==============");
        println!("Partitions:        {}", self.partitions.len());
        println!("Pages fetched:     {}", self.pages());
        println!("Rows fetched:      {}", self.fetched());
        println!("Documents created: {}", writes.created);
        println!("Documents changed: {}", writes.modified);
        println!("Failed writes:     {}", writes.failed);
        println!("Retries:           {}", self.retries());
        println!("Rows without key:  {}", self.keyless());
        println!("Elapsed time:      {:.1}s", self.elapsed.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_partitions() {
        let mut first = PartitionTally::new("a");
        first.record_page(1000, 1);
        first.record_page(200, 3);
        first.record_writes(UpsertSummary {
            created: 1100,
            modified: 50,
            failed: 2,
        });

        let mut second = PartitionTally::new("b");
        second.record_page(0, 1);
        second.keyless = 4;

        let run = RunAccounting::new("shelters")
            .with_partition(first)
            .with_partition(second);

        assert_eq!(run.written(), 1150);
        assert_eq!(run.fetched(), 1200);
        assert_eq!(run.pages(), 3);
        assert_eq!(run.failed_writes(), 2);
        assert_eq!(run.retries(), 2);
        assert_eq!(run.keyless(), 4);
    }

    #[test]
    fn test_merge_runs() {
        let a = RunAccounting::new("shelters").with_partition(PartitionTally::new("global"));
        let b = RunAccounting::new("registrations").with_partition(PartitionTally::new("global"));
        let merged = RunAccounting::default().merge(a).merge(b);
        assert_eq!(merged.collector, "shelters+registrations");
        assert_eq!(merged.partitions.len(), 2);
    }
}
