//! Partition enumeration
//!
//! A run walks an ordered sequence of [`Partition`]s. Sources hand them out
//! one at a time so that hierarchies needing a network call per parent
//! (sub-regions of a region) are only expanded when the driver gets there.

pub mod months;
pub mod regions;

pub use months::{build_monthly_ranges, monthly_ranges, parse_compact_date};
pub use regions::{RegionDirectory, RegionHierarchy};

use crate::error::IngestError;
use crate::types::{DateRange, Partition, RegionCode};
use async_trait::async_trait;
use std::collections::VecDeque;

/// Yields the partitions of one run, in order
#[async_trait]
pub trait PartitionSource: Send {
    /// Next partition, or `None` when the run is complete
    async fn next_partition(&mut self) -> Result<Option<Partition>, IngestError>;
}

/// A precomputed list of partitions
#[derive(Debug, Clone, Default)]
pub struct StaticPartitions {
    queue: VecDeque<Partition>,
}

impl StaticPartitions {
    pub fn new(partitions: impl IntoIterator<Item = Partition>) -> Self {
        Self {
            queue: partitions.into_iter().collect(),
        }
    }

    /// The single global partition
    pub fn global() -> Self {
        Self::new([Partition::global()])
    }

    /// One partition per region; an empty list means the global partition
    pub fn regions(regions: impl IntoIterator<Item = RegionCode>) -> Self {
        let source = Self::new(regions.into_iter().map(Partition::for_region));
        if source.is_empty() {
            Self::global()
        } else {
            source
        }
    }

    /// One partition per date range
    pub fn periods(periods: impl IntoIterator<Item = DateRange>) -> Self {
        Self::new(periods.into_iter().map(Partition::for_period))
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[async_trait]
impl PartitionSource for StaticPartitions {
    async fn next_partition(&mut self) -> Result<Option<Partition>, IngestError> {
        Ok(self.queue.pop_front())
    }
}

/// Drain a source into a vector
pub async fn collect_partitions<S: PartitionSource + ?Sized>(
    source: &mut S,
) -> Result<Vec<Partition>, IngestError> {
    let mut out = Vec::new();
    while let Some(partition) = source.next_partition().await? {
        out.push(partition);
    }
    Ok(out)
}
