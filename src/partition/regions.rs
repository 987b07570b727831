//! Two-level region hierarchy, expanded lazily

use super::PartitionSource;
use crate::error::IngestError;
use crate::types::{DateRange, Partition, RegionCode};
use async_trait::async_trait;
use std::collections::VecDeque;
use tracing::{debug, info};

/// Lists first-level regions and the sub-regions of one region
#[async_trait]
pub trait RegionDirectory: Send + Sync {
    async fn regions(&self) -> Result<Vec<RegionCode>, IngestError>;

    async fn sub_regions(&self, parent: &RegionCode) -> Result<Vec<RegionCode>, IngestError>;
}

/// Region × sub-region × period partitions.
///
/// First-level regions are listed on the first call; sub-regions are listed
/// per region only when that region comes up. A region without sub-regions
/// still yields partitions scoped to the region alone.
pub struct RegionHierarchy<D: RegionDirectory> {
    directory: D,
    periods: Vec<Option<DateRange>>,
    only: Vec<String>,
    parents: Option<VecDeque<RegionCode>>,
    pending: VecDeque<Partition>,
}

impl<D: RegionDirectory> RegionHierarchy<D> {
    pub fn new(directory: D) -> Self {
        Self {
            directory,
            periods: vec![None],
            only: Vec::new(),
            parents: None,
            pending: VecDeque::new(),
        }
    }

    /// Cross every region scope with these periods (innermost loop)
    pub fn with_periods(mut self, periods: Vec<DateRange>) -> Self {
        self.periods = if periods.is_empty() {
            vec![None]
        } else {
            periods.into_iter().map(Some).collect()
        };
        self
    }

    /// Restrict to first-level regions matching these codes or names
    pub fn only_regions(mut self, only: Vec<String>) -> Self {
        self.only = only;
        self
    }

    fn keeps(&self, region: &RegionCode) -> bool {
        self.only.is_empty()
            || self.only.iter().any(|wanted| {
                wanted == &region.code || region.name.as_deref() == Some(wanted.as_str())
            })
    }

    fn expand(&mut self, parent: RegionCode, children: Vec<RegionCode>) {
        let scopes: Vec<Partition> = if children.is_empty() {
            vec![Partition::for_region(parent)]
        } else {
            children
                .into_iter()
                .map(|child| Partition::for_region(parent.clone()).with_sub_region(child))
                .collect()
        };
        for scope in scopes {
            for period in &self.periods {
                let partition = match period {
                    Some(range) => scope.clone().with_period(*range),
                    None => scope.clone(),
                };
                self.pending.push_back(partition);
            }
        }
    }
}

#[async_trait]
impl<D: RegionDirectory> PartitionSource for RegionHierarchy<D> {
    async fn next_partition(&mut self) -> Result<Option<Partition>, IngestError> {
        loop {
            if let Some(partition) = self.pending.pop_front() {
                return Ok(Some(partition));
            }

            if self.parents.is_none() {
                let listed = self.directory.regions().await?;
                let kept: VecDeque<RegionCode> =
                    listed.into_iter().filter(|r| self.keeps(r)).collect();
                info!("Region hierarchy: {} first-level regions", kept.len());
                self.parents = Some(kept);
            }

            let Some(parent) = self.parents.as_mut().and_then(VecDeque::pop_front) else {
                return Ok(None);
            };

            let children = self.directory.sub_regions(&parent).await?;
            if children.is_empty() {
                debug!("{} has no sub-regions, querying at region level", parent);
            } else {
                debug!("{} has {} sub-regions", parent, children.len());
            }
            self.expand(parent, children);
        }
    }
}
