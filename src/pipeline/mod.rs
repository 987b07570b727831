//! Pipeline driver
//!
//! Partitions are processed strictly one after another, and so are the pages
//! of a partition. For every page:
//!
//! ```text
//!   fetch ──▶ normalize rows ──▶ upsert batch ──▶ decide:
//!     0 rows                      → partition done (nothing written)
//!     rows < page size            → last page
//!     offset + page size ≥ total  → last page (total from the first page)
//!     otherwise                   → advance, pause, fetch again
//! ```

pub mod accounting;
pub mod progress;

pub use accounting::{PartitionTally, RunAccounting};
pub use progress::RunProgress;

use crate::collectors::Collector;
use crate::error::IngestError;
use crate::fetch::{PageFetcher, Transport};
use crate::partition::PartitionSource;
use crate::store::DocumentStore;
use crate::types::{PageCursor, Partition, UpsertOp};
use tracing::{debug, info, warn};

/// Drives one collector over a partition source
pub struct Pipeline<C, T, S>
where
    C: Collector,
    T: Transport,
    S: DocumentStore,
{
    collector: C,
    fetcher: PageFetcher<T>,
    store: S,
    progress: RunProgress,
    ensure_index: bool,
}

impl<C, T, S> Pipeline<C, T, S>
where
    C: Collector,
    T: Transport,
    S: DocumentStore,
{
    pub fn new(collector: C, fetcher: PageFetcher<T>, store: S) -> Self {
        Self {
            collector,
            fetcher,
            store,
            progress: RunProgress::hidden(),
            ensure_index: false,
        }
    }

    pub fn with_progress(mut self, progress: RunProgress) -> Self {
        self.progress = progress;
        self
    }

    /// Create the unique identity index before the first write
    pub fn with_index_provisioning(mut self, enabled: bool) -> Self {
        self.ensure_index = enabled;
        self
    }

    pub fn collector(&self) -> &C {
        &self.collector
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run every partition the source yields. The first fatal error aborts
    /// the run; nothing is skipped silently.
    pub async fn run<P>(&self, source: &mut P) -> Result<RunAccounting, IngestError>
    where
        P: PartitionSource + ?Sized,
    {
        let name = self.collector.name();
        info!(
            "Starting {} run into collection '{}'",
            name,
            self.collector.collection()
        );

        if self.ensure_index {
            self.store
                .ensure_identity_index(self.collector.collection())
                .await?;
        }

        let mut accounting = RunAccounting::new(name);
        loop {
            let partition = match source.next_partition().await {
                Ok(Some(partition)) => partition,
                Ok(None) => break,
                Err(e) => {
                    self.progress.abandon();
                    return Err(e);
                }
            };

            let tally = match self.run_partition(&partition, accounting.written()).await {
                Ok(tally) => tally,
                Err(e) => {
                    self.progress.abandon();
                    return Err(e);
                }
            };
            accounting = accounting.with_partition(tally);
        }

        let accounting = accounting.with_elapsed(self.progress.elapsed());
        self.progress.finish(accounting.written());
        info!(
            "{} run completed: {} partitions, {} rows fetched, {} total documents written ({} failed)",
            name,
            accounting.partitions.len(),
            accounting.fetched(),
            accounting.written(),
            accounting.failed_writes()
        );
        Ok(accounting)
    }

    /// Page through one partition. `written_before` only feeds the running
    /// total in progress output.
    pub async fn run_partition(
        &self,
        partition: &Partition,
        written_before: u64,
    ) -> Result<PartitionTally, IngestError> {
        let label = partition.label();
        let mut cursor = PageCursor::new(self.collector.page_size());
        let mut tally = PartitionTally::new(label.clone());
        let delay = self.collector.page_delay();

        loop {
            let request = self.collector.request(partition, cursor.window());
            debug!("{} page {}: {}", label, cursor.pages_fetched() + 1, request.describe());

            let page = self
                .fetcher
                .fetch(&request, self.collector.envelope())
                .await
                .map_err(|e| IngestError::fetch(label.clone(), e))?;

            let rows = page.rows.len();
            cursor.record_page(rows, page.total, page.attempts);
            tally.record_page(rows, page.attempts);
            tally.observed_total = cursor.observed_total();

            if rows == 0 {
                debug!("{}: empty page, partition exhausted", label);
                break;
            }

            let normalizer = self.collector.normalizer();
            let records: Vec<_> = page
                .rows
                .into_iter()
                .map(|raw| normalizer.normalize(raw))
                .collect();
            let keyless = records.iter().filter(|r| r.is_keyless()).count() as u64;
            if keyless > 0 {
                warn!(
                    "{} page {}: {} rows carry no identifier and collapse into one document",
                    label,
                    cursor.pages_fetched(),
                    keyless
                );
                tally.keyless += keyless;
            }
            let ops: Vec<UpsertOp> = records.into_iter().map(UpsertOp::from).collect();
            let summary = self
                .store
                .upsert_many(self.collector.collection(), ops)
                .await?;
            tally.record_writes(summary);

            info!(
                "{} page {}: {} rows, {} written (partition {}/{}, run total {})",
                label,
                cursor.pages_fetched(),
                rows,
                summary.written(),
                cursor.retrieved,
                cursor
                    .observed_total()
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "?".to_string()),
                written_before + tally.written()
            );
            self.progress
                .page_done(&label, rows as u64, written_before + tally.written());

            if (rows as u64) < cursor.page_size {
                break;
            }
            if cursor.reached_total() {
                break;
            }

            cursor.advance();
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        Ok(tally)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{Envelope, FetchError, HttpResponse, PageRequest, RetryPolicy};
    use crate::normalize::{Normalizer, ShelterNormalizer};
    use crate::partition::StaticPartitions;
    use crate::store::MemoryStore;
    use crate::types::PageWindow;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;

    struct TestCollector {
        page_size: u64,
        envelope: Envelope,
    }

    impl Collector for TestCollector {
        fn name(&self) -> &'static str {
            "test"
        }
        fn collection(&self) -> &str {
            "docs"
        }
        fn page_size(&self) -> u64 {
            self.page_size
        }
        fn page_delay(&self) -> Duration {
            Duration::ZERO
        }
        fn request(&self, _partition: &Partition, window: PageWindow) -> PageRequest {
            PageRequest::new("http://svc.test/items").param("pageNo", window.page_number())
        }
        fn envelope(&self) -> &Envelope {
            &self.envelope
        }
        fn normalizer(&self) -> &dyn Normalizer {
            &ShelterNormalizer
        }
    }

    #[derive(Clone, Default)]
    struct Scripted {
        responses: Arc<Mutex<VecDeque<HttpResponse>>>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl Scripted {
        fn push(&self, response: HttpResponse) {
            self.responses.lock().push_back(response);
        }
        fn calls(&self) -> usize {
            self.calls.lock().len()
        }
    }

    #[async_trait]
    impl Transport for Scripted {
        async fn get(&self, request: &PageRequest) -> Result<HttpResponse, FetchError> {
            self.calls.lock().push(request.get("pageNo").unwrap_or("").to_string());
            self.responses
                .lock()
                .pop_front()
                .ok_or_else(|| FetchError::Network("script exhausted".into()))
        }
    }

    fn page(start: usize, rows: usize, total: u64) -> HttpResponse {
        let items: Vec<String> = (start..start + rows)
            .map(|i| format!(r#"{{"careRegNo":"{}"}}"#, i))
            .collect();
        HttpResponse::ok(format!(
            r#"{{"response":{{"header":{{"resultCode":"00"}},"body":{{"totalCount":{},"items":{{"item":[{}]}}}}}}}}"#,
            total,
            items.join(",")
        ))
    }

    fn pipeline(page_size: u64, transport: Scripted) -> Pipeline<TestCollector, Scripted, MemoryStore> {
        let collector = TestCollector {
            page_size,
            envelope: Envelope::Portal,
        };
        Pipeline::new(
            collector,
            PageFetcher::new(transport, RetryPolicy::immediate(3)),
            MemoryStore::new(),
        )
    }

    #[tokio::test]
    async fn test_short_page_ends_partition() {
        let transport = Scripted::default();
        transport.push(page(0, 10, 25));
        transport.push(page(10, 10, 25));
        transport.push(page(20, 5, 25));
        let p = pipeline(10, transport.clone());

        let tally = p.run_partition(&Partition::global(), 0).await.unwrap();
        assert_eq!(tally.pages, 3);
        assert_eq!(tally.fetched, 25);
        assert_eq!(tally.written(), 25);
        assert_eq!(tally.observed_total, Some(25));
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_total_bound_stops_without_extra_fetch() {
        let transport = Scripted::default();
        transport.push(page(0, 10, 20));
        transport.push(page(10, 10, 20));
        let p = pipeline(10, transport.clone());

        let tally = p.run_partition(&Partition::global(), 0).await.unwrap();
        assert_eq!(tally.pages, 2);
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_page_writes_nothing() {
        let transport = Scripted::default();
        transport.push(HttpResponse::ok(
            r#"{"response":{"header":{"resultCode":"03","resultMsg":"NODATA_ERROR"}}}"#,
        ));
        let p = pipeline(10, transport.clone());
        let tally = p.run_partition(&Partition::global(), 0).await.unwrap();
        assert_eq!(tally.pages, 1);
        assert_eq!(tally.written(), 0);
        assert_eq!(p.store().count("docs"), 0);
    }

    #[tokio::test]
    async fn test_later_totals_do_not_move_the_bound() {
        let transport = Scripted::default();
        transport.push(page(0, 10, 20));
        // Second page claims a much larger total; the first page's figure holds
        transport.push(page(10, 10, 9999));
        let p = pipeline(10, transport.clone());
        let tally = p.run_partition(&Partition::global(), 0).await.unwrap();
        assert_eq!(tally.pages, 2);
        assert_eq!(tally.observed_total, Some(20));
    }

    #[tokio::test]
    async fn test_rows_without_identifier_are_counted() {
        let transport = Scripted::default();
        transport.push(HttpResponse::ok(
            r#"{"response":{"header":{"resultCode":"00"},"body":{"totalCount":3,"items":{"item":[
                {"careRegNo":"311322200900001","careNm":"A"},
                {"careNm":"B"},
                {"careNm":"C"}]}}}}"#,
        ));
        let p = pipeline(10, transport.clone());

        let tally = p.run_partition(&Partition::global(), 0).await.unwrap();
        assert_eq!(tally.fetched, 3);
        assert_eq!(tally.keyless, 2);
        // Both keyless rows land on the placeholder document
        assert_eq!(p.store().count("docs"), 2);
        assert!(p.store().get("docs", "NA").is_some());
    }

    #[tokio::test]
    async fn test_fatal_error_aborts_run() {
        let transport = Scripted::default();
        transport.push(page(0, 3, 3));
        transport.push(HttpResponse::new(403, "Forbidden"));
        let p = pipeline(10, transport.clone());

        let mut source = StaticPartitions::new(vec![
            Partition::global(),
            Partition::for_region(crate::types::RegionCode::new("r2")),
        ]);
        let err = p.run(&mut source).await.unwrap_err();
        match err {
            IngestError::Fetch { partition, .. } => assert_eq!(partition, "r2"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(p.store().count("docs"), 3);
    }
}
