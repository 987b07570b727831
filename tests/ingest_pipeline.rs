//! End-to-end ingestion tests
//!
//! Every test drives the public API with a scripted transport and the
//! in-memory store; nothing touches the network.

use animal_ingest::{
    collectors::{AbandonmentCollector, Collector, RegistrationCollector, ShelterCollector},
    config::{AbandonmentConfig, RegistrationConfig, ShelterConfig},
    fetch::{FetchError, HttpResponse, PageFetcher, PageRequest, RetryPolicy, Transport},
    partition::{collect_partitions, PartitionSource, StaticPartitions},
    pipeline::Pipeline,
    store::MemoryStore,
    IngestError, Partition,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

// ============================================================================
// Scripted transports
// ============================================================================

/// Answers requests from a queue, in order, and records every request
#[derive(Clone, Default)]
struct Queue {
    responses: Arc<Mutex<VecDeque<HttpResponse>>>,
    requests: Arc<Mutex<Vec<PageRequest>>>,
}

impl Queue {
    fn with(responses: Vec<HttpResponse>) -> Self {
        let queue = Self::default();
        queue.responses.lock().extend(responses);
        queue
    }

    fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    fn urls(&self) -> Vec<String> {
        self.requests.lock().iter().map(|r| r.url.clone()).collect()
    }
}

#[async_trait]
impl Transport for Queue {
    async fn get(&self, request: &PageRequest) -> Result<HttpResponse, FetchError> {
        self.requests.lock().push(request.clone());
        self.responses
            .lock()
            .pop_front()
            .ok_or_else(|| FetchError::Network("no scripted response left".into()))
    }
}

/// Routes by URL path and `upr_cd`, for the region hierarchy
#[derive(Clone, Default)]
struct Portal {
    requests: Arc<Mutex<Vec<PageRequest>>>,
}

#[async_trait]
impl Transport for Portal {
    async fn get(&self, request: &PageRequest) -> Result<HttpResponse, FetchError> {
        self.requests.lock().push(request.clone());
        let body = if request.url.ends_with("/sido_v2") {
            portal_page(
                r#"[{"orgCd":"6110000","orgdownNm":"서울특별시"},
                    {"orgCd":"5690000","orgdownNm":"세종특별자치시"}]"#,
                2,
            )
        } else if request.url.ends_with("/sigungu_v2") {
            match request.get("upr_cd") {
                Some("6110000") => portal_page(
                    r#"[{"uprCd":"6110000","orgCd":"3220000","orgdownNm":"강남구"}]"#,
                    1,
                ),
                _ => portal_no_data(),
            }
        } else {
            let region = request.get("upr_cd").unwrap_or("none");
            let sub = request.get("org_cd").unwrap_or("none");
            portal_page(
                &format!(
                    r#"{{"desertionNo":"{}-{}","orgNm":"서울특별시 강남구","kindFullNm":"[개] 믹스견"}}"#,
                    region, sub
                ),
                1,
            )
        };
        Ok(HttpResponse::ok(body))
    }
}

// ============================================================================
// Response builders
// ============================================================================

fn portal_page(items: &str, total: u64) -> String {
    format!(
        r#"{{"response":{{"header":{{"resultCode":"00","resultMsg":"NORMAL SERVICE."}},
             "body":{{"items":{{"item":{}}},"numOfRows":1000,"pageNo":1,"totalCount":{}}}}}}}"#,
        items, total
    )
}

fn portal_no_data() -> String {
    r#"{"response":{"header":{"resultCode":"03","resultMsg":"NODATA_ERROR"}}}"#.to_string()
}

const SERVICE: &str = "Grid_Registrations";

fn registration_rows(start: usize, count: usize) -> Vec<String> {
    (start..start + count)
        .map(|i| {
            format!(
                r#"{{"CTPV":"서울특별시","SGG":"구{}","BRDT":"2019","RFID_SE":"내장형","LVSTCK_KND":"개","SPCS":"믹스","CNT":"1,{:03}"}}"#,
                i,
                i % 1000
            )
        })
        .collect()
}

fn grid_page(rows: &[String], total: u64) -> HttpResponse {
    HttpResponse::ok(format!(
        r#"{{"{}":{{"totalCnt":{},"startRow":1,"endRow":1000,"result":{{"code":"INFO-000","message":"정상 처리되었습니다."}},"row":[{}]}}}}"#,
        SERVICE,
        total,
        rows.join(",")
    ))
}

fn registration_collector(page_size: u64) -> RegistrationCollector {
    RegistrationCollector::from_config(&RegistrationConfig {
        api_key: Some("KEY".into()),
        endpoint: "http://grid.test/openapi".into(),
        service: SERVICE.into(),
        page_size,
        page_delay_ms: 0,
        ..RegistrationConfig::default()
    })
    .unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn total_of_2500_with_page_size_1000_takes_three_fetches() {
    let rows = registration_rows(0, 2500);
    // The third page is deliberately full: the first page's total must stop
    // the loop, not the short-page rule.
    let transport = Queue::with(vec![
        grid_page(&rows[0..1000], 2500),
        grid_page(&rows[1000..2000], 2500),
        grid_page(&rows[1500..2500], 2500),
        grid_page(&rows[0..10], 2500),
    ]);

    let pipeline = Pipeline::new(
        registration_collector(1000),
        PageFetcher::new(transport.clone(), RetryPolicy::immediate(1)),
        MemoryStore::new(),
    );
    let mut source = StaticPartitions::global();
    let accounting = pipeline.run(&mut source).await.unwrap();

    assert_eq!(transport.calls(), 3);
    let urls = transport.urls();
    assert!(urls[0].ends_with("/1/1000"));
    assert!(urls[1].ends_with("/1001/2000"));
    assert!(urls[2].ends_with("/2001/3000"));
    assert_eq!(accounting.pages(), 3);
    assert_eq!(accounting.partitions[0].observed_total, Some(2500));
    assert_eq!(pipeline.store().count("registrations"), 2500);
}

#[tokio::test]
async fn second_run_over_same_data_writes_nothing() {
    let rows = registration_rows(0, 40);
    let script = || {
        vec![
            grid_page(&rows[0..25], 40),
            grid_page(&rows[25..40], 40),
        ]
    };
    let store = Arc::new(MemoryStore::new());

    let first = Pipeline::new(
        registration_collector(25),
        PageFetcher::new(Queue::with(script()), RetryPolicy::immediate(1)),
        store.clone(),
    )
    .run(&mut StaticPartitions::global())
    .await
    .unwrap();
    let keys_after_first = store.keys("registrations");

    let second = Pipeline::new(
        registration_collector(25),
        PageFetcher::new(Queue::with(script()), RetryPolicy::immediate(1)),
        store.clone(),
    )
    .run(&mut StaticPartitions::global())
    .await
    .unwrap();

    assert_eq!(first.written(), 40);
    assert_eq!(second.written(), 0);
    assert_eq!(second.fetched(), 40);
    assert_eq!(store.keys("registrations"), keys_after_first);
    assert_eq!(store.count("registrations"), 40);

    let doc = store
        .get("registrations", "서울특별시|구7|2019|내장형|개|믹스")
        .unwrap();
    assert_eq!(doc["count"], serde_json::json!(1007));
    assert_eq!(doc["raw"]["CNT"], serde_json::json!("1,007"));
}

#[tokio::test]
async fn transient_failures_are_retried_within_a_run() {
    let rows = registration_rows(0, 3);
    let transport = Queue::with(vec![
        HttpResponse::new(503, "Service Unavailable"),
        HttpResponse::new(503, "Service Unavailable"),
        grid_page(&rows, 3),
    ]);
    let pipeline = Pipeline::new(
        registration_collector(1000),
        PageFetcher::new(transport.clone(), RetryPolicy::immediate(3)),
        MemoryStore::new(),
    );

    let accounting = pipeline.run(&mut StaticPartitions::global()).await.unwrap();
    assert_eq!(transport.calls(), 3);
    assert_eq!(accounting.written(), 3);
    assert_eq!(accounting.retries(), 2);
}

#[tokio::test]
async fn exhausted_retries_abort_the_run_with_last_failure() {
    let transport = Queue::with(vec![
        HttpResponse::new(500, "boom"),
        HttpResponse::new(502, "bad gateway"),
        HttpResponse::new(503, "unavailable"),
    ]);
    let pipeline = Pipeline::new(
        registration_collector(1000),
        PageFetcher::new(transport.clone(), RetryPolicy::immediate(3)),
        MemoryStore::new(),
    );

    let err = pipeline
        .run(&mut StaticPartitions::global())
        .await
        .unwrap_err();
    match err {
        IngestError::Fetch {
            partition,
            source: FetchError::Exhausted { attempts, last },
        } => {
            assert_eq!(partition, "global");
            assert_eq!(attempts, 3);
            assert!(matches!(*last, FetchError::Status { status: 503, .. }));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn grid_error_payload_is_not_read_as_empty() {
    let transport = Queue::with(vec![HttpResponse::ok(
        r#"{"RESULT":{"CODE":"INFO-100","MESSAGE":"인증키가 유효하지 않습니다."}}"#,
    )]);
    let pipeline = Pipeline::new(
        registration_collector(1000),
        PageFetcher::new(transport.clone(), RetryPolicy::immediate(5)),
        MemoryStore::new(),
    );
    let err = pipeline
        .run(&mut StaticPartitions::global())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        IngestError::Fetch {
            source: FetchError::Service { transient: false, .. },
            ..
        }
    ));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn region_without_sub_regions_is_still_queried() {
    let transport = Portal::default();
    let fetcher = PageFetcher::new(transport.clone(), RetryPolicy::immediate(1));
    let collector = AbandonmentCollector::from_config(&AbandonmentConfig {
        service_key: Some("portal-key".into()),
        base_url: "https://portal.test/abandonmentPublicService_v2".into(),
        start_date: "20240115".into(),
        end_date: "20240131".into(),
        page_delay_ms: 0,
        ..AbandonmentConfig::default()
    })
    .unwrap();

    let mut source = collector.partitions(fetcher.clone());
    let pipeline = Pipeline::new(collector, fetcher, MemoryStore::new());
    let accounting = pipeline.run(source.as_mut()).await.unwrap();

    let labels: Vec<&str> = accounting
        .partitions
        .iter()
        .map(|p| p.label.as_str())
        .collect();
    assert_eq!(
        labels,
        vec![
            "서울특별시(6110000)/강남구(3220000)/2024-01",
            "세종특별자치시(5690000)/2024-01",
        ]
    );

    let store = pipeline.store();
    assert_eq!(
        store.keys("abandonments"),
        vec!["5690000-none".to_string(), "6110000-3220000".to_string()]
    );
    let doc = store.get("abandonments", "6110000-3220000").unwrap();
    assert_eq!(doc["species"], serde_json::json!("개"));
    assert_eq!(doc["sigungu"], serde_json::json!("강남구"));

    let requests = transport.requests.lock();
    let record_requests: Vec<&PageRequest> = requests
        .iter()
        .filter(|r| r.url.ends_with("/abandonmentPublic_v2"))
        .collect();
    assert_eq!(record_requests.len(), 2);
    assert!(record_requests
        .iter()
        .all(|r| r.get("bgnde") == Some("20240115") && r.get("endde") == Some("20240131")));
}

#[tokio::test]
async fn month_only_partitions_when_regions_disabled() {
    let collector = AbandonmentCollector::from_config(&AbandonmentConfig {
        service_key: Some("k".into()),
        start_date: "20240115".into(),
        end_date: "20240410".into(),
        use_regions: false,
        ..AbandonmentConfig::default()
    })
    .unwrap();
    let fetcher = PageFetcher::new(Queue::default(), RetryPolicy::immediate(1));
    let mut source = collector.partitions(fetcher);
    let partitions = collect_partitions(source.as_mut()).await.unwrap();
    let labels: Vec<String> = partitions.iter().map(Partition::label).collect();
    assert_eq!(labels, vec!["2024-01", "2024-02", "2024-03", "2024-04"]);
}

#[tokio::test]
async fn shelters_single_object_items() {
    let body = portal_page(
        r#"{"careRegNo":"311322200900001","careNm":"보호소","careAddr":"경기도 양주시 남면","lat":"37.87","lng":"126.98"}"#,
        1,
    );
    let transport = Queue::with(vec![HttpResponse::ok(body)]);
    let collector = ShelterCollector::from_config(&ShelterConfig {
        service_key: Some("k".into()),
        page_delay_ms: 0,
        ..ShelterConfig::default()
    })
    .unwrap();
    let mut source = collector.partitions();
    let pipeline = Pipeline::new(
        collector,
        PageFetcher::new(transport, RetryPolicy::immediate(1)),
        MemoryStore::new(),
    );
    let accounting = pipeline.run(&mut source).await.unwrap();
    assert_eq!(accounting.written(), 1);
    assert_eq!(pipeline.collector().name(), "shelters");

    let doc = pipeline.store().get("shelters", "311322200900001").unwrap();
    assert_eq!(doc["sido"], serde_json::json!("경기도"));
    assert_eq!(doc["uid"], serde_json::json!("311322200900001"));
}

#[tokio::test]
async fn partition_source_errors_abort_the_run() {
    let transport = Queue::with(vec![HttpResponse::new(401, "Unauthorized")]);
    let fetcher = PageFetcher::new(transport, RetryPolicy::immediate(3));
    let collector = AbandonmentCollector::from_config(&AbandonmentConfig {
        service_key: Some("k".into()),
        ..AbandonmentConfig::default()
    })
    .unwrap();
    let mut source = collector.partitions(fetcher.clone());
    let err = source.next_partition().await.unwrap_err();
    assert!(matches!(err, IngestError::Fetch { .. }));
}
