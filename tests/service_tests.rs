use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use workday_feed::fetch::{FetchError, FetchFuture};
use workday_feed::persistence::FeedStore;
use workday_feed::refresh::run_refresh;
use workday_feed::status::shared_status;
use workday_feed::{FeedService, FeedSource, MemoryFeedStore, ServiceError, feed_id};
use workday_core::WorkdayConfig;

/// Serves canned calendar bodies keyed by url and counts requests.
#[derive(Default)]
struct StubSource {
    bodies: Mutex<HashMap<String, String>>,
    calls: Mutex<Vec<String>>,
}

impl StubSource {
    fn with(url: &str, body: String) -> Self {
        let source = Self::default();
        source.set(url, body);
        source
    }

    fn set(&self, url: &str, body: String) {
        self.bodies.lock().insert(url.to_string(), body);
    }

    fn remove(&self, url: &str) {
        self.bodies.lock().remove(url);
    }
}

impl FeedSource for StubSource {
    fn fetch<'a>(&'a self, url: &'a str) -> FetchFuture<'a> {
        self.calls.lock().push(url.to_string());
        let body = self.bodies.lock().get(url).cloned();
        Box::pin(async move {
            body.ok_or_else(|| FetchError::Unavailable(format!("no body for {url}")))
        })
    }
}

fn feed(events: &[(&str, &str, &str)]) -> String {
    let mut out = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Roster//EN\r\n");
    for (start, end, summary) in events {
        out.push_str("BEGIN:VEVENT\r\n");
        out.push_str(&format!("DTSTART;TZID=Europe/Stockholm:{start}\r\n"));
        out.push_str(&format!("DTEND;TZID=Europe/Stockholm:{end}\r\n"));
        out.push_str(&format!("SUMMARY:{summary}\r\n"));
        out.push_str("END:VEVENT\r\n");
    }
    out.push_str("END:VCALENDAR\r\n");
    out
}

fn service(store: Arc<MemoryFeedStore>, source: Arc<StubSource>) -> FeedService {
    FeedService::new(store, source, WorkdayConfig::default())
        .unwrap()
        .with_refresh_pause(Duration::ZERO)
}

const URL_A: &str = "https://example.com/a.ics";
const URL_B: &str = "https://example.com/b.ics";

#[tokio::test]
async fn generate_stores_the_simplified_calendar() {
    let store = Arc::new(MemoryFeedStore::new());
    let source = Arc::new(StubSource::with(
        URL_A,
        feed(&[
            ("20240304T080000", "20240304T120000", "Pass A"),
            ("20240304T130000", "20240304T170000", "Pass B"),
            ("20240305T090000", "20240305T100000", "Sick leave"),
        ]),
    ));
    let service = service(store.clone(), source);

    let record = service.generate(URL_A, None).await.unwrap();
    assert_eq!(record.unique_id, feed_id(URL_A, "Jobb"));
    assert_eq!(record.summary, "Jobb");
    assert_eq!(record.workdays.len(), 1);
    assert_eq!(record.ical_content.matches("BEGIN:VEVENT").count(), 1);
    assert!(record.ical_content.contains("SUMMARY:Jobb\r\n"));

    let stored = store.load_feed(&record.unique_id).unwrap().unwrap();
    assert_eq!(stored, record);
    assert_eq!(service.calendar(&record.unique_id).unwrap(), record);
}

#[tokio::test]
async fn custom_summary_changes_the_identity() {
    let store = Arc::new(MemoryFeedStore::new());
    let source = Arc::new(StubSource::with(
        URL_A,
        feed(&[("20240304T080000", "20240304T120000", "Pass")]),
    ));
    let service = service(store.clone(), source);

    let default = service.generate(URL_A, Some("  ")).await.unwrap();
    let custom = service.generate(URL_A, Some("Work")).await.unwrap();
    assert_ne!(default.unique_id, custom.unique_id);
    assert!(custom.ical_content.contains("SUMMARY:Work\r\n"));
    assert_eq!(store.list_feeds().unwrap().len(), 2);
}

#[tokio::test]
async fn generate_rejects_missing_and_unsupported_urls() {
    let service = service(
        Arc::new(MemoryFeedStore::new()),
        Arc::new(StubSource::default()),
    );
    assert!(matches!(
        service.generate("   ", None).await,
        Err(ServiceError::InvalidRequest(_))
    ));
    assert!(matches!(
        service.generate("ftp://example.com/a.ics", None).await,
        Err(ServiceError::InvalidRequest(_))
    ));
}

#[tokio::test]
async fn malformed_source_is_a_convert_error_and_nothing_is_stored() {
    let store = Arc::new(MemoryFeedStore::new());
    let source = Arc::new(StubSource::with(URL_A, "<html>not a calendar</html>".into()));
    let service = service(store.clone(), source);

    let err = service.generate(URL_A, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::Convert(_)), "{err}");
    assert!(store.list_feeds().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_calendar_is_not_found() {
    let service = service(
        Arc::new(MemoryFeedStore::new()),
        Arc::new(StubSource::default()),
    );
    assert!(matches!(
        service.calendar("0000000000000000"),
        Err(ServiceError::NotFound(_))
    ));
}

#[tokio::test]
async fn refresh_all_isolates_failing_feeds() {
    let store = Arc::new(MemoryFeedStore::new());
    let source = Arc::new(StubSource::default());
    source.set(URL_A, feed(&[("20240304T080000", "20240304T120000", "Pass")]));
    source.set(URL_B, feed(&[("20240306T080000", "20240306T120000", "Pass")]));
    let service = service(store.clone(), source.clone());

    let a = service.generate(URL_A, None).await.unwrap();
    let b = service.generate(URL_B, None).await.unwrap();

    source.remove(URL_A);
    source.set(
        URL_B,
        feed(&[
            ("20240306T080000", "20240306T120000", "Pass"),
            ("20240307T080000", "20240307T120000", "Pass"),
        ]),
    );

    let report = service.refresh_all().await.unwrap();
    assert_eq!(report.feed_count, 2);
    assert_eq!(report.refreshed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.to_cli_summary(), "feeds=2, refreshed=1, failed=1");

    let stale = store.load_feed(&a.unique_id).unwrap().unwrap();
    assert_eq!(stale, a);
    let fresh = store.load_feed(&b.unique_id).unwrap().unwrap();
    assert_eq!(fresh.workdays.len(), 2);
    assert!(fresh.last_updated >= b.last_updated);
}

#[tokio::test]
async fn run_refresh_records_status_and_refuses_overlap() {
    let store = Arc::new(MemoryFeedStore::new());
    let source = Arc::new(StubSource::with(
        URL_A,
        feed(&[("20240304T080000", "20240304T120000", "Pass")]),
    ));
    let service = service(store, source);
    service.generate(URL_A, None).await.unwrap();

    let status = shared_status();
    let report = run_refresh(&service, &status).await.unwrap().unwrap();
    assert_eq!(report.refreshed, 1);
    {
        let snapshot = status.read();
        assert!(!snapshot.is_running);
        assert!(snapshot.last_started.is_some());
        assert!(snapshot.last_completed.is_some());
        assert_eq!(snapshot.error, None);
    }

    status.write().is_running = true;
    assert!(run_refresh(&service, &status).await.is_none());
}
