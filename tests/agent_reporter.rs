use pcmetrics::agent::{MetricsSnapshot, ReportError, Reporter};
use pcmetrics::MetricKind;
use std::collections::HashSet;
use std::time::Duration;
use wiremock::matchers::{header, method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn reporter_for(server: &MockServer) -> Reporter {
    Reporter::new(&server.uri(), Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn test_report_posts_one_request_per_metric() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/update/(gauge|counter)/[^/]+/[^/]+$"))
        .and(header("content-type", "text/plain"))
        .respond_with(ResponseTemplate::new(200).set_body_string("200 OK"))
        .expect(2)
        .mount(&server)
        .await;

    let mut snapshot = MetricsSnapshot::new();
    snapshot.set_gauge("Alloc", 123.456);
    snapshot.add_counter("PollCount", 1);

    // Act
    let summary = reporter_for(&server).report(&snapshot).await;

    // Assert
    assert_eq!(summary.sent, 2);
    assert_eq!(summary.failed, 0);

    let paths: HashSet<String> = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .map(|req| req.url.path().to_string())
        .collect();
    let expected: HashSet<String> = [
        "/update/gauge/Alloc/123.456".to_string(),
        "/update/counter/PollCount/1".to_string(),
    ]
    .into_iter()
    .collect();
    assert_eq!(paths, expected);

    for req in server.received_requests().await.unwrap() {
        assert!(req.body.is_empty(), "report requests carry no body");
    }
}

#[tokio::test]
async fn test_report_continues_past_rejected_metrics() {
    // Arrange
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/update/gauge/Bad/1"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path_regex(r"^/update/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let mut snapshot = MetricsSnapshot::new();
    snapshot.set_gauge("Bad", 1.0);
    snapshot.set_gauge("Good", 2.0);
    snapshot.add_counter("PollCount", 5);

    // Act
    let summary = reporter_for(&server).report(&snapshot).await;

    // Assert
    assert_eq!(summary.sent, 2);
    assert_eq!(summary.failed, 1);
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_send_metric_reports_non_ok_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = reporter_for(&server)
        .send_metric(MetricKind::Counter, "PollCount", "1")
        .await
        .unwrap_err();
    match err {
        ReportError::Status { status, name, .. } => {
            assert_eq!(status.as_u16(), 500);
            assert_eq!(name, "PollCount");
        }
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_send_metric_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&server)
        .await;

    let reporter = Reporter::new(&server.uri(), Duration::from_millis(200)).unwrap();
    let err = reporter
        .send_metric(MetricKind::Gauge, "Alloc", "1")
        .await
        .unwrap_err();
    match err {
        ReportError::Transport { source, .. } => assert!(source.is_timeout()),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_report_with_unreachable_server_counts_failures() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut snapshot = MetricsSnapshot::new();
    snapshot.set_gauge("Alloc", 1.0);
    snapshot.add_counter("PollCount", 1);

    let reporter = Reporter::new(&addr.to_string(), Duration::from_secs(1)).unwrap();
    let summary = reporter.report(&snapshot).await;
    assert_eq!(summary.sent, 0);
    assert_eq!(summary.failed, 2);
}

#[tokio::test]
async fn test_empty_snapshot_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let summary = reporter_for(&server).report(&MetricsSnapshot::new()).await;
    assert_eq!(summary.sent, 0);
    assert_eq!(summary.failed, 0);
}
