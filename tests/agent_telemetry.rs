//! Runs in its own process: installing the Prometheus recorder is global.

use pcmetrics::app::AgentApp;
use pcmetrics::config::{AgentConfig, TelemetryConfig};
use std::time::Duration;

#[tokio::test]
async fn test_agent_exports_poll_counter() {
    let config = AgentConfig {
        // Nothing listens here; reports are not due within this test anyway.
        address: "http://127.0.0.1:9".to_string(),
        poll_interval_seconds: 1,
        report_interval_seconds: 60,
        telemetry: TelemetryConfig {
            listen_address: Some("127.0.0.1:0".parse().unwrap()),
        },
        ..AgentConfig::default()
    };
    let app = AgentApp::start(&config).await.unwrap();
    let scrape_url = format!(
        "http://{}/metrics",
        app.telemetry_addr().expect("telemetry should be enabled")
    );

    // The first poll runs as soon as the agent task is scheduled.
    let body = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let body = reqwest::get(&scrape_url).await.unwrap().text().await.unwrap();
            if body.contains("agent_polls_total") {
                return body;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .expect("poll counter should be exported");
    assert!(body.contains("# TYPE agent_polls_total counter"), "body: {}", body);

    app.shutdown().await;
}
