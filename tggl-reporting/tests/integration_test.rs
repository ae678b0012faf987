//! Integration tests for tggl-reporting

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tggl_flags::{EvaluationContext, Value};
use tggl_reporting::*;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingSink {
    payloads: Mutex<Vec<ReportPayload>>,
}

impl RecordingSink {
    fn payloads(&self) -> Vec<ReportPayload> {
        self.payloads.lock().clone()
    }
}

#[async_trait]
impl ReportSink for RecordingSink {
    async fn send(&self, payload: &ReportPayload) -> Result<()> {
        self.payloads.lock().push(payload.clone());
        Ok(())
    }
}

struct FailingSink {
    attempts: Mutex<usize>,
}

#[async_trait]
impl ReportSink for FailingSink {
    async fn send(&self, _payload: &ReportPayload) -> Result<()> {
        *self.attempts.lock() += 1;
        Err(ReportingError::Serialization("unreachable collector".into()))
    }
}

fn reporting_with(sink: Arc<dyn ReportSink>) -> Reporting {
    let config = ReportingConfig::builder()
        .app_prefix("tggl-rust/LocalClient")
        .app("tests")
        .build();
    Reporting::with_sink(config, sink)
}

#[tokio::test]
async fn test_identical_evaluations_aggregate() {
    let sink = Arc::new(RecordingSink::default());
    let reporting = reporting_with(sink.clone());

    reporting.report_flag("beta", FlagUsage::new(true, "on", Value::Null));
    reporting.report_flag("beta", FlagUsage::new(true, "on", Value::Null));
    reporting.flush().await;

    let payloads = sink.payloads();
    assert_eq!(payloads.len(), 1);
    assert_eq!(
        serde_json::to_value(&payloads[0]).unwrap(),
        json!({
            "clients": [{
                "id": "tggl-rust/LocalClient/tests",
                "flags": {"beta": [{"active": true, "value": "on", "default": null, "count": 2}]}
            }]
        })
    );
}

#[tokio::test]
async fn test_received_values_paginate() {
    let sink = Arc::new(RecordingSink::default());
    let reporting = reporting_with(sink.clone());

    for i in 0..4500 {
        reporting.report_context(&EvaluationContext::new().with_attribute("requestId", format!("r{i}")));
    }
    reporting.flush().await;

    let payloads = sink.payloads();
    let counts: Vec<usize> = payloads.iter().map(ReportPayload::received_value_count).collect();
    assert_eq!(counts, vec![2000, 2000, 500]);
    assert!(payloads[0].received_properties.is_some());
    assert!(payloads[1].received_properties.is_none());
}

#[tokio::test]
async fn test_flush_without_new_data_sends_nothing() {
    let sink = Arc::new(RecordingSink::default());
    let reporting = reporting_with(sink.clone());

    reporting.report_flag("beta", FlagUsage::new(false, Value::Null, Value::Null));
    reporting.flush().await;
    reporting.flush().await;
    reporting.flush().await;

    assert_eq!(sink.payloads().len(), 1);
}

#[tokio::test]
async fn test_delivery_errors_are_swallowed() {
    let sink = Arc::new(FailingSink {
        attempts: Mutex::new(0),
    });
    let reporting = reporting_with(sink.clone());

    reporting.report_flag("beta", FlagUsage::new(true, 1, 0));
    reporting.flush().await;

    assert_eq!(*sink.attempts.lock(), 1);
    // The failed batch is not retried
    reporting.flush().await;
    assert_eq!(*sink.attempts.lock(), 1);
}

#[tokio::test]
async fn test_disabled_reporting_records_nothing() {
    let sink = Arc::new(RecordingSink::default());
    let reporting = Reporting::with_sink(ReportingConfig::disabled(), sink.clone());

    reporting.report_flag("beta", FlagUsage::new(true, 1, 0));
    reporting.report_context(&EvaluationContext::new().with_user_id("u1"));
    reporting.start();
    reporting.close().await;

    assert!(reporting.collector().is_empty());
    assert!(sink.payloads().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_timer_flushes_periodically() {
    let sink = Arc::new(RecordingSink::default());
    let reporting = reporting_with(sink.clone());
    reporting.start();

    reporting.report_flag("beta", FlagUsage::new(true, 1, 0));
    tokio::time::sleep(Duration::from_millis(5100)).await;
    assert_eq!(sink.payloads().len(), 1);

    reporting.report_flag("beta", FlagUsage::new(true, 1, 0));
    tokio::time::sleep(Duration::from_millis(5000)).await;
    assert_eq!(sink.payloads().len(), 2);

    reporting.close().await;
}

#[tokio::test(start_paused = true)]
async fn test_zero_interval_timer_keeps_running() {
    let sink = Arc::new(RecordingSink::default());
    let mut config = ReportingConfig::builder().app("tests").build();
    config.report_interval = Duration::ZERO;
    let reporting = Reporting::with_sink(config, sink.clone());
    reporting.start();

    reporting.report_flag("beta", FlagUsage::new(true, 1, 0));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(sink.payloads().len(), 1);

    reporting.report_flag("beta", FlagUsage::new(true, 1, 0));
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(sink.payloads().len(), 2);

    reporting.close().await;
    assert!(reporting.is_closed());
}

#[tokio::test(start_paused = true)]
async fn test_close_stops_timer_and_flushes() {
    let sink = Arc::new(RecordingSink::default());
    let reporting = reporting_with(sink.clone());
    reporting.start();

    reporting.report_flag("beta", FlagUsage::new(true, 1, 0));
    reporting.close().await;
    assert_eq!(sink.payloads().len(), 1);
    assert!(reporting.is_closed());

    // Nothing is flushed by the timer any more
    reporting.report_flag("beta", FlagUsage::new(true, 1, 0));
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(sink.payloads().len(), 1);

    // Starting again after close is a no-op
    reporting.start();
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(sink.payloads().len(), 1);
}

#[tokio::test]
async fn test_http_sink_posts_report() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/report"))
        .and(header("x-tggl-api-key", "server-key"))
        .and(body_json(json!({
            "clients": [{
                "id": "shop",
                "flags": {"beta": [{"active": true, "value": true, "default": false, "count": 1}]}
            }]
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let config = ReportingConfig::builder()
        .app("shop")
        .api_key("server-key")
        .base_url(server.uri())
        .build();
    let reporting = Reporting::new(config).unwrap();

    reporting.report_flag("beta", FlagUsage::new(true, true, false));
    reporting.flush().await;
}

#[tokio::test]
async fn test_http_sink_error_status_is_swallowed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"error": "boom"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = ReportingConfig::builder().url(format!("{}/ingest", server.uri())).build();
    let reporting = Reporting::new(config).unwrap();

    reporting.report_flag("beta", FlagUsage::new(true, true, false));
    reporting.flush().await;
    assert!(reporting.collector().is_empty());
}
