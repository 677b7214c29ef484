#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use docai_client::{
    ClientError, ClientSettings, DocAiClient, DocAiClientBuilder, HttpRequest, Provider,
    RawResponse, Transport, TransportError, WaitOptions,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use wiremock::{MockServer, ResponseTemplate};

pub fn settings(server: &MockServer) -> ClientSettings {
    ClientSettings {
        poll_interval: Duration::from_millis(10),
        wait_timeout: Duration::from_secs(5),
        ..ClientSettings::new(server.uri())
    }
}

pub fn builder(server: &MockServer) -> DocAiClientBuilder {
    docai_logging::initialize_for_tests();
    DocAiClient::builder(settings(server))
}

pub fn fast_wait() -> WaitOptions {
    WaitOptions::new(Duration::from_millis(10), Duration::from_secs(5))
}

pub fn accepted(task_id: &str) -> ResponseTemplate {
    ResponseTemplate::new(202).set_body_json(json!({
        "task_id": task_id,
        "status": "accepted",
        "message": "Processing started"
    }))
}

pub fn task_body(task_id: &str, status: &str, progress: Value, result: Value) -> Value {
    json!({
        "task_id": task_id,
        "status": status,
        "progress": progress,
        "result": result,
        "error": null,
        "created_at": 1700000000.0,
        "updated_at": null
    })
}

pub fn running(task_id: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(task_body(task_id, "running", Value::Null, Value::Null))
}

pub fn succeeded(task_id: &str, result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(task_body(task_id, "succeeded", Value::Null, result))
}

pub async fn count_requests(server: &MockServer, method: &str, path: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.method.as_str() == method && r.url.path() == path)
        .count()
}

/// Provider returning a fixed value after `delay`, counting its invocations.
#[derive(Clone)]
pub struct CountingProvider {
    value: String,
    delay: Duration,
    calls: Arc<AtomicUsize>,
}

impl CountingProvider {
    pub fn new(value: &str) -> Self {
        Self::with_delay(value, Duration::ZERO)
    }

    pub fn with_delay(value: &str, delay: Duration) -> Self {
        Self {
            value: value.to_string(),
            delay,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Provider<String> for CountingProvider {
    async fn provide(&self) -> Result<String, ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.value.clone())
    }
}

/// Fake transport that records every request and replays canned responses.
#[derive(Default)]
pub struct RecordingTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<VecDeque<RawResponse>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.responses.lock().push_back(RawResponse {
            url: "http://fake/api".to_string(),
            status,
            body: body.to_string(),
        });
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait::async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let url = format!("http://fake/api{}", request.path);
        self.requests.lock().push(request);
        Ok(self.responses.lock().pop_front().unwrap_or(RawResponse {
            url,
            status: 404,
            body: r#"{"detail":"Not Found"}"#.to_string(),
        }))
    }
}
