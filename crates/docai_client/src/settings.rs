use std::time::Duration;

use docai_core::DEFAULT_TRIGGER_SOURCE;

use crate::WaitOptions;

/// Connection and polling settings for a [`crate::DocAiClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub base_url: String,
    /// Route prefix joined between `base_url` and each endpoint path.
    pub api_prefix: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub wait_timeout: Duration,
    /// Provenance tag sent when a request does not carry one.
    pub trigger_source: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8001".to_string(),
            api_prefix: "/api".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(2000),
            wait_timeout: Duration::from_millis(180_000),
            trigger_source: DEFAULT_TRIGGER_SOURCE.to_string(),
        }
    }
}

impl ClientSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Wait options carrying this client's poll interval and timeout.
    pub fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            poll_interval: self.poll_interval,
            timeout: self.wait_timeout,
            cancel: None,
        }
    }
}
