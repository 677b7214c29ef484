use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{ClientSettings, TransportError, TransportFailure};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A JSON request relative to the configured API prefix.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// Endpoint path such as `/addon/process`.
    pub path: String,
    pub body: Option<Value>,
    pub bearer: Option<String>,
}

impl HttpRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            path: path.into(),
            body: None,
            bearer: None,
        }
    }

    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            path: path.into(),
            body: Some(body),
            bearer: None,
        }
    }
}

/// Status and body text of a completed HTTP exchange, whatever the status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Reject non-2xx statuses, then parse the body as `T`.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, TransportError> {
        if !self.is_success() {
            return Err(TransportError::new(
                TransportFailure::HttpStatus(self.status),
                self.url,
                format!("HTTP {}", self.status),
            )
            .with_body(self.body));
        }
        serde_json::from_str(&self.body).map_err(|err| {
            TransportError::new(
                TransportFailure::InvalidBody {
                    status: self.status,
                },
                self.url,
                err.to_string(),
            )
            .with_body(self.body)
        })
    }
}

/// Issues one HTTP exchange. Status handling and decoding live in
/// [`RawResponse::json`] so every transport reports failures the same way.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError>;
}

/// Join base URL, route prefix and endpoint path with exactly one `/`
/// between non-empty parts, whatever slashes the caller supplied.
pub fn join_url(base_url: &str, api_prefix: &str, path: &str) -> String {
    let mut url = base_url.trim_end_matches('/').to_string();
    for part in [api_prefix, path] {
        let part = part.trim_matches('/');
        if !part.is_empty() {
            url.push('/');
            url.push_str(part);
        }
    }
    url
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    base_url: String,
    api_prefix: String,
}

impl ReqwestTransport {
    pub fn new(settings: &ClientSettings) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| {
                TransportError::new(TransportFailure::Network, &settings.base_url, err.to_string())
            })?;
        Ok(Self {
            client,
            base_url: settings.base_url.clone(),
            api_prefix: settings.api_prefix.clone(),
        })
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, TransportError> {
        let url = join_url(&self.base_url, &self.api_prefix, &request.path);
        let parsed = reqwest::Url::parse(&url)
            .map_err(|err| TransportError::new(TransportFailure::InvalidUrl, &url, err.to_string()))?;

        let mut builder = match request.method {
            HttpMethod::Get => self.client.get(parsed),
            HttpMethod::Post => self.client.post(parsed),
        };
        if let Some(body) = request.body {
            builder = builder
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_string());
        }
        if let Some(token) = request.bearer {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| map_reqwest_error(&url, err))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| map_reqwest_error(&url, err))?;

        Ok(RawResponse { url, status, body })
    }
}

fn map_reqwest_error(url: &str, err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        return TransportError::new(TransportFailure::Timeout, url, err.to_string());
    }
    TransportError::new(TransportFailure::Network, url, err.to_string())
}
