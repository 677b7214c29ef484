use std::sync::Arc;

use docai_logging::docai_trace;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{ClientError, HttpRequest, Provider, Transport};

/// Typed JSON calls over a [`Transport`], adding the bearer header when an
/// auth provider yields a non-blank token.
pub(crate) struct ApiClient {
    transport: Arc<dyn Transport>,
    auth_provider: Option<Arc<dyn Provider<String>>>,
}

impl ApiClient {
    pub(crate) fn new(
        transport: Arc<dyn Transport>,
        auth_provider: Option<Arc<dyn Provider<String>>>,
    ) -> Self {
        Self {
            transport,
            auth_provider,
        }
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.send(HttpRequest::get(path)).await
    }

    pub(crate) async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|err| {
            ClientError::configuration(format!("request body for {path} is not serializable: {err}"))
        })?;
        self.send(HttpRequest::post(path, body)).await
    }

    async fn send<T: DeserializeOwned>(&self, mut request: HttpRequest) -> Result<T, ClientError> {
        request.bearer = self.bearer().await?;
        docai_trace!("{:?} {}", request.method, request.path);
        let response = self.transport.send(request).await?;
        Ok(response.json()?)
    }

    async fn bearer(&self) -> Result<Option<String>, ClientError> {
        let Some(provider) = &self.auth_provider else {
            return Ok(None);
        };
        let token = provider.provide().await?;
        Ok(Some(token).filter(|t| !t.trim().is_empty()))
    }
}
