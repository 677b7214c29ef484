//! Injected sources for the ambient context a request needs.
//!
//! A [`Provider`] is a single custom source (document token, wiki info, login
//! code, bearer token). A [`PlatformAccessor`] is the host environment's view
//! of the open document and signed-in user. Clients receive either through
//! their builder; nothing here is looked up from global state.

use std::future::Future;

use docai_core::{non_empty, WikiInfo};

use crate::ClientError;

/// Asynchronous source of a value. May perform I/O.
#[async_trait::async_trait]
pub trait Provider<T>: Send + Sync {
    async fn provide(&self) -> Result<T, ClientError>;
}

/// Provider that always returns the same value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticProvider<T>(T);

impl<T> StaticProvider<T> {
    pub fn new(value: T) -> Self {
        Self(value)
    }
}

#[async_trait::async_trait]
impl<T> Provider<T> for StaticProvider<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn provide(&self) -> Result<T, ClientError> {
        Ok(self.0.clone())
    }
}

/// Provider backed by an async closure.
pub struct FnProvider<F>(F);

impl<F> FnProvider<F> {
    pub fn new<T, Fut>(f: F) -> Self
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, ClientError>>,
    {
        Self(f)
    }
}

#[async_trait::async_trait]
impl<T, F, Fut> Provider<T> for FnProvider<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<T, ClientError>> + Send + 'static,
    T: Send + 'static,
{
    async fn provide(&self) -> Result<T, ClientError> {
        (self.0)().await
    }
}

/// Host-environment capabilities: the open document and the signed-in user.
///
/// `Ok(None)` means the host has nothing to offer right now.
#[async_trait::async_trait]
pub trait PlatformAccessor: Send + Sync {
    async fn current_document_token(&self) -> Result<Option<String>, ClientError>;

    async fn wiki_info(&self) -> Result<Option<WikiInfo>, ClientError> {
        Ok(None)
    }

    /// Short-lived login code to exchange for the user's durable identity.
    async fn login_code(&self) -> Result<Option<String>, ClientError>;
}

/// Accessor reading the host context from environment variables:
/// `{PREFIX}_DOC_TOKEN`, `{PREFIX}_WIKI_NODE_TOKEN`, `{PREFIX}_WIKI_SPACE_ID`
/// and `{PREFIX}_LOGIN_CODE`. The default prefix is `DOCAI`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentAccessor {
    prefix: String,
}

impl Default for EnvironmentAccessor {
    fn default() -> Self {
        Self::with_prefix("DOCAI")
    }
}

impl EnvironmentAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn var(&self, name: &str) -> Option<String> {
        non_empty(std::env::var(format!("{}_{}", self.prefix, name)).ok())
    }
}

#[async_trait::async_trait]
impl PlatformAccessor for EnvironmentAccessor {
    async fn current_document_token(&self) -> Result<Option<String>, ClientError> {
        Ok(self.var("DOC_TOKEN"))
    }

    async fn wiki_info(&self) -> Result<Option<WikiInfo>, ClientError> {
        let wiki = WikiInfo::new(self.var("WIKI_NODE_TOKEN"), self.var("WIKI_SPACE_ID"));
        Ok(Some(wiki).filter(|w| !w.is_empty()))
    }

    async fn login_code(&self) -> Result<Option<String>, ClientError> {
        Ok(self.var("LOGIN_CODE"))
    }
}

/// Accessor with fixed answers, for tests and embedding hosts that already
/// know their context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticAccessor {
    pub document_token: Option<String>,
    pub wiki: Option<WikiInfo>,
    pub login_code: Option<String>,
}

impl StaticAccessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document_token(mut self, token: impl Into<String>) -> Self {
        self.document_token = Some(token.into());
        self
    }

    pub fn wiki(mut self, wiki: WikiInfo) -> Self {
        self.wiki = Some(wiki);
        self
    }

    pub fn login_code(mut self, code: impl Into<String>) -> Self {
        self.login_code = Some(code.into());
        self
    }
}

#[async_trait::async_trait]
impl PlatformAccessor for StaticAccessor {
    async fn current_document_token(&self) -> Result<Option<String>, ClientError> {
        Ok(self.document_token.clone())
    }

    async fn wiki_info(&self) -> Result<Option<WikiInfo>, ClientError> {
        Ok(self.wiki.clone())
    }

    async fn login_code(&self) -> Result<Option<String>, ClientError> {
        Ok(self.login_code.clone())
    }
}
