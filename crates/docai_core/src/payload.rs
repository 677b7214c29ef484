use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::WikiInfo;

/// Provenance tag sent when the caller does not supply one.
pub const DEFAULT_TRIGGER_SOURCE: &str = "docs_addon";

/// Rejections raised while building a payload, before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("request carries neither token nor doc_token")]
    MissingToken,
    #[error("request carries an empty user id")]
    MissingUserId,
    #[error("save request carries empty content")]
    MissingContent,
}

/// Map an empty string to `None`. The backend treats `""` as a distinct,
/// invalid value, so it must never reach the wire.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Caller-facing description of a processing request.
///
/// `token` is the unified entry point (document token or wiki node token);
/// `doc_token` is kept for callers that only know the drive token. When both
/// are set they are sent unchanged and the backend decides which wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerOptions {
    pub token: Option<String>,
    pub doc_token: Option<String>,
    pub user_id: String,
    pub mode: Option<String>,
    /// User-selected fragment to process instead of the whole document.
    pub content: Option<String>,
    pub trigger_source: Option<String>,
    pub wiki_node_token: Option<String>,
    pub wiki_space_id: Option<String>,
}

impl TriggerOptions {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Self::default()
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_doc_token(mut self, doc_token: impl Into<String>) -> Self {
        self.doc_token = Some(doc_token.into());
        self
    }

    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_trigger_source(mut self, source: impl Into<String>) -> Self {
        self.trigger_source = Some(source.into());
        self
    }

    pub fn with_wiki(mut self, wiki: WikiInfo) -> Self {
        self.wiki_node_token = wiki.node_token;
        self.wiki_space_id = wiki.space_id;
        self
    }

    /// Normalise into the wire payload, filling in `default_trigger_source`
    /// when the caller left the provenance tag unset.
    pub fn into_payload(self, default_trigger_source: &str) -> Result<ProcessPayload, RequestError> {
        let token = non_empty(self.token);
        let doc_token = non_empty(self.doc_token);
        if token.is_none() && doc_token.is_none() {
            return Err(RequestError::MissingToken);
        }
        if self.user_id.is_empty() {
            return Err(RequestError::MissingUserId);
        }
        let trigger_source = non_empty(self.trigger_source)
            .or_else(|| non_empty(Some(default_trigger_source.to_string())));

        Ok(ProcessPayload {
            token,
            doc_token,
            user_id: self.user_id,
            mode: non_empty(self.mode),
            content: non_empty(self.content),
            trigger_source,
            wiki_node_token: non_empty(self.wiki_node_token),
            wiki_space_id: non_empty(self.wiki_space_id),
        })
    }
}

/// Body of `POST /addon/process`. Built through [`TriggerOptions::into_payload`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doc_token: Option<String>,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trigger_source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiki_node_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiki_space_id: Option<String>,
}

/// Body of `POST /addon/save`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavePayload {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub token: String,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiki_node_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wiki_space_id: Option<String>,
}

impl SavePayload {
    pub fn new(
        content: impl Into<String>,
        title: Option<String>,
        token: impl Into<String>,
        user_id: impl Into<String>,
        wiki: WikiInfo,
    ) -> Result<Self, RequestError> {
        let content = content.into();
        let token = token.into();
        let user_id = user_id.into();
        if content.is_empty() {
            return Err(RequestError::MissingContent);
        }
        if token.is_empty() {
            return Err(RequestError::MissingToken);
        }
        if user_id.is_empty() {
            return Err(RequestError::MissingUserId);
        }
        Ok(Self {
            content,
            title: non_empty(title),
            token,
            user_id,
            wiki_node_token: non_empty(wiki.node_token),
            wiki_space_id: non_empty(wiki.space_id),
        })
    }
}

/// Body of `POST /addon/auth`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthRequest {
    pub code: String,
}

/// Response of `POST /addon/auth`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    pub open_id: String,
}

/// Response of `GET /ping`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PingResponse {
    pub message: String,
}
