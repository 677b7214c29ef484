use serde::{Deserialize, Serialize};

use crate::payload::non_empty;

/// A lazily resolved value: either still pending or resolved and cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cached<T> {
    Pending,
    Resolved(T),
}

impl<T> Default for Cached<T> {
    fn default() -> Self {
        Cached::Pending
    }
}

impl<T> Cached<T> {
    pub fn get(&self) -> Option<&T> {
        match self {
            Cached::Pending => None,
            Cached::Resolved(value) => Some(value),
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Cached::Resolved(_))
    }

    pub fn resolve(&mut self, value: T) {
        *self = Cached::Resolved(value);
    }

    pub fn reset(&mut self) {
        *self = Cached::Pending;
    }
}

/// Wiki coordinates of the active document, when it lives in a knowledge base.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WikiInfo {
    #[serde(default)]
    pub node_token: Option<String>,
    #[serde(default)]
    pub space_id: Option<String>,
}

impl WikiInfo {
    pub fn new(node_token: Option<String>, space_id: Option<String>) -> Self {
        Self {
            node_token: non_empty(node_token),
            space_id: non_empty(space_id),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.node_token.is_none() && self.space_id.is_none()
    }
}

/// Partial overwrite of the document-scoped context fields.
///
/// Unset and empty fields leave the cached value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextPatch {
    pub document_token: Option<String>,
    pub wiki_node_token: Option<String>,
    pub wiki_space_id: Option<String>,
}

impl ContextPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn document_token(mut self, token: impl Into<String>) -> Self {
        self.document_token = Some(token.into());
        self
    }

    pub fn wiki_node_token(mut self, token: impl Into<String>) -> Self {
        self.wiki_node_token = Some(token.into());
        self
    }

    pub fn wiki_space_id(mut self, space_id: impl Into<String>) -> Self {
        self.wiki_space_id = Some(space_id.into());
        self
    }
}

/// Session-scoped cache of the ambient state every task request needs.
///
/// The document token and wiki coordinates belong to the open document and
/// are cleared together; the user identity outlives document switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextCache {
    pub document_token: Cached<String>,
    pub wiki_node_token: Option<String>,
    pub wiki_space_id: Option<String>,
    pub user_identity: Cached<String>,
    generation: u64,
}

impl ContextCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wiki(&self) -> WikiInfo {
        WikiInfo {
            node_token: self.wiki_node_token.clone(),
            space_id: self.wiki_space_id.clone(),
        }
    }

    /// Bumped whenever the caller overwrites or clears the document-scoped
    /// fields. A lookup started under one generation must not write its
    /// result into another.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Store a lazily resolved document token with the wiki coordinates
    /// looked up alongside it. Empty wiki fields leave cached values alone.
    pub fn resolve_document(&mut self, token: String, wiki: Option<WikiInfo>) {
        self.document_token.resolve(token);
        if let Some(wiki) = wiki {
            if let Some(node_token) = non_empty(wiki.node_token) {
                self.wiki_node_token = Some(node_token);
            }
            if let Some(space_id) = non_empty(wiki.space_id) {
                self.wiki_space_id = Some(space_id);
            }
        }
    }

    pub fn apply(&mut self, patch: ContextPatch) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(token) = non_empty(patch.document_token) {
            self.document_token.resolve(token);
        }
        if let Some(token) = non_empty(patch.wiki_node_token) {
            self.wiki_node_token = Some(token);
        }
        if let Some(space_id) = non_empty(patch.wiki_space_id) {
            self.wiki_space_id = Some(space_id);
        }
    }

    /// Forget the document-scoped fields. The user identity is kept.
    pub fn clear_document(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        self.document_token.reset();
        self.wiki_node_token = None;
        self.wiki_space_id = None;
    }
}
