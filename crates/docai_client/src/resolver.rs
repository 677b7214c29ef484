use std::sync::Arc;

use docai_core::{non_empty, AuthRequest, AuthResponse, ContextCache, ContextPatch, WikiInfo};
use docai_logging::{docai_debug, docai_info, docai_warn};
use parking_lot::Mutex;

use crate::api::ApiClient;
use crate::{ClientError, PlatformAccessor, Provider};

const AUTH_PATH: &str = "/addon/auth";

/// Lazily resolves and caches the document token, wiki coordinates and user
/// identity that every task request needs.
///
/// Resolution never holds the cache lock across I/O. Two concurrent first
/// calls may both hit their source and the last writer wins. A lookup that
/// finishes after the caller changed the document context is dropped.
pub struct ContextResolver {
    cache: Mutex<ContextCache>,
    api: Arc<ApiClient>,
    doc_token_provider: Option<Arc<dyn Provider<String>>>,
    wiki_info_provider: Option<Arc<dyn Provider<WikiInfo>>>,
    code_provider: Option<Arc<dyn Provider<String>>>,
    platform: Option<Arc<dyn PlatformAccessor>>,
}

impl ContextResolver {
    pub(crate) fn new(
        api: Arc<ApiClient>,
        doc_token_provider: Option<Arc<dyn Provider<String>>>,
        wiki_info_provider: Option<Arc<dyn Provider<WikiInfo>>>,
        code_provider: Option<Arc<dyn Provider<String>>>,
        platform: Option<Arc<dyn PlatformAccessor>>,
    ) -> Self {
        Self {
            cache: Mutex::new(ContextCache::new()),
            api,
            doc_token_provider,
            wiki_info_provider,
            code_provider,
            platform,
        }
    }

    /// Lazily resolve the active document token. A result whose lookup
    /// raced with [`Self::set_context`] or [`Self::clear_context`] is
    /// discarded and resolution starts over.
    pub async fn resolve_document_token(&self) -> Result<String, ClientError> {
        loop {
            let generation = {
                let cache = self.cache.lock();
                if let Some(token) = cache.document_token.get() {
                    return Ok(token.clone());
                }
                cache.generation()
            };

            let (token, via_platform) = if let Some(provider) = &self.doc_token_provider {
                (provider.provide().await?, false)
            } else if let Some(platform) = &self.platform {
                (platform.current_document_token().await?.unwrap_or_default(), true)
            } else {
                return Err(ClientError::configuration("no way to resolve document token"));
            };
            let token = non_empty(Some(token)).ok_or_else(|| {
                ClientError::configuration("document token resolution produced no value")
            })?;
            let wiki = self.lookup_wiki(via_platform).await;

            let stored = {
                let mut cache = self.cache.lock();
                if cache.generation() == generation {
                    cache.resolve_document(token.clone(), wiki);
                    true
                } else {
                    false
                }
            };
            if stored {
                docai_debug!("document token resolved");
                return Ok(token);
            }
            docai_debug!("context changed during document token lookup, resolving again");
        }
    }

    pub async fn resolve_user_identity(&self) -> Result<String, ClientError> {
        if let Some(identity) = self.cached_user_identity() {
            return Ok(identity);
        }

        let code = if let Some(provider) = &self.code_provider {
            provider.provide().await?
        } else if let Some(platform) = &self.platform {
            platform.login_code().await?.unwrap_or_default()
        } else {
            return Err(ClientError::configuration("no way to obtain a login code"));
        };
        if code.is_empty() {
            return Err(ClientError::configuration("login code resolution produced no value"));
        }

        let response: AuthResponse = self.api.post(AUTH_PATH, &AuthRequest { code }).await?;
        let identity = non_empty(Some(response.open_id)).ok_or_else(|| {
            ClientError::configuration("identity exchange returned an empty open_id")
        })?;
        docai_info!("user identity resolved");
        self.cache.lock().user_identity.resolve(identity.clone());
        Ok(identity)
    }

    /// Overwrite any subset of the document-scoped fields, bypassing lazy
    /// resolution.
    pub fn set_context(&self, patch: ContextPatch) -> &Self {
        self.cache.lock().apply(patch);
        self
    }

    /// Forget the document-scoped fields, e.g. when the active document
    /// changes. The user identity is kept.
    pub fn clear_context(&self) -> &Self {
        self.cache.lock().clear_document();
        self
    }

    /// Wiki coordinates currently cached for the active document.
    pub fn wiki(&self) -> WikiInfo {
        self.cache.lock().wiki()
    }

    pub fn snapshot(&self) -> ContextCache {
        self.cache.lock().clone()
    }

    fn cached_user_identity(&self) -> Option<String> {
        self.cache.lock().user_identity.get().cloned()
    }

    /// Best-effort wiki lookup alongside document token resolution. A
    /// configured wiki provider wins; the platform is asked only when it also
    /// supplied the token.
    async fn lookup_wiki(&self, via_platform: bool) -> Option<WikiInfo> {
        let lookup = if let Some(provider) = &self.wiki_info_provider {
            provider.provide().await.map(Some)
        } else if let (true, Some(platform)) = (via_platform, &self.platform) {
            platform.wiki_info().await
        } else {
            return None;
        };

        match lookup {
            Ok(wiki) => wiki,
            Err(err) => {
                docai_warn!("wiki info lookup failed, continuing without it: {}", err);
                None
            }
        }
    }
}
