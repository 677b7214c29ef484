use std::sync::Arc;
use std::time::Duration;

use docai_core::{
    modes, ContextPatch, GenerateOutcome, PingResponse, ProgressTracker, SaveOutcome, SavePayload,
    TaskAccepted, TaskState, TriggerOptions, WikiInfo,
};
use docai_logging::{docai_debug, docai_info, docai_warn};
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;

use crate::api::ApiClient;
use crate::{
    ClientError, ClientSettings, ContextResolver, PlatformAccessor, ProgressSink, Provider,
    ReqwestTransport, Transport,
};

const PING_PATH: &str = "/ping";
const PROCESS_PATH: &str = "/addon/process";
const SAVE_PATH: &str = "/addon/save";
const TASKS_PATH: &str = "/addon/tasks";

/// Bounds for one wait on a task.
#[derive(Debug, Clone)]
pub struct WaitOptions {
    pub poll_interval: Duration,
    /// Measured from the start of the wait.
    pub timeout: Duration,
    /// Cancelling this token during the inter-poll sleep ends the wait.
    pub cancel: Option<CancellationToken>,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
            timeout: Duration::from_millis(180_000),
            cancel: None,
        }
    }
}

impl WaitOptions {
    pub fn new(poll_interval: Duration, timeout: Duration) -> Self {
        Self {
            poll_interval,
            timeout,
            cancel: None,
        }
    }

    pub fn with_cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Submit-and-wait request with optional progress reporting.
#[derive(Clone, Default)]
pub struct GenerateOptions {
    pub trigger: TriggerOptions,
    pub wait: WaitOptions,
    pub sink: Option<Arc<dyn ProgressSink>>,
}

impl GenerateOptions {
    pub fn new(trigger: TriggerOptions) -> Self {
        Self {
            trigger,
            ..Self::default()
        }
    }

    pub fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = wait;
        self
    }

    pub fn with_sink(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }
}

/// Context-resolving processing request. `wait` defaults to the client
/// settings.
#[derive(Clone, Default)]
pub struct ProcessOptions {
    pub mode: String,
    pub content: Option<String>,
    pub wait: Option<WaitOptions>,
    pub sink: Option<Arc<dyn ProgressSink>>,
}

impl ProcessOptions {
    pub fn new(mode: impl Into<String>) -> Self {
        Self {
            mode: mode.into(),
            ..Self::default()
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_wait(mut self, wait: WaitOptions) -> Self {
        self.wait = Some(wait);
        self
    }

    pub fn with_sink(mut self, sink: impl ProgressSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }
}

/// Client for the document-processing add-on backend.
pub struct DocAiClient {
    settings: ClientSettings,
    api: Arc<ApiClient>,
    context: ContextResolver,
}

impl DocAiClient {
    pub fn builder(settings: ClientSettings) -> DocAiClientBuilder {
        DocAiClientBuilder::new(settings)
    }

    /// Client over the default HTTP transport with no context sources.
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        Self::builder(settings).build()
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn context(&self) -> &ContextResolver {
        &self.context
    }

    pub fn set_context(&self, patch: ContextPatch) -> &Self {
        self.context.set_context(patch);
        self
    }

    pub fn clear_context(&self) -> &Self {
        self.context.clear_context();
        self
    }

    /// Connectivity check against `GET /ping`.
    pub async fn ping(&self) -> Result<String, ClientError> {
        let response: PingResponse = self.api.get(PING_PATH).await?;
        Ok(response.message)
    }

    /// Submit a processing request. Nothing is sent if the request carries no
    /// token or no user id.
    pub async fn trigger(&self, options: TriggerOptions) -> Result<TaskAccepted, ClientError> {
        let payload = options.into_payload(&self.settings.trigger_source)?;
        let accepted: TaskAccepted = self.api.post(PROCESS_PATH, &payload).await?;
        docai_info!(
            "task {} accepted (mode {})",
            accepted.task_id,
            payload.mode.as_deref().unwrap_or("default")
        );
        Ok(accepted)
    }

    pub async fn get_task(&self, task_id: &str) -> Result<TaskState, ClientError> {
        let path = format!("{}/{}", TASKS_PATH, urlencoding::encode(task_id));
        self.api.get(&path).await
    }

    /// Poll until the task is terminal or the deadline passes.
    pub async fn wait_task(&self, task_id: &str, wait: WaitOptions) -> Result<TaskState, ClientError> {
        self.poll_until_terminal(task_id, &wait, |_| {}).await
    }

    /// Trigger, then wait while reporting progress changes to the sink.
    pub async fn generate(&self, options: GenerateOptions) -> Result<GenerateOutcome, ClientError> {
        let accepted = self.trigger(options.trigger).await?;
        let sink = options.sink;
        let mut tracker = ProgressTracker::new();

        let task = self
            .poll_until_terminal(&accepted.task_id, &options.wait, |snapshot| {
                let Some(sink) = sink.as_deref() else {
                    return;
                };
                let Some(event) = tracker.observe(snapshot) else {
                    return;
                };
                if let Err(err) = sink.emit(&event) {
                    docai_warn!("progress sink failed for task {}: {}", event.task_id, err);
                }
            })
            .await?;

        Ok(GenerateOutcome::from_task(task))
    }

    pub async fn process(&self, mode: &str, content: Option<&str>) -> Result<GenerateOutcome, ClientError> {
        let mut options = ProcessOptions::new(mode);
        options.content = content.map(ToOwned::to_owned);
        self.process_with(options).await
    }

    /// Resolve context, then generate against the active document.
    pub async fn process_with(&self, options: ProcessOptions) -> Result<GenerateOutcome, ClientError> {
        let (token, user_id) = self.resolve_context().await?;
        let mut trigger = TriggerOptions::new(user_id)
            .with_token(token)
            .with_mode(options.mode)
            .with_wiki(self.context.wiki());
        trigger.content = options.content;

        self.generate(GenerateOptions {
            trigger,
            wait: options.wait.unwrap_or_else(|| self.settings.wait_options()),
            sink: options.sink,
        })
        .await
    }

    pub async fn idea_expand(&self, content: Option<&str>) -> Result<GenerateOutcome, ClientError> {
        self.process(modes::IDEA_EXPAND, content).await
    }

    pub async fn research(&self, content: Option<&str>) -> Result<GenerateOutcome, ClientError> {
        self.process(modes::RESEARCH, content).await
    }

    /// Save `content` as a note next to the active document.
    pub async fn save(&self, content: &str, title: Option<&str>) -> Result<SaveOutcome, ClientError> {
        let (token, user_id) = self.resolve_context().await?;
        let payload = SavePayload::new(
            content,
            title.map(ToOwned::to_owned),
            token,
            user_id,
            self.context.wiki(),
        )?;
        let accepted: TaskAccepted = self.api.post(SAVE_PATH, &payload).await?;
        docai_info!("save task {} accepted", accepted.task_id);

        let task = self
            .wait_task(&accepted.task_id, self.settings.wait_options())
            .await?;
        Ok(SaveOutcome::from_task(&task))
    }

    async fn resolve_context(&self) -> Result<(String, String), ClientError> {
        tokio::try_join!(
            self.context.resolve_document_token(),
            self.context.resolve_user_identity()
        )
    }

    /// Strictly sequential polling. The deadline is checked only after a
    /// non-terminal snapshot, so a task that finishes on the last poll
    /// still succeeds, and no poll is made once the deadline has passed.
    async fn poll_until_terminal<F>(
        &self,
        task_id: &str,
        wait: &WaitOptions,
        mut on_snapshot: F,
    ) -> Result<TaskState, ClientError>
    where
        F: FnMut(&TaskState) + Send,
    {
        let deadline = Instant::now().checked_add(wait.timeout);
        let mut polls: u32 = 0;
        loop {
            let task = self.get_task(task_id).await?;
            polls += 1;
            docai_debug!("task {} poll {}: {}", task_id, polls, task.status);
            on_snapshot(&task);

            if task.is_terminal() {
                docai_info!("task {} {} after {} polls", task_id, task.status, polls);
                return Ok(task);
            }
            if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
                docai_warn!("task {} still running after {:?}", task_id, wait.timeout);
                return Err(ClientError::Timeout {
                    task_id: task_id.to_string(),
                });
            }
            pause(task_id, wait).await?;
        }
    }
}

async fn pause(task_id: &str, wait: &WaitOptions) -> Result<(), ClientError> {
    let Some(cancel) = &wait.cancel else {
        sleep(wait.poll_interval).await;
        return Ok(());
    };
    tokio::select! {
        _ = cancel.cancelled() => Err(ClientError::Cancelled {
            task_id: task_id.to_string(),
        }),
        _ = sleep(wait.poll_interval) => Ok(()),
    }
}

/// Wires settings, transport and context sources into a [`DocAiClient`].
pub struct DocAiClientBuilder {
    settings: ClientSettings,
    transport: Option<Arc<dyn Transport>>,
    auth_provider: Option<Arc<dyn Provider<String>>>,
    doc_token_provider: Option<Arc<dyn Provider<String>>>,
    wiki_info_provider: Option<Arc<dyn Provider<WikiInfo>>>,
    code_provider: Option<Arc<dyn Provider<String>>>,
    platform: Option<Arc<dyn PlatformAccessor>>,
}

impl DocAiClientBuilder {
    pub fn new(settings: ClientSettings) -> Self {
        Self {
            settings,
            transport: None,
            auth_provider: None,
            doc_token_provider: None,
            wiki_info_provider: None,
            code_provider: None,
            platform: None,
        }
    }

    /// Replace the default reqwest transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Bearer token source. A blank token omits the header.
    pub fn auth_provider(mut self, provider: impl Provider<String> + 'static) -> Self {
        self.auth_provider = Some(Arc::new(provider));
        self
    }

    pub fn doc_token_provider(mut self, provider: impl Provider<String> + 'static) -> Self {
        self.doc_token_provider = Some(Arc::new(provider));
        self
    }

    pub fn wiki_info_provider(mut self, provider: impl Provider<WikiInfo> + 'static) -> Self {
        self.wiki_info_provider = Some(Arc::new(provider));
        self
    }

    /// Login code source, exchanged once for the user identity.
    pub fn code_provider(mut self, provider: impl Provider<String> + 'static) -> Self {
        self.code_provider = Some(Arc::new(provider));
        self
    }

    pub fn platform(mut self, platform: impl PlatformAccessor + 'static) -> Self {
        self.platform = Some(Arc::new(platform));
        self
    }

    pub fn build(self) -> Result<DocAiClient, ClientError> {
        url::Url::parse(&self.settings.base_url).map_err(|err| {
            ClientError::configuration(format!("invalid base url {:?}: {err}", self.settings.base_url))
        })?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(&self.settings)?),
        };

        let api = Arc::new(ApiClient::new(transport, self.auth_provider));
        let context = ContextResolver::new(
            api.clone(),
            self.doc_token_provider,
            self.wiki_info_provider,
            self.code_provider,
            self.platform,
        );
        Ok(DocAiClient {
            settings: self.settings,
            api,
            context,
        })
    }
}
