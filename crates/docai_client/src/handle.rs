use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use docai_core::{GenerateOutcome, ProgressEvent, SaveOutcome, TaskAccepted, TaskState, TriggerOptions};
use docai_logging::docai_debug;

use crate::{ClientError, DocAiClient, GenerateOptions, ProcessOptions, ProgressSink, SinkResult, WaitOptions};

pub type RequestId = u64;

/// Work a [`ClientHandle`] runs on its worker thread.
#[derive(Debug, Clone)]
pub enum ClientCommand {
    Ping,
    Trigger(TriggerOptions),
    GetTask { task_id: String },
    WaitTask { task_id: String, wait: WaitOptions },
    Generate { trigger: TriggerOptions, wait: WaitOptions },
    Process { mode: String, content: Option<String> },
    Save { content: String, title: Option<String> },
}

/// Successful result of a [`ClientCommand`].
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Pong(String),
    Accepted(TaskAccepted),
    Task(TaskState),
    Generated(GenerateOutcome),
    Saved(SaveOutcome),
}

#[derive(Debug)]
pub enum ClientEvent {
    Progress {
        request_id: RequestId,
        event: ProgressEvent,
    },
    Completed {
        request_id: RequestId,
        result: Result<Completion, ClientError>,
    },
}

/// Synchronous front for a [`DocAiClient`]: commands go to a dedicated
/// thread running a Tokio runtime, each as its own task, and results come
/// back as [`ClientEvent`]s. Dropping the handle stops the worker and
/// abandons in-flight commands.
pub struct ClientHandle {
    cmd_tx: mpsc::Sender<(RequestId, ClientCommand)>,
    event_rx: mpsc::Receiver<ClientEvent>,
    next_id: AtomicU64,
}

impl ClientHandle {
    pub fn new(client: DocAiClient) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel::<(RequestId, ClientCommand)>();
        let (event_tx, event_rx) = mpsc::channel();
        let client = Arc::new(client);

        thread::Builder::new()
            .name("docai-client".to_string())
            .spawn(move || {
                while let Ok((request_id, command)) = cmd_rx.recv() {
                    let client = client.clone();
                    let event_tx = event_tx.clone();
                    runtime.spawn(async move {
                        handle_command(&client, request_id, command, event_tx).await;
                    });
                }
                docai_debug!("client handle closed");
            })?;

        Ok(Self {
            cmd_tx,
            event_rx,
            next_id: AtomicU64::new(1),
        })
    }

    /// Queue a command and return the id its events will carry, or `None`
    /// if the worker thread is gone.
    pub fn submit(&self, command: ClientCommand) -> Option<RequestId> {
        let request_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.cmd_tx.send((request_id, command)).ok()?;
        Some(request_id)
    }

    pub fn try_recv(&self) -> Option<ClientEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Block until the next event.
    pub fn recv(&self) -> Option<ClientEvent> {
        self.event_rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<ClientEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

struct ChannelProgressSink {
    request_id: RequestId,
    tx: mpsc::Sender<ClientEvent>,
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: &ProgressEvent) -> SinkResult {
        self.tx
            .send(ClientEvent::Progress {
                request_id: self.request_id,
                event: event.clone(),
            })
            .map_err(|_| "progress receiver dropped")?;
        Ok(())
    }
}

async fn handle_command(
    client: &DocAiClient,
    request_id: RequestId,
    command: ClientCommand,
    event_tx: mpsc::Sender<ClientEvent>,
) {
    let sink = Arc::new(ChannelProgressSink {
        request_id,
        tx: event_tx.clone(),
    });
    let result = match command {
        ClientCommand::Ping => client.ping().await.map(Completion::Pong),
        ClientCommand::Trigger(trigger) => client.trigger(trigger).await.map(Completion::Accepted),
        ClientCommand::GetTask { task_id } => client.get_task(&task_id).await.map(Completion::Task),
        ClientCommand::WaitTask { task_id, wait } => {
            client.wait_task(&task_id, wait).await.map(Completion::Task)
        }
        ClientCommand::Generate { trigger, wait } => client
            .generate(GenerateOptions {
                trigger,
                wait,
                sink: Some(sink),
            })
            .await
            .map(Completion::Generated),
        ClientCommand::Process { mode, content } => {
            let mut options = ProcessOptions::new(mode);
            options.content = content;
            options.sink = Some(sink);
            client.process_with(options).await.map(Completion::Generated)
        }
        ClientCommand::Save { content, title } => client
            .save(&content, title.as_deref())
            .await
            .map(Completion::Saved),
    };
    let _ = event_tx.send(ClientEvent::Completed { request_id, result });
}
