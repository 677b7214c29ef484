//! Docai client: context resolution, task submission and polling over HTTP.
mod api;
mod client;
mod error;
mod handle;
mod progress;
mod provider;
mod resolver;
mod settings;
mod transport;

pub use client::{DocAiClient, DocAiClientBuilder, GenerateOptions, ProcessOptions, WaitOptions};
pub use error::{ClientError, ErrorKind, TransportError, TransportFailure};
pub use handle::{ClientCommand, ClientEvent, ClientHandle, Completion, RequestId};
pub use progress::{ProgressSink, SinkResult};
pub use provider::{EnvironmentAccessor, FnProvider, PlatformAccessor, Provider, StaticAccessor, StaticProvider};
pub use resolver::ContextResolver;
pub use settings::ClientSettings;
pub use transport::{join_url, HttpMethod, HttpRequest, RawResponse, ReqwestTransport, Transport};

pub use docai_core::{
    modes, ContextCache, ContextPatch, GenerateOutcome, ProgressEvent, SaveOutcome, TaskAccepted,
    TaskProgress, TaskState, TaskStatus, TriggerOptions, WikiInfo,
};
