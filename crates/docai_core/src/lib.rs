//! Docai core: pure task-lifecycle model, wire payloads and result extraction.
mod context;
mod extract;
mod payload;
mod progress;
mod task;

pub mod modes;

pub use context::{Cached, ContextCache, ContextPatch, WikiInfo};
pub use extract::{extract_links, ArtifactLinks, GenerateOutcome, SaveOutcome};
pub use payload::{
    non_empty, AuthRequest, AuthResponse, PingResponse, ProcessPayload, RequestError, SavePayload,
    TriggerOptions, DEFAULT_TRIGGER_SOURCE,
};
pub use progress::{ProgressEvent, ProgressTracker};
pub use task::{TaskAccepted, TaskProgress, TaskState, TaskStatus};
