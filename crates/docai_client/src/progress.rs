use docai_core::ProgressEvent;

pub type SinkResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// Receives change-triggered progress while a task is being polled.
///
/// An `Err` from [`ProgressSink::emit`] is logged at warn and polling
/// continues; a failing sink never decides the task's outcome.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: &ProgressEvent) -> SinkResult;
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressEvent) -> SinkResult + Send + Sync,
{
    fn emit(&self, event: &ProgressEvent) -> SinkResult {
        self(event)
    }
}
