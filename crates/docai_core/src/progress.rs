use crate::{TaskState, TaskStatus};

/// Notification emitted when a polled snapshot differs from the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub task_id: String,
    pub status: TaskStatus,
    pub stage: Option<String>,
    pub percent: Option<f64>,
    pub message: Option<String>,
    pub raw: TaskState,
}

impl ProgressEvent {
    pub fn from_snapshot(snapshot: &TaskState) -> Self {
        Self {
            task_id: snapshot.task_id.clone(),
            status: snapshot.status,
            stage: snapshot.stage().map(ToOwned::to_owned),
            percent: snapshot.percent(),
            message: snapshot.progress_message().map(ToOwned::to_owned),
            raw: snapshot.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ProgressKey {
    status: TaskStatus,
    stage: Option<String>,
    percent: Option<f64>,
}

impl ProgressKey {
    fn of(snapshot: &TaskState) -> Self {
        Self {
            status: snapshot.status,
            stage: snapshot.stage().map(ToOwned::to_owned),
            percent: snapshot.percent(),
        }
    }
}

/// Change detector over consecutive snapshots of one task.
///
/// Only `status`, `progress.stage` and `progress.percent` count as a change;
/// a new `progress.message` alone does not. The first snapshot always counts.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    last: Option<ProgressKey>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `snapshot` and return an event if it differs from the previous one.
    pub fn observe(&mut self, snapshot: &TaskState) -> Option<ProgressEvent> {
        let key = ProgressKey::of(snapshot);
        if self.last.as_ref() == Some(&key) {
            return None;
        }
        self.last = Some(key);
        Some(ProgressEvent::from_snapshot(snapshot))
    }
}
