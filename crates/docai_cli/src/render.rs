use chrono::{DateTime, TimeZone};
use docai_client::{
    Completion, GenerateOutcome, ProgressEvent, SaveOutcome, TaskAccepted, TaskState, TaskStatus,
};

/// One terminal line for a progress notification.
pub fn progress_line<Tz>(event: &ProgressEvent, at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut line = format!("[{}] {} {}", at.format("%H:%M:%S"), event.task_id, event.status);
    if let Some(stage) = &event.stage {
        line.push(' ');
        line.push_str(stage);
    }
    if let Some(percent) = event.percent {
        line.push_str(&format!(" ({percent:.0}%)"));
    }
    if let Some(message) = &event.message {
        line.push_str(": ");
        line.push_str(message);
    }
    line
}

pub fn completion_lines(completion: &Completion) -> Vec<String> {
    match completion {
        Completion::Pong(message) => vec![format!("backend replied: {message}")],
        Completion::Accepted(accepted) => accepted_lines(accepted),
        Completion::Task(task) => task_lines(task),
        Completion::Generated(outcome) => generate_lines(outcome),
        Completion::Saved(outcome) => save_lines(outcome),
    }
}

/// Whether the completion represents a task that ended well.
pub fn completion_succeeded(completion: &Completion) -> bool {
    match completion {
        Completion::Pong(_) | Completion::Accepted(_) => true,
        Completion::Task(task) => task.status != TaskStatus::Failed,
        Completion::Generated(outcome) => outcome.succeeded(),
        Completion::Saved(outcome) => outcome.succeeded(),
    }
}

fn accepted_lines(accepted: &TaskAccepted) -> Vec<String> {
    let mut lines = vec![format!("task {} {}", accepted.task_id, accepted.status)];
    if !accepted.message.is_empty() {
        lines.push(accepted.message.clone());
    }
    lines
}

fn task_lines(task: &TaskState) -> Vec<String> {
    let mut lines = vec![format!("task {}: {}", task.task_id, task.status)];
    if let Some(stage) = task.stage() {
        lines.push(format!("stage: {stage}"));
    }
    if let Some(percent) = task.percent() {
        lines.push(format!("progress: {percent:.0}%"));
    }
    if let Some(error) = &task.error {
        lines.push(format!("error: {error}"));
    }
    if let Some(result) = &task.result {
        for (key, value) in result {
            lines.push(format!("{key}: {value}"));
        }
    }
    lines
}

fn generate_lines(outcome: &GenerateOutcome) -> Vec<String> {
    let mut lines = vec![format!("task {}: {}", outcome.task.task_id, outcome.task.status)];
    push_field(&mut lines, "document", &outcome.child_doc_url);
    push_field(&mut lines, "document token", &outcome.child_doc_token);
    push_field(&mut lines, "container", &outcome.container_url);
    push_field(&mut lines, "container token", &outcome.container_token);
    push_field(&mut lines, "error", &outcome.error);
    lines
}

fn save_lines(outcome: &SaveOutcome) -> Vec<String> {
    let mut lines = vec![format!("note task {}: {}", outcome.task_id, outcome.status)];
    push_field(&mut lines, "note", &outcome.child_doc_url);
    push_field(&mut lines, "note token", &outcome.child_doc_token);
    push_field(&mut lines, "container", &outcome.container_url);
    push_field(&mut lines, "error", &outcome.error);
    lines
}

fn push_field(lines: &mut Vec<String>, label: &str, value: &Option<String>) {
    if let Some(value) = value {
        lines.push(format!("{label}: {value}"));
    }
}
