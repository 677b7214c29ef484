use serde::Serialize;
use serde_json::{Map, Value};

use crate::payload::non_empty;
use crate::{TaskState, TaskStatus};

const CHILD_DOC_URL: &str = "child_doc_url";
const CHILD_DOC_TOKEN: &str = "child_doc_token";
const CONTAINER_URL: &str = "container_url";
const CONTAINER_TOKEN: &str = "container_token";

/// Artifact locators pulled out of a task's open `result` payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArtifactLinks {
    pub child_doc_url: Option<String>,
    pub child_doc_token: Option<String>,
    pub container_url: Option<String>,
    pub container_token: Option<String>,
}

/// Read the known locator keys from `result`.
///
/// A key counts only if present and a JSON string. Numbers, nulls, objects
/// and the like are dropped, never stringified.
pub fn extract_links(result: Option<&Map<String, Value>>) -> ArtifactLinks {
    let Some(result) = result else {
        return ArtifactLinks::default();
    };
    ArtifactLinks {
        child_doc_url: string_field(result, CHILD_DOC_URL),
        child_doc_token: string_field(result, CHILD_DOC_TOKEN),
        container_url: string_field(result, CONTAINER_URL),
        container_token: string_field(result, CONTAINER_TOKEN),
    }
}

fn string_field(result: &Map<String, Value>, key: &str) -> Option<String> {
    result
        .get(key)
        .and_then(Value::as_str)
        .map(ToOwned::to_owned)
}

/// Result of a processing run: the terminal snapshot plus its artifacts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateOutcome {
    pub task: TaskState,
    pub child_doc_url: Option<String>,
    pub child_doc_token: Option<String>,
    pub container_url: Option<String>,
    pub container_token: Option<String>,
    pub error: Option<String>,
}

impl GenerateOutcome {
    pub fn from_task(task: TaskState) -> Self {
        let links = extract_links(task.result.as_ref());
        let error = non_empty(task.error.clone());
        Self {
            child_doc_url: links.child_doc_url,
            child_doc_token: links.child_doc_token,
            container_url: links.container_url,
            container_token: links.container_token,
            error,
            task,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.task.status == TaskStatus::Succeeded
    }
}

/// Result of a save run. The snapshot itself is not re-exposed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaveOutcome {
    pub task_id: String,
    pub status: TaskStatus,
    pub child_doc_url: Option<String>,
    pub child_doc_token: Option<String>,
    pub container_url: Option<String>,
    pub error: Option<String>,
}

impl SaveOutcome {
    pub fn from_task(task: &TaskState) -> Self {
        let links = extract_links(task.result.as_ref());
        Self {
            task_id: task.task_id.clone(),
            status: task.status,
            child_doc_url: links.child_doc_url,
            child_doc_token: links.child_doc_token,
            container_url: links.container_url,
            error: non_empty(task.error.clone()),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.status == TaskStatus::Succeeded
    }
}
