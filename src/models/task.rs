use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Deserializer, Serialize};

use super::datetime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    Todo,
    InProgress,
    Done,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Todo => "TODO",
            Status::InProgress => "IN_PROGRESS",
            Status::Done => "DONE",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Status::Done)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TODO" => Ok(Status::Todo),
            "IN_PROGRESS" => Ok(Status::InProgress),
            "DONE" => Ok(Status::Done),
            other => Err(format!("unknown task status: {}", other)),
        }
    }
}

/// A task as returned by the task service.
///
/// `done_at` is maintained by the server and is only expected when the
/// status is `DONE`; nothing on the client derives it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub text: String,
    pub status: Status,
    #[serde(default)]
    pub user_id: i64,
    #[serde(with = "datetime")]
    pub created_at: NaiveDateTime,
    #[serde(default, with = "datetime::option")]
    pub done_at: Option<NaiveDateTime>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTaskRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Full-replacement update body: every mutable field is sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: String,
    pub text: String,
    pub status: Status,
}

impl From<&Task> for UpdateTaskRequest {
    fn from(task: &Task) -> Self {
        Self {
            title: task.title.clone(),
            text: task.text.clone(),
            status: task.status,
        }
    }
}

/// Editable copy of a task, as held by the task editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    original: Task,
    pub title: String,
    pub text: String,
    pub completed: bool,
}

impl TaskDraft {
    pub fn new(task: &Task) -> Self {
        Self {
            original: task.clone(),
            title: task.title.clone(),
            text: task.text.clone(),
            completed: task.status.is_done(),
        }
    }

    pub fn task_id(&self) -> i64 {
        self.original.id
    }

    pub fn has_changes(&self) -> bool {
        self.title.trim() != self.original.title
            || self.text != self.original.text
            || self.completed != self.original.status.is_done()
    }

    /// The editor only toggles between done and not done. Unchecking a
    /// done task reopens it as `TODO`; an open task keeps its status.
    pub fn to_update(&self) -> UpdateTaskRequest {
        let status = match (self.completed, self.original.status) {
            (true, _) => Status::Done,
            (false, Status::Done) => Status::Todo,
            (false, open) => open,
        };
        UpdateTaskRequest {
            title: self.title.trim().to_string(),
            text: self.text.clone(),
            status,
        }
    }
}
