/// Task model and wire payloads
///
/// This module provides the Task record and the input types the client
/// derives requests from. Tasks are the core entity of the Taskdeck system.
///
/// # Identity
///
/// Task identity is server-assigned: a task only gains an `id` once the API
/// has accepted its creation, and the client never invents one. Every
/// mutation returns the canonical record, which replaces the local copy.
///
/// # Wire format
///
/// ```json
/// {
///   "id": 7,
///   "title": "Buy milk",
///   "description": "",
///   "completed": false
/// }
/// ```
///
/// Create and update requests additionally carry the owner's id as `userId`
/// (see [`TaskPayload`]); the API scopes reads by bearer token but expects
/// the owner stamped on writes.

use serde::{Deserialize, Serialize};

/// Task record as returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Server-assigned task ID
    pub id: i64,

    /// Short title shown in list views
    pub title: String,

    /// Free-form details (may be empty)
    pub description: String,

    /// Whether the task has been completed
    pub completed: bool,
}

/// Input for creating a new task
///
/// Carries everything a [`Task`] has except the id, which the server
/// assigns on creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Task title
    pub title: String,

    /// Task details (may be empty)
    pub description: String,

    /// Initial completion state (new tasks normally start open)
    #[serde(default)]
    pub completed: bool,
}

impl TaskDraft {
    /// Creates an open draft with the given title and description
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        TaskDraft {
            title: title.into(),
            description: description.into(),
            completed: false,
        }
    }
}

/// Input for updating an existing task
///
/// All fields are optional. Absent fields are omitted from the request body
/// entirely; the caller is responsible for resupplying any field it wants
/// preserved (the API's partial-update semantics are not guaranteed).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskPatch {
    /// New title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// New description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// New completion state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// Patch that only changes the completion state
    pub fn completed(value: bool) -> Self {
        TaskPatch {
            completed: Some(value),
            ..Default::default()
        }
    }

    /// Full-object patch of `task` with the completion state inverted
    ///
    /// Title and description are resupplied unchanged so the update is safe
    /// against replace-semantics on the server side.
    pub fn toggled_from(task: &Task) -> Self {
        TaskPatch {
            title: Some(task.title.clone()),
            description: Some(task.description.clone()),
            completed: Some(!task.completed),
        }
    }

    /// True if the patch carries no fields at all
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.completed.is_none()
    }
}

/// Request body for task writes
///
/// The API expects the owner's id stamped on every create/update as
/// `userId`. Optional fields mirror [`TaskPatch`]: absent means "not sent",
/// never `null`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPayload {
    /// Task title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Task details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Completion state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,

    /// Id of the user the task belongs to
    pub user_id: String,
}

impl TaskPayload {
    /// Builds a create payload: every field of the draft, plus the owner
    pub fn from_draft(draft: TaskDraft, user_id: &str) -> Self {
        TaskPayload {
            title: Some(draft.title),
            description: Some(draft.description),
            completed: Some(draft.completed),
            user_id: user_id.to_string(),
        }
    }

    /// Builds an update payload: only the fields present in the patch, plus the owner
    pub fn from_patch(patch: TaskPatch, user_id: &str) -> Self {
        TaskPayload {
            title: patch.title,
            description: patch.description,
            completed: patch.completed,
            user_id: user_id.to_string(),
        }
    }
}
