//! Core task types: identifiers, the task entity, drafts, and patches.
//!
//! A task never stores its own calendar day — the day is the bucket key in
//! the surrounding [`TaskBook`]. Moving a task between days is not a
//! supported mutation, so the day cannot drift out of sync with the bucket.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::day::DayKey;

/// Maximum allowed task title length in characters.
pub const MAX_TASK_TITLE_LENGTH: usize = 256;

/// Prefix that marks a locally-synthesized (provisional) task id.
///
/// Confirmed ids are assigned by the remote store and never carry it.
pub const LOCAL_ID_PREFIX: &str = "local-";

/// Unique identifier for a task.
///
/// Either a confirmed id assigned by the remote store, or a provisional
/// `local-` id synthesized while the remote insert is pending (or while the
/// user is signed out entirely).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    /// Wraps an id assigned by the remote store.
    pub fn confirmed(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Synthesizes a new provisional id (`local-` + time-ordered UUID v7).
    #[must_use]
    pub fn provisional() -> Self {
        Self(format!("{LOCAL_ID_PREFIX}{}", Uuid::now_v7()))
    }

    /// Whether this id was synthesized locally and is not yet (or never
    /// will be) backed by a remote document.
    #[must_use]
    pub fn is_provisional(&self) -> bool {
        self.0.starts_with(LOCAL_ID_PREFIX)
    }

    /// Returns the string representation of this id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TaskId {
    type Err = std::convert::Infallible;

    /// Round-trips any id string, provisional prefix included.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

/// Identifier of the task's owning user, as issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    /// Creates a user identifier from its string representation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string representation of this user id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Errors for user-supplied task input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DraftError {
    /// Task title cannot be empty.
    #[error("task title cannot be empty")]
    TitleEmpty,
    /// Task title exceeds the maximum length.
    #[error("task title too long (max {MAX_TASK_TITLE_LENGTH} characters)")]
    TitleTooLong,
}

/// Validated user input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    title: String,
    description: String,
    time: Option<NaiveTime>,
}

impl TaskDraft {
    /// Creates a draft with the given title and no description or time.
    ///
    /// # Errors
    ///
    /// Returns [`DraftError::TitleEmpty`] if the title is blank after
    /// trimming, or [`DraftError::TitleTooLong`] if it exceeds
    /// [`MAX_TASK_TITLE_LENGTH`] characters.
    pub fn new(title: impl Into<String>) -> Result<Self, DraftError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(DraftError::TitleEmpty);
        }
        if title.chars().count() > MAX_TASK_TITLE_LENGTH {
            return Err(DraftError::TitleTooLong);
        }
        Ok(Self {
            title,
            description: String::new(),
            time: None,
        })
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the wall-clock time.
    #[must_use]
    pub const fn with_time(mut self, time: NaiveTime) -> Self {
        self.time = Some(time);
        self
    }

    /// The draft's title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// The draft's description (empty by default).
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The draft's wall-clock time, if any.
    #[must_use]
    pub const fn time(&self) -> Option<NaiveTime> {
        self.time
    }
}

/// A single to-do item within one day bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique id, confirmed or provisional.
    pub id: TaskId,
    /// User-supplied title, never empty.
    pub title: String,
    /// Free-form description, empty by default.
    pub description: String,
    /// Optional wall-clock time, serialized as `"HH:MM"`.
    #[serde(with = "hhmm", default, skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    /// Completion flag.
    pub completed: bool,
    /// Owning user; absent for locally-only tasks.
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user: Option<UserId>,
    /// When the task was created.
    pub created_at: DateTime<Utc>,
    /// When the task was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Builds a task from a validated draft.
    #[must_use]
    pub fn from_draft(id: TaskId, draft: TaskDraft, user: Option<UserId>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: draft.title,
            description: draft.description,
            time: draft.time,
            completed: false,
            user,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merges a partial update in place and stamps `updated_at`.
    pub fn apply_patch(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title.clone_from(title);
        }
        if let Some(description) = &patch.description {
            self.description.clone_from(description);
        }
        if let Some(time) = patch.time {
            self.time = Some(time);
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        self.updated_at = Utc::now();
    }
}

/// A partial update to a task's mutable fields.
///
/// The grouping day is deliberately absent: tasks cannot move between
/// day buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// Replacement title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Replacement description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Replacement wall-clock time.
    #[serde(with = "hhmm", default, skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    /// Replacement completion flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    /// True when the patch would not change any field.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.time.is_none()
            && self.completed.is_none()
    }
}

/// The full in-memory collection: day bucket -> tasks in insertion order.
pub type TaskBook = HashMap<DayKey, Vec<Task>>;

/// Serde adapter for `Option<NaiveTime>` as an `"HH:MM"` string.
mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const TIME_FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(
        time: &Option<NaiveTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match time {
            Some(t) => serializer.serialize_some(&t.format(TIME_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveTime>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw {
            Some(s) => NaiveTime::parse_from_str(&s, TIME_FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}
