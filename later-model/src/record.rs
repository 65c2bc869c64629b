//! Loose task records and the load-boundary validation step.
//!
//! Records arriving from the remote store or the persisted cache are
//! duck-typed: any field may be missing or malformed. [`RawTaskRecord`] is
//! the schema-less shape, and [`RawTaskRecord::validate`] is the single
//! place where records are repaired or rejected before they enter the
//! in-memory collection.

use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::day::DayKey;
use crate::task::{Task, TaskId, UserId};

/// Wall-clock time format accepted on loose records.
const TIME_FORMAT: &str = "%H:%M";

/// A task record as it appears on the wire or in the cache blob, before
/// validation. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawTaskRecord {
    /// Document id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Task title.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Task description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Grouping day as `yyyy-MM-dd`; snapshot records carry it, cache
    /// records rely on their bucket key instead.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Wall-clock time as `HH:MM`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// Completion flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    /// Owning user id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    /// Creation timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last-update timestamp.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RawTaskRecord {
    /// Builds the loose form of a task for transport or storage.
    #[must_use]
    pub fn from_task(day: DayKey, task: &Task) -> Self {
        Self {
            id: Some(task.id.as_str().to_string()),
            title: Some(task.title.clone()),
            description: Some(task.description.clone()),
            date: Some(day.to_string()),
            time: task.time.map(|t| t.format(TIME_FORMAT).to_string()),
            completed: Some(task.completed),
            user_id: task.user.as_ref().map(|u| u.as_str().to_string()),
            created_at: Some(task.created_at),
            updated_at: Some(task.updated_at),
        }
    }

    /// Validates and repairs this record into a typed task plus its day.
    ///
    /// Rejection (returns `None`): missing id, missing or blank title.
    /// Repair: missing/malformed `date` falls back to `fallback_day`,
    /// malformed `time` becomes none, missing `completed` becomes false,
    /// missing timestamps become "now".
    #[must_use]
    pub fn validate(self, fallback_day: DayKey) -> Option<(DayKey, Task)> {
        let id = self.id?;
        let title = self.title.filter(|t| !t.trim().is_empty())?;

        let day = self
            .date
            .as_deref()
            .and_then(|d| DayKey::parse(d).ok())
            .unwrap_or(fallback_day);
        let time = self
            .time
            .as_deref()
            .and_then(|t| NaiveTime::parse_from_str(t, TIME_FORMAT).ok());
        let created_at = self.created_at.unwrap_or_else(Utc::now);

        Some((
            day,
            Task {
                id: TaskId::confirmed(id),
                title,
                description: self.description.unwrap_or_default(),
                time,
                completed: self.completed.unwrap_or(false),
                user: self.user_id.map(UserId::new),
                created_at,
                updated_at: self.updated_at.unwrap_or(created_at),
            },
        ))
    }
}
