//! Calendar day keys and per-day calendar markers.
//!
//! Every task lives in exactly one day bucket; [`DayKey`] is the bucket key
//! in its ISO `yyyy-MM-dd` form, usable both as a map key and as the string
//! that appears in the persisted JSON blob.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used everywhere a day crosses a serialization boundary.
const DAY_FORMAT: &str = "%Y-%m-%d";

/// A string that failed to parse as an ISO `yyyy-MM-dd` day.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid day key: {0:?} (expected yyyy-MM-dd)")]
pub struct InvalidDayKey(pub String);

/// A calendar date in ISO `yyyy-MM-dd` form.
///
/// Serializes to the ISO string (also when used as a JSON map key) so the
/// persisted collection blob keeps the shape `{"2024-03-01": [...]}`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct DayKey(NaiveDate);

impl DayKey {
    /// Wraps an already-parsed calendar date.
    #[must_use]
    pub const fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Today's date in the local timezone.
    #[must_use]
    pub fn today() -> Self {
        Self(chrono::Local::now().date_naive())
    }

    /// Parses an ISO `yyyy-MM-dd` string.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidDayKey`] if the string is not a valid calendar date
    /// in that format.
    pub fn parse(s: &str) -> Result<Self, InvalidDayKey> {
        NaiveDate::parse_from_str(s, DAY_FORMAT)
            .map(Self)
            .map_err(|_| InvalidDayKey(s.to_string()))
    }

    /// Returns the underlying calendar date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DAY_FORMAT))
    }
}

impl FromStr for DayKey {
    type Err = InvalidDayKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<DayKey> for String {
    fn from(day: DayKey) -> Self {
        day.to_string()
    }
}

impl TryFrom<String> for DayKey {
    type Error = InvalidDayKey;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

/// Lightweight calendar projection for a single populated day.
///
/// Derived on demand from the task collection; carries just enough for a
/// calendar widget to mark the day and show progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayMarker {
    /// Number of tasks in the day's bucket.
    pub task_count: usize,
    /// How many of them are completed.
    pub completed_count: usize,
}
