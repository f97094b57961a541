//! Task data structure and related functionality.
//!
//! This module defines the core `Task` struct that represents a single to-do
//! entry, together with the persisted timestamp format.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::fields::Priority;

/// A single to-do entry.
///
/// Tasks are only created through `TaskList::add`, which validates the text
/// first. `id` and `created_at` never change after creation; `completed` is
/// only ever flipped by producing a new copy via [`Task::toggled`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub text: String,
    pub completed: bool,
    #[serde(with = "iso8601")]
    pub created_at: DateTime<Utc>,
    pub priority: Priority,
}

impl Task {
    /// Create an open task with a fresh id, stamped with the current time.
    ///
    /// The caller is responsible for passing already-validated text.
    pub(crate) fn new(text: String, priority: Priority) -> Self {
        Task {
            id: Uuid::now_v7().to_string(),
            text,
            completed: false,
            // Stored form only carries milliseconds.
            created_at: Utc::now().trunc_subsecs(3),
            priority,
        }
    }

    /// Copy of this task with `completed` flipped.
    pub fn toggled(&self) -> Self {
        Task {
            completed: !self.completed,
            ..self.clone()
        }
    }

    /// First eight characters of the id, enough to address a task from the CLI.
    pub fn short_id(&self) -> &str {
        let end = self
            .id
            .char_indices()
            .nth(8)
            .map_or(self.id.len(), |(i, _)| i);
        &self.id[..end]
    }
}

/// ISO-8601 timestamps with millisecond precision and a `Z` suffix.
mod iso8601 {
    use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|dt| dt.with_timezone(&Utc).trunc_subsecs(3))
            .map_err(serde::de::Error::custom)
    }
}
