//! Derivation of the display list from the task collection.
//!
//! Display order is never taken from storage order: it is recomputed here from
//! the current filter and sort selection every time the list is shown.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::fields::{Filter, SortMode};
use crate::task::Task;

/// Filter then sort `tasks` into display order. Ties keep insertion order.
pub fn project<'a>(tasks: &'a [Task], filter: Filter, sort: SortMode) -> Vec<&'a Task> {
    let mut shown: Vec<&Task> = tasks.iter().filter(|t| filter.matches(t.completed)).collect();
    // `sort_by` is stable.
    shown.sort_by(|a, b| compare(a, b, sort));
    shown
}

fn compare(a: &Task, b: &Task, sort: SortMode) -> Ordering {
    match sort {
        SortMode::Date => newest_first(a, b),
        SortMode::Alphabetical => a.text.to_lowercase().cmp(&b.text.to_lowercase()),
        SortMode::Priority => b
            .priority
            .rank()
            .cmp(&a.priority.rank())
            .then_with(|| newest_first(a, b)),
    }
}

fn newest_first(a: &Task, b: &Task) -> Ordering {
    b.created_at.cmp(&a.created_at)
}

/// Completion counts for the whole collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub active: usize,
    pub completed: usize,
}

impl Stats {
    pub fn of(tasks: &[Task]) -> Self {
        let completed = tasks.iter().filter(|t| t.completed).count();
        Stats {
            total: tasks.len(),
            active: tasks.len() - completed,
            completed,
        }
    }

    /// Share of completed tasks, 0..=100. An empty list counts as 0%.
    pub fn completion_percent(&self) -> u16 {
        if self.total == 0 {
            return 0;
        }
        ((self.completed * 100) / self.total) as u16
    }

    pub fn summary(&self) -> String {
        format!(
            "{} total • {} active • {} completed",
            self.total, self.active, self.completed
        )
    }
}

/// What to show when the display list is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    NoTasks,
    AllDone,
    NoneCompleted,
    NoMatches,
}

impl EmptyState {
    /// `None` when there is something to display.
    pub fn for_view(total: usize, shown: usize, filter: Filter) -> Option<Self> {
        if total == 0 {
            return Some(EmptyState::NoTasks);
        }
        if shown > 0 {
            return None;
        }
        Some(match filter {
            Filter::Active => EmptyState::AllDone,
            Filter::Completed => EmptyState::NoneCompleted,
            Filter::All => EmptyState::NoMatches,
        })
    }

    pub fn title(self) -> &'static str {
        match self {
            EmptyState::NoTasks => "No tasks yet",
            EmptyState::AllDone => "All tasks completed!",
            EmptyState::NoneCompleted => "No completed tasks",
            EmptyState::NoMatches => "No tasks found",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            EmptyState::NoTasks => "Add your first task to get started!",
            EmptyState::AllDone => "Great job! You've completed all your tasks.",
            EmptyState::NoneCompleted => "Complete some tasks to see them here.",
            EmptyState::NoMatches => "Try adjusting your filters.",
        }
    }
}

/// Format a creation time relative to `now` ("just now", "5m ago", "3d ago").
pub fn format_age(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now - created_at;
    if delta.num_minutes() < 1 {
        "just now".into()
    } else if delta.num_hours() < 1 {
        format!("{}m ago", delta.num_minutes())
    } else if delta.num_days() < 1 {
        format!("{}h ago", delta.num_hours())
    } else {
        format!("{}d ago", delta.num_days())
    }
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}
