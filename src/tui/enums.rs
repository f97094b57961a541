//! Enumerations for TUI state management.

/// Which screen or overlay currently receives input.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppState {
    TaskList,
    AddTask,
    Help,
    Confirm,
}

/// Destructive action waiting for a yes/no answer.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ConfirmAction {
    Delete { id: String, text: String },
    ClearCompleted { count: usize },
}

impl ConfirmAction {
    pub fn describe(&self) -> String {
        match self {
            ConfirmAction::Delete { text, .. } => format!("Delete \"{text}\""),
            ConfirmAction::ClearCompleted { count } => format!("Clear {count} completed task(s)"),
        }
    }
}
