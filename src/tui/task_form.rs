//! Add-task form for the terminal user interface.
//!
//! The form owns the text being typed, the selected priority and the last
//! validation error. Any edit clears the error, matching the inline message
//! behaviour of the list view.

use crate::{
    fields::Priority,
    list::Command,
    tui::input::InputField,
    validation::{ValidationError, MAX_TEXT_LEN},
};

pub struct TaskForm {
    pub text: InputField,
    pub priority: Priority,
    pub error: Option<ValidationError>,
}

impl TaskForm {
    pub fn new(priority: Priority) -> Self {
        Self {
            text: InputField::with_limit(MAX_TEXT_LEN),
            priority,
            error: None,
        }
    }

    pub fn handle_char(&mut self, c: char) {
        self.text.handle_char(c);
        self.error = None;
    }

    pub fn handle_backspace(&mut self) {
        self.text.handle_backspace();
        self.error = None;
    }

    pub fn handle_delete(&mut self) {
        self.text.handle_delete();
        self.error = None;
    }

    pub fn cycle_priority(&mut self, forward: bool) {
        self.priority = if forward {
            self.priority.next()
        } else {
            self.priority.prev()
        };
    }

    /// Counter shown under the input, e.g. `12/100 characters`.
    pub fn counter(&self) -> String {
        format!("{}/{} characters", self.text.char_count(), MAX_TEXT_LEN)
    }

    /// Command to dispatch when the form is submitted.
    pub fn command(&self) -> Command {
        Command::Add {
            text: self.text.value.clone(),
            priority: self.priority,
        }
    }

    /// Empty the text after a successful add; the chosen priority is kept.
    pub fn reset(&mut self) {
        self.text.clear();
        self.error = None;
    }
}
