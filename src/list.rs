//! The task list state container and its mutation operations.
//!
//! `TaskList` is an immutable value: every operation returns a new list and
//! leaves the receiver untouched, so callers can compare states before and
//! after a change and persist the result explicitly.

use thiserror::Error;

use crate::fields::Priority;
use crate::task::Task;
use crate::validation::{validate, ValidationError};

/// Ordered collection of tasks, newest first at insertion time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskList {
    tasks: Vec<Task>,
}

/// A user action against the task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Add { text: String, priority: Priority },
    Toggle(String),
    Remove(String),
    ClearCompleted,
}

/// Failure to resolve a CLI id prefix to a single task.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("no task with id starting with '{0}'")]
    NotFound(String),
    #[error("'{prefix}' matches {count} tasks; use a longer id")]
    Ambiguous { prefix: String, count: usize },
}

impl TaskList {
    pub fn new(tasks: Vec<Task>) -> Self {
        TaskList { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Get a task by ID.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.completed).count()
    }

    /// Whether clear-completed has anything to do.
    pub fn has_completed(&self) -> bool {
        self.tasks.iter().any(|t| t.completed)
    }

    /// Validate `text` and prepend a new task. On error the list is left as is.
    pub fn add(&self, text: &str, priority: Priority) -> Result<TaskList, ValidationError> {
        let text = validate(text)?;
        let mut tasks = Vec::with_capacity(self.tasks.len() + 1);
        tasks.push(Task::new(text, priority));
        tasks.extend(self.tasks.iter().cloned());
        Ok(TaskList { tasks })
    }

    /// Flip `completed` on the task with this id. Unknown ids leave the list unchanged.
    pub fn toggle(&self, id: &str) -> TaskList {
        let tasks = self
            .tasks
            .iter()
            .map(|t| if t.id == id { t.toggled() } else { t.clone() })
            .collect();
        TaskList { tasks }
    }

    /// Remove the task with this id. Unknown ids leave the list unchanged.
    pub fn remove(&self, id: &str) -> TaskList {
        self.retain(|t| t.id != id)
    }

    /// Remove every completed task.
    pub fn clear_completed(&self) -> TaskList {
        self.retain(|t| !t.completed)
    }

    /// Dispatch a command against this list.
    pub fn apply(&self, command: &Command) -> Result<TaskList, ValidationError> {
        match command {
            Command::Add { text, priority } => self.add(text, *priority),
            Command::Toggle(id) => Ok(self.toggle(id)),
            Command::Remove(id) => Ok(self.remove(id)),
            Command::ClearCompleted => Ok(self.clear_completed()),
        }
    }

    /// Resolve a full id or unique id prefix to a task id.
    pub fn resolve_id(&self, prefix: &str) -> Result<String, LookupError> {
        let prefix = prefix.trim();
        if let Some(task) = self.get(prefix) {
            return Ok(task.id.clone());
        }
        let matches: Vec<&Task> = if prefix.is_empty() {
            Vec::new()
        } else {
            self.tasks.iter().filter(|t| t.id.starts_with(prefix)).collect()
        };
        match matches.as_slice() {
            [] => Err(LookupError::NotFound(prefix.to_string())),
            [only] => Ok(only.id.clone()),
            _ => Err(LookupError::Ambiguous {
                prefix: prefix.to_string(),
                count: matches.len(),
            }),
        }
    }

    fn retain(&self, keep: impl Fn(&Task) -> bool) -> TaskList {
        TaskList {
            tasks: self.tasks.iter().filter(|t| keep(t)).cloned().collect(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;

    /// Build a task with a deterministic id and timestamp (minutes after a fixed epoch).
    pub(crate) fn task(id: &str, text: &str, completed: bool, minute: i64, priority: Priority) -> Task {
        Task {
            id: id.to_string(),
            text: text.to_string(),
            completed,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute),
            priority,
        }
    }

    fn sample() -> TaskList {
        TaskList::new(vec![
            task("c3", "Third", true, 3, Priority::Low),
            task("b2", "Second", false, 2, Priority::High),
            task("a1", "First", true, 1, Priority::Medium),
        ])
    }

    #[test]
    fn test_add_prepends_one_task() {
        let list = sample();
        let next = list.add("  Call the plumber ", Priority::High).unwrap();
        assert_eq!(next.len(), list.len() + 1);
        let first = &next.tasks()[0];
        assert_eq!(first.text, "Call the plumber");
        assert_eq!(first.priority, Priority::High);
        assert!(!first.completed);
        assert_eq!(&next.tasks()[1..], list.tasks());
    }

    #[test]
    fn test_add_too_short_leaves_list_unchanged() {
        let list = sample();
        assert_eq!(list.add("ok", Priority::Low), Err(ValidationError::TooShort));
        assert_eq!(list, sample());
    }

    #[test]
    fn test_toggle_is_own_inverse() {
        let list = sample();
        let once = list.toggle("b2");
        assert!(once.get("b2").unwrap().completed);
        assert_eq!(once.toggle("b2"), list);
    }

    #[test]
    fn test_toggle_unknown_id_is_identity() {
        assert_eq!(sample().toggle("zz"), sample());
    }

    #[test]
    fn test_remove_twice_is_noop() {
        let once = sample().remove("b2");
        assert_eq!(once.len(), 2);
        assert!(once.get("b2").is_none());
        assert_eq!(once.remove("b2"), once);
    }

    #[test]
    fn test_clear_completed_keeps_open_tasks() {
        let cleared = sample().clear_completed();
        assert_eq!(cleared.len(), 1);
        assert_eq!(cleared.tasks()[0].id, "b2");
        assert!(!cleared.has_completed());
    }

    #[test]
    fn test_apply_dispatches_commands() {
        let list = sample();
        assert_eq!(list.apply(&Command::Toggle("a1".into())).unwrap(), list.toggle("a1"));
        assert_eq!(list.apply(&Command::Remove("a1".into())).unwrap(), list.remove("a1"));
        assert_eq!(list.apply(&Command::ClearCompleted).unwrap(), list.clear_completed());
        let added = list
            .apply(&Command::Add { text: "Plan the trip".into(), priority: Priority::Low })
            .unwrap();
        assert_eq!(added.tasks()[0].text, "Plan the trip");
        assert_eq!(
            list.apply(&Command::Add { text: " ".into(), priority: Priority::Low }),
            Err(ValidationError::EmptyTask)
        );
    }

    #[test]
    fn test_counts() {
        let list = sample();
        assert_eq!(list.completed_count(), 2);
        assert!(list.has_completed());
        assert!(!TaskList::default().has_completed());
    }

    #[test]
    fn test_resolve_id() {
        let list = TaskList::new(vec![
            task("abc111", "One", false, 1, Priority::Low),
            task("abc222", "Two", false, 2, Priority::Low),
        ]);
        assert_eq!(list.resolve_id("abc1"), Ok("abc111".to_string()));
        assert_eq!(list.resolve_id("abc222"), Ok("abc222".to_string()));
        assert_eq!(
            list.resolve_id("abc"),
            Err(LookupError::Ambiguous { prefix: "abc".into(), count: 2 })
        );
        assert_eq!(list.resolve_id("zzz"), Err(LookupError::NotFound("zzz".into())));
        assert_eq!(list.resolve_id(""), Err(LookupError::NotFound(String::new())));
    }

    fn arb_list() -> impl Strategy<Value = TaskList> {
        prop::collection::vec((any::<bool>(), 0i64..10_000, 0usize..3), 0..20).prop_map(|rows| {
            TaskList::new(
                rows.into_iter()
                    .enumerate()
                    .map(|(i, (done, minute, p))| {
                        task(&format!("id{i}"), &format!("task {i}"), done, minute, Priority::ALL[p])
                    })
                    .collect(),
            )
        })
    }

    proptest! {
        #[test]
        fn prop_toggle_twice_is_identity(list in arb_list(), pick in any::<prop::sample::Index>()) {
            prop_assume!(!list.is_empty());
            let id = list.tasks()[pick.index(list.len())].id.clone();
            prop_assert_eq!(list.toggle(&id).toggle(&id), list);
        }

        #[test]
        fn prop_valid_add_grows_by_one(list in arb_list(), text in "[a-zA-Z][a-zA-Z ]{1,97}[a-zA-Z]") {
            let next = list.add(&text, Priority::Medium).unwrap();
            prop_assert_eq!(next.len(), list.len() + 1);
            prop_assert_eq!(&next.tasks()[0].text, &text);
        }

        #[test]
        fn prop_clear_completed_leaves_only_open(list in arb_list()) {
            let cleared = list.clear_completed();
            prop_assert!(cleared.tasks().iter().all(|t| !t.completed));
            prop_assert_eq!(cleared.len(), list.len() - list.completed_count());
        }
    }
}
