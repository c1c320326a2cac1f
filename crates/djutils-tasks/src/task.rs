//! Task descriptors and task errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// A unit of background work, identified by the module defining it and its name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique id of this invocation.
    pub id: Uuid,
    /// Module path that defines the task (e.g. `"billing.tasks"`).
    pub module: String,
    /// Task name within the module.
    pub name: String,
    /// Arguments passed to the task body.
    #[serde(default)]
    pub args: serde_json::Value,
}

impl Task {
    /// Creates an invocation with no arguments.
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            module: module.into(),
            name: name.into(),
            args: serde_json::Value::Null,
        }
    }

    /// Sets the arguments.
    #[must_use]
    pub fn with_args(mut self, args: serde_json::Value) -> Self {
        self.args = args;
        self
    }

    /// Returns `"<module>.<name>"`, the name allow-lists refer to.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.module, self.name)
    }
}

/// Errors raised by hooks and task bodies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// Raised by a pre-execute hook to stop the task before its body runs.
    #[error("Task execution cancelled: {0}")]
    CancelExecution(String),

    /// The task body returned an error.
    #[error("Task failed: {0}")]
    Failed(String),

    /// A hook failed for a reason other than cancellation.
    #[error("Hook '{id}' failed: {message}")]
    Hook {
        /// Registration id of the hook.
        id: String,
        /// What went wrong.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_name() {
        let task = Task::new("billing.tasks", "send_invoices");
        assert_eq!(task.qualified_name(), "billing.tasks.send_invoices");
        assert!(task.args.is_null());
    }

    #[test]
    fn test_invocations_get_distinct_ids() {
        assert_ne!(Task::new("a", "b").id, Task::new("a", "b").id);
    }

    #[test]
    fn test_deserialize_without_args() {
        let id = Uuid::new_v4();
        let json = serde_json::json!({"id": id, "module": "m", "name": "n"});
        let task: Task = serde_json::from_value(json).unwrap();
        assert_eq!(task.id, id);
        assert!(task.args.is_null());
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            TaskError::CancelExecution("not allowed".into()).to_string(),
            "Task execution cancelled: not allowed"
        );
        assert_eq!(
            TaskError::Hook { id: "h".into(), message: "boom".into() }.to_string(),
            "Hook 'h' failed: boom"
        );
    }
}
