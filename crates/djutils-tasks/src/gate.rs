//! Allow-list gating of task execution.

use std::collections::HashSet;
use std::sync::Arc;

use djutils_core::Settings;

use crate::hooks::{PreExecuteHook, TaskHooks};
use crate::task::{Task, TaskError};

/// Id under which [`AllowedTasksGate::install`] registers its hook.
pub const GATE_HOOK_ID: &str = "allowed_tasks_gate";

/// Cancels every task whose qualified name is not allow-listed.
///
/// An empty allow-list cancels everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowedTasksGate {
    allowed: HashSet<String>,
}

impl AllowedTasksGate {
    /// Creates a gate allowing the given qualified names.
    pub fn new<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates a gate from `settings.allowed_tasks`.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.allowed_tasks.iter().cloned())
    }

    /// Returns `true` if `qualified_name` may run.
    pub fn is_allowed(&self, qualified_name: &str) -> bool {
        self.allowed.contains(qualified_name)
    }

    /// Checks `task` against the allow-list.
    pub fn check(&self, task: &Task) -> Result<(), TaskError> {
        let name = task.qualified_name();
        if self.is_allowed(&name) {
            Ok(())
        } else {
            Err(TaskError::CancelExecution(format!(
                "{name} is not in the allowed tasks registry"
            )))
        }
    }

    /// Converts the gate into a pre-execute hook.
    pub fn into_hook(self) -> PreExecuteHook {
        Arc::new(move |task: &Task| self.check(task))
    }

    /// Registers the gate on `hooks` under [`GATE_HOOK_ID`].
    pub fn install(self, hooks: &TaskHooks) {
        hooks.pre_execute(GATE_HOOK_ID, self.into_hook());
    }
}
