//! Startup and pre-execute hook registry.
//!
//! Hooks are registered under an id; registering the same id again replaces
//! the earlier hook. Hooks run in registration order.
//!
//! ```
//! use std::sync::Arc;
//! use djutils_tasks::{Task, TaskError, TaskHooks};
//!
//! let hooks = TaskHooks::new();
//! hooks.pre_execute("no_reports", Arc::new(|task: &Task| {
//!     if task.module == "reports" {
//!         return Err(TaskError::CancelExecution("reports are paused".into()));
//!     }
//!     Ok(())
//! }));
//!
//! assert!(hooks.run_pre_execute(&Task::new("billing", "charge")).is_ok());
//! assert!(hooks.run_pre_execute(&Task::new("reports", "daily")).is_err());
//! ```

use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;

use djutils_core::logging::{setup_logging, TASKS_TARGET};
use djutils_core::Settings;

use crate::task::{Task, TaskError};

/// A hook run once when the consumer starts.
pub type StartupHook = Arc<dyn Fn() -> Result<(), TaskError> + Send + Sync>;

/// A hook run before every task. Returning
/// [`TaskError::CancelExecution`] stops the task.
pub type PreExecuteHook = Arc<dyn Fn(&Task) -> Result<(), TaskError> + Send + Sync>;

type Registry<H> = RwLock<Vec<(String, H)>>;

fn register<H>(registry: &Registry<H>, id: String, hook: H) {
    let mut hooks = registry.write().unwrap_or_else(PoisonError::into_inner);
    if let Some(entry) = hooks.iter_mut().find(|(hid, _)| *hid == id) {
        entry.1 = hook;
    } else {
        hooks.push((id, hook));
    }
}

fn unregister<H>(registry: &Registry<H>, id: &str) -> bool {
    let mut hooks = registry.write().unwrap_or_else(PoisonError::into_inner);
    let before = hooks.len();
    hooks.retain(|(hid, _)| hid != id);
    hooks.len() < before
}

fn snapshot<H: Clone>(registry: &Registry<H>) -> Vec<(String, H)> {
    registry
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Registered startup and pre-execute hooks.
#[derive(Default)]
pub struct TaskHooks {
    startup: Registry<StartupHook>,
    pre_execute: Registry<PreExecuteHook>,
}

impl std::fmt::Debug for TaskHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskHooks")
            .field("startup", &self.startup_count())
            .field("pre_execute", &self.pre_execute_count())
            .finish()
    }
}

impl TaskHooks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a startup hook.
    pub fn on_startup(&self, id: impl Into<String>, hook: StartupHook) {
        register(&self.startup, id.into(), hook);
    }

    /// Registers a pre-execute hook.
    pub fn pre_execute(&self, id: impl Into<String>, hook: PreExecuteHook) {
        register(&self.pre_execute, id.into(), hook);
    }

    /// Removes the hook registered under `id` from both lists.
    ///
    /// Returns `true` if anything was removed.
    pub fn remove(&self, id: &str) -> bool {
        let startup = unregister(&self.startup, id);
        let pre_execute = unregister(&self.pre_execute, id);
        startup || pre_execute
    }

    /// Returns the number of startup hooks.
    pub fn startup_count(&self) -> usize {
        self.startup
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns the number of pre-execute hooks.
    pub fn pre_execute_count(&self) -> usize {
        self.pre_execute
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Runs every startup hook.
    ///
    /// A failing hook is logged and does not stop the others. Returns the
    /// failures.
    pub fn run_startup(&self) -> Vec<TaskError> {
        let mut failures = Vec::new();
        for (id, hook) in snapshot(&self.startup) {
            if let Err(err) = hook() {
                tracing::error!(target: TASKS_TARGET, hook = %id, error = %err, "startup hook failed");
                failures.push(err);
            }
        }
        failures
    }

    /// Runs the pre-execute hooks for `task`.
    ///
    /// Stops at the first [`TaskError::CancelExecution`] and returns it. Any
    /// other hook error is logged and the remaining hooks still run.
    pub fn run_pre_execute(&self, task: &Task) -> Result<(), TaskError> {
        for (id, hook) in snapshot(&self.pre_execute) {
            match hook(task) {
                Ok(()) => {}
                Err(err @ TaskError::CancelExecution(_)) => return Err(err),
                Err(err) => {
                    tracing::error!(
                        target: TASKS_TARGET,
                        hook = %id,
                        task = %task.qualified_name(),
                        error = %err,
                        "pre-execute hook failed"
                    );
                }
            }
        }
        Ok(())
    }
}

static GLOBAL_HOOKS: Lazy<TaskHooks> = Lazy::new(TaskHooks::new);

/// Returns the process-wide hook registry.
pub fn global_hooks() -> &'static TaskHooks {
    &GLOBAL_HOOKS
}

/// Builds the startup hook that installs logging for the task consumer.
///
/// The hook installs the subscriber configured by `settings` (a no-op if one
/// is already installed) and announces the task log target, so operators can
/// route `djutils_tasks` events to their own sink through `log_level`.
pub fn install_task_logging(settings: Settings) -> StartupHook {
    Arc::new(move || {
        setup_logging(&settings);
        tracing::info!(target: TASKS_TARGET, target_name = TASKS_TARGET, "task logging installed");
        Ok(())
    })
}
