//! Running tasks behind the hook registry.

use std::fmt::Display;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::Instrument;

use djutils_core::logging::{task_span, TASKS_TARGET};

use crate::hooks::TaskHooks;
use crate::task::{Task, TaskError};

/// How a task invocation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome<T> {
    /// The body ran and returned a value.
    Completed(T),
    /// A pre-execute hook cancelled the task; the body never ran.
    Cancelled(String),
}

impl<T> TaskOutcome<T> {
    /// Returns `true` if the task was cancelled.
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled(_))
    }
}

/// Executes task bodies after the registered hooks.
#[derive(Debug)]
pub struct Consumer {
    hooks: Arc<TaskHooks>,
    started: AtomicBool,
}

impl Consumer {
    /// Creates a consumer over `hooks`.
    pub const fn new(hooks: Arc<TaskHooks>) -> Self {
        Self {
            hooks,
            started: AtomicBool::new(false),
        }
    }

    /// Returns the hook registry.
    pub fn hooks(&self) -> &TaskHooks {
        &self.hooks
    }

    /// Runs the startup hooks. Only the first call does anything.
    pub fn start(&self) -> Vec<TaskError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Vec::new();
        }
        self.hooks.run_startup()
    }

    /// Runs `body` for `task` unless a pre-execute hook cancels it.
    ///
    /// A body error is logged under the `djutils_tasks` target and returned
    /// as [`TaskError::Failed`].
    pub async fn execute<F, Fut, T, E>(&self, task: &Task, body: F) -> Result<TaskOutcome<T>, TaskError>
    where
        F: FnOnce(Task) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let name = task.qualified_name();
        let span = task_span(&name);

        if let Err(err) = span.in_scope(|| self.hooks.run_pre_execute(task)) {
            let TaskError::CancelExecution(reason) = err else {
                return Err(err);
            };
            tracing::info!(target: TASKS_TARGET, parent: &span, task = %name, id = %task.id, reason = %reason, "task cancelled");
            return Ok(TaskOutcome::Cancelled(reason));
        }

        tracing::debug!(target: TASKS_TARGET, parent: &span, task = %name, id = %task.id, "executing task");
        match body(task.clone()).instrument(span.clone()).await {
            Ok(value) => Ok(TaskOutcome::Completed(value)),
            Err(err) => {
                tracing::error!(target: TASKS_TARGET, parent: &span, task = %name, id = %task.id, error = %err, "task failed");
                Err(TaskError::Failed(err.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::AllowedTasksGate;
    use std::sync::atomic::AtomicUsize;

    fn consumer_allowing(names: &[&str]) -> Consumer {
        let hooks = Arc::new(TaskHooks::new());
        AllowedTasksGate::new(names.iter().copied()).install(&hooks);
        Consumer::new(hooks)
    }

    #[tokio::test]
    async fn test_allowed_task_runs() {
        let consumer = consumer_allowing(&["math.add"]);
        let task = Task::new("math", "add").with_args(serde_json::json!([2, 3]));
        let outcome = consumer
            .execute(&task, |task| async move {
                let args: Vec<i64> = serde_json::from_value(task.args).map_err(|e| e.to_string())?;
                Ok::<_, String>(args.iter().sum::<i64>())
            })
            .await
            .unwrap();
        assert_eq!(outcome, TaskOutcome::Completed(5));
    }

    #[tokio::test]
    async fn test_disallowed_task_body_never_runs() {
        let consumer = consumer_allowing(&["math.add"]);
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let outcome = consumer
            .execute(&Task::new("math", "sub"), |_| async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(())
            })
            .await
            .unwrap();
        assert!(outcome.is_cancelled());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_body_error_becomes_failed() {
        let consumer = consumer_allowing(&["utils.tasks.exception_handling"]);
        let err = consumer
            .execute(&Task::new("utils.tasks", "exception_handling"), |_| async {
                Err::<(), _>("boom")
            })
            .await
            .unwrap_err();
        assert_eq!(err, TaskError::Failed("boom".into()));
    }

    #[test]
    fn test_start_runs_startup_hooks_once() {
        let hooks = Arc::new(TaskHooks::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        hooks.on_startup(
            "count",
            Arc::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );
        let consumer = Consumer::new(hooks);
        assert!(consumer.start().is_empty());
        assert!(consumer.start().is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
