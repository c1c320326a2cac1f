//! # djutils-tasks
//!
//! Hooks around background task execution.
//!
//! A [`Consumer`] runs task bodies behind a [`TaskHooks`] registry: startup
//! hooks run once, pre-execute hooks run before every task and may cancel
//! it. [`AllowedTasksGate`] is the pre-execute hook that refuses any task
//! not named in `Settings::allowed_tasks`.

pub mod consumer;
pub mod gate;
pub mod hooks;
pub mod task;

pub use consumer::{Consumer, TaskOutcome};
pub use gate::AllowedTasksGate;
pub use hooks::{global_hooks, install_task_logging, PreExecuteHook, StartupHook, TaskHooks};
pub use task::{Task, TaskError};
