//! Logging integration for djutils.
//!
//! Library code only emits [`tracing`] events. Binaries call
//! [`setup_logging`] once to install a subscriber configured from
//! [`Settings`](crate::settings::Settings).

use crate::settings::Settings;

/// Tracing target used by the background-task crate.
pub const TASKS_TARGET: &str = "djutils_tasks";

/// Sets up the global tracing subscriber based on the given settings.
///
/// The filter is read from `settings.log_level` (falls back to "info" when it
/// does not parse). Debug mode uses the pretty formatter, otherwise JSON.
/// Installing twice is a no-op.
pub fn setup_logging(settings: &Settings) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_new(&settings.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    if settings.debug {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .pretty()
            .try_init()
            .ok();
    } else {
        fmt::Subscriber::builder()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .try_init()
            .ok();
    }
}

/// Creates a tracing span for one background task execution.
pub fn task_span(task_name: &str) -> tracing::Span {
    tracing::info_span!(target: TASKS_TARGET, "task", name = task_name)
}
