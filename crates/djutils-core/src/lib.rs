//! # djutils-core
//!
//! Core types shared by every djutils crate: settings, error types,
//! logging setup, and timestamp signing.
//!
//! ## Modules
//!
//! - [`error`] - Error types and result aliases
//! - [`settings`] - Settings values and their defaults
//! - [`settings_loader`] - Loading settings from TOML, JSON and the environment
//! - [`logging`] - Tracing-based logging integration
//! - [`signing`] - HMAC-SHA256 signers with optional expiry

pub mod error;
pub mod logging;
pub mod settings;
pub mod settings_loader;
pub mod signing;

// Re-export the most commonly used types at the crate root.
pub use error::{SigningError, UtilsError, UtilsResult, ValidationError};
pub use settings::Settings;
