//! # djutils
//!
//! Framework-adjacent utilities for web services.
//!
//! This is the meta-crate that re-exports the sub-crates. Depend on
//! `djutils` for everything, or on individual crates for finer-grained
//! control.

/// Settings, error types, logging, and timestamp signing.
pub use djutils_core as core;

/// HTTP request and response types.
#[cfg(feature = "http")]
pub use djutils_http as http;

/// Model base, field pre-save hooks, and CSV/Zip export.
#[cfg(feature = "db")]
pub use djutils_db as db;

/// Password hashing, hashed fields, and stateless token authentication.
#[cfg(feature = "auth")]
pub use djutils_auth as auth;

/// Task hooks and allow-list gating.
#[cfg(feature = "tasks")]
pub use djutils_tasks as tasks;

/// Email message rendering.
#[cfg(feature = "mail")]
pub use djutils_mail as mail;

// Third-party re-exports
pub use async_trait::async_trait;
pub use axum;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tracing;

/// The names most applications need.
pub mod prelude {
    pub use djutils_core::signing::{Signer, TimestampSigner};
    pub use djutils_core::{Settings, UtilsError, UtilsResult, ValidationError};

    #[cfg(feature = "http")]
    pub use djutils_http::{HttpRequest, HttpResponse, JsonResponse};

    #[cfg(feature = "db")]
    pub use djutils_db::{BaseModel, CsvExport, Field, Model, Value, ZipExport, ZipOptions};

    #[cfg(feature = "auth")]
    pub use djutils_auth::{
        AuthError, HashedCharField, ObtainStatelessAuthToken, PrincipalResolver,
        StatelessTokenAuthentication, TokenAuthConfig, User,
    };

    #[cfg(feature = "tasks")]
    pub use djutils_tasks::{AllowedTasksGate, Consumer, Task, TaskError, TaskHooks};

    #[cfg(feature = "mail")]
    pub use djutils_mail::{render_messages, MessageRenderer};
}
