//! Core error types for djutils.
//!
//! [`UtilsError`] is the shared error enum for every crate in the workspace.
//! [`ValidationError`] carries field-level messages and is what credential
//! validators hand back to the token endpoint. [`SigningError`] is the
//! narrow failure type of the [`signing`](crate::signing) module.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use thiserror::Error;

/// Key under which errors that are not tied to a single field are reported.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Represents a validation error with optional field-level errors.
///
/// # Examples
///
/// ```
/// use djutils_core::error::ValidationError;
///
/// let err = ValidationError::new("This field is required.", "required");
/// assert_eq!(err.to_string(), "This field is required.");
///
/// let err = ValidationError::for_field("username", "This field is required.", "required");
/// assert_eq!(err.message_dict()["username"], vec!["This field is required.".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The primary error message.
    pub message: String,
    /// A short code identifying the type of failure (e.g. "required", "authorization").
    pub code: String,
    /// Additional parameters providing context for the error message.
    pub params: HashMap<String, String>,
    /// Per-field validation errors, keyed by field name.
    pub field_errors: HashMap<String, Vec<Self>>,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            params: HashMap::new(),
            field_errors: HashMap::new(),
        }
    }

    /// Creates a `ValidationError` containing per-field errors.
    pub fn with_field_errors(field_errors: HashMap<String, Vec<Self>>) -> Self {
        Self {
            message: String::new(),
            code: String::new(),
            params: HashMap::new(),
            field_errors,
        }
    }

    /// Creates a `ValidationError` holding a single error for one field.
    pub fn for_field(
        field: impl Into<String>,
        message: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(field.into(), vec![Self::new(message, code)]);
        Self::with_field_errors(field_errors)
    }

    /// Adds a parameter to this validation error.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Adds an error for `field`, keeping any errors already recorded.
    pub fn add_field_error(&mut self, field: impl Into<String>, error: Self) {
        self.field_errors.entry(field.into()).or_default().push(error);
    }

    /// Flattens the error into `{field: [messages]}`.
    ///
    /// A top-level message is reported under [`NON_FIELD_ERRORS`]. The map is
    /// ordered so serialized bodies are stable.
    pub fn message_dict(&self) -> BTreeMap<String, Vec<String>> {
        let mut dict: BTreeMap<String, Vec<String>> = BTreeMap::new();
        if !self.message.is_empty() {
            dict.entry(NON_FIELD_ERRORS.to_string())
                .or_default()
                .push(self.message.clone());
        }
        for (field, errors) in &self.field_errors {
            let messages = dict.entry(field.clone()).or_default();
            messages.extend(errors.iter().map(ToString::to_string));
        }
        dict
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.message.is_empty() {
            write!(f, "{}", self.message)?;
        } else if !self.field_errors.is_empty() {
            let mut first = true;
            for (field, errors) in &self.field_errors {
                for error in errors {
                    if !first {
                        write!(f, "; ")?;
                    }
                    write!(f, "{field}: {error}")?;
                    first = false;
                }
            }
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

/// Failure modes of signature verification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SigningError {
    /// The value is malformed or its signature does not match.
    #[error("Bad signature: {0}")]
    BadSignature(String),

    /// The signature is valid but older than the allowed maximum age.
    #[error("Signature age {age} > {max_age} seconds")]
    SignatureExpired {
        /// Seconds elapsed since the value was signed.
        age: u64,
        /// The maximum allowed age in seconds.
        max_age: u64,
    },
}

/// The primary error type for djutils.
///
/// Each variant maps to an HTTP status code via [`UtilsError::status_code`].
#[derive(Error, Debug)]
pub enum UtilsError {
    // ── HTTP errors ──────────────────────────────────────────────────

    /// HTTP 400 Bad Request.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// HTTP 401 Unauthorized.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// HTTP 403 Forbidden.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// HTTP 404 Not Found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// HTTP 405 Method Not Allowed.
    #[error("Method not allowed: {0}")]
    MethodNotAllowed(String),

    /// HTTP 500 Internal Server Error.
    #[error("Internal server error: {0}")]
    InternalServerError(String),

    // ── Storage errors ───────────────────────────────────────────────

    /// A lookup expected exactly one result but found none.
    #[error("Object does not exist: {0}")]
    DoesNotExist(String),

    /// A generic storage error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    // ── Validation ───────────────────────────────────────────────────

    /// One or more fields failed validation.
    #[error("Validation error: {0}")]
    ValidationError(ValidationError),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value could not be loaded.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The utilities are improperly configured (e.g. no secret key).
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    // ── Serialization / signing ──────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A signed value failed verification.
    #[error(transparent)]
    Signing(#[from] SigningError),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl UtilsError {
    /// Returns the HTTP status code associated with this error.
    ///
    /// - `BadRequest`, `ValidationError`, `Signing` -> 400
    /// - `Unauthorized` -> 401
    /// - `PermissionDenied` -> 403
    /// - `NotFound`, `DoesNotExist` -> 404
    /// - `MethodNotAllowed` -> 405
    /// - Everything else -> 500
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BadRequest(_) | Self::ValidationError(_) | Self::Signing(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::PermissionDenied(_) => 403,
            Self::NotFound(_) | Self::DoesNotExist(_) => 404,
            Self::MethodNotAllowed(_) => 405,
            Self::InternalServerError(_)
            | Self::DatabaseError(_)
            | Self::ConfigurationError(_)
            | Self::ImproperlyConfigured(_)
            | Self::SerializationError(_)
            | Self::IoError(_) => 500,
        }
    }
}

impl From<ValidationError> for UtilsError {
    fn from(err: ValidationError) -> Self {
        Self::ValidationError(err)
    }
}

/// A convenience type alias for `Result<T, UtilsError>`.
pub type UtilsResult<T> = Result<T, UtilsError>;
