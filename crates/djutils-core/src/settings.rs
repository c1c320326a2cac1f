//! Settings for djutils.
//!
//! [`Settings`] holds every configuration value the utilities read, with
//! sensible defaults. Settings are plain values passed to constructors; there
//! is deliberately no process-wide settings global, so tests can build as
//! many independent configurations as they like.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::UtilsError;

/// Default salt scoping stateless authentication tokens.
pub const DEFAULT_TOKEN_SALT: &str = "stateless_auth_token";

/// Default maximum token age in seconds (one hour).
pub const DEFAULT_TOKEN_MAX_AGE: u64 = 3600;

/// Stateless token authentication configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenAuthSettings {
    /// The `Authorization` header keyword (matched case-insensitively).
    pub keyword: String,
    /// Maximum token age in seconds.
    pub max_age: u64,
    /// Salt namespacing the token signatures.
    pub salt: String,
}

impl Default for TokenAuthSettings {
    fn default() -> Self {
        Self {
            keyword: "Token".to_string(),
            max_age: DEFAULT_TOKEN_MAX_AGE,
            salt: DEFAULT_TOKEN_SALT.to_string(),
        }
    }
}

/// The complete set of djutils settings.
///
/// # Examples
///
/// ```
/// use djutils_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.token_auth.max_age, 3600);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Whether debug mode is enabled.
    pub debug: bool,
    /// The secret key used for cryptographic signing.
    pub secret_key: String,
    /// The log level filter (e.g. "info", "`djutils_auth=debug`").
    pub log_level: String,
    /// Stateless token authentication options.
    pub token_auth: TokenAuthSettings,
    /// Preferred password hasher algorithm ("argon2", "bcrypt" or "`pbkdf2_sha256`").
    pub password_hasher: String,
    /// Qualified task names (`module.name`) allowed to execute.
    pub allowed_tasks: Vec<String>,
    /// Directories searched for email templates.
    pub template_dirs: Vec<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            secret_key: String::new(),
            log_level: "info".to_string(),
            token_auth: TokenAuthSettings::default(),
            password_hasher: "argon2".to_string(),
            allowed_tasks: Vec::new(),
            template_dirs: Vec::new(),
        }
    }
}

impl Settings {
    /// Checks settings that must be present before anything is signed.
    ///
    /// # Errors
    ///
    /// Returns [`UtilsError::ImproperlyConfigured`] when the secret key is
    /// empty, the token max age is zero, or the token keyword is empty or
    /// contains whitespace.
    pub fn validate(&self) -> Result<(), UtilsError> {
        if self.secret_key.trim().is_empty() {
            return Err(UtilsError::ImproperlyConfigured(
                "The SECRET_KEY setting must not be empty.".to_string(),
            ));
        }
        if self.token_auth.max_age == 0 {
            return Err(UtilsError::ImproperlyConfigured(
                "token_auth.max_age must be greater than zero.".to_string(),
            ));
        }
        let keyword = &self.token_auth.keyword;
        if keyword.is_empty() || keyword.chars().any(char::is_whitespace) {
            return Err(UtilsError::ImproperlyConfigured(format!(
                "token_auth.keyword must be a single non-empty word, got {keyword:?}."
            )));
        }
        Ok(())
    }
}
