//! Settings loading from configuration files and the environment.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `DJUTILS_SECRET_KEY` | `secret_key` |
//! | `DJUTILS_DEBUG` | `debug` |
//! | `DJUTILS_LOG_LEVEL` | `log_level` |
//! | `DJUTILS_TOKEN_KEYWORD` | `token_auth.keyword` |
//! | `DJUTILS_TOKEN_MAX_AGE` | `token_auth.max_age` |
//! | `DJUTILS_TOKEN_SALT` | `token_auth.salt` |
//! | `DJUTILS_PASSWORD_HASHER` | `password_hasher` |
//! | `DJUTILS_ALLOWED_TASKS` | `allowed_tasks` (comma-separated) |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use djutils_core::settings_loader;
//!
//! let settings = settings_loader::from_toml_file_with_env("config/djutils.toml").unwrap();
//! settings.validate().unwrap();
//! ```

use std::path::Path;

use crate::error::UtilsError;
use crate::settings::Settings;

/// Loads settings from a TOML string.
///
/// Any fields not present in the TOML keep their default values.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, UtilsError> {
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| UtilsError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;
    merge_over_defaults(toml_to_json(toml_value), "TOML")
}

/// Loads settings from a TOML file.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, UtilsError> {
    from_toml_str(&read_config(path.as_ref(), "TOML")?)
}

/// Loads settings from a TOML file and then applies environment variable overrides.
pub fn from_toml_file_with_env(path: impl AsRef<Path>) -> Result<Settings, UtilsError> {
    let mut settings = from_toml_file(path)?;
    apply_env_overrides(&mut settings)?;
    Ok(settings)
}

/// Loads settings from a JSON string.
pub fn from_json_str(json_str: &str) -> Result<Settings, UtilsError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| UtilsError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;
    merge_over_defaults(json_value, "JSON")
}

/// Loads settings from a JSON file.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, UtilsError> {
    from_json_str(&read_config(path.as_ref(), "JSON")?)
}

/// Loads settings from a JSON file and then applies environment variable overrides.
pub fn from_json_file_with_env(path: impl AsRef<Path>) -> Result<Settings, UtilsError> {
    let mut settings = from_json_file(path)?;
    apply_env_overrides(&mut settings)?;
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Result<Settings, UtilsError> {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings)?;
    Ok(settings)
}

/// Applies `DJUTILS_*` environment variable overrides to a settings struct.
pub fn apply_env_overrides(settings: &mut Settings) -> Result<(), UtilsError> {
    apply_overrides(settings, |name| std::env::var(name).ok())
}

/// Applies overrides from an arbitrary variable source.
///
/// # Errors
///
/// Returns [`UtilsError::ImproperlyConfigured`] when a numeric variable does
/// not parse. Nothing is applied past the failing variable.
pub fn apply_overrides<F>(settings: &mut Settings, lookup: F) -> Result<(), UtilsError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("DJUTILS_SECRET_KEY") {
        settings.secret_key = val;
    }

    if let Some(val) = lookup("DJUTILS_DEBUG") {
        settings.debug = matches!(val.to_lowercase().as_str(), "true" | "1" | "yes");
    }

    if let Some(val) = lookup("DJUTILS_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = lookup("DJUTILS_TOKEN_KEYWORD") {
        settings.token_auth.keyword = val;
    }

    if let Some(val) = lookup("DJUTILS_TOKEN_MAX_AGE") {
        settings.token_auth.max_age = val.trim().parse::<u64>().map_err(|e| {
            UtilsError::ImproperlyConfigured(format!(
                "DJUTILS_TOKEN_MAX_AGE must be a whole number of seconds, got {val:?}: {e}"
            ))
        })?;
    }

    if let Some(val) = lookup("DJUTILS_TOKEN_SALT") {
        settings.token_auth.salt = val;
    }

    if let Some(val) = lookup("DJUTILS_PASSWORD_HASHER") {
        settings.password_hasher = val;
    }

    if let Some(val) = lookup("DJUTILS_ALLOWED_TASKS") {
        settings.allowed_tasks = val
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    Ok(())
}

// ============================================================
// Helpers
// ============================================================

fn read_config(path: &Path, format: &str) -> Result<String, UtilsError> {
    std::fs::read_to_string(path).map_err(|e| {
        UtilsError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

fn merge_over_defaults(value: serde_json::Value, format: &str) -> Result<Settings, UtilsError> {
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        UtilsError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, value);
    serde_json::from_value(merged).map_err(|e| {
        UtilsError::ConfigurationError(format!("Failed to deserialize settings from {format}: {e}"))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    // ── TOML loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            debug = false
            secret_key = "toml-secret"
            log_level = "debug"
        "#;
        let settings = from_toml_str(toml).unwrap();
        assert!(!settings.debug);
        assert_eq!(settings.secret_key, "toml-secret");
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.token_auth.max_age, 3600);
    }

    #[test]
    fn test_from_toml_str_token_auth_partial() {
        let toml = r#"
            [token_auth]
            max_age = 600
        "#;
        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.token_auth.max_age, 600);
        assert_eq!(settings.token_auth.keyword, "Token");
        assert_eq!(settings.token_auth.salt, "stateless_auth_token");
    }

    #[test]
    fn test_from_toml_str_allowed_tasks() {
        let toml = r#"allowed_tasks = ["app.tasks.send_report", "app.tasks.cleanup"]"#;
        let settings = from_toml_str(toml).unwrap();
        assert_eq!(
            settings.allowed_tasks,
            vec!["app.tasks.send_report".to_string(), "app.tasks.cleanup".to_string()]
        );
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert!(settings.debug);
        assert_eq!(settings.password_hasher, "argon2");
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let result = from_toml_str("this is not = = toml");
        assert!(matches!(result, Err(UtilsError::ConfigurationError(_))));
    }

    // ── JSON loading ────────────────────────────────────────────────

    #[test]
    fn test_from_json_str_basic() {
        let json = r#"{"secret_key": "json-secret", "token_auth": {"keyword": "Bearer"}}"#;
        let settings = from_json_str(json).unwrap();
        assert_eq!(settings.secret_key, "json-secret");
        assert_eq!(settings.token_auth.keyword, "Bearer");
        assert_eq!(settings.token_auth.max_age, 3600);
    }

    #[test]
    fn test_from_json_str_invalid() {
        assert!(from_json_str("{not json").is_err());
    }

    // ── Files ───────────────────────────────────────────────────────

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("djutils.toml");
        std::fs::write(&path, "secret_key = \"file-secret\"\n").unwrap();
        let settings = from_toml_file(&path).unwrap();
        assert_eq!(settings.secret_key, "file-secret");
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("djutils.json");
        std::fs::write(&path, r#"{"log_level": "warn"}"#).unwrap();
        let settings = from_json_file(&path).unwrap();
        assert_eq!(settings.log_level, "warn");
    }

    #[test]
    fn test_from_toml_file_missing() {
        let result = from_toml_file("/nonexistent/path/djutils.toml");
        assert!(matches!(result, Err(UtilsError::ConfigurationError(_))));
    }

    // ── Overrides ───────────────────────────────────────────────────

    #[test]
    fn test_apply_overrides_secret_and_debug() {
        let env = vars(&[("DJUTILS_SECRET_KEY", "env-secret"), ("DJUTILS_DEBUG", "0")]);
        let mut settings = Settings::default();
        apply_overrides(&mut settings, |k| env.get(k).cloned()).unwrap();
        assert_eq!(settings.secret_key, "env-secret");
        assert!(!settings.debug);
    }

    #[test]
    fn test_apply_overrides_debug_yes() {
        let env = vars(&[("DJUTILS_DEBUG", "YES")]);
        let mut settings = Settings::default();
        settings.debug = false;
        apply_overrides(&mut settings, |k| env.get(k).cloned()).unwrap();
        assert!(settings.debug);
    }

    #[test]
    fn test_apply_overrides_token_settings() {
        let env = vars(&[
            ("DJUTILS_TOKEN_KEYWORD", "Bearer"),
            ("DJUTILS_TOKEN_MAX_AGE", "120"),
            ("DJUTILS_TOKEN_SALT", "api"),
        ]);
        let mut settings = Settings::default();
        apply_overrides(&mut settings, |k| env.get(k).cloned()).unwrap();
        assert_eq!(settings.token_auth.keyword, "Bearer");
        assert_eq!(settings.token_auth.max_age, 120);
        assert_eq!(settings.token_auth.salt, "api");
    }

    #[test]
    fn test_apply_overrides_invalid_max_age() {
        for value in ["soon", "600s", "-1", ""] {
            let env = vars(&[("DJUTILS_TOKEN_MAX_AGE", value)]);
            let mut settings = Settings::default();
            let err = apply_overrides(&mut settings, |k| env.get(k).cloned()).unwrap_err();
            assert!(matches!(err, UtilsError::ImproperlyConfigured(_)), "{value:?}");
        }
    }

    #[test]
    fn test_apply_overrides_allowed_tasks() {
        let env = vars(&[("DJUTILS_ALLOWED_TASKS", "a.b, c.d,,")]);
        let mut settings = Settings::default();
        apply_overrides(&mut settings, |k| env.get(k).cloned()).unwrap();
        assert_eq!(settings.allowed_tasks, vec!["a.b".to_string(), "c.d".to_string()]);
    }

    #[test]
    fn test_toml_file_then_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("djutils.toml");
        std::fs::write(&path, "secret_key = \"toml-secret\"\ndebug = true\n").unwrap();

        let env = vars(&[("DJUTILS_SECRET_KEY", "override")]);
        let mut settings = from_toml_file(&path).unwrap();
        apply_overrides(&mut settings, |k| env.get(k).cloned()).unwrap();
        assert_eq!(settings.secret_key, "override");
        assert!(settings.debug);
    }

    // ── Helpers ─────────────────────────────────────────────────────

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({"outer": {"a": 1, "b": 2}});
        let over = serde_json::json!({"outer": {"b": 3}});
        let merged = merge_json(base, over);
        assert_eq!(merged["outer"]["a"], 1);
        assert_eq!(merged["outer"]["b"], 3);
    }

    #[test]
    fn test_merge_json_array_override() {
        let base = serde_json::json!({"list": [1, 2, 3]});
        let over = serde_json::json!({"list": [4, 5]});
        assert_eq!(merge_json(base, over)["list"], serde_json::json!([4, 5]));
    }
}
