//! Model fields that never persist secrets in plain text.

use std::sync::Arc;

use async_trait::async_trait;

use djutils_core::{Settings, UtilsError, ValidationError};
use djutils_db::{Field, Model, Value};

use crate::hashers::{identify_hasher, preferred_hasher, Argon2Hasher, PasswordHasher};

/// A character field whose value is hashed before it is saved.
///
/// Values that already look like an encoded hash are saved as they are, so
/// saving an instance twice does not hash the hash. Anything else is hashed
/// with the configured hasher (Argon2id unless overridden) and the hash is
/// written back onto the instance. Null values are left alone.
#[derive(Clone)]
pub struct HashedCharField {
    name: String,
    hasher: Arc<dyn PasswordHasher>,
}

impl std::fmt::Debug for HashedCharField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashedCharField")
            .field("name", &self.name)
            .field("hasher", &self.hasher.algorithm())
            .finish()
    }
}

impl HashedCharField {
    /// Creates a hashed field named `name` using the preferred hasher.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            hasher: Arc::new(Argon2Hasher),
        }
    }

    /// Creates a hashed field using the hasher named in `settings`.
    pub fn from_settings(name: impl Into<String>, settings: &Settings) -> Result<Self, UtilsError> {
        Ok(Self {
            name: name.into(),
            hasher: preferred_hasher(settings)?,
        })
    }

    /// Uses `hasher` for new hashes.
    #[must_use]
    pub fn with_hasher(mut self, hasher: Arc<dyn PasswordHasher>) -> Self {
        self.hasher = hasher;
        self
    }
}

#[async_trait]
impl Field for HashedCharField {
    fn name(&self) -> &str {
        &self.name
    }

    async fn pre_save(&self, instance: &mut dyn Model, _add: bool) -> Result<Value, UtilsError> {
        let secret = match instance.get_field(&self.name) {
            None | Some(Value::Null) => return Ok(Value::Null),
            Some(Value::String(secret)) => secret,
            Some(other) => {
                return Err(ValidationError::for_field(
                    self.name.clone(),
                    format!("Expected a string, got {other}."),
                    "invalid",
                )
                .into());
            }
        };

        if identify_hasher(&secret).is_some() {
            return Ok(Value::String(secret));
        }

        let hashed = Value::String(self.hasher.hash(&secret).await?);
        instance.set_field(&self.name, hashed.clone())?;
        tracing::debug!(
            model = instance.model_name(),
            field = %self.name,
            algorithm = self.hasher.algorithm(),
            "hashed field value before save"
        );
        Ok(hashed)
    }
}
