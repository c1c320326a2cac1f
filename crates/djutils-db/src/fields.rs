//! Model fields and their pre-save hooks.
//!
//! A [`Field`] describes one attribute of a [`Model`]. Just before a model is
//! written, [`prepare_for_save`](crate::model::prepare_for_save) gives every
//! field a chance to compute or rewrite its value through
//! [`Field::pre_save`].

use async_trait::async_trait;
use chrono::Utc;

use djutils_core::UtilsError;

use crate::model::Model;
use crate::value::Value;

/// A model field with a pre-save hook.
///
/// The default hook returns the attribute's current value unchanged.
#[async_trait]
pub trait Field: Send + Sync {
    /// The attribute name on the model.
    fn name(&self) -> &str;

    /// Returns the value to persist for this field.
    ///
    /// `add` is `true` when the instance is being saved for the first time.
    /// Implementations may write a new value back to `instance`.
    async fn pre_save(&self, instance: &mut dyn Model, add: bool) -> Result<Value, UtilsError> {
        let _ = add;
        Ok(instance.get_field(self.name()).unwrap_or(Value::Null))
    }
}

/// A plain character field.
#[derive(Debug, Clone)]
pub struct CharField {
    name: String,
    /// Maximum length in characters, checked on save.
    pub max_length: Option<usize>,
}

impl CharField {
    /// Creates a character field named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            max_length: None,
        }
    }

    /// Sets the maximum length.
    #[must_use]
    pub const fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }
}

#[async_trait]
impl Field for CharField {
    fn name(&self) -> &str {
        &self.name
    }

    async fn pre_save(&self, instance: &mut dyn Model, _add: bool) -> Result<Value, UtilsError> {
        let value = instance.get_field(&self.name).unwrap_or(Value::Null);
        if let (Some(max), Some(s)) = (self.max_length, value.as_str()) {
            let len = s.chars().count();
            if len > max {
                return Err(djutils_core::ValidationError::for_field(
                    self.name.clone(),
                    format!("Ensure this value has at most {max} characters (it has {len})."),
                    "max_length",
                )
                .into());
            }
        }
        Ok(value)
    }
}

/// A UTC timestamp field that can stamp itself on save.
#[derive(Debug, Clone)]
pub struct DateTimeField {
    name: String,
    /// Set to now on every save.
    pub auto_now: bool,
    /// Set to now on the first save only.
    pub auto_now_add: bool,
}

impl DateTimeField {
    /// Creates a plain timestamp field.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            auto_now: false,
            auto_now_add: false,
        }
    }

    /// A field refreshed on every save.
    pub fn auto_now(name: impl Into<String>) -> Self {
        Self {
            auto_now: true,
            ..Self::new(name)
        }
    }

    /// A field stamped once, when the instance is first saved.
    pub fn auto_now_add(name: impl Into<String>) -> Self {
        Self {
            auto_now_add: true,
            ..Self::new(name)
        }
    }
}

#[async_trait]
impl Field for DateTimeField {
    fn name(&self) -> &str {
        &self.name
    }

    async fn pre_save(&self, instance: &mut dyn Model, add: bool) -> Result<Value, UtilsError> {
        if self.auto_now || (self.auto_now_add && add) {
            let now = Value::DateTimeTz(Utc::now());
            instance.set_field(&self.name, now.clone())?;
            Ok(now)
        } else {
            Ok(instance.get_field(&self.name).unwrap_or(Value::Null))
        }
    }
}

/// A UUID field. A null value is replaced by a fresh v4 UUID on first save.
#[derive(Debug, Clone)]
pub struct UuidField {
    name: String,
}

impl UuidField {
    /// Creates a UUID field named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[async_trait]
impl Field for UuidField {
    fn name(&self) -> &str {
        &self.name
    }

    async fn pre_save(&self, instance: &mut dyn Model, add: bool) -> Result<Value, UtilsError> {
        let current = instance.get_field(&self.name).unwrap_or(Value::Null);
        if add && current.is_null() {
            let id = Value::Uuid(uuid::Uuid::new_v4());
            instance.set_field(&self.name, id.clone())?;
            return Ok(id);
        }
        Ok(current)
    }
}
