//! Model trait and the shared base model.
//!
//! The [`Model`] trait is the object-safe view of an instance that fields
//! work against: named attribute reads and writes. [`BaseModel`] supplies
//! the UUID primary key and the created/modified timestamps every concrete
//! model embeds.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use djutils_core::UtilsError;

use crate::fields::{DateTimeField, Field, UuidField};
use crate::value::Value;

/// A persistable model instance.
///
/// # Examples
///
/// ```
/// use djutils_db::model::Model;
/// use djutils_db::value::Value;
/// use djutils_core::UtilsError;
///
/// struct Tag {
///     label: String,
/// }
///
/// impl Model for Tag {
///     fn model_name(&self) -> &'static str { "tag" }
///
///     fn get_field(&self, name: &str) -> Option<Value> {
///         (name == "label").then(|| Value::from(self.label.as_str()))
///     }
///
///     fn set_field(&mut self, name: &str, value: Value) -> Result<(), UtilsError> {
///         match (name, value) {
///             ("label", Value::String(s)) => { self.label = s; Ok(()) }
///             (name, _) => Err(UtilsError::BadRequest(format!("cannot set {name}"))),
///         }
///     }
///
///     fn field_values(&self) -> Vec<(&'static str, Value)> {
///         vec![("label", Value::from(self.label.as_str()))]
///     }
/// }
/// ```
pub trait Model: Send + Sync {
    /// Lowercase model name, used in log and error messages.
    fn model_name(&self) -> &'static str;

    /// Reads the named attribute, or `None` if the model has no such attribute.
    fn get_field(&self, name: &str) -> Option<Value>;

    /// Writes the named attribute.
    fn set_field(&mut self, name: &str, value: Value) -> Result<(), UtilsError>;

    /// Returns all attribute name-value pairs for this instance.
    fn field_values(&self) -> Vec<(&'static str, Value)>;
}

/// Primary key and timestamps shared by concrete models.
///
/// Concrete models embed a `BaseModel` and forward the `id`, `created_at`
/// and `modified_at` attributes to it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BaseModel {
    /// Random v4 UUID assigned at construction.
    pub id: Uuid,
    /// Set on first save.
    pub created_at: Option<DateTime<Utc>>,
    /// Refreshed on every save.
    pub modified_at: Option<DateTime<Utc>>,
}

impl Default for BaseModel {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseModel {
    /// Attribute names managed by the base model.
    pub const FIELD_NAMES: [&'static str; 3] = ["id", "created_at", "modified_at"];

    /// Creates an unsaved base with a fresh id.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: None,
            modified_at: None,
        }
    }

    /// The field declarations for the base attributes, in declaration order.
    pub fn fields() -> Vec<Box<dyn Field>> {
        vec![
            Box::new(UuidField::new("id")),
            Box::new(DateTimeField::auto_now_add("created_at")),
            Box::new(DateTimeField::auto_now("modified_at")),
        ]
    }

    /// Reads a base attribute.
    pub fn get_field(&self, name: &str) -> Option<Value> {
        match name {
            "id" => Some(Value::Uuid(self.id)),
            "created_at" => Some(Value::from(self.created_at)),
            "modified_at" => Some(Value::from(self.modified_at)),
            _ => None,
        }
    }

    /// Writes a base attribute.
    ///
    /// Returns `Ok(false)` when `name` is not a base attribute so the
    /// embedding model can handle it.
    pub fn set_field(&mut self, name: &str, value: Value) -> Result<bool, UtilsError> {
        match (name, value) {
            ("id", Value::Uuid(id)) => self.id = id,
            ("created_at", Value::DateTimeTz(dt)) => self.created_at = Some(dt),
            ("created_at", Value::Null) => self.created_at = None,
            ("modified_at", Value::DateTimeTz(dt)) => self.modified_at = Some(dt),
            ("modified_at", Value::Null) => self.modified_at = None,
            (name, value) if Self::FIELD_NAMES.contains(&name) => {
                return Err(UtilsError::BadRequest(format!(
                    "Invalid value {value} for field '{name}'"
                )));
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Returns the base attribute name-value pairs.
    pub fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::Uuid(self.id)),
            ("created_at", Value::from(self.created_at)),
            ("modified_at", Value::from(self.modified_at)),
        ]
    }
}

/// Runs every field's pre-save hook in declaration order.
///
/// Returns the values to persist as `(field name, value)` pairs.
pub async fn prepare_for_save(
    instance: &mut dyn Model,
    fields: &[Box<dyn Field>],
    add: bool,
) -> Result<Vec<(String, Value)>, UtilsError> {
    let mut row = Vec::with_capacity(fields.len());
    for field in fields {
        let value = field.pre_save(instance, add).await?;
        row.push((field.name().to_string(), value));
    }
    tracing::trace!(model = instance.model_name(), add, "prepared row for save");
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::CharField;

    struct Note {
        base: BaseModel,
        body: String,
    }

    impl Model for Note {
        fn model_name(&self) -> &'static str {
            "note"
        }

        fn get_field(&self, name: &str) -> Option<Value> {
            match name {
                "body" => Some(Value::from(self.body.as_str())),
                _ => self.base.get_field(name),
            }
        }

        fn set_field(&mut self, name: &str, value: Value) -> Result<(), UtilsError> {
            if self.base.set_field(name, value.clone())? {
                return Ok(());
            }
            match (name, value) {
                ("body", Value::String(s)) => {
                    self.body = s;
                    Ok(())
                }
                (name, _) => Err(UtilsError::BadRequest(format!("no field '{name}'"))),
            }
        }

        fn field_values(&self) -> Vec<(&'static str, Value)> {
            let mut values = self.base.field_values();
            values.push(("body", Value::from(self.body.as_str())));
            values
        }
    }

    fn note_fields() -> Vec<Box<dyn Field>> {
        let mut fields = BaseModel::fields();
        fields.push(Box::new(CharField::new("body").with_max_length(10)));
        fields
    }

    fn note(body: &str) -> Note {
        Note {
            base: BaseModel::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn test_base_model_new_assigns_unique_ids() {
        let a = BaseModel::new();
        let b = BaseModel::new();
        assert_ne!(a.id, b.id);
        assert!(a.created_at.is_none());
        assert!(a.modified_at.is_none());
    }

    #[test]
    fn test_base_set_field_rejects_wrong_type() {
        let mut base = BaseModel::new();
        assert!(base.set_field("id", Value::Int(1)).is_err());
        assert!(!base.set_field("other", Value::Int(1)).unwrap());
    }

    #[tokio::test]
    async fn test_first_save_stamps_both_timestamps() {
        let mut n = note("hello");
        let id = n.base.id;
        let row = prepare_for_save(&mut n, &note_fields(), true).await.unwrap();

        let names: Vec<&str> = row.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["id", "created_at", "modified_at", "body"]);
        assert_eq!(row[0].1, Value::Uuid(id));
        assert!(n.base.created_at.is_some());
        assert!(n.base.modified_at.is_some());
        assert_eq!(row[3].1, Value::from("hello"));
    }

    #[tokio::test]
    async fn test_update_keeps_created_at_and_refreshes_modified_at() {
        let mut n = note("hello");
        prepare_for_save(&mut n, &note_fields(), true).await.unwrap();
        let created = n.base.created_at;
        let first_modified = n.base.modified_at.unwrap();

        prepare_for_save(&mut n, &note_fields(), false).await.unwrap();
        assert_eq!(n.base.created_at, created);
        assert!(n.base.modified_at.unwrap() >= first_modified);
    }

    #[tokio::test]
    async fn test_uuid_field_fills_null_on_add() {
        struct Bare {
            id: Option<Uuid>,
        }
        impl Model for Bare {
            fn model_name(&self) -> &'static str {
                "bare"
            }
            fn get_field(&self, name: &str) -> Option<Value> {
                (name == "id").then(|| Value::from(self.id))
            }
            fn set_field(&mut self, _name: &str, value: Value) -> Result<(), UtilsError> {
                if let Value::Uuid(id) = value {
                    self.id = Some(id);
                }
                Ok(())
            }
            fn field_values(&self) -> Vec<(&'static str, Value)> {
                vec![("id", Value::from(self.id))]
            }
        }

        let mut bare = Bare { id: None };
        let fields: Vec<Box<dyn Field>> = vec![Box::new(UuidField::new("id"))];
        let row = prepare_for_save(&mut bare, &fields, true).await.unwrap();
        assert!(bare.id.is_some());
        assert_eq!(row[0].1, Value::from(bare.id));
    }

    #[tokio::test]
    async fn test_char_field_max_length() {
        let mut n = note("this body is too long");
        let err = prepare_for_save(&mut n, &note_fields(), true)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert!(err.to_string().contains("at most 10 characters"));
    }

    #[test]
    fn test_field_values_include_base() {
        let n = note("x");
        let names: Vec<&str> = n.field_values().iter().map(|(k, _)| *k).collect();
        assert_eq!(names, vec!["id", "created_at", "modified_at", "body"]);
    }
}
