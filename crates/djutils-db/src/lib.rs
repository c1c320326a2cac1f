//! # djutils-db
//!
//! Model layer for djutils: backend-agnostic values, the [`Model`] trait,
//! fields with pre-save hooks, the shared [`BaseModel`], and CSV / zip
//! export helpers.
//!
//! ## Modules
//!
//! - [`value`] - The [`Value`] enum
//! - [`model`] - [`Model`], [`BaseModel`] and [`prepare_for_save`]
//! - [`fields`] - The [`Field`] trait and built-in fields
//! - [`export`] - CSV and zip download responses

pub mod export;
pub mod fields;
pub mod model;
pub mod value;

pub use export::{CsvExport, ZipCompression, ZipExport, ZipOptions};
pub use fields::{CharField, DateTimeField, Field, UuidField};
pub use model::{prepare_for_save, BaseModel, Model};
pub use value::Value;
