//! Download helpers for models: CSV files and zip archives.

pub mod csv;
pub mod zip;

pub use self::csv::{encode_row, CsvExport};
pub use self::zip::{ZipCompression, ZipExport, ZipOptions, ZipWriter};
