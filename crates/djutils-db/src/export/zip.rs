//! Zip archive export for models.
//!
//! Implement [`ZipExport`] on a model whose instances each contribute one
//! file to a downloadable archive. The archive is built in memory with
//! [`ZipWriter`], a small PKZIP writer supporting stored and deflated
//! entries (no ZIP64, no encryption).

use std::io::Write;

use chrono::{DateTime, Datelike, Timelike, Utc};
use flate2::write::DeflateEncoder;
use flate2::Compression;

use djutils_core::UtilsError;
use djutils_http::{FileResponse, HttpResponse};

const LOCAL_FILE_HEADER_SIG: u32 = 0x0403_4b50;
const CENTRAL_DIR_HEADER_SIG: u32 = 0x0201_4b50;
const END_OF_CENTRAL_DIR_SIG: u32 = 0x0605_4b50;
const VERSION: u16 = 20;
/// General purpose flag bit 11: file names are UTF-8.
const FLAG_UTF8: u16 = 0x0800;

/// Compression method for archive entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZipCompression {
    /// No compression.
    Stored,
    /// Raw deflate.
    #[default]
    Deflated,
}

impl ZipCompression {
    const fn method(self) -> u16 {
        match self {
            Self::Stored => 0,
            Self::Deflated => 8,
        }
    }
}

/// Options for [`ZipExport::write_zip_response`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZipOptions {
    /// Entry compression method.
    pub compression: ZipCompression,
    /// Deflate level, 0-9. Ignored for stored entries.
    pub level: u32,
}

impl Default for ZipOptions {
    fn default() -> Self {
        Self {
            compression: ZipCompression::Deflated,
            level: 9,
        }
    }
}

struct CentralEntry {
    name: Vec<u8>,
    method: u16,
    crc: u32,
    compressed_size: u32,
    size: u32,
    offset: u32,
}

/// Writes a PKZIP archive into memory.
pub struct ZipWriter {
    options: ZipOptions,
    dos_time: u16,
    dos_date: u16,
    buffer: Vec<u8>,
    entries: Vec<CentralEntry>,
}

impl ZipWriter {
    /// Creates a writer stamping entries with the current time.
    pub fn new(options: ZipOptions) -> Self {
        Self::with_timestamp(options, Utc::now())
    }

    /// Creates a writer stamping entries with `timestamp`.
    ///
    /// Timestamps outside the DOS range (1980-2107) are clamped.
    pub fn with_timestamp(options: ZipOptions, timestamp: DateTime<Utc>) -> Self {
        let (dos_time, dos_date) = dos_datetime(timestamp);
        Self {
            options,
            dos_time,
            dos_date,
            buffer: Vec::new(),
            entries: Vec::new(),
        }
    }

    /// Number of entries written so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entry has been written.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Appends a file to the archive.
    pub fn add_file(&mut self, name: &str, data: &[u8]) -> Result<(), UtilsError> {
        let crc = crc32fast::hash(data);
        let compressed = match self.options.compression {
            ZipCompression::Stored => data.to_vec(),
            ZipCompression::Deflated => {
                let mut encoder =
                    DeflateEncoder::new(Vec::new(), Compression::new(self.options.level.min(9)));
                encoder.write_all(data)?;
                encoder.finish()?
            }
        };

        let entry = CentralEntry {
            name: name.as_bytes().to_vec(),
            method: self.options.compression.method(),
            crc,
            compressed_size: to_u32(compressed.len(), "compressed entry size")?,
            size: to_u32(data.len(), "entry size")?,
            offset: to_u32(self.buffer.len(), "archive offset")?,
        };
        let name_len = to_u16(entry.name.len(), "file name length")?;

        let out = &mut self.buffer;
        put_u32(out, LOCAL_FILE_HEADER_SIG);
        put_u16(out, VERSION);
        put_u16(out, FLAG_UTF8);
        put_u16(out, entry.method);
        put_u16(out, self.dos_time);
        put_u16(out, self.dos_date);
        put_u32(out, entry.crc);
        put_u32(out, entry.compressed_size);
        put_u32(out, entry.size);
        put_u16(out, name_len);
        put_u16(out, 0);
        out.extend_from_slice(&entry.name);
        out.extend_from_slice(&compressed);

        self.entries.push(entry);
        Ok(())
    }

    /// Writes the central directory and returns the archive bytes.
    pub fn finish(mut self) -> Result<Vec<u8>, UtilsError> {
        let cd_offset = to_u32(self.buffer.len(), "central directory offset")?;
        let count = to_u16(self.entries.len(), "entry count")?;

        let out = &mut self.buffer;
        for entry in &self.entries {
            put_u32(out, CENTRAL_DIR_HEADER_SIG);
            put_u16(out, VERSION);
            put_u16(out, VERSION);
            put_u16(out, FLAG_UTF8);
            put_u16(out, entry.method);
            put_u16(out, self.dos_time);
            put_u16(out, self.dos_date);
            put_u32(out, entry.crc);
            put_u32(out, entry.compressed_size);
            put_u32(out, entry.size);
            put_u16(out, to_u16(entry.name.len(), "file name length")?);
            put_u16(out, 0); // extra field length
            put_u16(out, 0); // comment length
            put_u16(out, 0); // disk number start
            put_u16(out, 0); // internal attributes
            put_u32(out, 0); // external attributes
            put_u32(out, entry.offset);
            out.extend_from_slice(&entry.name);
        }

        let cd_size = to_u32(out.len() - cd_offset as usize, "central directory size")?;
        put_u32(out, END_OF_CENTRAL_DIR_SIG);
        put_u16(out, 0);
        put_u16(out, 0);
        put_u16(out, count);
        put_u16(out, count);
        put_u32(out, cd_size);
        put_u32(out, cd_offset);
        put_u16(out, 0);

        Ok(self.buffer)
    }
}

/// Models whose instances each contribute one file to a zip download.
pub trait ZipExport: Sized {
    /// The file contents and the name to store them under, if any.
    fn file_for_zip(&self) -> Option<(Vec<u8>, String)>;

    /// The download name of the archive.
    fn zipfile_name() -> String;

    /// Builds an archive of every item's file and returns it as a download.
    ///
    /// Items without a file, or with empty contents or an empty name, are
    /// skipped.
    fn write_zip_response<'a, I>(items: I, options: ZipOptions) -> Result<HttpResponse, UtilsError>
    where
        I: IntoIterator<Item = &'a Self>,
        Self: 'a,
    {
        let mut writer = ZipWriter::new(options);
        let mut skipped = 0_usize;
        for item in items {
            match item.file_for_zip() {
                Some((data, name)) if !data.is_empty() && !name.is_empty() => {
                    writer.add_file(&name, &data)?;
                }
                _ => skipped += 1,
            }
        }
        let filename = Self::zipfile_name();
        tracing::debug!(
            archive = %filename,
            entries = writer.len(),
            skipped,
            "built zip export"
        );
        Ok(FileResponse::from_bytes(writer.finish()?, &filename, true))
    }
}

fn put_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn to_u32(value: usize, what: &str) -> Result<u32, UtilsError> {
    u32::try_from(value).map_err(|_| {
        UtilsError::SerializationError(format!("zip {what} exceeds the 32-bit limit"))
    })
}

fn to_u16(value: usize, what: &str) -> Result<u16, UtilsError> {
    u16::try_from(value).map_err(|_| {
        UtilsError::SerializationError(format!("zip {what} exceeds the 16-bit limit"))
    })
}

/// Packs a timestamp into DOS `(time, date)` fields.
fn dos_datetime(timestamp: DateTime<Utc>) -> (u16, u16) {
    let year = timestamp.year().clamp(1980, 2107);
    let (month, day, hour, minute, second) = if year == timestamp.year() {
        (
            timestamp.month(),
            timestamp.day(),
            timestamp.hour(),
            timestamp.minute(),
            timestamp.second(),
        )
    } else if year == 1980 {
        (1, 1, 0, 0, 0)
    } else {
        (12, 31, 23, 59, 58)
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let date = (((year - 1980) as u32) << 9 | month << 5 | day) as u16;
    #[allow(clippy::cast_possible_truncation)]
    let time = (hour << 11 | minute << 5 | second / 2) as u16;
    (time, date)
}
