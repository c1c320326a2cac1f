//! CSV export for models.
//!
//! Implement [`CsvExport`] on a model to get buffered and streamed CSV
//! download responses. Rows use the minimal-quoting dialect: a field is
//! quoted only when it contains the delimiter, a double quote, CR or LF,
//! quotes inside quoted fields are doubled, and each row ends with `\r\n`.
//! A row holding one empty field is written as `""` so it is not read back
//! as a blank line.

use bytes::Bytes;
use futures::{Stream, StreamExt};

use djutils_core::UtilsError;
use djutils_http::{HttpResponse, StreamingHttpResponse};

const CSV_CONTENT_TYPE: &str = "text/csv";

/// Encodes one CSV row, including the trailing `\r\n`.
///
/// # Examples
///
/// ```
/// use djutils_db::export::csv::encode_row;
///
/// let row = encode_row(&["plain", "with,comma", "say \"hi\""]);
/// assert_eq!(row, "plain,\"with,comma\",\"say \"\"hi\"\"\"\r\n");
/// ```
pub fn encode_row<S: AsRef<str>>(fields: &[S]) -> String {
    if let [only] = fields {
        if only.as_ref().is_empty() {
            return "\"\"\r\n".to_string();
        }
    }
    let mut line = String::new();
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            line.push(',');
        }
        let field = field.as_ref();
        if field.contains([',', '"', '\r', '\n']) {
            line.push('"');
            line.push_str(&field.replace('"', "\"\""));
            line.push('"');
        } else {
            line.push_str(field);
        }
    }
    line.push_str("\r\n");
    line
}

/// Models that can be written as CSV rows.
pub trait CsvExport: Send + Sync + Sized + 'static {
    /// Column headings, written once before any row.
    fn csv_header() -> Vec<String>;

    /// The cells of this instance's row, in heading order.
    fn csv_row(&self) -> Vec<String>;

    /// Builds a buffered CSV download of `items`.
    ///
    /// The body is the header row followed by one row per item.
    fn write_csv_response<'a, I>(filename: &str, items: I) -> HttpResponse
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let mut body = encode_row(&Self::csv_header());
        for item in items {
            body.push_str(&encode_row(&item.csv_row()));
        }

        let mut response = HttpResponse::ok(body);
        response.set_content_type(CSV_CONTENT_TYPE);
        response.set_attachment(filename);
        response
    }

    /// Builds a streamed CSV download of `items`.
    ///
    /// The header row is the first chunk; every item then becomes its own
    /// chunk. An error from `items` ends the body with that error.
    fn stream_csv_response<S>(filename: &str, items: S) -> HttpResponse
    where
        S: Stream<Item = Result<Self, UtilsError>> + Send + 'static,
    {
        let header = futures::stream::once(async {
            Ok::<_, UtilsError>(Bytes::from(encode_row(&Self::csv_header())))
        });
        let rows = items.map(|item| item.map(|item| Bytes::from(encode_row(&item.csv_row()))));

        let mut response =
            StreamingHttpResponse::with_content_type(CSV_CONTENT_TYPE, Box::pin(header.chain(rows)));
        response.set_attachment(filename);
        response
    }
}
