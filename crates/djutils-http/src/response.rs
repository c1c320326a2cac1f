//! HTTP response types.
//!
//! [`HttpResponse`] plus constructors for the common shapes: JSON bodies,
//! streamed bodies and in-memory file downloads.

use std::pin::Pin;

use axum::response::IntoResponse;
use bytes::Bytes;
use futures::Stream;
use http::{HeaderMap, HeaderValue, StatusCode};

use djutils_core::UtilsError;

/// A boxed stream of body chunks.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, UtilsError>> + Send>>;

/// The body content of an HTTP response.
pub enum ResponseContent {
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// UTF-8 text.
    Text(String),
    /// A streaming body.
    Streaming(BodyStream),
}

impl std::fmt::Debug for ResponseContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes(b) => f.debug_tuple("Bytes").field(&b.len()).finish(),
            Self::Text(t) => f
                .debug_tuple("Text")
                .field(&t.chars().take(100).collect::<String>())
                .finish(),
            Self::Streaming(_) => f.debug_tuple("Streaming").finish(),
        }
    }
}

/// An HTTP response.
///
/// All response types convert to an Axum response via [`IntoResponse`].
///
/// # Examples
///
/// ```
/// use djutils_http::HttpResponse;
///
/// let response = HttpResponse::ok("Hello, World!");
/// assert_eq!(response.status(), http::StatusCode::OK);
/// ```
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    content: ResponseContent,
    charset: String,
    content_type: String,
}

impl std::fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .field("charset", &self.charset)
            .field("content", &self.content)
            .finish_non_exhaustive()
    }
}

impl HttpResponse {
    /// Creates a new `HttpResponse` with the given status code and text body.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            content: ResponseContent::Text(body.into()),
            charset: "utf-8".to_string(),
            content_type: "text/html".to_string(),
        }
    }

    /// Creates a new `HttpResponse` with the given status code and byte body.
    pub fn with_bytes(status: StatusCode, body: Vec<u8>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            content: ResponseContent::Bytes(body),
            charset: "utf-8".to_string(),
            content_type: "application/octet-stream".to_string(),
        }
    }

    /// Creates a 200 OK response with the given body.
    pub fn ok(body: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    /// Creates a 400 Bad Request response.
    pub fn bad_request(body: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, body)
    }

    /// Creates a 401 Unauthorized response carrying a `WWW-Authenticate` challenge.
    pub fn unauthorized(body: impl Into<String>, challenge: &str) -> Self {
        let mut response = Self::new(StatusCode::UNAUTHORIZED, body);
        if let Ok(value) = HeaderValue::from_str(challenge) {
            response.headers.insert(http::header::WWW_AUTHENTICATE, value);
        }
        response
    }

    /// Creates a 500 Internal Server Error response.
    pub fn server_error(body: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, body)
    }

    /// Creates a 405 Method Not Allowed response with the list of permitted methods.
    pub fn not_allowed(permitted_methods: &[&str]) -> Self {
        let body = format!("Method Not Allowed. Permitted: {}", permitted_methods.join(", "));
        let mut response = Self::new(StatusCode::METHOD_NOT_ALLOWED, body);
        if let Ok(value) = HeaderValue::from_str(&permitted_methods.join(", ")) {
            response.headers.insert(http::header::ALLOW, value);
        }
        response
    }

    /// Builds a plain-text response whose status follows [`UtilsError::status_code`].
    ///
    /// Server errors get a generic body; their detail is logged, never sent.
    pub fn from_error(error: &UtilsError) -> Self {
        let status =
            StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = if status.is_server_error() {
            tracing::error!(error = %error, status = status.as_u16(), "request failed");
            status.canonical_reason().unwrap_or("Server Error").to_string()
        } else {
            error.to_string()
        };
        let mut response = Self::new(status, body);
        response.set_content_type("text/plain");
        response
    }

    /// Returns the status code.
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns a reference to the headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a mutable reference to the headers.
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Adds a header to the response.
    #[must_use]
    pub fn set_header(mut self, name: http::header::HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Marks the response as a download named `filename`.
    pub fn set_attachment(&mut self, filename: &str) {
        let escaped = filename.replace('\\', "\\\\").replace('"', "\\\"");
        if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename=\"{escaped}\"")) {
            self.headers.insert(http::header::CONTENT_DISPOSITION, value);
        }
    }

    /// Returns the charset.
    pub fn charset(&self) -> &str {
        &self.charset
    }

    /// Returns the content type.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Sets the content type.
    pub fn set_content_type(&mut self, content_type: impl Into<String>) {
        self.content_type = content_type.into();
    }

    /// Returns the response body as a reference to the content enum.
    pub const fn content(&self) -> &ResponseContent {
        &self.content
    }

    /// Returns `true` if the body is streamed.
    pub const fn is_streaming(&self) -> bool {
        matches!(self.content, ResponseContent::Streaming(_))
    }

    /// Returns the body as bytes, if available (not streaming).
    pub fn content_bytes(&self) -> Option<Vec<u8>> {
        match &self.content {
            ResponseContent::Bytes(b) => Some(b.clone()),
            ResponseContent::Text(t) => Some(t.as_bytes().to_vec()),
            ResponseContent::Streaming(_) => None,
        }
    }

    /// Returns the full content type header value including charset.
    fn full_content_type(&self) -> String {
        if self.content_type.starts_with("text/") || self.content_type.contains("json") {
            format!("{}; charset={}", self.content_type, self.charset)
        } else {
            self.content_type.clone()
        }
    }
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> axum::response::Response {
        let content_type = HeaderValue::from_str(&self.full_content_type()).ok();

        let body = match self.content {
            ResponseContent::Text(text) => axum::body::Body::from(text),
            ResponseContent::Bytes(bytes) => axum::body::Body::from(bytes),
            ResponseContent::Streaming(stream) => axum::body::Body::from_stream(stream),
        };

        let mut response = axum::response::Response::new(body);
        *response.status_mut() = self.status;
        if let Some(ct) = content_type {
            response.headers_mut().insert(http::header::CONTENT_TYPE, ct);
        }
        for (key, value) in &self.headers {
            response.headers_mut().insert(key, value.clone());
        }
        response
    }
}

/// A JSON response.
///
/// Serializes the given data as JSON and sets the content type to `application/json`.
pub struct JsonResponse;

impl JsonResponse {
    /// Creates a new JSON response from a serializable value.
    ///
    /// Falls back to a 500 response if serialization fails.
    pub fn new<T: serde::Serialize>(data: &T) -> HttpResponse {
        Self::with_status(StatusCode::OK, data)
    }

    /// Creates a new JSON response with a custom status code.
    pub fn with_status<T: serde::Serialize>(status: StatusCode, data: &T) -> HttpResponse {
        match serde_json::to_string(data) {
            Ok(json) => {
                let mut response = HttpResponse::new(status, json);
                response.set_content_type("application/json");
                response
            }
            Err(e) => HttpResponse::server_error(format!("JSON serialization error: {e}")),
        }
    }
}

/// A file download response built from bytes already in memory.
pub struct FileResponse;

impl FileResponse {
    /// Creates a response carrying `data` named `filename`.
    ///
    /// The content type is inferred from the filename's extension. With
    /// `as_attachment` the `Content-Disposition` header asks the client to
    /// save the file.
    pub fn from_bytes(data: Vec<u8>, filename: &str, as_attachment: bool) -> HttpResponse {
        let content_type = std::path::Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or("application/octet-stream", mime_from_extension);

        let mut response = HttpResponse::with_bytes(StatusCode::OK, data);
        response.set_content_type(content_type);
        if as_attachment {
            response.set_attachment(filename);
        }
        response
    }
}

/// A streaming HTTP response.
pub struct StreamingHttpResponse;

impl StreamingHttpResponse {
    /// Creates a streaming response from an async stream.
    pub fn new(stream: BodyStream) -> HttpResponse {
        HttpResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            content: ResponseContent::Streaming(stream),
            charset: "utf-8".to_string(),
            content_type: "application/octet-stream".to_string(),
        }
    }

    /// Creates a streaming response with a custom content type.
    pub fn with_content_type(content_type: &str, stream: BodyStream) -> HttpResponse {
        let mut response = Self::new(stream);
        response.set_content_type(content_type);
        response
    }
}

/// Infers a MIME type from a file extension.
fn mime_from_extension(ext: &str) -> &'static str {
    match ext.to_lowercase().as_str() {
        "html" | "htm" => "text/html",
        "json" => "application/json",
        "xml" => "application/xml",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "pdf" => "application/pdf",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[test]
    fn test_http_response_ok() {
        let resp = HttpResponse::ok("Hello");
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.content_type(), "text/html");
        assert_eq!(resp.charset(), "utf-8");
        assert_eq!(resp.content_bytes().unwrap(), b"Hello");
    }

    #[test]
    fn test_http_response_not_allowed() {
        let resp = HttpResponse::not_allowed(&["POST"]);
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers().get(http::header::ALLOW).unwrap(), "POST");
    }

    #[test]
    fn test_http_response_unauthorized_challenge() {
        let resp = HttpResponse::unauthorized("Invalid credentials", "Token");
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            resp.headers().get(http::header::WWW_AUTHENTICATE).unwrap(),
            "Token"
        );
    }

    #[test]
    fn test_from_error_maps_status() {
        let resp = HttpResponse::from_error(&UtilsError::PermissionDenied("nope".into()));
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(resp.content_type(), "text/plain");
    }

    #[test]
    fn test_from_error_hides_server_error_detail() {
        let resp =
            HttpResponse::from_error(&UtilsError::DatabaseError("connection reset".into()));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = String::from_utf8(resp.content_bytes().unwrap()).unwrap();
        assert_eq!(body, "Internal Server Error");
    }

    #[test]
    fn test_set_attachment_quotes_filename() {
        let mut resp = HttpResponse::ok("");
        resp.set_attachment("report \"q1\".csv");
        assert_eq!(
            resp.headers()
                .get(http::header::CONTENT_DISPOSITION)
                .unwrap()
                .to_str()
                .unwrap(),
            "attachment; filename=\"report \\\"q1\\\".csv\""
        );
    }

    #[test]
    fn test_json_response() {
        let resp = JsonResponse::new(&serde_json::json!({"token": "abc"}));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.content_type(), "application/json");
        let body: serde_json::Value = serde_json::from_slice(&resp.content_bytes().unwrap()).unwrap();
        assert_eq!(body["token"], "abc");
    }

    #[test]
    fn test_json_response_with_status() {
        let resp = JsonResponse::with_status(StatusCode::BAD_REQUEST, &serde_json::json!({}));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(resp.full_content_type(), "application/json; charset=utf-8");
    }

    #[test]
    fn test_file_response_from_bytes() {
        let resp = FileResponse::from_bytes(vec![1, 2, 3], "archive.zip", true);
        assert_eq!(resp.content_type(), "application/zip");
        assert_eq!(resp.full_content_type(), "application/zip");
        assert_eq!(
            resp.headers().get(http::header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"archive.zip\""
        );
        assert_eq!(resp.content_bytes().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_file_response_inline() {
        let resp = FileResponse::from_bytes(Vec::new(), "noext", false);
        assert_eq!(resp.content_type(), "application/octet-stream");
        assert!(resp.headers().get(http::header::CONTENT_DISPOSITION).is_none());
    }

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(mime_from_extension("csv"), "text/csv");
        assert_eq!(mime_from_extension("ZIP"), "application/zip");
        assert_eq!(mime_from_extension("unknown"), "application/octet-stream");
    }

    #[test]
    fn test_response_content_debug() {
        let debug = format!("{:?}", ResponseContent::Text("hello".to_string()));
        assert!(debug.contains("hello"));
        let debug = format!("{:?}", ResponseContent::Bytes(vec![1, 2, 3]));
        assert!(debug.contains('3'));
    }

    #[tokio::test]
    async fn test_into_response_with_custom_header() {
        let resp = HttpResponse::ok("test").set_header(
            http::header::HeaderName::from_static("x-custom"),
            HeaderValue::from_static("custom-value"),
        );
        let axum_resp = resp.into_response();
        assert_eq!(axum_resp.status(), StatusCode::OK);
        assert_eq!(axum_resp.headers().get("x-custom").unwrap(), "custom-value");
        let ct = axum_resp.headers().get(http::header::CONTENT_TYPE).unwrap();
        assert_eq!(ct, "text/html; charset=utf-8");
        let body = axum_resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"test");
    }

    #[tokio::test]
    async fn test_streaming_response_body() {
        let chunks = vec![Ok(Bytes::from("a,b\r\n")), Ok(Bytes::from("1,2\r\n"))];
        let resp = StreamingHttpResponse::with_content_type(
            "text/csv",
            Box::pin(futures::stream::iter(chunks)),
        );
        assert!(resp.is_streaming());
        assert!(resp.content_bytes().is_none());

        let axum_resp = resp.into_response();
        let body = axum_resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"a,b\r\n1,2\r\n");
    }
}
