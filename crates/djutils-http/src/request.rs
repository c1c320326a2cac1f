//! HTTP request type.
//!
//! [`HttpRequest`] carries what the token endpoint reads from a request: the
//! method, the headers, the declared content type and the raw body, with
//! form-encoded bodies parsed up front. Instances are created from an
//! incoming Axum request via [`HttpRequest::from_axum`], or with
//! [`HttpRequest::builder`] in tests.

use std::collections::HashMap;

use http::{HeaderMap, Method};
use serde::de::DeserializeOwned;

use djutils_core::UtilsError;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// An HTTP request.
///
/// # Examples
///
/// ```
/// use djutils_http::HttpRequest;
///
/// let request = HttpRequest::builder()
///     .method(http::Method::POST)
///     .content_type("application/x-www-form-urlencoded")
///     .body(b"username=alice".to_vec())
///     .build();
///
/// assert_eq!(request.method(), &http::Method::POST);
/// assert_eq!(request.form_value("username"), Some("alice"));
/// ```
#[derive(Debug)]
pub struct HttpRequest {
    method: Method,
    content_type: Option<String>,
    headers: HeaderMap,
    form: HashMap<String, String>,
    body: Vec<u8>,
}

impl HttpRequest {
    /// Creates a new [`HttpRequestBuilder`] for constructing an `HttpRequest`.
    pub fn builder() -> HttpRequestBuilder {
        HttpRequestBuilder::default()
    }

    /// Creates an `HttpRequest` from Axum request parts and the body bytes.
    pub fn from_axum(parts: http::request::Parts, body: Vec<u8>) -> Self {
        let content_type = parts
            .headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);
        Self::assemble(parts.method, content_type, parts.headers, body)
    }

    fn assemble(
        method: Method,
        content_type: Option<String>,
        headers: HeaderMap,
        body: Vec<u8>,
    ) -> Self {
        let form = if content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with(FORM_CONTENT_TYPE))
        {
            parse_form(&body)
        } else {
            HashMap::new()
        };

        Self {
            method,
            content_type,
            headers,
            form,
            body,
        }
    }

    /// Returns the HTTP method.
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the content type of the request body, if set.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Returns `true` when the body is declared as JSON.
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.starts_with("application/json"))
    }

    /// Returns the first value of a form body parameter.
    pub fn form_value(&self, name: &str) -> Option<&str> {
        self.form.get(name).map(String::as_str)
    }

    /// Returns the request headers.
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the raw bytes of the `Authorization` header, if present.
    ///
    /// Bytes are returned as received so callers can reject values that are
    /// not valid UTF-8 themselves.
    pub fn authorization_header(&self) -> Option<&[u8]> {
        self.headers
            .get(http::header::AUTHORIZATION)
            .map(http::HeaderValue::as_bytes)
    }

    /// Deserializes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`UtilsError::BadRequest`] when the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, UtilsError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| UtilsError::BadRequest(format!("JSON parse error: {e}")))
    }
}

/// Parses a form-encoded body. Repeated keys keep their first value.
fn parse_form(input: &[u8]) -> HashMap<String, String> {
    let mut form = HashMap::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        form.entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    form
}

/// Builder for constructing [`HttpRequest`] instances in tests.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    method: Method,
    content_type: Option<String>,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Default for HttpRequestBuilder {
    fn default() -> Self {
        Self {
            method: Method::GET,
            content_type: None,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }
}

impl HttpRequestBuilder {
    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Sets the content type.
    #[must_use]
    pub fn content_type(mut self, ct: &str) -> Self {
        self.content_type = Some(ct.to_string());
        self
    }

    /// Adds a header.
    #[must_use]
    pub fn header(self, name: &str, value: &str) -> Self {
        self.header_bytes(name, value.as_bytes())
    }

    /// Adds a header whose value is given as raw bytes.
    ///
    /// Values `http` refuses (control characters) are silently dropped.
    #[must_use]
    pub fn header_bytes(mut self, name: &str, value: &[u8]) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::header::HeaderName::from_bytes(name.as_bytes()),
            http::header::HeaderValue::from_bytes(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Sets a JSON body and the matching content type.
    #[must_use]
    pub fn json(mut self, value: &serde_json::Value) -> Self {
        self.content_type = Some("application/json".to_string());
        self.body = value.to_string().into_bytes();
        self
    }

    /// Builds the [`HttpRequest`].
    pub fn build(self) -> HttpRequest {
        HttpRequest::assemble(self.method, self.content_type, self.headers, self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let req = HttpRequest::builder().build();
        assert_eq!(req.method(), &Method::GET);
        assert!(req.content_type().is_none());
        assert!(!req.is_json());
        assert!(req.authorization_header().is_none());
    }

    #[test]
    fn test_form_body() {
        let req = HttpRequest::builder()
            .method(Method::POST)
            .content_type("application/x-www-form-urlencoded; charset=utf-8")
            .body(b"username=alice&password=s%26cret&username=bob".to_vec())
            .build();
        assert_eq!(req.form_value("username"), Some("alice"));
        assert_eq!(req.form_value("password"), Some("s&cret"));
        assert_eq!(req.form_value("missing"), None);
    }

    #[test]
    fn test_non_form_body_is_not_parsed() {
        let req = HttpRequest::builder()
            .method(Method::POST)
            .content_type("text/plain")
            .body(b"username=alice".to_vec())
            .build();
        assert_eq!(req.form_value("username"), None);
    }

    #[test]
    fn test_json_body() {
        let req = HttpRequest::builder()
            .method(Method::POST)
            .json(&serde_json::json!({"username": "alice"}))
            .build();
        assert!(req.is_json());
        let value: serde_json::Value = req.json().unwrap();
        assert_eq!(value["username"], "alice");
    }

    #[test]
    fn test_json_body_invalid() {
        let req = HttpRequest::builder()
            .content_type("application/json")
            .body(b"{not json".to_vec())
            .build();
        let err = req.json::<serde_json::Value>().unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_authorization_header_raw_bytes() {
        let req = HttpRequest::builder()
            .header_bytes("authorization", b"Token \xff\xfe")
            .build();
        assert_eq!(req.authorization_header(), Some(&b"Token \xff\xfe"[..]));
    }

    #[test]
    fn test_from_axum() {
        let request = http::Request::builder()
            .method(Method::POST)
            .uri("http://example.com/token/")
            .header("authorization", "Token abc")
            .header("content-type", "application/x-www-form-urlencoded")
            .body(())
            .unwrap();

        let (parts, ()) = request.into_parts();
        let req = HttpRequest::from_axum(parts, b"username=bob&password=pw".to_vec());

        assert_eq!(req.method(), &Method::POST);
        assert_eq!(req.authorization_header(), Some(&b"Token abc"[..]));
        assert_eq!(req.headers().len(), 2);
        assert_eq!(req.form_value("username"), Some("bob"));
    }
}
