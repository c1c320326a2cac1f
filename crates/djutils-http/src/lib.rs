//! # djutils-http
//!
//! HTTP layer for djutils. Provides the request and response types used by
//! the token endpoint and the export helpers.

pub mod request;
pub mod response;

pub use request::{HttpRequest, HttpRequestBuilder};
pub use response::{
    BodyStream, FileResponse, HttpResponse, JsonResponse, ResponseContent, StreamingHttpResponse,
};
