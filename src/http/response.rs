//! HTTP response building module
//!
//! Builders for every response the server emits. A builder failure cannot
//! come from user input; it is logged and replaced by an empty response.

use std::convert::Infallible;

use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Bytes;
use hyper::header::{
    ACCEPT_RANGES, ALLOW, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG,
    LAST_MODIFIED, LOCATION,
};
use hyper::http::response::Builder;
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::logger;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const REGISTRY_CACHE_CONTROL: &str = "public, max-age=300";

/// Response body: in-memory for generated content, streamed for files
pub type ResponseBody = UnsyncBoxBody<Bytes, std::io::Error>;

pub type HttpResponse = Response<ResponseBody>;

/// Body holding `bytes` in memory
pub fn full(bytes: impl Into<Bytes>) -> ResponseBody {
    Full::new(bytes.into())
        .map_err(|never: Infallible| match never {})
        .boxed_unsync()
}

pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new().map_err(|never: Infallible| match never {}).boxed_unsync()
}

/// Plain-text error body, newline terminated
pub fn plain_text(status: StatusCode, message: &str) -> HttpResponse {
    let builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, TEXT_PLAIN)
        .header("X-Content-Type-Options", "nosniff");
    finish(builder, Bytes::from(format!("{message}\n")), status.as_str())
}

pub fn build_400_response() -> HttpResponse {
    plain_text(StatusCode::BAD_REQUEST, "400 bad request")
}

pub fn build_403_response() -> HttpResponse {
    plain_text(StatusCode::FORBIDDEN, "403 forbidden")
}

pub fn build_404_response() -> HttpResponse {
    plain_text(StatusCode::NOT_FOUND, "404 page not found")
}

pub fn build_405_response() -> HttpResponse {
    let builder = Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header(CONTENT_TYPE, TEXT_PLAIN)
        .header(ALLOW, "GET, HEAD");
    finish(builder, Bytes::from_static(b"405 method not allowed\n"), "405")
}

pub fn build_500_response(message: &str) -> HttpResponse {
    plain_text(StatusCode::INTERNAL_SERVER_ERROR, message)
}

/// 301 to `location`, used to add the trailing slash to directories
pub fn build_redirect_response(location: &str) -> HttpResponse {
    let builder = Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(LOCATION, location)
        .header(CONTENT_TYPE, TEXT_PLAIN);
    finish(builder, Bytes::new(), "301")
}

pub fn build_304_response(etag: &str, last_modified: Option<&str>) -> HttpResponse {
    let mut builder = Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(ETAG, etag)
        .header(CACHE_CONTROL, REGISTRY_CACHE_CONTROL);
    if let Some(date) = last_modified {
        builder = builder.header(LAST_MODIFIED, date);
    }
    finish(builder, Bytes::new(), "304")
}

pub fn build_416_response(len: u64) -> HttpResponse {
    let builder = Response::builder()
        .status(StatusCode::RANGE_NOT_SATISFIABLE)
        .header(CONTENT_TYPE, TEXT_PLAIN)
        .header(CONTENT_RANGE, format!("bytes */{len}"));
    finish(builder, Bytes::from_static(b"416 range not satisfiable\n"), "416")
}

/// JSON body with a trailing newline.
///
/// Serialization errors are returned so the caller can log them with its
/// own request context.
pub fn build_json_response<T: Serialize + ?Sized>(
    status: StatusCode,
    value: &T,
) -> Result<HttpResponse, serde_json::Error> {
    let mut body = serde_json::to_vec(value)?;
    body.push(b'\n');
    let builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .header(CONTENT_LENGTH, body.len());
    Ok(finish(builder, Bytes::from(body), "JSON"))
}

pub fn build_html_response(html: String) -> HttpResponse {
    let builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/html; charset=utf-8")
        .header(CONTENT_LENGTH, html.len());
    finish(builder, Bytes::from(html), "HTML")
}

/// Representation metadata shared by full and partial file responses
pub struct FileHeaders<'a> {
    pub content_type: &'a str,
    pub etag: &'a str,
    pub last_modified: Option<&'a str>,
}

/// 200 response carrying a whole file of `len` bytes
pub fn build_file_response(body: ResponseBody, len: u64, headers: &FileHeaders<'_>) -> HttpResponse {
    let builder = file_builder(StatusCode::OK, headers).header(CONTENT_LENGTH, len);
    finish_body(builder, body, "200")
}

/// 206 response carrying bytes `start..=end` of a `total` byte file
pub fn build_partial_response(
    body: ResponseBody,
    start: u64,
    end: u64,
    total: u64,
    headers: &FileHeaders<'_>,
) -> HttpResponse {
    let builder = file_builder(StatusCode::PARTIAL_CONTENT, headers)
        .header(CONTENT_LENGTH, end - start + 1)
        .header(CONTENT_RANGE, format!("bytes {start}-{end}/{total}"));
    finish_body(builder, body, "206")
}

fn file_builder(status: StatusCode, headers: &FileHeaders<'_>) -> Builder {
    let mut builder = Response::builder()
        .status(status)
        .header(CONTENT_TYPE, headers.content_type)
        .header(ACCEPT_RANGES, "bytes")
        .header(ETAG, headers.etag)
        .header(CACHE_CONTROL, REGISTRY_CACHE_CONTROL);
    if let Some(date) = headers.last_modified {
        builder = builder.header(LAST_MODIFIED, date);
    }
    builder
}

/// Drop the body but keep status and headers, for HEAD requests
pub fn without_body(response: HttpResponse) -> HttpResponse {
    let (parts, _) = response.into_parts();
    Response::from_parts(parts, empty())
}

fn finish(builder: Builder, body: Bytes, label: &str) -> HttpResponse {
    finish_body(builder, full(body), label)
}

fn finish_body(builder: Builder, body: ResponseBody, label: &str) -> HttpResponse {
    builder.body(body).unwrap_or_else(|e| {
        logger::log_error(&format!("Failed to build {label} response: {e}"));
        Response::new(empty())
    })
}
