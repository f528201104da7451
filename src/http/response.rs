//! HTTP response building module
//!
//! Builders for every status the server emits. All of them share the
//! `ResponseBody` type so file streams and fixed bodies can be returned from
//! the same handler.

use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full};
use hyper::body::Bytes;
use hyper::header::{
    HeaderValue, ALLOW, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG, LAST_MODIFIED,
    LOCATION, X_CONTENT_TYPE_OPTIONS,
};
use hyper::{Response, StatusCode};
use std::io;

use super::cache::Validators;
use crate::error::ServeError;

/// Body type of every response: either a fixed buffer or a file stream
pub type ResponseBody = UnsyncBoxBody<Bytes, io::Error>;

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";
const TEXT_HTML: &str = "text/html; charset=utf-8";

/// Body from an in-memory buffer
pub fn full<T: Into<Bytes>>(chunk: T) -> ResponseBody {
    Full::new(chunk.into())
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Zero-length body
pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed_unsync()
}

/// Build a plain-text error response
///
/// Mirrors what browsers and tools expect from a minimal file server: a short
/// body, no sniffing.
pub fn build_text_response(status: StatusCode, message: &'static str) -> Response<ResponseBody> {
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, TEXT_PLAIN)
        .header(X_CONTENT_TYPE_OPTIONS, "nosniff")
        .header(CONTENT_LENGTH, message.len())
        .body(full(message))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            fallback(status)
        })
}

/// Build the response for a classified filesystem failure
pub fn build_error_response(err: &ServeError) -> Response<ResponseBody> {
    build_text_response(err.status(), err.body())
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<ResponseBody> {
    build_error_response(&ServeError::NotFound)
}

/// Build 400 Bad Request response
pub fn build_400_response() -> Response<ResponseBody> {
    build_text_response(StatusCode::BAD_REQUEST, "400 Bad Request\n")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<ResponseBody> {
    let mut resp = build_text_response(StatusCode::METHOD_NOT_ALLOWED, "405 method not allowed\n");
    resp.headers_mut()
        .insert(ALLOW, HeaderValue::from_static("GET, HEAD"));
    resp
}

/// Build 412 Precondition Failed response
pub fn build_412_response() -> Response<ResponseBody> {
    Response::builder()
        .status(StatusCode::PRECONDITION_FAILED)
        .body(empty())
        .unwrap_or_else(|e| {
            log_build_error("412", &e);
            fallback(StatusCode::PRECONDITION_FAILED)
        })
}

/// Build 416 Range Not Satisfiable response
pub fn build_416_response(size: u64) -> Response<ResponseBody> {
    let mut resp = build_text_response(
        StatusCode::RANGE_NOT_SATISFIABLE,
        "invalid range: failed to overlap\n",
    );
    if let Ok(value) = HeaderValue::from_str(&format!("bytes */{size}")) {
        resp.headers_mut().insert(CONTENT_RANGE, value);
    }
    resp
}

/// Build 304 Not Modified response
///
/// Carries the validators but none of the content headers.
pub fn build_304_response(validators: &Validators) -> Response<ResponseBody> {
    let mut builder = Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(ETAG, &validators.etag);
    if let Some(last_modified) = validators.last_modified_header() {
        builder = builder.header(LAST_MODIFIED, last_modified);
    }

    builder.body(empty()).unwrap_or_else(|e| {
        log_build_error("304", &e);
        fallback(StatusCode::NOT_MODIFIED)
    })
}

/// Build 301 redirect response
///
/// `location` may be relative (`docs/`, `../app.js`); clients resolve it
/// against the request URL.
pub fn build_redirect_response(location: &str, is_head: bool) -> Response<ResponseBody> {
    let body = if is_head {
        String::new()
    } else {
        format!(
            "<a href=\"{}\">Moved Permanently</a>.\n\n",
            crate::handler::listing::escape_html(location)
        )
    };

    Response::builder()
        .status(StatusCode::MOVED_PERMANENTLY)
        .header(LOCATION, location)
        .header(CONTENT_TYPE, TEXT_HTML)
        .body(full(body))
        .unwrap_or_else(|e| {
            log_build_error("301", &e);
            fallback(StatusCode::MOVED_PERMANENTLY)
        })
}

/// Build generated HTML response (directory listings)
pub fn build_html_response(
    content: String,
    last_modified: Option<String>,
    is_head: bool,
) -> Response<ResponseBody> {
    let content_length = content.len();
    let body = if is_head { empty() } else { full(content) };

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, TEXT_HTML)
        .header(CONTENT_LENGTH, content_length);
    if let Some(last_modified) = last_modified {
        builder = builder.header(LAST_MODIFIED, last_modified);
    }

    builder.body(body).unwrap_or_else(|e| {
        log_build_error("HTML", &e);
        fallback(StatusCode::INTERNAL_SERVER_ERROR)
    })
}

fn fallback(status: StatusCode) -> Response<ResponseBody> {
    let mut resp = Response::new(empty());
    *resp.status_mut() = status;
    resp
}

/// Log response build error
pub fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_bodies() {
        let resp = build_404_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers()[CONTENT_TYPE], TEXT_PLAIN);
        assert_eq!(resp.headers()[X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(resp.headers()[CONTENT_LENGTH], "19");
    }

    #[test]
    fn test_405_has_allow() {
        let resp = build_405_response();
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(resp.headers()[ALLOW], "GET, HEAD");
    }

    #[test]
    fn test_416_content_range() {
        let resp = build_416_response(1234);
        assert_eq!(resp.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        assert_eq!(resp.headers()[CONTENT_RANGE], "bytes */1234");
    }

    #[test]
    fn test_redirect() {
        let resp = build_redirect_response("docs/", false);
        assert_eq!(resp.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(resp.headers()[LOCATION], "docs/");
    }
}
