//! HTTP response building module
//!
//! Builders for every response the server sends. A builder that fails logs the
//! error and falls back to an empty response instead of panicking.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Methods allowed on a route, for `Allow` headers
pub type AllowedMethods = &'static str;

const SERIALIZE_FALLBACK: &str = r#"{"error":"Internal server error"}"#;

fn finish(
    status: &str,
    builder: hyper::http::response::Builder,
    body: Bytes,
) -> Response<Full<Bytes>> {
    builder.body(Full::new(body)).unwrap_or_else(|e| {
        log_build_error(status, &e);
        Response::new(Full::new(Bytes::new()))
    })
}

fn plain_text(status: StatusCode, text: &'static str) -> hyper::http::response::Builder {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain; charset=utf-8")
        .header("Content-Length", text.len())
}

/// Build 304 Not Modified response
pub fn build_304_response(etag: &str) -> Response<Full<Bytes>> {
    let builder = Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header("ETag", etag)
        .header("Cache-Control", "no-cache");
    finish("304", builder, Bytes::new())
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    const TEXT: &str = "404 Not Found";
    finish(
        "404",
        plain_text(StatusCode::NOT_FOUND, TEXT),
        Bytes::from_static(TEXT.as_bytes()),
    )
}

/// Build 405 Method Not Allowed response
pub fn build_405_response(allow: AllowedMethods) -> Response<Full<Bytes>> {
    const TEXT: &str = "405 Method Not Allowed";
    finish(
        "405",
        plain_text(StatusCode::METHOD_NOT_ALLOWED, TEXT).header("Allow", allow),
        Bytes::from_static(TEXT.as_bytes()),
    )
}

/// Build OPTIONS response
pub fn build_options_response(allow: AllowedMethods) -> Response<Full<Bytes>> {
    let builder = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Allow", allow);
    finish("OPTIONS", builder, Bytes::new())
}

/// Build 413 Payload Too Large response
pub fn build_413_response() -> Response<Full<Bytes>> {
    const TEXT: &str = "413 Payload Too Large";
    finish(
        "413",
        plain_text(StatusCode::PAYLOAD_TOO_LARGE, TEXT),
        Bytes::from_static(TEXT.as_bytes()),
    )
}

/// Build 500 Internal Server Error response
pub fn build_500_response() -> Response<Full<Bytes>> {
    const TEXT: &str = "500 Internal Server Error";
    finish(
        "500",
        plain_text(StatusCode::INTERNAL_SERVER_ERROR, TEXT),
        Bytes::from_static(TEXT.as_bytes()),
    )
}

/// Build health probe response
pub fn build_health_response(is_head: bool) -> Response<Full<Bytes>> {
    const TEXT: &str = "ok";
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from_static(TEXT.as_bytes())
    };
    finish(
        "health",
        plain_text(StatusCode::OK, TEXT).header("Cache-Control", "no-store"),
        body,
    )
}

/// Build generic HTML response
pub fn build_html_response(content: String, is_head: bool) -> Response<Full<Bytes>> {
    let content_length = content.len();
    let body = if is_head {
        Bytes::new()
    } else {
        Bytes::from(content)
    };

    let builder = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", "text/html; charset=utf-8")
        .header("Content-Length", content_length)
        .header("Cache-Control", "no-cache");
    finish("HTML", builder, body)
}

/// Build JSON response
pub fn build_json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    match serde_json::to_vec(body) {
        Ok(json) => {
            let builder = Response::builder()
                .status(status)
                .header("Content-Type", "application/json")
                .header("Content-Length", json.len());
            finish("JSON", builder, Bytes::from(json))
        }
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            let builder = Response::builder()
                .status(StatusCode::INTERNAL_SERVER_ERROR)
                .header("Content-Type", "application/json");
            finish("JSON", builder, Bytes::from_static(SERIALIZE_FALLBACK.as_bytes()))
        }
    }
}

/// Build static file response with `ETag`
///
/// Outputs are overwritten in place, so clients revalidate on every use.
pub fn build_cached_response(
    data: Bytes,
    content_type: &str,
    etag: &str,
    is_head: bool,
) -> Response<Full<Bytes>> {
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    let builder = Response::builder()
        .status(StatusCode::OK)
        .header("Content-Type", content_type)
        .header("Content-Length", content_length)
        .header("ETag", etag)
        .header("Cache-Control", "no-cache");
    finish("200", builder, body)
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
