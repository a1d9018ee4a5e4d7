//! Result processing endpoint
//!
//! `POST /process` with form field `image_name`. Responds with
//! `{"processed_images": [...]}` or `{"error": "..."}`; error detail beyond
//! the public message only goes to the server log.

use crate::config::AppState;
use crate::gallery::ProcessError;
use crate::http;
use crate::logger;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use std::sync::Arc;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data";
const IMAGE_NAME_FIELD: &str = "image_name";

pub async fn handle_process<B>(
    headers: &HeaderMap,
    body: B,
    state: &Arc<AppState>,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let max_body_size = state.config.http.max_body_size;
    if let Some(resp) = check_body_size(headers, max_body_size) {
        return resp;
    }

    let limit = usize::try_from(max_body_size).unwrap_or(usize::MAX);
    let bytes = match Limited::new(body, limit).collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            logger::log_error(&format!(
                "Request body too large (max: {max_body_size} bytes)"
            ));
            return http::build_413_response();
        }
        Err(e) => {
            return error_response(&ProcessError::Processing(format!(
                "failed to read request body: {e}"
            )));
        }
    };

    let image_name = form_field(headers, &bytes, IMAGE_NAME_FIELD).await;

    let task_state = Arc::clone(state);
    let outcome = tokio::task::spawn_blocking(move || {
        task_state.copier.process(image_name.as_deref())
    })
    .await
    .unwrap_or_else(|e| Err(ProcessError::Processing(format!("worker task failed: {e}"))));

    match outcome {
        Ok(processed) => http::build_json_response(StatusCode::OK, &processed),
        Err(err) => error_response(&err),
    }
}

fn error_response(err: &ProcessError) -> Response<Full<Bytes>> {
    logger::log_error(&format!("[{}] {err}", err.category()));
    http::build_json_response(
        err.status(),
        &serde_json::json!({ "error": err.client_message() }),
    )
}

/// How a `/process` body encodes its form fields
#[derive(Debug, PartialEq, Eq)]
enum FormEncoding {
    UrlEncoded,
    Multipart { boundary: String },
}

/// Form encoding from `Content-Type`; a missing header means url-encoded
fn form_encoding(headers: &HeaderMap) -> Option<FormEncoding> {
    let Some(content_type) = headers.get(CONTENT_TYPE) else {
        return Some(FormEncoding::UrlEncoded);
    };
    let content_type = content_type.to_str().ok()?;
    let mime = content_type.split(';').next().unwrap_or_default().trim();

    if mime.eq_ignore_ascii_case(FORM_CONTENT_TYPE) {
        Some(FormEncoding::UrlEncoded)
    } else if mime.eq_ignore_ascii_case(MULTIPART_CONTENT_TYPE) {
        match multer::parse_boundary(content_type) {
            Ok(boundary) => Some(FormEncoding::Multipart { boundary }),
            Err(e) => {
                logger::log_warning(&format!("Invalid multipart Content-Type: {e}"));
                None
            }
        }
    } else {
        None
    }
}

/// First value of `field` in a url-encoded or multipart form body
///
/// Bodies with another declared content type carry no form fields.
async fn form_field(headers: &HeaderMap, body: &[u8], field: &str) -> Option<String> {
    match form_encoding(headers) {
        Some(FormEncoding::UrlEncoded) => url::form_urlencoded::parse(body)
            .find(|(key, _)| key == field)
            .map(|(_, value)| value.into_owned()),
        Some(FormEncoding::Multipart { boundary }) => {
            multipart_field(body, boundary, field).await
        }
        None => {
            logger::log_warning("Ignoring /process body that is not form data");
            None
        }
    }
}

async fn multipart_field(body: &[u8], boundary: String, field: &str) -> Option<String> {
    let mut multipart = multer::Multipart::with_reader(body, boundary);
    loop {
        match multipart.next_field().await {
            Ok(Some(part)) if part.name() == Some(field) => {
                return match part.text().await {
                    Ok(value) => Some(value),
                    Err(e) => {
                        logger::log_warning(&format!("Unreadable multipart field {field}: {e}"));
                        None
                    }
                };
            }
            Ok(Some(_)) => {}
            Ok(None) => return None,
            Err(e) => {
                logger::log_warning(&format!("Malformed multipart body: {e}"));
                return None;
            }
        }
    }
}

/// Validate Content-Length header and return 413 if exceeded
fn check_body_size(headers: &HeaderMap, max_body_size: u64) -> Option<Response<Full<Bytes>>> {
    let content_length = headers.get(CONTENT_LENGTH)?;
    content_length.to_str().map_or_else(
        |_| {
            logger::log_warning("Content-Length header contains non-ASCII characters");
            None
        },
        |size_str| match size_str.parse::<u64>() {
            Ok(size) if size > max_body_size => {
                logger::log_error(&format!(
                    "Request body too large: {size} bytes (max: {max_body_size})"
                ));
                Some(http::build_413_response())
            }
            Err(_) => {
                logger::log_warning(&format!(
                    "Invalid Content-Length value: '{size_str}', skipping size check"
                ));
                None
            }
            _ => None,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::header::HeaderValue;

    fn form_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        headers
    }

    fn multipart_body(boundary: &str, fields: &[(&str, &str)]) -> Vec<u8> {
        let mut body = String::new();
        for (name, value) in fields {
            body.push_str(&format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            ));
        }
        body.push_str(&format!("--{boundary}--\r\n"));
        body.into_bytes()
    }

    #[tokio::test]
    async fn test_form_field_decoding() {
        let headers = form_headers();
        assert_eq!(
            form_field(&headers, b"image_name=my+photo%2Epng&x=1", IMAGE_NAME_FIELD).await,
            Some("my photo.png".to_string())
        );
        assert_eq!(
            form_field(&headers, b"image_name=a.png&image_name=b.png", IMAGE_NAME_FIELD).await,
            Some("a.png".to_string())
        );
        assert_eq!(form_field(&headers, b"other=1", IMAGE_NAME_FIELD).await, None);
        assert_eq!(
            form_field(&headers, b"image_name=", IMAGE_NAME_FIELD).await,
            Some(String::new())
        );
    }

    #[tokio::test]
    async fn test_form_field_content_types() {
        assert_eq!(
            form_field(&HeaderMap::new(), b"image_name=a.png", IMAGE_NAME_FIELD).await,
            Some("a.png".to_string())
        );

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded; charset=UTF-8"),
        );
        assert!(form_field(&headers, b"image_name=a.png", IMAGE_NAME_FIELD)
            .await
            .is_some());

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert_eq!(
            form_field(&headers, br#"{"image_name":"a.png"}"#, IMAGE_NAME_FIELD).await,
            None
        );
    }

    #[tokio::test]
    async fn test_form_field_multipart() {
        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("multipart/form-data; boundary=XyZ123"),
        );

        let body = multipart_body("XyZ123", &[("other", "1"), ("image_name", "cat.png")]);
        assert_eq!(
            form_field(&headers, &body, IMAGE_NAME_FIELD).await,
            Some("cat.png".to_string())
        );

        let body = multipart_body("XyZ123", &[("other", "1")]);
        assert_eq!(form_field(&headers, &body, IMAGE_NAME_FIELD).await, None);

        // Boundary parameter is required
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("multipart/form-data"));
        assert_eq!(form_encoding(&headers), None);
    }

    #[test]
    fn test_check_body_size() {
        let mut headers = HeaderMap::new();
        assert!(check_body_size(&headers, 10).is_none());

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("10"));
        assert!(check_body_size(&headers, 10).is_none());

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("11"));
        let resp = check_body_size(&headers, 10).unwrap();
        assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
