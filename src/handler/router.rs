//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, route matching,
//! dispatching and access logging.

use crate::config::AppState;
use crate::gallery;
use crate::handler::{process, static_files};
use crate::http::{self, response::AllowedMethods};
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, HeaderValue, IF_NONE_MATCH, REFERER, SERVER, USER_AGENT};
use hyper::{Method, Request, Response};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

/// URL prefix under which the static root is served
pub const STATIC_PREFIX: &str = "/static/";

const READ_METHODS: AllowedMethods = "GET, HEAD, OPTIONS";
const PROCESS_METHODS: AllowedMethods = "POST, OPTIONS";

/// Request context encapsulating information needed for request processing
pub struct RequestContext<'a> {
    pub path: &'a str,
    pub is_head: bool,
    pub if_none_match: Option<String>,
}

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let started = Instant::now();
    let (parts, body) = req.into_parts();

    let mut entry = state.config.logging.access_log.then(|| {
        let header = |name: HeaderName| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(ToString::to_string)
        };
        let mut entry = AccessLogEntry::new(
            peer_addr.ip().to_string(),
            parts.method.to_string(),
            parts.uri.path().to_string(),
        );
        entry.query = parts.uri.query().map(ToString::to_string);
        entry.http_version = version_label(parts.version).to_string();
        entry.referer = header(REFERER);
        entry.user_agent = header(USER_AGENT);
        entry
    });

    let ctx = RequestContext {
        path: parts.uri.path(),
        is_head: parts.method == Method::HEAD,
        if_none_match: parts
            .headers
            .get(IF_NONE_MATCH)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string),
    };

    let mut response = route_request(&ctx, &parts.method, &parts.headers, body, &state).await;

    if let Ok(server) = HeaderValue::from_str(&state.config.http.server_name) {
        response.headers_mut().insert(SERVER, server);
    }

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.request_time_us =
            u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

const fn version_label(version: hyper::Version) -> &'static str {
    match version {
        hyper::Version::HTTP_09 => "0.9",
        hyper::Version::HTTP_10 => "1.0",
        hyper::Version::HTTP_2 => "2",
        hyper::Version::HTTP_3 => "3",
        _ => "1.1",
    }
}

/// Route request based on path and method
async fn route_request<B>(
    ctx: &RequestContext<'_>,
    method: &Method,
    headers: &hyper::HeaderMap,
    body: B,
    state: &Arc<AppState>,
) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let health = &state.config.health;
    if health.enabled && (ctx.path == health.liveness_path || ctx.path == health.readiness_path) {
        return read_only(method, || async { http::build_health_response(ctx.is_head) }).await;
    }

    match ctx.path {
        "/" => read_only(method, || serve_gallery_page(ctx, state)).await,
        "/process" => match *method {
            Method::POST => process::handle_process(headers, body, state).await,
            Method::OPTIONS => http::build_options_response(PROCESS_METHODS),
            _ => method_not_allowed(method, PROCESS_METHODS),
        },
        path => match path.strip_prefix(STATIC_PREFIX) {
            Some(relative) => {
                read_only(method, || {
                    static_files::serve_static(ctx, state.layout.static_root(), relative)
                })
                .await
            }
            None => http::build_404_response(),
        },
    }
}

/// Dispatch GET/HEAD to `serve`, answer OPTIONS, refuse everything else
async fn read_only<F, Fut>(method: &Method, serve: F) -> Response<Full<Bytes>>
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Response<Full<Bytes>>>,
{
    match *method {
        Method::GET | Method::HEAD => serve().await,
        Method::OPTIONS => http::build_options_response(READ_METHODS),
        _ => method_not_allowed(method, READ_METHODS),
    }
}

fn method_not_allowed(method: &Method, allow: AllowedMethods) -> Response<Full<Bytes>> {
    logger::log_warning(&format!("Method not allowed: {method}"));
    http::build_405_response(allow)
}

/// Render the gallery listing page
async fn serve_gallery_page(
    ctx: &RequestContext<'_>,
    state: &Arc<AppState>,
) -> Response<Full<Bytes>> {
    let layout = &state.layout;
    let images = match gallery::list_images(layout.images_dir(), layout.extensions()).await {
        Ok(images) => images,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to list gallery directory {}: {e}",
                layout.images_dir().display()
            ));
            return http::build_500_response();
        }
    };

    let images_url = format!(
        "{STATIC_PREFIX}{}",
        state.config.gallery.images_dir.trim_matches('/')
    );
    let html = gallery::render_gallery_page(&images, &images_url);
    http::build_html_response(html, ctx.is_head)
}
