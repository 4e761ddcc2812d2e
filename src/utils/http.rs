//! HTTP utility functions

use hyper::header::{HeaderValue, ALLOW, CACHE_CONTROL, CONTENT_TYPE};
use hyper::{Body, Method, Response, StatusCode, Uri};
use serde_json::json;

/// Path answered locally instead of being relayed
pub const HEALTH_PATH: &str = "/health";

/// Build a plain-text error response
pub fn build_error_response(status: StatusCode, message: &str) -> Response<Body> {
    let mut response = Response::new(Body::from(format!("{}\n", message)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"));
    response
}

/// Whether a request targets the proxy's own health endpoint.
///
/// Only origin-form targets (`GET /health`) qualify; an absolute URL whose
/// path happens to be `/health` is relayed like any other request.
pub fn is_health_check(uri: &Uri) -> bool {
    uri.scheme().is_none() && uri.authority().is_none() && uri.path() == HEALTH_PATH
}

/// Build the health endpoint response
pub fn build_health_response(method: &Method, transport: &str, uptime_ms: u64) -> Response<Body> {
    if *method != Method::GET {
        let mut response = build_error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
        response.headers_mut().insert(ALLOW, HeaderValue::from_static("GET"));
        return response;
    }

    let health_data = json!({
        "status": "healthy",
        "service": env!("CARGO_PKG_NAME"),
        "transport": transport,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_ms": uptime_ms,
        "version": env!("CARGO_PKG_VERSION"),
    });

    let mut response = Response::new(Body::from(health_data.to_string()));
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    response
}
