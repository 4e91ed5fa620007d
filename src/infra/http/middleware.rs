//! Request tracing shared by the public and operator listeners.

use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{Instrument, debug, error, info_span, warn};
use uuid::Uuid;

use crate::application::error::ErrorReport;

pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

const MAX_FORWARDED_ID_LEN: usize = 64;

/// Tags the request with an id, runs it inside a span and logs how it ended.
///
/// An `x-request-id` set by a proxy in front of us is kept when it is short printable
/// ASCII; otherwise a fresh UUID is minted. The id is echoed on the response.
pub async fn trace_requests(request: Request<Body>, next: Next) -> Response {
    let request_id = forwarded_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = info_span!(
        target: "folio::http",
        "request",
        method = %method,
        path = %path,
        request_id = %request_id,
    );
    let started = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;
    let elapsed_ms = started.elapsed().as_millis();

    let report = response.extensions_mut().remove::<ErrorReport>();
    span.in_scope(|| log_outcome(&method, response.status(), elapsed_ms, report));

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(REQUEST_ID_HEADER, value);
    }
    response
}

fn forwarded_id(request: &Request<Body>) -> Option<String> {
    let value = request.headers().get(&REQUEST_ID_HEADER)?.to_str().ok()?.trim();
    let usable = !value.is_empty()
        && value.len() <= MAX_FORWARDED_ID_LEN
        && value.bytes().all(|byte| byte.is_ascii_graphic());
    usable.then(|| value.to_string())
}

fn log_outcome(method: &Method, status: StatusCode, elapsed_ms: u128, report: Option<ErrorReport>) {
    if !status.is_client_error() && !status.is_server_error() {
        debug!(
            target = "folio::http::response",
            status = status.as_u16(),
            elapsed_ms,
            "request served"
        );
        return;
    }

    let (source, messages) = report
        .map(|report| (report.source, report.messages))
        .unwrap_or(("unknown", Vec::new()));
    let detail = messages
        .first()
        .map(String::as_str)
        .unwrap_or("no diagnostic available");

    if status.is_server_error() {
        error!(
            target = "folio::http::response",
            status = status.as_u16(),
            %method,
            elapsed_ms,
            source,
            detail,
            chain = ?messages,
            "request failed"
        );
    } else {
        warn!(
            target = "folio::http::response",
            status = status.as_u16(),
            %method,
            elapsed_ms,
            source,
            detail,
            "client request error"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with(id: &str) -> Request<Body> {
        Request::builder()
            .uri("/blog")
            .header(&REQUEST_ID_HEADER, id)
            .body(Body::empty())
            .expect("request")
    }

    #[test]
    fn forwarded_ids_are_kept_when_printable() {
        assert_eq!(
            forwarded_id(&request_with("edge-7f3a")).as_deref(),
            Some("edge-7f3a")
        );
    }

    #[test]
    fn blank_or_oversized_forwarded_ids_are_replaced() {
        assert_eq!(forwarded_id(&request_with("   ")), None);
        assert_eq!(forwarded_id(&request_with(&"a".repeat(65))), None);
        assert_eq!(forwarded_id(&request_with("has space")), None);

        let bare = Request::builder().body(Body::empty()).expect("request");
        assert_eq!(forwarded_id(&bare), None);
    }
}
