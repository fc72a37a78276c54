//! Response enrichment (pass-through path) and substitute responses
//! (intercepted path).
//!
//! Header merge rules:
//! - injected headers replace downstream ones with the same name;
//! - `Set-Cookie` is appended after the downstream cookies instead, one
//!   entry per cookie, so the application's cookies survive;
//! - names or values that are not valid HTTP are skipped with a warning.

use std::time::Duration;

use axum::body::Body;
use axum::http::header::{HeaderName, HeaderValue, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use bytes::Bytes;

use vgate_core::{HeaderBag, Verdict};

/// Elapsed verdict time in seconds, or `-1` after a timeout.
pub const TIMING_HEADER: &str = "x-datadome-elapsed";

#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseEnricher {
    expose_headers: bool,
}

impl ResponseEnricher {
    pub fn new(expose_headers: bool) -> Self {
        Self { expose_headers }
    }

    pub fn exposes_headers(&self) -> bool {
        self.expose_headers
    }

    /// Merge verdict headers into a downstream response's headers.
    pub fn enrich(&self, headers: &mut HeaderMap, verdict: &Verdict, elapsed: Duration) {
        merge_headers(headers, &verdict.response_headers);

        if self.expose_headers {
            merge_headers(headers, &verdict.request_headers);
            let timing = if verdict.timed_out {
                "-1".to_string()
            } else {
                format!("{:.6}", elapsed.as_secs_f64())
            };
            if let Ok(v) = HeaderValue::from_str(&timing) {
                headers.insert(HeaderName::from_static(TIMING_HEADER), v);
            }
        }
    }
}

/// Case-insensitive merge with cookie concatenation.
pub fn merge_headers(dst: &mut HeaderMap, added: &HeaderBag) {
    for (name, value) in added.iter() {
        let Ok(name) = HeaderName::from_bytes(name.as_bytes()) else {
            tracing::warn!(header = %name, "skipping invalid verdict header name");
            continue;
        };

        if name == SET_COOKIE {
            for line in cookie_lines(value) {
                match HeaderValue::from_maybe_shared(line) {
                    Ok(v) => {
                        dst.append(SET_COOKIE, v);
                    }
                    Err(_) => tracing::warn!("skipping invalid Set-Cookie value from verdict"),
                }
            }
            continue;
        }

        match HeaderValue::from_maybe_shared(value.clone()) {
            Ok(v) => {
                dst.insert(name, v);
            }
            Err(_) => tracing::warn!(header = %name, "skipping invalid verdict header value"),
        }
    }
}

/// Newline-separated cookies become separate entries; blank lines are dropped.
fn cookie_lines(value: &Bytes) -> impl Iterator<Item = Bytes> + '_ {
    value
        .split(|b| *b == b'\n')
        .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
        .filter(|line| !line.is_empty())
        .map(|line| value.slice_ref(line))
}

/// Response sent instead of calling the application.
pub fn substitute_response(verdict: &Verdict) -> Response {
    let mut headers = HeaderMap::new();
    merge_headers(&mut headers, &verdict.response_headers);

    let (status, body) = if verdict.redirect {
        let status = verdict
            .http_status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::FOUND);
        if let Some(loc) = &verdict.redirect_location {
            match HeaderValue::from_maybe_shared(loc.clone()) {
                Ok(v) => {
                    headers.insert(LOCATION, v);
                }
                Err(_) => tracing::warn!("verdict redirect location is not a valid header value"),
            }
        }
        (status, Body::empty())
    } else {
        let status = verdict
            .http_status
            .and_then(|s| StatusCode::from_u16(s).ok())
            .unwrap_or(StatusCode::FORBIDDEN);
        let body = verdict
            .response_body
            .clone()
            .map(Body::from)
            .unwrap_or_else(Body::empty);
        (status, body)
    };

    let mut resp = Response::new(body);
    *resp.status_mut() = status;
    *resp.headers_mut() = headers;
    resp
}
