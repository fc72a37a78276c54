//! axum request -> `RequestView`.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use axum::http::header::{CONTENT_LENGTH, HOST};
use axum::http::HeaderMap;
use bytes::Bytes;

use vgate_core::RequestView;

/// Snapshot the metadata the gate needs. The body is not read.
pub fn request_view(req: &Request) -> RequestView {
    let headers = req.headers();
    let uri = req.uri();

    let scheme = uri
        .scheme_str()
        .map(str::to_string)
        .or_else(|| first_token(headers, "x-forwarded-proto"))
        .unwrap_or_else(|| "http".to_string())
        .to_ascii_lowercase();

    let authority = headers
        .get(HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| uri.authority().map(|a| a.as_str().to_string()));

    let (host, explicit_port) = match authority.as_deref() {
        Some(a) => split_authority(a),
        None => (None, None),
    };

    let port = explicit_port
        .or_else(|| first_token(headers, "x-forwarded-port").and_then(|p| p.parse().ok()))
        .or_else(|| default_port(&scheme));

    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let peer_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip());

    let body_len = headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok());

    RequestView {
        method: req.method().as_str().to_string(),
        scheme,
        host,
        port,
        path: uri.path().to_string(),
        path_and_query,
        headers: headers
            .iter()
            .map(|(k, v)| (k.as_str().to_string(), Bytes::copy_from_slice(v.as_bytes())))
            .collect(),
        peer_addr,
        body_len,
    }
}

fn first_token(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `host[:port]`, including bracketed IPv6 literals.
fn split_authority(authority: &str) -> (Option<String>, Option<u16>) {
    let authority = authority.trim();
    if authority.is_empty() {
        return (None, None);
    }

    if let Some(rest) = authority.strip_prefix('[') {
        if let Some((host, tail)) = rest.split_once(']') {
            let port = tail.strip_prefix(':').and_then(|p| p.parse().ok());
            return (Some(host.to_string()), port);
        }
    }

    match authority.rsplit_once(':') {
        Some((host, port)) if !host.contains(':') => match port.parse() {
            Ok(p) => (Some(host.to_string()), Some(p)),
            Err(_) => (Some(host.to_string()), None),
        },
        _ => (Some(authority.to_string()), None),
    }
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}
