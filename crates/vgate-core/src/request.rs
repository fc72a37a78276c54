//! Transport-agnostic view of one inbound request.
//!
//! Hosts build a `RequestView` from their own request type (the gateway does
//! it from `axum::extract::Request`). Header values stay raw bytes so the
//! extractor can truncate them without re-decoding.

use std::net::IpAddr;

use bytes::Bytes;
use percent_encoding::percent_decode;

/// Read-only request metadata consumed by matchers and the extractor.
#[derive(Debug, Clone, Default)]
pub struct RequestView {
    /// Request method (e.g. `GET`).
    pub method: String,
    /// URL scheme, lower-case (`http` / `https`).
    pub scheme: String,
    /// Host without port, if known.
    pub host: Option<String>,
    /// Effective port, if known.
    pub port: Option<u16>,
    /// Path without query string.
    pub path: String,
    /// Path plus query string, as received.
    pub path_and_query: String,
    /// Headers in arrival order. Names are lower-case.
    pub headers: Vec<(String, Bytes)>,
    /// Address of the connected peer.
    pub peer_addr: Option<IpAddr>,
    /// Declared body length.
    pub body_len: Option<u64>,
}

impl RequestView {
    /// First value of a header (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&Bytes> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    /// First value of a header as UTF-8 text, if it is valid UTF-8.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.header(name).and_then(|v| std::str::from_utf8(v).ok())
    }

    /// Cookie header(s) as one value; split cookie headers are joined with `; `.
    pub fn cookie_header(&self) -> Option<Bytes> {
        let mut parts = self
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("cookie"))
            .map(|(_, v)| v);

        let first = parts.next()?.clone();
        let mut joined: Option<Vec<u8>> = None;
        for p in parts {
            let buf = joined.get_or_insert_with(|| first.to_vec());
            buf.extend_from_slice(b"; ");
            buf.extend_from_slice(p);
        }
        Some(joined.map(Bytes::from).unwrap_or(first))
    }

    /// Decoded value of the first cookie named `name`.
    ///
    /// Pairs are separated by `;` or `,`; values are form-decoded (`+` is a
    /// space, then percent escapes).
    pub fn cookie(&self, name: &str) -> Option<Bytes> {
        let raw = self.cookie_header()?;
        raw.split(|b| *b == b';' || *b == b',').find_map(|pair| {
            let pair = trim_ascii(pair);
            let eq = pair.iter().position(|b| *b == b'=')?;
            let (k, v) = (&pair[..eq], &pair[eq + 1..]);
            if trim_ascii(k) != name.as_bytes() {
                return None;
            }
            let spaced: Vec<u8> = trim_ascii(v)
                .iter()
                .map(|b| if *b == b'+' { b' ' } else { *b })
                .collect();
            let decoded: Vec<u8> = percent_decode(&spaced).collect();
            Some(Bytes::from(decoded))
        })
    }

    /// Distinct header names in arrival order.
    pub fn header_names(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::with_capacity(self.headers.len());
        for (k, _) in &self.headers {
            if !out.iter().any(|n| n.eq_ignore_ascii_case(k)) {
                out.push(k.as_str());
            }
        }
        out
    }

    /// Best-effort client address.
    ///
    /// An untrusted peer wins. Behind trusted proxies, the right-most
    /// untrusted `X-Forwarded-For` hop is used, then the left-most hop, then
    /// the peer itself.
    pub fn client_ip(&self) -> Option<String> {
        if let Some(peer) = self.peer_addr {
            if !is_trusted_proxy(&peer) {
                return Some(peer.to_string());
            }
        }

        let forwarded: Vec<&str> = self
            .header_str("x-forwarded-for")
            .map(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        let untrusted = forwarded.iter().rev().find(|hop| {
            hop.parse::<IpAddr>()
                .map(|ip| !is_trusted_proxy(&ip))
                .unwrap_or(false)
        });

        untrusted
            .or_else(|| forwarded.first())
            .map(|s| s.to_string())
            .or_else(|| self.peer_addr.map(|p| p.to_string()))
    }
}

/// Loopback, private, link-local and unique-local addresses.
pub fn is_trusted_proxy(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.is_loopback() || v4.is_private() || v4.is_link_local(),
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_trusted_proxy(&IpAddr::V4(mapped));
            }
            // fc00::/7
            v6.is_loopback() || (v6.segments()[0] & 0xfe00) == 0xfc00
        }
    }
}

fn trim_ascii(mut s: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = s {
        if first.is_ascii_whitespace() {
            s = rest;
        } else {
            break;
        }
    }
    while let [rest @ .., last] = s {
        if last.is_ascii_whitespace() {
            s = rest;
        } else {
            break;
        }
    }
    s
}
