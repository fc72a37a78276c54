//! Verdict model and mapping of a raw verdict-service reply.
//!
//! Mapping rules:
//! - 403 => block with the upstream body.
//! - 301 / 302 => redirect to the upstream `Location`.
//! - anything else => pass.
//! - In every branch, diagnostic and injected headers are collected from the
//!   reply according to its space-separated list headers.

use bytes::Bytes;

/// Diagnostic header always mirrored into `request_headers`.
pub const RESPONSE_DIAGNOSTIC_HEADER: &str = "X-DataDomeResponse";
/// Names of reply headers to mirror back as diagnostics.
pub const REQUEST_HEADERS_LIST: &str = "X-DataDome-request-headers";
/// Names of reply headers to inject into the client response.
pub const RESPONSE_HEADERS_LIST: &str = "X-DataDome-headers";

/// Ordered header mapping with case-insensitive names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderBag {
    entries: Vec<(String, Bytes)>,
}

impl HeaderBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert, replacing any entry with the same name.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Bytes>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Add a value, joining it to an existing entry of the same name with a
    /// newline. Used for repeated `Set-Cookie` replies.
    pub fn append(&mut self, name: impl Into<String>, value: impl Into<Bytes>) {
        let name = name.into();
        let value = value.into();
        match self
            .entries
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case(&name))
        {
            Some(slot) => {
                let mut joined = Vec::with_capacity(slot.1.len() + 1 + value.len());
                joined.extend_from_slice(&slot.1);
                joined.push(b'\n');
                joined.extend_from_slice(&value);
                slot.1 = Bytes::from(joined);
            }
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Bytes> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Bytes)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Raw reply from the verdict service, detached from any HTTP client type.
#[derive(Debug, Clone, Default)]
pub struct UpstreamReply {
    pub status: u16,
    pub headers: HeaderBag,
    pub body: Bytes,
}

/// Outcome of one remote evaluation.
///
/// `redirect == true` implies `allow == false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub allow: bool,
    pub redirect: bool,
    pub http_status: Option<u16>,
    pub redirect_location: Option<Bytes>,
    pub response_body: Option<Bytes>,
    /// Diagnostics surfaced upstream (exposed only when configured).
    pub request_headers: HeaderBag,
    /// Headers and cookies injected into the client response.
    pub response_headers: HeaderBag,
    pub timed_out: bool,
}

impl Default for Verdict {
    fn default() -> Self {
        Self::pass()
    }
}

impl Verdict {
    /// Let the request through.
    pub fn pass() -> Self {
        Self {
            allow: true,
            redirect: false,
            http_status: None,
            redirect_location: None,
            response_body: None,
            request_headers: HeaderBag::new(),
            response_headers: HeaderBag::new(),
            timed_out: false,
        }
    }

    /// Fail-open verdict after the service did not answer in time.
    pub fn timed_out() -> Self {
        Self {
            timed_out: true,
            ..Self::pass()
        }
    }

    pub fn block(status: u16, body: Bytes) -> Self {
        Self {
            allow: false,
            http_status: Some(status),
            response_body: Some(body),
            ..Self::pass()
        }
    }

    pub fn redirect_to(status: u16, location: Option<Bytes>) -> Self {
        Self {
            allow: false,
            redirect: true,
            http_status: Some(status),
            redirect_location: location,
            ..Self::pass()
        }
    }

    /// The verdict asks to stop the request (block or redirect).
    pub fn is_flagged(&self) -> bool {
        !self.allow || self.redirect
    }

    /// Short label for logs and metrics.
    pub fn outcome(&self) -> &'static str {
        if self.redirect {
            "redirect"
        } else if !self.allow {
            "block"
        } else if self.timed_out {
            "timeout"
        } else {
            "allow"
        }
    }

    /// Map a verdict-service reply.
    pub fn from_upstream(reply: &UpstreamReply) -> Self {
        let mut verdict = match reply.status {
            403 => Self::block(403, reply.body.clone()),
            301 | 302 => Self::redirect_to(reply.status, reply.headers.get("location").cloned()),
            _ => Self::pass(),
        };

        if let Some(v) = reply.headers.get(RESPONSE_DIAGNOSTIC_HEADER) {
            verdict
                .request_headers
                .insert(RESPONSE_DIAGNOSTIC_HEADER, v.clone());
        }

        for name in listed_headers(reply.headers.get(REQUEST_HEADERS_LIST)) {
            if let Some(v) = reply.headers.get(name) {
                verdict.request_headers.insert(name, v.clone());
            }
        }

        for name in listed_headers(reply.headers.get(RESPONSE_HEADERS_LIST)) {
            if let Some(v) = reply.headers.get(name) {
                verdict.response_headers.insert(name, v.clone());
            }
        }

        verdict
    }
}

/// Split a space-separated header-name list. Missing or empty => nothing.
pub fn parse_header_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(' ').filter(|s| !s.is_empty())
}

fn listed_headers(raw: Option<&Bytes>) -> impl Iterator<Item = &str> {
    let list = raw.and_then(|b| std::str::from_utf8(b).ok()).unwrap_or("");
    parse_header_list(list)
}
