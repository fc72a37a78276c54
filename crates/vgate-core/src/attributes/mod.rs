//! Request attribute extraction.
//!
//! The payload sent to the verdict service is produced by walking a static,
//! ordered table of field descriptors (`fields::FIELDS`) once per request:
//! - each rule derives a value from the `RequestView` or returns `None`;
//! - `None` omits the field entirely (never sent as empty);
//! - text values with a declared limit keep exactly the first N bytes.
//!
//! Values are raw bytes end to end. Truncation can therefore split a
//! multi-byte character; the verdict service expects byte limits.

pub mod fields;

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;

use crate::request::RequestView;

pub use fields::{FieldSpec, FIELDS};

/// Scalar attribute value.
#[derive(Clone, PartialEq, Eq)]
pub enum AttrValue {
    Text(Bytes),
    Int(i64),
}

impl AttrValue {
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AttrValue::Text(b) => Some(b),
            AttrValue::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            AttrValue::Text(_) => None,
        }
    }

    fn truncated(self, max_len: Option<usize>) -> Self {
        match (self, max_len) {
            (AttrValue::Text(b), Some(n)) => AttrValue::Text(truncate_bytes(b, n)),
            (v, _) => v,
        }
    }
}

impl fmt::Debug for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(b) => write!(f, "{:?}", String::from_utf8_lossy(b)),
            AttrValue::Int(i) => write!(f, "{i}"),
        }
    }
}

impl PartialEq<&str> for AttrValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_bytes() == Some(other.as_bytes())
    }
}

impl PartialEq<i64> for AttrValue {
    fn eq(&self, other: &i64) -> bool {
        self.as_int() == Some(*other)
    }
}

/// Keep the first `max_len` bytes (zero-copy).
pub fn truncate_bytes(value: Bytes, max_len: usize) -> Bytes {
    if value.len() > max_len {
        value.slice(..max_len)
    } else {
        value
    }
}

/// Ordered attribute set for one request.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct RequestAttributes {
    entries: Vec<(&'static str, AttrValue)>,
}

impl RequestAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        self.entries.iter().find(|(k, _)| *k == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert or replace, keeping first-insertion order.
    pub fn insert(&mut self, name: &'static str, value: AttrValue) {
        match self.entries.iter_mut().find(|(k, _)| *k == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &AttrValue)> {
        self.entries.iter().map(|(k, v)| (*k, v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `application/x-www-form-urlencoded` body: attributes first, then `extra`.
    pub fn to_form_body(&self, extra: &[(&str, &str)]) -> String {
        let mut out = String::new();
        let mut push = |k: &[u8], v: &[u8]| {
            if !out.is_empty() {
                out.push('&');
            }
            out.extend(form_urlencoded::byte_serialize(k));
            out.push('=');
            out.extend(form_urlencoded::byte_serialize(v));
        };

        for (k, v) in &self.entries {
            match v {
                AttrValue::Text(b) => push(k.as_bytes(), b),
                AttrValue::Int(i) => push(k.as_bytes(), i.to_string().as_bytes()),
            }
        }
        for (k, v) in extra {
            push(k.as_bytes(), v.as_bytes());
        }
        out
    }
}

impl fmt::Debug for RequestAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter().map(|(k, v)| (k, v))).finish()
    }
}

/// Per-extraction inputs that are not part of the request.
#[derive(Debug, Clone, Copy)]
pub struct ExtractCtx {
    /// Wall clock in microseconds since the Unix epoch.
    pub now_micros: i64,
}

/// Extract attributes using the current wall clock.
pub fn extract(view: &RequestView) -> RequestAttributes {
    extract_at(view, SystemTime::now())
}

/// Extract attributes with an explicit clock.
pub fn extract_at(view: &RequestView, now: SystemTime) -> RequestAttributes {
    let now_micros = now
        .duration_since(UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_micros()).unwrap_or(i64::MAX))
        .unwrap_or(0);
    let ctx = ExtractCtx { now_micros };

    let mut attrs = RequestAttributes {
        entries: Vec::with_capacity(FIELDS.len()),
    };
    for spec in FIELDS {
        if let Some(value) = (spec.derive)(view, &ctx) {
            attrs.insert(spec.name, value.truncated(spec.max_len));
        }
    }
    attrs
}
