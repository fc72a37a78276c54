//! Static field table.
//!
//! Order matters: it is the order of the form payload. Names are part of the
//! remote API contract, including `XForwaredForIP` as spelled there.

use bytes::Bytes;

use super::{AttrValue, ExtractCtx};
use crate::request::RequestView;

/// Derivation rule. Must not fail: `None` means "omit".
pub type DeriveFn = fn(&RequestView, &ExtractCtx) -> Option<AttrValue>;

/// One captured field.
pub struct FieldSpec {
    pub name: &'static str,
    /// Byte limit for text values.
    pub max_len: Option<usize>,
    pub derive: DeriveFn,
}

/// Name of the cookie carrying the client identifier.
pub const CLIENT_ID_COOKIE: &str = "datadome";

/// Header names never reported in `HeadersList`.
const UNLISTED_HEADERS: [&str; 3] = ["version", "content-type", "content-length"];

pub static FIELDS: &[FieldSpec] = &[
    FieldSpec { name: "IP", max_len: None, derive: ip },
    FieldSpec { name: "Port", max_len: None, derive: port },
    FieldSpec { name: "Protocol", max_len: None, derive: protocol },
    FieldSpec { name: "Method", max_len: None, derive: method },
    FieldSpec { name: "Request", max_len: Some(2048), derive: request },
    FieldSpec { name: "TimeRequest", max_len: None, derive: time_request },
    FieldSpec { name: "Accept", max_len: Some(512), derive: accept },
    FieldSpec { name: "AcceptCharset", max_len: Some(128), derive: accept_charset },
    FieldSpec { name: "AcceptEncoding", max_len: Some(128), derive: accept_encoding },
    FieldSpec { name: "AcceptLanguage", max_len: Some(256), derive: accept_language },
    FieldSpec { name: "CacheControl", max_len: None, derive: cache_control },
    FieldSpec { name: "Connection", max_len: None, derive: connection },
    FieldSpec { name: "Host", max_len: None, derive: host },
    FieldSpec { name: "Origin", max_len: Some(512), derive: origin },
    FieldSpec { name: "Pragma", max_len: None, derive: pragma },
    FieldSpec { name: "Referer", max_len: Some(1024), derive: referer },
    FieldSpec { name: "UserAgent", max_len: Some(768), derive: user_agent },
    FieldSpec { name: "XForwaredForIP", max_len: Some(512), derive: x_forwarded_for },
    FieldSpec { name: "X-Requested-With", max_len: Some(128), derive: x_requested_with },
    FieldSpec { name: "HeadersList", max_len: Some(512), derive: headers_list },
    FieldSpec { name: "CookiesLen", max_len: None, derive: cookies_len },
    FieldSpec { name: "PostParamLen", max_len: None, derive: post_param_len },
    FieldSpec { name: "AuthorizationLen", max_len: None, derive: authorization_len },
    FieldSpec { name: "ClientID", max_len: Some(128), derive: client_id },
];

macro_rules! header_field {
    ($($fn_name:ident => $header:literal),* $(,)?) => {
        $(
            fn $fn_name(view: &RequestView, _: &ExtractCtx) -> Option<AttrValue> {
                view.header($header).cloned().map(AttrValue::Text)
            }
        )*
    };
}

header_field! {
    accept => "accept",
    accept_charset => "accept-charset",
    accept_encoding => "accept-encoding",
    accept_language => "accept-language",
    cache_control => "cache-control",
    connection => "connection",
    origin => "origin",
    pragma => "pragma",
    referer => "referer",
    user_agent => "user-agent",
    x_forwarded_for => "x-forwarded-for",
    x_requested_with => "x-requested-with",
}

fn authorization_len(view: &RequestView, _: &ExtractCtx) -> Option<AttrValue> {
    Some(AttrValue::Int(
        view.header("authorization").map(|v| len_i64(v.len())).unwrap_or(0),
    ))
}

fn len_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn non_empty(s: &str) -> Option<AttrValue> {
    (!s.is_empty()).then(|| AttrValue::Text(Bytes::copy_from_slice(s.as_bytes())))
}

fn ip(view: &RequestView, _: &ExtractCtx) -> Option<AttrValue> {
    view.client_ip().map(|s| AttrValue::Text(Bytes::from(s)))
}

fn port(view: &RequestView, _: &ExtractCtx) -> Option<AttrValue> {
    view.port.map(|p| AttrValue::Int(i64::from(p)))
}

fn protocol(view: &RequestView, _: &ExtractCtx) -> Option<AttrValue> {
    non_empty(&view.scheme.to_ascii_uppercase())
}

fn method(view: &RequestView, _: &ExtractCtx) -> Option<AttrValue> {
    non_empty(&view.method)
}

fn request(view: &RequestView, _: &ExtractCtx) -> Option<AttrValue> {
    non_empty(&view.path_and_query)
}

fn host(view: &RequestView, _: &ExtractCtx) -> Option<AttrValue> {
    view.host.as_deref().and_then(non_empty)
}

/// `X-Request-Start` in microseconds (`t=` prefix allowed), else now.
///
/// Parsing is lenient: leading digits only; zero or no digits falls back.
fn time_request(view: &RequestView, ctx: &ExtractCtx) -> Option<AttrValue> {
    let from_proxy = view
        .header("x-request-start")
        .map(|raw| parse_leading_int(&strip_t_prefix(raw)))
        .unwrap_or(0);

    let micros = if from_proxy == 0 { ctx.now_micros } else { from_proxy };
    Some(AttrValue::Int(micros))
}

fn strip_t_prefix(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i..].starts_with(b"t=") {
            i += 2;
        } else {
            out.push(raw[i]);
            i += 1;
        }
    }
    out
}

fn parse_leading_int(raw: &[u8]) -> i64 {
    let trimmed = raw
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map(|start| &raw[start..])
        .unwrap_or_default();

    let mut acc: i64 = 0;
    for b in trimmed.iter().take_while(|b| b.is_ascii_digit()) {
        acc = match acc
            .checked_mul(10)
            .and_then(|a| a.checked_add(i64::from(b - b'0')))
        {
            Some(v) => v,
            None => return 0,
        };
    }
    acc
}

/// Names joined before truncation; the limit may cut a name in half.
fn headers_list(view: &RequestView, _: &ExtractCtx) -> Option<AttrValue> {
    let names: Vec<String> = view
        .header_names()
        .into_iter()
        .map(|n| n.to_ascii_lowercase().replace('_', "-"))
        .filter(|n| !UNLISTED_HEADERS.contains(&n.as_str()))
        .collect();

    Some(AttrValue::Text(Bytes::from(names.join(","))))
}

fn cookies_len(view: &RequestView, _: &ExtractCtx) -> Option<AttrValue> {
    Some(AttrValue::Int(
        view.cookie_header().map(|c| len_i64(c.len())).unwrap_or(0),
    ))
}

fn post_param_len(view: &RequestView, _: &ExtractCtx) -> Option<AttrValue> {
    Some(AttrValue::Int(
        view.body_len
            .map(|n| i64::try_from(n).unwrap_or(i64::MAX))
            .unwrap_or(0),
    ))
}

fn client_id(view: &RequestView, _: &ExtractCtx) -> Option<AttrValue> {
    view.cookie(CLIENT_ID_COOKIE).map(AttrValue::Text)
}
