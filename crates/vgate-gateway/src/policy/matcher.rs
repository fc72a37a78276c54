//! Request matchers and route-rule compilation.
//!
//! Matchers are pure predicates over a `RequestView`. Callers can supply
//! their own (closures or types implementing `Matcher`); config rules are
//! compiled into `RouteMatcher`s with simple wildcard patterns.

use vgate_core::error::{Result, VGateError};
use vgate_core::RequestView;

use crate::config::schema::RouteRule;

/// Predicate deciding whether a request belongs to a matcher list.
pub trait Matcher: Send + Sync {
    fn matches(&self, req: &RequestView) -> bool;
}

impl<F> Matcher for F
where
    F: Fn(&RequestView) -> bool + Send + Sync,
{
    fn matches(&self, req: &RequestView) -> bool {
        self(req)
    }
}

/// Matcher over `(host, path)` only.
pub struct HostPath<F>(F);

/// Wrap a `(host, path)` predicate. A missing host is passed as `""`.
pub fn host_path<F>(f: F) -> HostPath<F>
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    HostPath(f)
}

impl<F> Matcher for HostPath<F>
where
    F: Fn(&str, &str) -> bool + Send + Sync,
{
    fn matches(&self, req: &RequestView) -> bool {
        (self.0)(req.host.as_deref().unwrap_or(""), &req.path)
    }
}

/// Compiled wildcard pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Any,
    Exact(String),
    Prefix(String),
    Suffix(String),
}

impl Pattern {
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(VGateError::BadConfig("empty route pattern".into()));
        }
        if raw == "*" {
            return Ok(Pattern::Any);
        }
        if let Some(rest) = raw.strip_prefix('*') {
            if rest.contains('*') {
                return Err(VGateError::BadConfig(format!(
                    "invalid route pattern: {raw} (one leading or trailing '*')"
                )));
            }
            return Ok(Pattern::Suffix(rest.to_string()));
        }
        if let Some(rest) = raw.strip_suffix('*') {
            if rest.contains('*') {
                return Err(VGateError::BadConfig(format!(
                    "invalid route pattern: {raw} (one leading or trailing '*')"
                )));
            }
            return Ok(Pattern::Prefix(rest.to_string()));
        }
        if raw.contains('*') {
            return Err(VGateError::BadConfig(format!(
                "invalid route pattern: {raw} (one leading or trailing '*')"
            )));
        }
        Ok(Pattern::Exact(raw.to_string()))
    }

    fn lowercased(self) -> Self {
        match self {
            Pattern::Any => Pattern::Any,
            Pattern::Exact(s) => Pattern::Exact(s.to_ascii_lowercase()),
            Pattern::Prefix(s) => Pattern::Prefix(s.to_ascii_lowercase()),
            Pattern::Suffix(s) => Pattern::Suffix(s.to_ascii_lowercase()),
        }
    }

    pub fn is_match(&self, value: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Exact(s) => value == s,
            Pattern::Prefix(s) => value.starts_with(s.as_str()),
            Pattern::Suffix(s) => value.ends_with(s.as_str()),
        }
    }
}

/// Compiled `RouteRule`.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    host: Option<Pattern>,
    path: Option<Pattern>,
    method: Option<String>, // upper-case
}

impl RouteMatcher {
    pub fn compile(rule: &RouteRule) -> Result<Self> {
        if rule.is_empty() {
            return Err(VGateError::BadConfig(
                "route rule must set at least one of host, path, method".into(),
            ));
        }
        let host = rule
            .host
            .as_deref()
            .map(Pattern::parse)
            .transpose()?
            .map(Pattern::lowercased);
        let path = rule.path.as_deref().map(Pattern::parse).transpose()?;
        let method = rule.method.as_ref().map(|m| m.to_ascii_uppercase());
        Ok(Self { host, path, method })
    }
}

impl Matcher for RouteMatcher {
    fn matches(&self, req: &RequestView) -> bool {
        if let Some(m) = &self.method {
            if !req.method.eq_ignore_ascii_case(m) {
                return false;
            }
        }
        if let Some(p) = &self.host {
            let host = req.host.as_deref().unwrap_or("").to_ascii_lowercase();
            if !p.is_match(&host) {
                return false;
            }
        }
        if let Some(p) = &self.path {
            if !p.is_match(&req.path) {
                return false;
            }
        }
        true
    }
}

pub fn compile_rules(raw: &[RouteRule]) -> Result<Vec<Box<dyn Matcher>>> {
    let mut out: Vec<Box<dyn Matcher>> = Vec::with_capacity(raw.len());
    for r in raw {
        out.push(Box::new(RouteMatcher::compile(r)?));
    }
    Ok(out)
}

pub fn any_match(matchers: &[Box<dyn Matcher>], req: &RequestView) -> bool {
    matchers.iter().any(|m| m.matches(req))
}
