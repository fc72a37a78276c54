use vgate_core::error::Result;
use vgate_core::{RequestView, Verdict};

use crate::config::schema::GateSection;

use super::matcher::{any_match, compile_rules, Matcher};

/// Terminal local decision for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Not evaluated; forwarded untouched.
    Ignored,
    /// Answered from the verdict; the application is not called.
    Intercepted,
    /// Forwarded; the response is enriched.
    PassThrough,
}

impl Disposition {
    pub fn as_str(self) -> &'static str {
        match self {
            Disposition::Ignored => "ignored",
            Disposition::Intercepted => "intercepted",
            Disposition::PassThrough => "pass_through",
        }
    }
}

/// Routing and intercept policy.
/// Construct once at startup, then share via Arc.
#[derive(Default)]
pub struct PolicyGate {
    exclude: Vec<Box<dyn Matcher>>,
    include: Vec<Box<dyn Matcher>>,
    intercept: Vec<Box<dyn Matcher>>,
    monitor_mode: bool,
}

impl PolicyGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile the declarative rules of a config section.
    pub fn from_config(gate: &GateSection) -> Result<Self> {
        Ok(Self {
            exclude: compile_rules(&gate.exclude)?,
            include: compile_rules(&gate.include)?,
            intercept: compile_rules(&gate.intercept)?,
            monitor_mode: gate.monitor_mode,
        })
    }

    pub fn monitor_mode(mut self, on: bool) -> Self {
        self.monitor_mode = on;
        self
    }

    pub fn exclude(mut self, m: impl Matcher + 'static) -> Self {
        self.exclude.push(Box::new(m));
        self
    }

    pub fn include(mut self, m: impl Matcher + 'static) -> Self {
        self.include.push(Box::new(m));
        self
    }

    pub fn intercept(mut self, m: impl Matcher + 'static) -> Self {
        self.intercept.push(Box::new(m));
        self
    }

    pub fn is_monitor_mode(&self) -> bool {
        self.monitor_mode
    }

    /// Whether the request skips evaluation entirely.
    ///
    /// Include rules narrow the evaluated set first; exclude rules then carve
    /// out of it. Order inside a list never changes the result.
    pub fn should_ignore(&self, req: &RequestView) -> bool {
        if self.include.is_empty() && self.exclude.is_empty() {
            return false;
        }
        if !self.include.is_empty() && !any_match(&self.include, req) {
            return true;
        }
        any_match(&self.exclude, req)
    }

    /// Decision for an evaluated request.
    pub fn decide(&self, req: &RequestView, verdict: &Verdict) -> Disposition {
        if !verdict.is_flagged() {
            return Disposition::PassThrough;
        }
        if !self.monitor_mode {
            return Disposition::Intercepted;
        }
        if any_match(&self.intercept, req) {
            Disposition::Intercepted
        } else {
            Disposition::PassThrough
        }
    }
}
