use serde::Deserialize;
use vgate_core::error::{Result, VGateError};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    pub api: ApiSection,

    #[serde(default)]
    pub gate: GateSection,
}

impl GateConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(VGateError::BadConfig(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.api.validate()?;
        self.gate.validate()?;

        Ok(())
    }
}

/// Demo host settings (ignored when the gate is embedded).
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}

/// Verdict service connection.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    pub key: String,

    #[serde(default = "default_api_host")]
    pub host: String,

    #[serde(default = "default_use_https")]
    pub use_https: bool,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Reported as `ServerName`; falls back to `$HOSTNAME`.
    #[serde(default)]
    pub server_name: Option<String>,
}

impl ApiSection {
    /// Section with defaults for everything but the key.
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            host: default_api_host(),
            use_https: default_use_https(),
            connect_timeout_ms: default_connect_timeout_ms(),
            timeout_ms: default_timeout_ms(),
            server_name: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.key.trim().is_empty() {
            return Err(VGateError::BadConfig("api.key must not be empty".into()));
        }
        if self.host.trim().is_empty() || self.host.contains('/') {
            return Err(VGateError::BadConfig(
                "api.host must be a bare host[:port]".into(),
            ));
        }
        if !(1..=60000).contains(&self.timeout_ms) {
            return Err(VGateError::BadConfig(
                "api.timeout_ms must be between 1 and 60000".into(),
            ));
        }
        if self.connect_timeout_ms == 0 || self.connect_timeout_ms > self.timeout_ms {
            return Err(VGateError::BadConfig(
                "api.connect_timeout_ms must be between 1 and api.timeout_ms".into(),
            ));
        }
        Ok(())
    }

    /// `{scheme}://{host}/validate-request`
    pub fn endpoint(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        format!("{scheme}://{}/validate-request", self.host)
    }
}

fn default_api_host() -> String {
    "api.datadome.co".into()
}
fn default_use_https() -> bool {
    true
}
fn default_connect_timeout_ms() -> u64 {
    1000
}
fn default_timeout_ms() -> u64 {
    3000
}

/// Local policy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GateSection {
    /// Observe flagged requests; only intercept ones matched by `intercept`.
    #[serde(default)]
    pub monitor_mode: bool,

    /// Echo diagnostic headers and timing on passed-through responses.
    #[serde(default)]
    pub expose_headers: bool,

    #[serde(default)]
    pub exclude: Vec<RouteRule>,

    #[serde(default)]
    pub include: Vec<RouteRule>,

    #[serde(default)]
    pub intercept: Vec<RouteRule>,
}

impl GateSection {
    pub fn validate(&self) -> Result<()> {
        for (list, rules) in [
            ("exclude", &self.exclude),
            ("include", &self.include),
            ("intercept", &self.intercept),
        ] {
            for (i, r) in rules.iter().enumerate() {
                if r.is_empty() {
                    return Err(VGateError::BadConfig(format!(
                        "gate.{list}[{i}] must set at least one of host, path, method"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Declarative matcher. Every field that is set must match.
///
/// `host` / `path` patterns: `*` matches anything, `*suffix`, `prefix*`, or an
/// exact value. Hosts compare case-insensitively.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteRule {
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
}

impl RouteRule {
    pub fn is_empty(&self) -> bool {
        self.host.is_none() && self.path.is_none() && self.method.is_none()
    }
}
