//! Gate config loader (strict parsing).

pub mod schema;

use std::fs;

use vgate_core::error::{Result, VGateError};

pub use schema::{ApiSection, GateConfig, GateSection, RouteRule, ServerSection};

pub fn load_from_file(path: &str) -> Result<GateConfig> {
    let s = fs::read_to_string(path)
        .map_err(|e| VGateError::Internal(format!("read config failed: {e}")))?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<GateConfig> {
    let cfg: GateConfig = serde_yaml::from_str(s)
        .map_err(|e| VGateError::BadConfig(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
