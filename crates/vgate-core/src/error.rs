//! Shared error type across vgate crates.

use thiserror::Error;

/// Stable error codes surfaced in logs and boot failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid or incomplete configuration.
    BadConfig,
    /// Verdict service could not be reached.
    Transport,
    /// Verdict service did not answer in time.
    Timeout,
    /// Internal error.
    Internal,
}

impl ClientCode {
    /// String representation used in structured log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadConfig => "BAD_CONFIG",
            ClientCode::Transport => "TRANSPORT",
            ClientCode::Timeout => "TIMEOUT",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, VGateError>;

/// Unified error type used by core and gateway.
#[derive(Debug, Error)]
pub enum VGateError {
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("timeout")]
    Timeout,
    #[error("internal: {0}")]
    Internal(String),
}

impl VGateError {
    /// Map to a stable code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            VGateError::BadConfig(_) => ClientCode::BadConfig,
            VGateError::Transport(_) => ClientCode::Transport,
            VGateError::Timeout => ClientCode::Timeout,
            VGateError::Internal(_) => ClientCode::Internal,
        }
    }

    /// Whether the failure was a timeout at any phase.
    pub fn is_timeout(&self) -> bool {
        matches!(self, VGateError::Timeout)
    }
}
