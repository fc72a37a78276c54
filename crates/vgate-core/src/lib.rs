//! vgate core: transport-agnostic request view, attribute extraction, verdict
//! model, and error types.
//!
//! This crate defines the contracts shared by the gateway and by hosts that
//! embed the gate in their own pipeline. It carries no HTTP client or runtime
//! dependency so the extraction and verdict mapping rules can be exercised
//! without a network.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Extraction never fails: missing request data yields an omitted field or a
//! documented default.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod attributes;
pub mod error;
pub mod request;
pub mod verdict;

/// Shared result type.
pub use error::{Result, VGateError};

pub use attributes::{AttrValue, RequestAttributes};
pub use request::RequestView;
pub use verdict::{HeaderBag, UpstreamReply, Verdict};
