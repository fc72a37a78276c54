//! Top-level facade crate for vgate.
//!
//! Re-exports core types and the gateway library so hosts can depend on a single crate.

pub mod core {
    pub use vgate_core::*;
}

pub mod gateway {
    pub use vgate_gateway::*;
}
