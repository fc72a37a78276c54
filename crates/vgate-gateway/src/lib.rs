//! vgate gateway library entry.
//!
//! This crate wires the verdict client, policy gate, response enricher and
//! axum middleware into a gate that can wrap any axum application. It is
//! consumed by the demo binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod client;
pub mod config;
pub mod enrich;
pub mod inspect;
pub mod obs;
pub mod policy;
pub mod router;
pub mod transport;
