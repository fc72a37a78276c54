//! Transport layer (axum).
//!
//! Converts axum requests into `RequestView`s and hosts the middleware that
//! applies the inspection result to the request lifecycle.

pub mod middleware;
pub mod view;

pub use middleware::gate_middleware;
pub use view::request_view;
