//! Policy layer (include/exclude routing, monitor mode, intercept rules).
//!
//! Compiles the gate configuration into matcher lists and turns a verdict
//! into a `Disposition` for the middleware to act on.

pub mod gate;
pub mod matcher;

pub use gate::{Disposition, PolicyGate};
pub use matcher::{host_path, Matcher, RouteMatcher};
