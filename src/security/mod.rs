//! Security concerns applied by the dispatcher to every request.
//!
//! Currently implemented:
//!
//! - [`Cors`] — Cross-Origin Resource Sharing headers and preflight detection.

pub mod cors;

pub use cors::Cors;
