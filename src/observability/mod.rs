//! Observability for the routing engine
//!
//! Structured logging built on the tracing crate. Selection, dispatch, and
//! feedback paths emit field-structured events; this module configures the
//! subscriber.

pub mod logging;

pub use logging::{init_default_logging, init_logging, LogFormat};
