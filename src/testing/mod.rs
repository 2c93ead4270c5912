//! Test support utilities
//!
//! Mock invokers and outcome sinks so routing behavior can be exercised
//! without real executors.

pub mod mocks;

pub use mocks::{MockBehavior, MockInvoker, RecordingSink};
