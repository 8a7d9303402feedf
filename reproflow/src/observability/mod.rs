//! Observability utilities.

mod tracing;

pub use self::tracing::{init_logging, LogFormat, SpanTimer};
