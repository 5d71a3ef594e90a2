//! Tracing and logging setup shared by every binary.

pub use self::tracing::{LogFormat, ParseLogFormatError, init};

/// Tracing configuration (filters, formats).
pub mod tracing;
