//! Structured JSON logging for audit passes.

mod format;

pub use format::{LogEvent, StructuredLogger};
