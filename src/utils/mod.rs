//! Utility helpers: logging and diagnostics plumbing.

pub mod logging;

pub use logging::{set_trace_handler, trace_line, ScopedTimer, TraceHandler};
