//! Observability subsystem
//!
//! - Structured logging through `tracing` (JSON or pretty)
//! - Request counters exposed on `/metrics`
//!
//! Observability is read-only: nothing here changes how a request is served.

mod logger;
mod metrics;

pub use logger::{init_logging, LogFormat, LoggingConfig};
pub use metrics::{status_class, MetricsRegistry, MetricsSnapshot, RequestCount, UNMATCHED_ROUTE};
