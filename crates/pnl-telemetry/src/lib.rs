//! Prometheus metrics and structured logging for the PnL summary bot.
//!
//! - Structured logging with tracing (JSON in production, pretty otherwise)
//! - Prometheus counters for ingestion, triggers, dispatch and resets
//! - A snapshot of the counters for periodic log output

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::{init_logging, DEFAULT_FILTER};
pub use metrics::{Metrics, MetricsSnapshot};
