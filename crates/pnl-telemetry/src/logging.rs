//! Structured logging initialization.

use crate::error::{TelemetryError, TelemetryResult};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor the config provides one.
pub const DEFAULT_FILTER: &str = "info,pnl=debug";

/// Initialize structured logging.
///
/// `RUST_LOG` wins over `default_filter`. Output is JSON when
/// `RUST_ENV=production` and pretty otherwise.
pub fn init_logging(default_filter: &str) -> TelemetryResult<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter).map_err(|e| TelemetryError::InvalidFilter {
            filter: default_filter.to_string(),
            reason: e.to_string(),
        })?,
    };

    let is_production = std::env::var("RUST_ENV")
        .map(|v| v == "production")
        .unwrap_or(false);

    let result = if is_production {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().pretty().with_target(true))
            .try_init()
    };

    result.map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }

    #[test]
    fn test_second_init_is_an_error_not_a_panic() {
        // The first call may or may not win depending on test ordering
        let _ = init_logging("warn");
        assert!(matches!(
            init_logging("warn"),
            Err(TelemetryError::LoggingInit(_))
        ));
    }
}
