//! Logging setup and span timing.

use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Output format for [`init_logging`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Installs a global `tracing` subscriber.
///
/// The filter comes from `RUST_LOG` and falls back to `default_filter`.
/// Returns `false` if a subscriber was already installed.
pub fn init_logging(format: LogFormat, default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match format {
        LogFormat::Pretty => builder.try_init().is_ok(),
        LogFormat::Json => builder.json().try_init().is_ok(),
    }
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_timer() {
        let timer = SpanTimer::start("train");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert_eq!(timer.name(), "train");
        assert!(timer.finish() >= 10.0);
    }

    #[test]
    fn test_init_logging_twice_is_harmless() {
        let _ = init_logging(LogFormat::Pretty, "warn");
        assert!(!init_logging(LogFormat::Json, "warn"));
    }
}
