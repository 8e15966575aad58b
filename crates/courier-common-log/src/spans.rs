//! Span and timing utilities.

use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{info_span, Instrument, Span};

/// Create a span covering one dispatch. The `error` field is filled in by
/// [`record_error`].
pub fn dispatch_span(method: &str, url: &str) -> Span {
    info_span!("dispatch", method = %method, url = %url, error = tracing::field::Empty)
}

/// Create a span for a transport call.
pub fn transport_span(method: &str, url: &str) -> Span {
    info_span!("transport", method = %method, url = %url)
}

/// Instrument a future with a span.
pub fn instrument_future<F: Future>(future: F, span: Span) -> impl Future<Output = F::Output> {
    future.instrument(span)
}

/// Record an error on the current span.
pub fn record_error(error: &dyn std::error::Error) {
    Span::current().record("error", tracing::field::display(error));
}

/// Timing utility for operations.
#[derive(Debug)]
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start a new timer.
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }

    /// Time elapsed so far.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Complete the timer, emit a debug record and return the duration.
    pub fn finish(self) -> Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = %self.operation,
            duration_ms = %duration.as_millis(),
            "operation completed"
        );
        duration
    }
}

/// Re-export of tracing::instrument for convenience.
pub use tracing::instrument;
