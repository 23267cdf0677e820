//! Span helpers for validation runs.

use std::future::Future;
use std::path::Path;

use tracing::{debug_span, info_span, Instrument, Span};

/// Span covering one validation run.
pub fn run_span(project_root: &Path) -> Span {
    info_span!("validate", root = %project_root.display())
}

/// Span for one orchestrator stage.
pub fn stage_span(stage: &'static str) -> Span {
    debug_span!("stage", stage = stage)
}

/// Span for work on one document.
pub fn document_span(kind: &str, path: &Path) -> Span {
    debug_span!("document", kind = %kind, path = %path.display())
}

/// Instrument a future with a span.
pub fn instrument_future<F: Future>(future: F, span: Span) -> impl Future<Output = F::Output> {
    future.instrument(span)
}

/// Timing utility for operations.
pub struct Timer {
    start: std::time::Instant,
    operation: &'static str,
}

impl Timer {
    /// Start a new timer.
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: std::time::Instant::now(),
            operation,
        }
    }

    /// Complete the timer and record duration.
    pub fn finish(self) -> std::time::Duration {
        let duration = self.start.elapsed();
        tracing::debug!(
            operation = %self.operation,
            duration_ms = %duration.as_millis(),
            "operation completed"
        );
        duration
    }
}

/// Macro for timing a block of code.
#[macro_export]
macro_rules! timed {
    ($name:expr, $body:expr) => {{
        let _timer = $crate::spans::Timer::start($name);
        let result = $body;
        _timer.finish();
        result
    }};
}
