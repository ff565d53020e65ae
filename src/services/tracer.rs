use std::time::{Duration, Instant};

use rand::Rng;
use tracing::debug;

/// An open span as seen by the emitter: identifiers plus what it was started with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveSpan {
    pub name: String,
    pub span_type: String,
    pub trace_id: u64,
    pub span_id: u64,
    pub started_at: Instant,
}

/// A span as handed back by `finish_span`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedSpan {
    pub trace_id: u64,
    pub span_id: u64,
    pub duration: Duration,
    pub error: Option<String>,
}

/// Tracing client seam. Id assignment and export are the client's business.
pub trait SpanTracer {
    fn start_span(&mut self, name: &str, span_type: &str) -> ActiveSpan;
    fn finish_span(
        &mut self,
        span: ActiveSpan,
        error: Option<&(dyn std::error::Error + 'static)>,
    ) -> FinishedSpan;
}

/// Default tracer: random non-zero 64-bit ids, finished spans go to the log.
#[derive(Debug, Default)]
pub struct LogTracer;

impl LogTracer {
    pub fn new() -> Self {
        Self
    }
}

fn random_id<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    // Zero is reserved as "no id" by most tracing backends.
    rng.gen_range(1..=u64::MAX)
}

impl SpanTracer for LogTracer {
    fn start_span(&mut self, name: &str, span_type: &str) -> ActiveSpan {
        let mut rng = rand::thread_rng();
        let trace_id = random_id(&mut rng);
        ActiveSpan {
            name: name.to_string(),
            span_type: span_type.to_string(),
            trace_id,
            // Root spans share their trace id.
            span_id: trace_id,
            started_at: Instant::now(),
        }
    }

    fn finish_span(
        &mut self,
        span: ActiveSpan,
        error: Option<&(dyn std::error::Error + 'static)>,
    ) -> FinishedSpan {
        let duration = span.started_at.elapsed();
        let error = error.map(|e| e.to_string());

        debug!(
            span_name = %span.name,
            span_type = %span.span_type,
            dd.trace_id = span.trace_id,
            dd.span_id = span.span_id,
            duration_us = duration.as_micros() as u64,
            error = error.as_deref().unwrap_or(""),
            "span finished"
        );

        FinishedSpan {
            trace_id: span.trace_id,
            span_id: span.span_id,
            duration,
            error,
        }
    }
}
