use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{error, info};

use super::tracer::{ActiveSpan, SpanTracer};
use crate::kernel::event::{TickEvent, TickKind};
use crate::kernel::event_loop::TickHandler;
use crate::kernel::telemetry::event::TelemetryEvent;
use crate::kernel::telemetry::recorder::TelemetryRecorder;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmitError {
    /// The synthetic failure attached to every error span.
    #[error("generate an error span")]
    Generated,
}

/// Lowercase hex SHA-256 of the tick's string form.
pub fn hash_timestamp(tick: &TickEvent) -> String {
    format!("{:x}", Sha256::digest(tick.to_string().as_bytes()))
}

/// Turns ticks into spans and log lines.
pub struct SpanEmitter<T: SpanTracer> {
    name: String,
    span_type: String,
    tracer: T,
    telemetry: TelemetryRecorder,
}

impl<T: SpanTracer> SpanEmitter<T> {
    pub fn new(name: impl Into<String>, span_type: impl Into<String>, tracer: T) -> Self {
        Self {
            name: name.into(),
            span_type: span_type.into(),
            tracer,
            telemetry: TelemetryRecorder::new(),
        }
    }

    pub fn telemetry(&self) -> &TelemetryRecorder {
        &self.telemetry
    }

    pub fn tracer(&self) -> &T {
        &self.tracer
    }

    fn finish(&mut self, kind: TickKind, span: ActiveSpan, err: Option<&EmitError>) {
        let finished = self
            .tracer
            .finish_span(span, err.map(|e| e as &(dyn std::error::Error + 'static)));

        self.telemetry.record(TelemetryEvent::SpanFinished {
            kind,
            trace_id: finished.trace_id,
            span_id: finished.span_id,
            duration_us: finished.duration.as_micros() as u64,
            errored: finished.error.is_some(),
        });
    }
}

impl<T: SpanTracer> TickHandler for SpanEmitter<T> {
    fn on_normal_tick(&mut self, tick: TickEvent) {
        let span = self.tracer.start_span(&self.name, &self.span_type);
        let hash = hash_timestamp(&tick);

        info!(
            dd.span_id = span.span_id,
            dd.trace_id = span.trace_id,
            "generate a span with the sha256 hashed timestamp({})",
            hash
        );

        self.finish(TickKind::Normal, span, None);
    }

    fn on_error_tick(&mut self, _tick: TickEvent) {
        let span = self.tracer.start_span(&self.name, &self.span_type);
        let err = EmitError::Generated;

        error!(
            dd.span_id = span.span_id,
            dd.trace_id = span.trace_id,
            "{}",
            err
        );

        self.finish(TickKind::Error, span, Some(&err));
    }
}
