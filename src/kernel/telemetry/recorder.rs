use std::collections::VecDeque;
use std::time::Duration;

use uuid::Uuid;

use super::event::TelemetryEvent;
use super::metrics::{compute_snapshot, SpanStats, TelemetrySnapshot};

pub const MAX_EVENTS: usize = 10_000;

#[derive(Debug)]
pub struct TelemetryRecorder {
    buffer: VecDeque<TelemetryEvent>,
    // Whole-session totals, unaffected by eviction.
    totals: SpanStats,
}

impl Default for TelemetryRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryRecorder {
    pub fn new() -> Self {
        Self {
            buffer: VecDeque::with_capacity(MAX_EVENTS),
            totals: SpanStats::default(),
        }
    }

    pub fn record(&mut self, event: TelemetryEvent) {
        self.totals.observe(&event);
        if self.buffer.len() >= MAX_EVENTS {
            self.buffer.pop_front();
        }
        self.buffer.push_back(event);
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn events(&self) -> impl Iterator<Item = &TelemetryEvent> {
        self.buffer.iter()
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        compute_snapshot(&self.buffer)
    }

    pub fn totals(&self) -> &SpanStats {
        &self.totals
    }

    /// Builds the shutdown summary from the whole-session totals.
    pub fn aggregate_session(&self, run_id: Uuid, elapsed: Duration) -> TelemetryEvent {
        let spans = &self.totals;

        TelemetryEvent::SessionSummary {
            run_id,
            elapsed_ms: elapsed.as_millis() as u64,
            normal_spans: spans.normal,
            error_spans: spans.error,
            errored_spans: spans.errored,
            avg_span_duration_us: spans.avg_duration_us,
            max_span_duration_us: spans.max_duration_us,
        }
    }
}
