use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::kernel::event::TickKind;

// Only ids, counts and durations. Log messages and hashes stay in the log stream.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    SpanFinished {
        kind: TickKind,
        trace_id: u64,
        span_id: u64,
        duration_us: u64,
        errored: bool,
    },

    SessionSummary {
        run_id: Uuid,
        elapsed_ms: u64,
        normal_spans: u64,
        error_spans: u64,
        errored_spans: u64,
        avg_span_duration_us: f64,
        max_span_duration_us: u64,
    },
}
