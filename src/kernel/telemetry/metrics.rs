use std::collections::VecDeque;

use super::event::TelemetryEvent;
use crate::kernel::event::TickKind;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub span_stats: SpanStats,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpanStats {
    pub normal: u64,
    pub error: u64,
    pub errored: u64,
    pub total_duration_us: u64,
    pub avg_duration_us: f64,
    pub max_duration_us: u64,
}

impl SpanStats {
    pub fn total(&self) -> u64 {
        self.normal + self.error
    }

    /// Folds one finished span in. Non-span events are ignored.
    pub fn observe(&mut self, event: &TelemetryEvent) {
        if let TelemetryEvent::SpanFinished { kind, duration_us, errored, .. } = event {
            match kind {
                TickKind::Normal => self.normal += 1,
                TickKind::Error => self.error += 1,
            }
            if *errored {
                self.errored += 1;
            }
            self.total_duration_us = self.total_duration_us.saturating_add(*duration_us);
            self.max_duration_us = self.max_duration_us.max(*duration_us);

            self.avg_duration_us = self.total_duration_us as f64 / self.total() as f64;
        }
    }
}

/// Stats over the events still held in the buffer.
pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();
    for event in events {
        snap.span_stats.observe(event);
    }
    snap
}
