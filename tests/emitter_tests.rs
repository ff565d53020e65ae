use sha2::{Digest, Sha256};
use span_generator::kernel::event::{TickEvent, TickKind};
use span_generator::kernel::event_loop::{EventLoop, TickHandler};
use span_generator::kernel::telemetry::event::TelemetryEvent;
use span_generator::kernel::telemetry::recorder::{TelemetryRecorder, MAX_EVENTS};
use span_generator::kernel::ticker::JitteredTicker;
use span_generator::kernel::time::IntervalBounds;
use span_generator::services::emitter::{hash_timestamp, EmitError, SpanEmitter};
use span_generator::services::tracer::{ActiveSpan, FinishedSpan, LogTracer, SpanTracer};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[derive(Default)]
struct RecordingTracer {
    next_id: u64,
    started: Vec<(String, String)>,
    finished: Vec<FinishedSpan>,
}

impl SpanTracer for RecordingTracer {
    fn start_span(&mut self, name: &str, span_type: &str) -> ActiveSpan {
        self.next_id += 1;
        self.started.push((name.to_string(), span_type.to_string()));
        ActiveSpan {
            name: name.to_string(),
            span_type: span_type.to_string(),
            trace_id: 1000 + self.next_id,
            span_id: self.next_id,
            started_at: Instant::now(),
        }
    }

    fn finish_span(
        &mut self,
        span: ActiveSpan,
        error: Option<&(dyn std::error::Error + 'static)>,
    ) -> FinishedSpan {
        let finished = FinishedSpan {
            trace_id: span.trace_id,
            span_id: span.span_id,
            duration: span.started_at.elapsed(),
            error: error.map(|e| e.to_string()),
        };
        self.finished.push(finished.clone());
        finished
    }
}

#[test]
fn test_hash_matches_sha256_of_timestamp_string() {
    let tick = TickEvent::now();
    let hash = hash_timestamp(&tick);

    assert_eq!(hash.len(), 64);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    assert_eq!(hash, format!("{:x}", Sha256::digest(tick.to_string().as_bytes())));
    assert_eq!(hash, hash_timestamp(&tick), "hash must be deterministic");
}

#[tokio::test]
async fn test_normal_tick_emits_clean_span() {
    let mut emitter = SpanEmitter::new("checkout", "web", RecordingTracer::default());
    emitter.on_normal_tick(TickEvent::now());

    let tracer = emitter.tracer();
    assert_eq!(tracer.started, vec![("checkout".to_string(), "web".to_string())]);
    assert_eq!(tracer.finished.len(), 1);
    assert!(tracer.finished[0].error.is_none());

    let snap = emitter.telemetry().snapshot();
    assert_eq!(snap.span_stats.normal, 1);
    assert_eq!(snap.span_stats.error, 0);
    assert_eq!(snap.span_stats.errored, 0);
}

#[tokio::test]
async fn test_error_tick_marks_span_errored() {
    let mut emitter = SpanEmitter::new("span-generator", "custom", RecordingTracer::default());
    emitter.on_error_tick(TickEvent::now());

    let finished = &emitter.tracer().finished;
    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].error.as_deref(), Some("generate an error span"));
    assert_eq!(EmitError::Generated.to_string(), "generate an error span");

    let recorded: Vec<&TelemetryEvent> = emitter.telemetry().events().collect();
    assert!(matches!(
        recorded[0],
        TelemetryEvent::SpanFinished {
            kind: TickKind::Error,
            errored: true,
            trace_id: 1001,
            span_id: 1,
            ..
        }
    ));
}

#[tokio::test]
async fn test_log_tracer_assigns_nonzero_ids() {
    let mut tracer = LogTracer::new();
    for _ in 0..100 {
        let span = tracer.start_span("span-generator", "custom");
        assert_ne!(span.trace_id, 0);
        assert_ne!(span.span_id, 0);

        let err = EmitError::Generated;
        let finished = tracer.finish_span(span.clone(), Some(&err));
        assert_eq!(finished.trace_id, span.trace_id);
        assert_eq!(finished.error.as_deref(), Some("generate an error span"));
    }
}

#[test]
fn test_recorder_is_bounded() {
    let mut recorder = TelemetryRecorder::new();
    for i in 0..(MAX_EVENTS as u64 + 5) {
        recorder.record(TelemetryEvent::SpanFinished {
            kind: TickKind::Normal,
            trace_id: i,
            span_id: i,
            duration_us: 10,
            errored: false,
        });
    }

    assert_eq!(recorder.len(), MAX_EVENTS);
    // Oldest entries were evicted.
    assert!(matches!(
        recorder.events().next(),
        Some(TelemetryEvent::SpanFinished { trace_id: 5, .. })
    ));
}

#[test]
fn test_session_summary_counts_evicted_spans() {
    let mut recorder = TelemetryRecorder::new();
    let recorded = MAX_EVENTS as u64 + 5_000;
    for i in 0..recorded {
        let kind = if i % 5 == 0 { TickKind::Error } else { TickKind::Normal };
        recorder.record(TelemetryEvent::SpanFinished {
            kind,
            trace_id: i,
            span_id: i,
            duration_us: i,
            errored: kind == TickKind::Error,
        });
    }

    // The buffer only holds the tail; the summary still covers every span.
    assert_eq!(recorder.len(), MAX_EVENTS);
    assert_eq!(recorder.snapshot().span_stats.total(), MAX_EVENTS as u64);
    assert_eq!(recorder.totals().total(), recorded);

    match recorder.aggregate_session(Uuid::new_v4(), Duration::from_secs(60)) {
        TelemetryEvent::SessionSummary {
            normal_spans,
            error_spans,
            errored_spans,
            max_span_duration_us,
            ..
        } => {
            assert_eq!(normal_spans + error_spans, recorded);
            assert_eq!(error_spans, recorded / 5);
            assert_eq!(errored_spans, error_spans);
            assert_eq!(max_span_duration_us, recorded - 1);
        }
        other => panic!("unexpected event: {:?}", other),
    }
}

#[test]
fn test_session_summary_aggregates_spans() {
    let mut recorder = TelemetryRecorder::new();
    for (kind, duration_us, errored) in [
        (TickKind::Normal, 10, false),
        (TickKind::Normal, 30, false),
        (TickKind::Error, 50, true),
    ] {
        recorder.record(TelemetryEvent::SpanFinished {
            kind,
            trace_id: 1,
            span_id: 1,
            duration_us,
            errored,
        });
    }

    let run_id = Uuid::new_v4();
    let summary = recorder.aggregate_session(run_id, Duration::from_secs(2));
    match summary {
        TelemetryEvent::SessionSummary {
            run_id: id,
            elapsed_ms,
            normal_spans,
            error_spans,
            errored_spans,
            avg_span_duration_us,
            max_span_duration_us,
        } => {
            assert_eq!(id, run_id);
            assert_eq!(elapsed_ms, 2000);
            assert_eq!(normal_spans, 2);
            assert_eq!(error_spans, 1);
            assert_eq!(errored_spans, 1);
            assert!((avg_span_duration_us - 30.0).abs() < f64::EPSILON);
            assert_eq!(max_span_duration_us, 50);
        }
        other => panic!("unexpected event: {:?}", other),
    }

    let json = serde_json::to_string(&summary).unwrap();
    assert!(json.contains("SessionSummary"));
}

#[tokio::test(start_paused = true)]
async fn test_event_loop_drives_emitter() {
    let cancel = CancellationToken::new();
    let event_loop = EventLoop::new(
        cancel.clone(),
        JitteredTicker::named("span", IntervalBounds::from_millis(10, 20).unwrap()),
        JitteredTicker::named("error-span", IntervalBounds::from_millis(50, 60).unwrap()),
    );

    let stopper = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(600)).await;
        stopper.cancel();
    });

    let mut emitter = SpanEmitter::new("span-generator", "custom", RecordingTracer::default());
    let summary = event_loop.run(&mut emitter).await;

    let spans = emitter.telemetry().snapshot().span_stats;
    assert_eq!(spans.normal, summary.normal_dispatched);
    assert_eq!(spans.error, summary.error_dispatched);
    assert_eq!(spans.errored, spans.error);
    assert!(spans.normal > 0 && spans.error > 0);
    assert_eq!(emitter.tracer().finished.len() as u64, spans.total());
}
