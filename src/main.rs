use span_generator::{EventLoop, GeneratorConfig, JitteredTicker, LogTracer, SpanEmitter};
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging/tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let run_id = Uuid::new_v4();
    let cfg = GeneratorConfig::from_env();
    let normal_bounds = cfg.normal_bounds()?;
    let error_bounds = cfg.error_bounds()?;

    info!(
        %run_id,
        span_name = %cfg.span_name,
        span_type = %cfg.span_type,
        span_interval_ms = ?(cfg.span_interval_min_ms, cfg.span_interval_max_ms),
        error_span_interval_ms = ?(cfg.error_span_interval_min_ms, cfg.error_span_interval_max_ms),
        "span generator starting"
    );

    let cancel = CancellationToken::new();
    tokio::spawn(watch_shutdown(cancel.clone()));

    let started = Instant::now();
    let event_loop = EventLoop::new(
        cancel,
        JitteredTicker::named("span", normal_bounds),
        JitteredTicker::named("error-span", error_bounds),
    );
    let mut emitter = SpanEmitter::new(
        cfg.span_name.clone(),
        cfg.span_type.clone(),
        LogTracer::new(),
    );

    let summary = event_loop.run(&mut emitter).await;

    let session = emitter.telemetry().aggregate_session(run_id, started.elapsed());
    info!(
        loop_summary = %serde_json::to_string(&summary)?,
        session = %serde_json::to_string(&session)?,
        "session summary"
    );
    info!("bye~~");
    Ok(())
}

/// Cancels the token on Ctrl+C or SIGTERM.
async fn watch_shutdown(cancel: CancellationToken) {
    match shutdown_signal().await {
        Ok(()) => {
            info!("shutdown requested");
            cancel.cancel();
        }
        Err(e) => warn!("failed to listen for shutdown signals: {}", e),
    }
}

#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut term = signal(SignalKind::terminate())?;
    tokio::select! {
        res = tokio::signal::ctrl_c() => res,
        _ = term.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
