use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::event::TickEvent;
use super::ticker::{JitteredTicker, TickerStats};

/// Receives dispatched ticks. Called synchronously from the loop, so a slow
/// handler delays the next wait and may cause ticks to be dropped.
pub trait TickHandler {
    fn on_normal_tick(&mut self, tick: TickEvent);
    fn on_error_tick(&mut self, tick: TickEvent);
}

/// Dispatch counts plus each ticker's final stats.
///
/// Delivery is best effort, so a ticker's `delivered` may exceed the matching
/// `*_dispatched` count. When both tickers hand off in the same poll, `select!`
/// takes one branch and drops the other `recv()` with its tick inside. A tick
/// that arrives after cancellation is likewise delivered but not dispatched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopSummary {
    pub normal_dispatched: u64,
    pub error_dispatched: u64,
    pub normal_ticker: TickerStats,
    pub error_ticker: TickerStats,
}

/// Multiplexes a normal and an error ticker against a cancellation token.
pub struct EventLoop {
    cancel: CancellationToken,
    normal: JitteredTicker,
    error: JitteredTicker,
}

impl EventLoop {
    pub fn new(cancel: CancellationToken, normal: JitteredTicker, error: JitteredTicker) -> Self {
        Self { cancel, normal, error }
    }

    /// Dispatches ticks until the token is cancelled, then stops both tickers.
    pub async fn run<H: TickHandler>(self, handler: &mut H) -> LoopSummary {
        let EventLoop { cancel, mut normal, mut error } = self;
        let mut summary = LoopSummary::default();

        info!(
            normal = %normal.label(),
            error = %error.label(),
            "event loop running"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                Some(tick) = normal.recv() => {
                    // A tick that raced with cancellation is not dispatched.
                    if cancel.is_cancelled() {
                        break;
                    }
                    handler.on_normal_tick(tick);
                    summary.normal_dispatched += 1;
                }
                Some(tick) = error.recv() => {
                    if cancel.is_cancelled() {
                        break;
                    }
                    handler.on_error_tick(tick);
                    summary.error_dispatched += 1;
                }
            }
        }

        debug!("cancellation observed, stopping tickers");
        let (normal_ticker, error_ticker) = tokio::join!(normal.stop(), error.stop());
        summary.normal_ticker = normal_ticker;
        summary.error_ticker = error_ticker;

        info!(
            normal_dispatched = summary.normal_dispatched,
            error_dispatched = summary.error_dispatched,
            "event loop stopped"
        );
        summary
    }
}
