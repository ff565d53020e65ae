//! Jittered ticker: fires at random intervals drawn from `[min, max)`.
//!
//! Delivery is a rendezvous. A tick only reaches a consumer that is awaiting
//! `recv()` at the moment the timer fires; otherwise it is dropped. The
//! producer never waits on a consumer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{debug, trace, warn};

use super::event::TickEvent;
use super::time::IntervalBounds;

type Waiter = oneshot::Sender<TickEvent>;
type StopRequest = oneshot::Sender<()>;

/// `delivered` counts hand-offs into a live receive slot. A slot whose
/// `recv()` future is dropped right after the hand-off (for example the losing
/// branch of a `select!` when two sources fire in the same poll) still counts
/// as delivered, even though its consumer never sees the tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerStats {
    pub delivered: u64,
    pub dropped: u64,
}

#[derive(Debug, Default)]
struct TickCounters {
    delivered: AtomicU64,
    dropped: AtomicU64,
}

impl TickCounters {
    fn snapshot(&self) -> TickerStats {
        TickerStats {
            delivered: self.delivered.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

pub struct JitteredTicker {
    label: String,
    bounds: IntervalBounds,
    waiters: mpsc::UnboundedSender<Waiter>,
    stop_tx: Option<oneshot::Sender<StopRequest>>,
    handle: Option<JoinHandle<()>>,
    counters: Arc<TickCounters>,
}

impl JitteredTicker {
    /// Starts the background loop immediately. Must be called inside a tokio runtime.
    pub fn new(bounds: IntervalBounds) -> Self {
        Self::named("ticker", bounds)
    }

    pub fn named(label: impl Into<String>, bounds: IntervalBounds) -> Self {
        let label = label.into();
        let (waiters_tx, waiters_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        let counters = Arc::new(TickCounters::default());

        let worker = TickerLoop {
            label: label.clone(),
            bounds,
            waiters: waiters_rx,
            pending: VecDeque::new(),
            stop_rx,
            counters: counters.clone(),
        };
        let handle = tokio::spawn(worker.run());

        debug!(ticker = %label, min = ?bounds.min(), max = ?bounds.max(), "ticker started");

        Self {
            label,
            bounds,
            waiters: waiters_tx,
            stop_tx: Some(stop_tx),
            handle: Some(handle),
            counters,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn bounds(&self) -> IntervalBounds {
        self.bounds
    }

    pub fn stats(&self) -> TickerStats {
        self.counters.snapshot()
    }

    /// Waits for the next tick. Returns `None` once the ticker has stopped.
    ///
    /// Cancel-safe: dropping the returned future abandons the slot, and a tick
    /// fired into an abandoned slot counts as dropped.
    pub async fn recv(&self) -> Option<TickEvent> {
        let (slot_tx, slot_rx) = oneshot::channel();
        self.waiters.send(slot_tx).ok()?;
        slot_rx.await.ok()
    }

    /// Stops the background loop and waits for it to exit. After this returns
    /// the event source is closed and `recv()` yields `None`. Calling it again
    /// only returns the final stats.
    pub async fn stop(&mut self) -> TickerStats {
        if let Some(stop_tx) = self.stop_tx.take() {
            let (ack_tx, ack_rx) = oneshot::channel();
            if stop_tx.send(ack_tx).is_ok() {
                let _ = ack_rx.await;
            }
        }

        match self.handle.take() {
            Some(handle) => {
                if let Err(e) = handle.await {
                    warn!(ticker = %self.label, "ticker task ended abnormally: {}", e);
                }
                let stats = self.counters.snapshot();
                debug!(
                    ticker = %self.label,
                    delivered = stats.delivered,
                    dropped = stats.dropped,
                    "ticker stopped"
                );
                stats
            }
            None => self.counters.snapshot(),
        }
    }
}

struct TickerLoop {
    label: String,
    bounds: IntervalBounds,
    waiters: mpsc::UnboundedReceiver<Waiter>,
    pending: VecDeque<Waiter>,
    stop_rx: oneshot::Receiver<StopRequest>,
    counters: Arc<TickCounters>,
}

impl TickerLoop {
    async fn run(mut self) {
        let mut rng = StdRng::from_entropy();

        let mut wait = self.bounds.sample(&mut rng);
        let timer = sleep(wait);
        tokio::pin!(timer);

        loop {
            tokio::select! {
                request = &mut self.stop_rx => {
                    // A dropped handle counts as a stop request with nobody to acknowledge.
                    self.close();
                    if let Ok(ack) = request {
                        let _ = ack.send(());
                    }
                    return;
                }
                Some(slot) = self.waiters.recv() => {
                    self.pending.retain(|s| !s.is_closed());
                    self.pending.push_back(slot);
                }
                () = &mut timer => {
                    let tick = TickEvent::now();
                    if self.hand_off(tick) {
                        self.counters.delivered.fetch_add(1, Ordering::Relaxed);
                        trace!(ticker = %self.label, after = ?wait, "tick delivered");
                    } else {
                        self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                        trace!(
                            ticker = %self.label,
                            after = ?wait,
                            "no receiver ready, tick dropped"
                        );
                    }

                    wait = self.bounds.sample(&mut rng);
                    timer.as_mut().reset(Instant::now() + wait);
                }
            }
        }
    }

    /// Gives the tick to the first slot still listening. Abandoned slots are discarded.
    fn hand_off(&mut self, tick: TickEvent) -> bool {
        while let Ok(slot) = self.waiters.try_recv() {
            self.pending.push_back(slot);
        }
        while let Some(slot) = self.pending.pop_front() {
            if slot.send(tick).is_ok() {
                return true;
            }
        }
        false
    }

    fn close(&mut self) {
        self.waiters.close();
        // Dropping pending slots resolves their receivers to `None`.
        while self.waiters.try_recv().is_ok() {}
        self.pending.clear();
    }
}
