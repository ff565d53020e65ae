use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

/// Which ticker produced a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TickKind {
    Normal,
    Error,
}

impl fmt::Display for TickKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickKind::Normal => f.write_str("normal"),
            TickKind::Error => f.write_str("error"),
        }
    }
}

/// A single tick. Carries the wall-clock time it was generated at plus the
/// runtime's monotonic instant (the latter follows a paused test clock).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEvent {
    pub emitted_at: DateTime<Utc>,
    pub instant: Instant,
}

impl TickEvent {
    pub fn now() -> Self {
        Self {
            emitted_at: Utc::now(),
            instant: Instant::now(),
        }
    }
}

impl fmt::Display for TickEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.emitted_at.to_rfc3339_opts(SecondsFormat::Nanos, true))
    }
}
