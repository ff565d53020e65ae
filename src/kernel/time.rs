use std::time::Duration;

use rand::Rng;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BoundsError {
    #[error("interval min ({min:?}) is greater than max ({max:?})")]
    Inverted { min: Duration, max: Duration },
    #[error("interval bounds are both zero")]
    Zero,
}

/// Inclusive-exclusive range `[min, max)` a jittered ticker draws from.
///
/// `min == max` is accepted and yields a fixed interval. An inverted range or
/// a zero-width range at zero is rejected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalBounds {
    min: Duration,
    max: Duration,
}

impl IntervalBounds {
    pub fn new(min: Duration, max: Duration) -> Result<Self, BoundsError> {
        if min > max {
            return Err(BoundsError::Inverted { min, max });
        }
        if max.is_zero() {
            return Err(BoundsError::Zero);
        }
        Ok(Self { min, max })
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Result<Self, BoundsError> {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    /// Fixed-period bounds, useful for a source that should effectively never fire.
    pub fn fixed(period: Duration) -> Result<Self, BoundsError> {
        Self::new(period, period)
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn width(&self) -> Duration {
        self.max - self.min
    }

    /// Uniform draw from `[min, max)` in whole milliseconds, or exactly `min`
    /// when the range is narrower than a millisecond.
    ///
    /// Offsets stay at the timer's resolution so that rounding a deadline up
    /// to the next millisecond can never reach `max`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let width_ms = u64::try_from(self.width().as_millis()).unwrap_or(u64::MAX);
        if width_ms == 0 {
            return self.min;
        }
        self.min + Duration::from_millis(rng.gen_range(0..width_ms))
    }
}
