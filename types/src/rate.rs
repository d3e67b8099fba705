//! The shared pacing interval.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Pacing interval used when nothing else is configured.
pub const DEFAULT_KEY_RATE: Duration = Duration::from_secs(1);

/// Minimum interval between two emissions sharing a key.
///
/// A `KeyRate` is a handle: clones share the same underlying value, so a
/// [`set`](Self::set) on any clone is observed by every emitter the next time
/// it arms a wait. Emitters already waiting keep the interval they read.
///
/// The interval is stored as whole nanoseconds; durations longer than
/// `u64::MAX` nanoseconds (~584 years) saturate.
#[derive(Clone)]
pub struct KeyRate(Arc<AtomicU64>);

impl KeyRate {
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self(Arc::new(AtomicU64::new(to_nanos(interval))))
    }

    /// Current interval.
    #[must_use]
    pub fn get(&self) -> Duration {
        Duration::from_nanos(self.0.load(Ordering::Acquire))
    }

    /// Replace the interval for every handle sharing this rate.
    pub fn set(&self, interval: Duration) {
        self.0.store(to_nanos(interval), Ordering::Release);
    }
}

impl Default for KeyRate {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_RATE)
    }
}

impl From<Duration> for KeyRate {
    fn from(interval: Duration) -> Self {
        Self::new(interval)
    }
}

impl fmt::Debug for KeyRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeyRate").field(&self.get()).finish()
    }
}

fn to_nanos(interval: Duration) -> u64 {
    u64::try_from(interval.as_nanos()).unwrap_or(u64::MAX)
}
