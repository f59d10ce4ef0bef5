//! Clock and timer bookkeeping
//!
//! Timers are settled by the scheduler at the start of each step, so waits are
//! measured in whole ticks. The clock is injectable so tests can drive time by
//! hand.

use super::awaitable::{pending, Awaitable, Resolver};
use crate::value::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Monotonic time source
pub trait Clock: Send + Sync {
    /// Time elapsed since some fixed origin
    fn now(&self) -> Duration;
}

/// Wall-clock time since construction
#[derive(Debug, Clone)]
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.micros
            .fetch_add(by.as_micros() as u64, Ordering::SeqCst);
    }

    pub fn set(&self, at: Duration) {
        self.micros.store(at.as_micros() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_micros(self.micros.load(Ordering::SeqCst))
    }
}

struct PendingTimer {
    due: Duration,
    resolver: Resolver,
}

/// Outstanding delays plus the user-visible stopwatch
pub struct Timers {
    clock: Arc<dyn Clock>,
    pending: Vec<PendingTimer>,
    origin: Duration,
}

impl Timers {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let origin = clock.now();
        Self {
            clock,
            pending: Vec::new(),
            origin,
        }
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// An awaitable settled with null once `duration` has passed
    pub fn delay(&mut self, duration: Duration) -> Awaitable {
        let (resolver, awaitable) = pending();
        self.pending.push(PendingTimer {
            due: self.clock.now() + duration,
            resolver,
        });
        awaitable
    }

    /// Settle every timer that is due. Returns how many fired.
    pub fn fire_due(&mut self) -> usize {
        let now = self.clock.now();
        let mut fired = 0;
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due <= now {
                let timer = self.pending.swap_remove(i);
                // A dropped waiter (restarted thread) is fine
                timer.resolver.resolve(Value::Null);
                fired += 1;
            } else {
                i += 1;
            }
        }
        fired
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Seconds on the stopwatch
    pub fn elapsed_seconds(&self) -> f64 {
        self.clock.now().saturating_sub(self.origin).as_secs_f64()
    }

    /// Restart the stopwatch
    pub fn reset(&mut self) {
        self.origin = self.clock.now();
    }

    /// Drop every outstanding delay
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}

impl std::fmt::Debug for Timers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timers")
            .field("pending", &self.pending.len())
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::awaitable::AwaitableStatus;

    #[test]
    fn test_delay_fires_when_due() {
        let clock = ManualClock::new();
        let mut timers = Timers::new(Arc::new(clock.clone()));
        let mut wait = timers.delay(Duration::from_millis(500));

        assert_eq!(timers.fire_due(), 0);
        assert_eq!(wait.poll(), AwaitableStatus::Pending);

        clock.advance(Duration::from_millis(500));
        assert_eq!(timers.fire_due(), 1);
        assert_eq!(wait.poll(), AwaitableStatus::Settled(Value::Null));
        assert_eq!(timers.pending_count(), 0);
    }

    #[test]
    fn test_stopwatch_reset() {
        let clock = ManualClock::new();
        let mut timers = Timers::new(Arc::new(clock.clone()));
        clock.advance(Duration::from_secs(2));
        assert_eq!(timers.elapsed_seconds(), 2.0);
        timers.reset();
        clock.advance(Duration::from_millis(250));
        assert_eq!(timers.elapsed_seconds(), 0.25);
    }
}
