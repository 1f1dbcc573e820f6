//! Monotonic time sources for pacing acquisition and gating publication.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// A monotonic clock. Time is measured from an arbitrary origin fixed when the clock is
/// created.
pub trait Clock {
    /// Time elapsed since the origin of the clock.
    fn now(&self) -> Duration;

    /// Block until `deadline` (relative to the origin) has been reached. Returns
    /// immediately if it already has.
    fn wait_until(&mut self, deadline: Duration) {
        while self.now() < deadline {
            core::hint::spin_loop();
        }
    }
}

/// Wall clock based on [`Instant`], waits by spinning so that the sampling jitter is not
/// bounded by the scheduler granularity of `thread::sleep`.
#[derive(Debug, Clone, Copy)]
pub struct Monotonic {
    origin: Instant,
}

impl Monotonic {
    pub fn new() -> Monotonic {
        Monotonic {
            origin: Instant::now(),
        }
    }
}

impl Default for Monotonic {
    fn default() -> Self {
        Monotonic::new()
    }
}

impl Clock for Monotonic {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Simulated clock that only moves when waited on or advanced explicitly. Clones share the
/// same time, so a sample source or sink can hold a handle and simulate slow calls.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> ManualClock {
        ManualClock::default()
    }

    pub fn advance(&self, d: Duration) {
        self.now.set(self.now.get() + d);
    }

    pub fn set(&self, t: Duration) {
        self.now.set(t);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn wait_until(&mut self, deadline: Duration) {
        if self.now.get() < deadline {
            self.now.set(deadline);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_wait_reaches_deadline() {
        let mut c = Monotonic::new();
        let deadline = c.now() + Duration::from_micros(500);
        c.wait_until(deadline);
        assert!(c.now() >= deadline);
    }

    #[test]
    fn monotonic_past_deadline_returns() {
        let mut c = Monotonic::new();
        c.wait_until(Duration::ZERO);
    }

    #[test]
    fn manual_clock_jumps_to_deadline() {
        let mut c = ManualClock::new();
        c.wait_until(Duration::from_millis(5));
        assert_eq!(c.now(), Duration::from_millis(5));

        // never goes backwards
        c.wait_until(Duration::from_millis(2));
        assert_eq!(c.now(), Duration::from_millis(5));
    }

    #[test]
    fn manual_clock_shared() {
        let c = ManualClock::new();
        let h = c.clone();
        h.advance(Duration::from_millis(3));
        assert_eq!(c.now(), Duration::from_millis(3));
    }
}
