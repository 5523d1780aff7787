use std::cell::Cell;
use std::time::{Duration, Instant};

/// Source of monotonic time for an attempt
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Production clock backed by `Instant::now`
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Used for replays and tests.
#[derive(Clone, Debug)]
pub struct ManualClock {
    base: Instant,
    elapsed: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(base: Instant) -> Self {
        Self {
            base,
            elapsed: Cell::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }

    /// Moves the clock to `elapsed` past its base. Never goes backwards.
    pub fn set_elapsed(&self, elapsed: Duration) {
        if elapsed > self.elapsed.get() {
            self.elapsed.set(elapsed);
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + self.elapsed.get()
    }
}
