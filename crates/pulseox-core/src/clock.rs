//! Millisecond time sources for beat timing.
//!
//! Timestamps are `u32` milliseconds, matching the microcontroller uptime
//! counter the pipeline was tuned against. They wrap after ~49.7 days.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

pub trait Clock {
    /// Milliseconds on a monotonic timeline.
    fn now_ms(&self) -> u32;
}

/// Wall-clock uptime since construction.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u32 {
        self.origin.elapsed().as_millis() as u32
    }
}

/// Externally driven clock for tests, simulation and replay.
///
/// Clones share the same underlying time, so a driver can keep one handle
/// while the pipeline owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u32>>,
}

impl ManualClock {
    pub fn new(start_ms: u32) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, ms: u32) {
        self.now.set(ms);
    }

    pub fn advance(&self, delta_ms: u32) {
        self.now.set(self.now.get().wrapping_add(delta_ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}
