//! General time utility functions
//!
//! All cyclic processing in the actuator executable works on a monotonic
//! millisecond clock. Components which only run on a fixed cadence use a
//! [`PeriodicGate`] to decide when they are due, rather than relying on a
//! central scheduler.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use chrono;
use std::time::Instant;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of nanoseconds in a second
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

// ---------------------------------------------------------------------------
// TYPES
// ---------------------------------------------------------------------------

/// Monotonic timestamp or duration in milliseconds.
pub type Millis = u64;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// A source of monotonic time.
pub trait Clock {
    /// Milliseconds elapsed since the clock was started.
    fn now_ms(&self) -> Millis;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A [`Clock`] backed by the operating system's monotonic clock.
pub struct SystemClock {
    start: Instant
}

/// Decides whether a periodic task is due to run.
///
/// The gate remembers when it last opened and opens again once at least
/// `period_ms` has elapsed since then.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodicGate {
    period_ms: Millis,
    last_run_ms: Millis
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl SystemClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        self.start.elapsed().as_millis() as Millis
    }
}

impl PeriodicGate {
    /// Create a new gate with the given period, treating time zero as the
    /// last run.
    pub fn new(period_ms: Millis) -> Self {
        Self {
            period_ms,
            last_run_ms: 0
        }
    }

    /// Returns `true` if the task should run at `now_ms`, recording `now_ms`
    /// as the last run time if so.
    pub fn ready(&mut self, now_ms: Millis) -> bool {
        if now_ms.saturating_sub(self.last_run_ms) >= self.period_ms {
            self.last_run_ms = now_ms;
            true
        }
        else {
            false
        }
    }

    /// The period of this gate.
    pub fn period_ms(&self) -> Millis {
        self.period_ms
    }

    /// The time at which the gate last opened.
    pub fn last_run_ms(&self) -> Millis {
        self.last_run_ms
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Convert a duration into a number of seconds, or `None` if overflow
pub fn duration_to_seconds(duration: chrono::Duration) -> Option<f64> {
    duration
        .num_nanoseconds()
        .map(|ns| ns as f64 / NANOS_PER_SECOND as f64)
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_periodic_gate() {
        let mut gate = PeriodicGate::new(10);

        assert!(!gate.ready(5));
        assert!(gate.ready(10));
        assert_eq!(gate.last_run_ms(), 10);

        // Not again until a full period has passed since the last run
        assert!(!gate.ready(19));
        assert!(gate.ready(23));
        assert!(!gate.ready(32));
        assert!(gate.ready(33));
    }

    #[test]
    fn test_periodic_gate_clock_behind() {
        let mut gate = PeriodicGate::new(10);
        assert!(gate.ready(100));

        // A timestamp before the last run never opens the gate
        assert!(!gate.ready(50));
    }

    #[test]
    fn test_duration_to_seconds() {
        assert_eq!(
            duration_to_seconds(chrono::Duration::milliseconds(1500)),
            Some(1.5)
        );
    }
}
