//! # Rate limited ramp
//!
//! Shared primitive used by both actuator controllers to move a value towards its target by a
//! bounded amount per update.

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use std::ops::{Add, Sub};

use serde::Deserialize;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Step limits for a ramp.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RampRate<T> {
    /// Largest increase per update
    pub step_up: T,

    /// Largest decrease per update
    pub step_down: T,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl<T> RampRate<T>
where
    T: Copy + PartialOrd + Add<Output = T> + Sub<Output = T>
{
    pub fn new(step_up: T, step_down: T) -> Self {
        Self { step_up, step_down }
    }

    /// A ramp which moves at the same rate in both directions.
    pub fn symmetric(step: T) -> Self {
        Self::new(step, step)
    }

    /// Next value of `current` on its way to `target`.
    pub fn next(&self, current: T, target: T) -> T {
        ramp(current, target, self.step_up, self.step_down)
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Move `current` towards `target` by at most `step_up` if it is below the target, or at most
/// `step_down` if it is above it. The result never passes the target.
///
/// The remaining distance is compared against the step, rather than adding the step and then
/// clamping, so that values near the limits of an integer type cannot overflow.
pub fn ramp<T>(current: T, target: T, step_up: T, step_down: T) -> T
where
    T: Copy + PartialOrd + Add<Output = T> + Sub<Output = T>
{
    if current < target {
        if target - current > step_up {
            current + step_up
        }
        else {
            target
        }
    }
    else if current > target {
        if current - target > step_down {
            current - step_down
        }
        else {
            target
        }
    }
    else {
        current
    }
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ramp_int() {
        assert_eq!(ramp(0, 100, 5, 5), 5);
        assert_eq!(ramp(98, 100, 5, 5), 100);
        assert_eq!(ramp(100, 100, 5, 5), 100);
        assert_eq!(ramp(10, -50, 5, 7), 3);
        assert_eq!(ramp(-48, -50, 5, 7), -50);
    }

    #[test]
    fn test_ramp_float_asymmetric() {
        let r: RampRate<f64> = RampRate::new(0.05, 0.1);

        assert!((r.next(0.0, 2.0) - 0.05).abs() < 1e-12);
        assert!((r.next(0.0, -2.0) + 0.1).abs() < 1e-12);
        assert_eq!(r.next(1.99, 2.0), 2.0);
    }

    #[test]
    fn test_ramp_converges_exactly() {
        for &(start, target, up, down) in &[
            (0i32, 255, 5, 5),
            (-255, 255, 7, 3),
            (255, -255, 1, 13),
            (17, 17, 4, 4),
        ] {
            let mut v = start;
            let mut n = 0;
            while v != target {
                let next = ramp(v, target, up, down);

                // Step bound holds and the target is never crossed
                assert!((next - v).abs() <= up.max(down));
                if start < target {
                    assert!(next <= target);
                }
                else {
                    assert!(next >= target);
                }

                v = next;
                n += 1;
                assert!(n < 1000);
            }
            assert_eq!(v, target);
        }

        let mut f = 0.0f64;
        for _ in 0..100 {
            f = ramp(f, 2.0, 0.05, 0.05);
        }
        assert_eq!(f, 2.0);
    }
}
