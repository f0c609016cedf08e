//! Utility maths functions

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use num_traits::Float;

/// Map a value from one range into another.
pub fn lin_map<T>(source_range: (T, T), target_range: (T, T), value: T) -> T
where 
    T: Float 
{
    target_range.0 
        + ((value - source_range.0) 
        * (target_range.1 - target_range.0) 
        / (source_range.1 - source_range.0))
}

/// Limit a value to the range `[min, max]`.
pub fn clamp<T>(value: &T, min: &T, max: &T) -> T 
where
    T: PartialOrd + Copy
{
    let mut ret = *value;

    if ret > *max {
        ret = *max
    }
    if ret < *min {
        ret = *min
    }

    ret
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_lin_map() {
        assert_eq!(lin_map((0f64, 180f64), (150f64, 600f64), 0f64), 150f64);
        assert_eq!(lin_map((0f64, 180f64), (150f64, 600f64), 90f64), 375f64);
        assert_eq!(lin_map((0f64, 180f64), (150f64, 600f64), 180f64), 600f64);
        assert_eq!(lin_map((-1f64, 1f64), (0f64, 10f64), 0f64), 5f64);
    }

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(&300, &-255, &255), 255);
        assert_eq!(clamp(&-300, &-255, &255), -255);
        assert_eq!(clamp(&12, &-255, &255), 12);
        assert_eq!(clamp(&181.5f64, &0.0, &180.0), 180.0);
    }
}
