//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Floor a f64 into the u32 range, returning `None` for negative or non-finite values.
#[must_use]
pub fn floor_f64_to_u32(value: f64) -> Option<u32> {
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    let max = cast::<u32, f64>(u32::MAX).unwrap_or(f64::MAX);
    cast::<f64, u32>(value.min(max).floor())
}

/// Percentage of `current` against `target`, clamped to `0.0..=100.0`.
#[must_use]
pub fn progress_pct(current: u32, target: u32) -> f32 {
    if target == 0 {
        return 100.0;
    }
    let ratio = f64::from(current) / f64::from(target) * 100.0;
    cast::<f64, f32>(ratio.min(100.0)).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_rejects_negative_and_non_finite() {
        assert_eq!(floor_f64_to_u32(77.5), Some(77));
        assert_eq!(floor_f64_to_u32(-1.0), None);
        assert_eq!(floor_f64_to_u32(f64::NAN), None);
        assert_eq!(floor_f64_to_u32(f64::from(u32::MAX) * 4.0), Some(u32::MAX));
    }

    #[test]
    fn progress_clamps_to_hundred() {
        assert!((progress_pct(25, 50) - 50.0).abs() < f32::EPSILON);
        assert!((progress_pct(500, 50) - 100.0).abs() < f32::EPSILON);
        assert!((progress_pct(0, 0) - 100.0).abs() < f32::EPSILON);
    }
}
