//! Shared utility functions

/// Normalize an angle to [0, 360) degrees
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let a = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if a >= 360.0 {
        0.0
    } else {
        a
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_normalize_degrees() {
        assert_abs_diff_eq!(normalize_degrees(0.0), 0.0);
        assert_abs_diff_eq!(normalize_degrees(360.0), 0.0);
        assert_abs_diff_eq!(normalize_degrees(-90.0), 270.0);
        assert_abs_diff_eq!(normalize_degrees(725.0), 5.0);
        assert_abs_diff_eq!(normalize_degrees(-1085.0), 355.0, epsilon = 1e-3);
    }

    #[test]
    fn test_tiny_negative_stays_in_range() {
        let a = normalize_degrees(-1e-7);
        assert!((0.0..360.0).contains(&a));
    }
}
