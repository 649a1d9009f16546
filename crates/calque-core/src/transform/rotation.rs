//! Pointer-driven rotation about the layer center.
//!
//! The angle delta is the difference between the current pointer angle and
//! the pointer angle captured when the rotation started, both measured from
//! the layer center with `atan2(dy, dx)`:
//!
//! ```text
//! angle = normalize(start_angle + atan2(p - c) - atan2(p0 - c))
//! ```

use crate::geometry::{normalize_angle, pointer_angle, Point};

/// Layer angle after moving the pointer to `pointer`.
///
/// # Arguments
///
/// * `start_angle` - Layer angle when the rotation started (degrees)
/// * `center` - Layer center (pivot)
/// * `initial_pointer_angle` - `atan2` angle of the pointer at start (degrees)
/// * `pointer` - Current pointer, same coordinate space as `center`
///
/// # Returns
///
/// The new angle, normalized into `[0, 360)`.
pub fn rotated_angle(start_angle: f64, center: Point, initial_pointer_angle: f64, pointer: Point) -> f64 {
    let delta = pointer_angle(center, pointer) - initial_pointer_angle;
    normalize_angle(start_angle + delta)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_angle(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_quarter_turn() {
        let c = Point::new(0.0, 0.0);
        let start = pointer_angle(c, Point::new(100.0, 0.0));
        assert_angle(rotated_angle(0.0, c, start, Point::new(0.0, 100.0)), 90.0);
    }

    #[test]
    fn test_counter_clockwise_wraps_below_zero() {
        let c = Point::new(50.0, 50.0);
        let start = pointer_angle(c, Point::new(150.0, 50.0));
        // Pointer moves above the center: -90°
        assert_angle(rotated_angle(10.0, c, start, Point::new(50.0, -50.0)), 280.0);
    }

    #[test]
    fn test_distance_from_center_is_irrelevant() {
        let c = Point::new(0.0, 0.0);
        let start = pointer_angle(c, Point::new(1.0, 0.0));
        let near = rotated_angle(45.0, c, start, Point::new(1.0, 1.0));
        let far = rotated_angle(45.0, c, start, Point::new(500.0, 500.0));
        assert_angle(near, far);
        assert_angle(near, 90.0);
    }

    #[test]
    fn test_crossing_the_atan2_seam() {
        // atan2 jumps from 180 to -180 on the negative x axis
        let c = Point::new(0.0, 0.0);
        let start = pointer_angle(c, Point::new(-100.0, -1.0));
        let angle = rotated_angle(0.0, c, start, Point::new(-100.0, 1.0));
        assert!(angle < 2.0 || angle > 358.0, "angle was {}", angle);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================
