//! Fixed-point helpers for position blending.
//!
//! Simulation coordinates are integers. The only fractional quantity the
//! pool handles is the tween factor, which stays fixed-point so blended
//! positions are identical on every platform.

use fixed::types::I32F32;

/// Fixed-point number type for blend factors.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Clamp a blend factor into `[0, 1]`.
#[must_use]
pub fn clamp_unit(alpha: Fixed) -> Fixed {
    alpha.clamp(Fixed::ZERO, Fixed::ONE)
}

/// Blend two integer coordinates: `from * (1 - alpha) + to * alpha`,
/// rounded to the nearest integer (ties away from zero).
#[must_use]
pub fn lerp_coord(from: i32, to: i32, alpha: Fixed) -> i32 {
    let inv = Fixed::ONE - alpha;
    let blended = Fixed::from_num(to) * alpha + Fixed::from_num(from) * inv;
    blended.round().to_num::<i32>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp_endpoints() {
        assert_eq!(lerp_coord(10, 50, Fixed::ZERO), 10);
        assert_eq!(lerp_coord(10, 50, Fixed::ONE), 50);
    }

    #[test]
    fn test_lerp_midpoint_rounds() {
        assert_eq!(lerp_coord(0, 10, Fixed::from_num(0.5)), 5);
        // 0.5 * 3 = 1.5 rounds away from zero
        assert_eq!(lerp_coord(0, 3, Fixed::from_num(0.5)), 2);
        assert_eq!(lerp_coord(0, -3, Fixed::from_num(0.5)), -2);
    }

    #[test]
    fn test_clamp_unit() {
        assert_eq!(clamp_unit(Fixed::from_num(2)), Fixed::ONE);
        assert_eq!(clamp_unit(Fixed::from_num(-1)), Fixed::ZERO);
        assert_eq!(clamp_unit(Fixed::from_num(0.25)), Fixed::from_num(0.25));
    }
}
