#![forbid(unsafe_code)]

//! Numeric recovery for geometry read from untrusted state.
//!
//! Persisted widget state can carry `NaN`, infinities, or negative sizes
//! after a corrupted write or a bad import. None of those are errors here:
//! every helper substitutes a floor or a fallback and returns a usable
//! value.

use crate::geometry::{Point, Size};

/// `value` if finite, otherwise `fallback`.
#[inline]
pub fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}

/// Clamp to `>= 0`; non-finite input becomes `0`. Never returns `-0.0`.
#[inline]
pub fn non_negative(value: f64) -> f64 {
    let value = finite_or(value, 0.0);
    if value > 0.0 { value } else { 0.0 }
}

/// Clamp a finite, positive `value` up to `floor`. Non-finite or
/// non-positive input becomes `fallback` (itself floored).
#[inline]
pub fn at_least(value: f64, floor: f64, fallback: f64) -> f64 {
    let value = if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    };
    value.max(floor)
}

/// Position clamped into the non-negative quadrant.
#[inline]
pub fn position(point: Point) -> Point {
    Point::new(non_negative(point.x), non_negative(point.y))
}

/// Size with both axes floored to `min`; non-finite axes become `min`.
#[inline]
pub fn size(size: Size, min: f64) -> Size {
    Size::new(at_least(size.w, min, min), at_least(size.h, min, min))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn non_finite_values_fall_back() {
        assert_eq!(finite_or(f64::NAN, 3.0), 3.0);
        assert_eq!(finite_or(f64::INFINITY, 3.0), 3.0);
        assert_eq!(finite_or(2.0, 3.0), 2.0);
        assert_eq!(non_negative(f64::NEG_INFINITY), 0.0);
        assert_eq!(non_negative(-4.0), 0.0);
        assert!(non_negative(-0.0).is_sign_positive());
    }

    #[test]
    fn at_least_floors_and_defaults() {
        assert_eq!(at_least(50.0, 120.0, 240.0), 120.0);
        assert_eq!(at_least(300.0, 120.0, 240.0), 300.0);
        assert_eq!(at_least(f64::NAN, 120.0, 240.0), 240.0);
        assert_eq!(at_least(-1.0, 120.0, 240.0), 240.0);
        assert_eq!(at_least(0.0, 90.0, 40.0), 90.0);
    }

    #[test]
    fn size_floor_applies_per_axis() {
        let s = size(Size::new(0.25, f64::NAN), 1.0);
        assert_eq!(s, Size::new(1.0, 1.0));
    }

    proptest! {
        #[test]
        fn sanitized_position_is_never_negative(x in proptest::num::f64::ANY, y in proptest::num::f64::ANY) {
            let p = position(Point::new(x, y));
            prop_assert!(p.x >= 0.0 && p.y >= 0.0);
            prop_assert!(p.x.is_finite() && p.y.is_finite());
        }
    }
}
