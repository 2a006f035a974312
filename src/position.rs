//! Position model: clamping, wrapping and rounding of element coordinates.

use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Constrain `value` to `[min, max]`; `wrap` folds it around the range instead.
pub fn constrain(value: f64, min: f64, max: f64, wrap: bool) -> f64 {
    if wrap && max > min {
        let span = max - min;
        let folded = min + (value - min).rem_euclid(span);
        // rem_euclid can land on `min + span` through rounding
        return folded.min(max);
    }
    if max < min {
        return min;
    }
    value.clamp(min, max)
}

/// Round to the nearest multiple of `precision`; non-positive disables it.
pub fn round_to(value: f64, precision: f64) -> f64 {
    if precision <= 0.0 {
        return value;
    }
    let rounded = (value / precision).round() * precision;
    // keep -0 out of transforms
    if rounded == 0.0 { 0.0 } else { rounded }
}
