use crate::foundation::core::Point;

/// Plain linear interpolation `a + factor * (b - a)`.
pub fn mix(factor: f64, a: f64, b: f64) -> f64 {
    a + factor * (b - a)
}

/// Component-wise [`mix`] for points.
pub fn mix_point(factor: f64, a: Point, b: Point) -> Point {
    Point::new(mix(factor, a.x, b.x), mix(factor, a.y, b.y))
}

/// Clamp to `[0, 1]`, mapping NaN to 0.
pub(crate) fn clamp01(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Frames-per-line denominators never drop below one frame.
pub(crate) fn floor_one(v: f64) -> f64 {
    v.max(1.0)
}

pub(crate) fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
