/// Signed acceleration characteristic of one attribute group.
///
/// `0` keeps the legacy per-line timing. `-1` and `1` select path-length timing at constant
/// speed. Values above 1 ease in with exponent `1 + (c - 1) / 10`, values below -1 ease out
/// with the mirrored curve.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct Accel(pub i32);

impl Accel {
    /// Legacy per-line timing.
    pub const LEGACY: Self = Self(0);

    /// `true` for characteristic 0.
    pub fn is_legacy(self) -> bool {
        self.0 == 0
    }

    /// Curve exponent, `None` for the identity characteristics `-1, 0, 1`.
    pub fn exponent(self) -> Option<f64> {
        match self.0 {
            -1..=1 => None,
            c => Some(1.0 + f64::from(c.unsigned_abs() - 1) / 10.0),
        }
    }

    /// Remap linear progress in `[0, 1]`; input outside the range is clamped.
    pub fn apply(self, progress: f64) -> f64 {
        let t = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        match (self.exponent(), self.0 > 0) {
            (None, _) => t,
            (Some(e), true) => t.powf(e),
            (Some(e), false) => 1.0 - (1.0 - t).powf(e),
        }
    }
}

impl From<i32> for Accel {
    fn from(v: i32) -> Self {
        Self(v)
    }
}

/// Free-function form of [`Accel::apply`].
pub fn remap(progress: f64, characteristic: i32) -> f64 {
    Accel(characteristic).apply(progress)
}

#[cfg(test)]
#[path = "../../tests/unit/animation/accel.rs"]
mod tests;
