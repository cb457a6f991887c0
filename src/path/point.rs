use crate::{
    animation::accel::Accel,
    foundation::core::Point,
    foundation::math::{approx_eq, mix},
};

/// Four-corner warp factors; every factor `1.0` means no warp.
///
/// Each corner is placed at `center + factor * (corner - center)` per axis.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Perspective {
    /// Top-left corner, horizontal factor.
    pub tl_x: f64,
    /// Top-left corner, vertical factor.
    pub tl_y: f64,
    /// Top-right corner, horizontal factor.
    pub tr_x: f64,
    /// Top-right corner, vertical factor.
    pub tr_y: f64,
    /// Bottom-left corner, horizontal factor.
    pub bl_x: f64,
    /// Bottom-left corner, vertical factor.
    pub bl_y: f64,
    /// Bottom-right corner, horizontal factor.
    pub br_x: f64,
    /// Bottom-right corner, vertical factor.
    pub br_y: f64,
}

impl Default for Perspective {
    fn default() -> Self {
        Self::from_array([1.0; 8])
    }
}

impl Perspective {
    /// Factors in file order `tlx tly trx try blx bly brx bry`.
    pub fn to_array(self) -> [f64; 8] {
        [
            self.tl_x, self.tl_y, self.tr_x, self.tr_y, self.bl_x, self.bl_y, self.br_x, self.br_y,
        ]
    }

    /// Inverse of [`Self::to_array`].
    pub fn from_array(v: [f64; 8]) -> Self {
        Self {
            tl_x: v[0],
            tl_y: v[1],
            tr_x: v[2],
            tr_y: v[3],
            bl_x: v[4],
            bl_y: v[5],
            br_x: v[6],
            br_y: v[7],
        }
    }

    /// Every factor is (approximately) `1.0`.
    pub fn is_identity(self) -> bool {
        self.to_array().iter().all(|f| approx_eq(*f, 1.0))
    }

    /// Per-factor linear blend from `a` (factor 0) to `b` (factor 1).
    pub fn mix(factor: f64, a: Self, b: Self) -> Self {
        let (a, b) = (a.to_array(), b.to_array());
        Self::from_array(std::array::from_fn(|i| mix(factor, a[i], b[i])))
    }

    /// Warped corners `[top-left, top-right, bottom-left, bottom-right]` of a `w` x `h` box
    /// anchored at the origin.
    pub fn corners(self, w: f64, h: f64) -> [Point; 4] {
        let (cx, cy) = (w / 2.0, h / 2.0);
        let warp = |fx: f64, fy: f64, x: f64, y: f64| {
            Point::new(cx + fx * (x - cx), cy + fy * (y - cy))
        };
        [
            warp(self.tl_x, self.tl_y, 0.0, 0.0),
            warp(self.tr_x, self.tr_y, w, 0.0),
            warp(self.bl_x, self.bl_y, 0.0, h),
            warp(self.br_x, self.br_y, w, h),
        ]
    }
}

/// Acceleration characteristic per attribute group.
///
/// Only the values stored on a segment start point are consulted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct AccelGroup {
    /// Position (and the movement timing other groups may inherit).
    pub position: Accel,
    /// Opacity.
    pub opacity: Accel,
    /// Width and height.
    pub size: Accel,
    /// Rotation.
    pub rotation: Accel,
    /// Perspective factors.
    pub perspective: Accel,
    /// Feather radius.
    pub feather: Accel,
}

impl AccelGroup {
    /// Characteristics in file order.
    pub fn to_array(self) -> [i32; 6] {
        [
            self.position.0,
            self.opacity.0,
            self.size.0,
            self.rotation.0,
            self.perspective.0,
            self.feather.0,
        ]
    }

    /// Inverse of [`Self::to_array`].
    pub fn from_array(v: [i32; 6]) -> Self {
        Self {
            position: Accel(v[0]),
            opacity: Accel(v[1]),
            size: Accel(v[2]),
            rotation: Accel(v[3]),
            perspective: Accel(v[4]),
            feather: Accel(v[5]),
        }
    }

    /// No group is accelerated.
    pub fn is_legacy(self) -> bool {
        self.to_array().iter().all(|c| *c == 0)
    }
}

/// One authored waypoint with its full set of transform attributes.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ControlPoint {
    /// Target position of the object handle.
    pub position: Point,
    /// Opacity in percent, `[0, 100]`.
    pub opacity: f64,
    /// Width resize in percent of the source width.
    pub width_pct: f64,
    /// Height resize in percent of the source height.
    pub height_pct: f64,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Four-corner warp.
    pub perspective: Perspective,
    /// Feather radius applied to the source selection.
    pub feather_radius: f64,
    /// Acceleration used when this point starts a segment.
    pub accel: AccelGroup,
    /// Relative output frame this point is pinned to; 0 means unpinned.
    pub keyframe: u32,
    /// Absolute frame number mirror of `keyframe`, kept for persistence.
    pub keyframe_abs: i64,
}

impl Default for ControlPoint {
    fn default() -> Self {
        Self {
            position: Point::ZERO,
            opacity: 100.0,
            width_pct: 100.0,
            height_pct: 100.0,
            rotation: 0.0,
            perspective: Perspective::default(),
            feather_radius: 0.0,
            accel: AccelGroup::default(),
            keyframe: 0,
            keyframe_abs: 0,
        }
    }
}

impl ControlPoint {
    /// Default attributes at a given position.
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            position: Point::new(x, y),
            ..Self::default()
        }
    }

    /// Pin this point to relative frame `keyframe`.
    pub fn with_keyframe(mut self, keyframe: u32) -> Self {
        self.keyframe = keyframe;
        self
    }

    /// Replace the acceleration characteristics.
    pub fn with_accel(mut self, accel: AccelGroup) -> Self {
        self.accel = accel;
        self
    }

    /// Pinned to an output frame.
    pub fn is_keyframe(&self) -> bool {
        self.keyframe > 0
    }

    /// Copy of this point with every attribute except position (and keyframe pinning) reset.
    pub fn attributes_reset(&self) -> Self {
        Self {
            position: self.position,
            keyframe: self.keyframe,
            keyframe_abs: self.keyframe_abs,
            ..Self::default()
        }
    }
}
