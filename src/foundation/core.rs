use crate::foundation::error::{MovePathError, MovePathResult};

pub use kurbo::{Point, Vec2};

/// Pixel dimensions of an image or layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Build a canvas size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `true` when either side is zero.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Inclusive destination frame range, processed from `start` towards `end`.
///
/// `start > end` is legal and means the pass runs backwards through the frame numbers; the
/// relative frame index still counts upwards from 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameSpan {
    /// First processed frame number.
    pub start: i64,
    /// Last processed frame number (inclusive).
    pub end: i64,
}

impl FrameSpan {
    /// Build a span; both bounds must be non-negative frame numbers.
    pub fn new(start: i64, end: i64) -> MovePathResult<Self> {
        if start < 0 || end < 0 {
            return Err(MovePathError::validation(
                "frame span bounds must be non-negative",
            ));
        }
        Ok(Self { start, end })
    }

    /// Number of frames in the span (always at least 1).
    pub fn len_frames(self) -> u32 {
        u32::try_from(self.start.abs_diff(self.end)).unwrap_or(u32::MAX - 1) + 1
    }

    /// `+1` for ascending spans, `-1` for descending spans.
    pub fn direction(self) -> i64 {
        if self.end >= self.start { 1 } else { -1 }
    }

    /// Absolute frame number of a 1-based relative frame index.
    pub fn frame_at(self, rel_idx: u32) -> i64 {
        self.start + i64::from(rel_idx.saturating_sub(1)) * self.direction()
    }

    /// Absolute frame number for a 0-based relative offset (keyframe mirror).
    pub fn abs_of_rel(self, rel: i64) -> i64 {
        self.start + rel * self.direction()
    }

    /// 0-based relative offset of an absolute frame number, if it lies inside the span.
    pub fn rel_of_abs(self, abs: i64) -> Option<i64> {
        let rel = (abs - self.start) * self.direction();
        (rel >= 0 && rel < i64::from(self.len_frames())).then_some(rel)
    }

    /// Iterate `(relative index, absolute frame number)` pairs in processing order.
    pub fn iter(self) -> impl Iterator<Item = (u32, i64)> {
        (1..=self.len_frames()).map(move |rel| (rel, self.frame_at(rel)))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
