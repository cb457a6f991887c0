use crate::{
    foundation::core::FrameSpan,
    foundation::error::{MovePathError, MovePathResult},
    path::point::ControlPoint,
};

/// Upper bound on the number of control points a path may hold.
pub const MAX_POINTS: usize = 1024;

/// Ordered control points of one move path plus the "current point" cursor.
///
/// A path always holds at least two points: a single authored point is duplicated into a
/// zero-length line so every consumer can rely on `point_idx_max() >= 1`.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct PathModel {
    points: Vec<ControlPoint>,
    current: usize,
}

impl Default for PathModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PathModel {
    /// Two default points at the origin.
    pub fn new() -> Self {
        Self {
            points: vec![ControlPoint::default(); 2],
            current: 0,
        }
    }

    /// Build a path from authored points.
    pub fn from_points(mut points: Vec<ControlPoint>) -> MovePathResult<Self> {
        if points.is_empty() {
            return Err(MovePathError::validation("a move path needs at least one point"));
        }
        if points.len() > MAX_POINTS {
            return Err(MovePathError::validation(format!(
                "a move path holds at most {MAX_POINTS} points, got {}",
                points.len()
            )));
        }
        if points.len() == 1 {
            points.push(points[0]);
        }
        Ok(Self { points, current: 0 })
    }

    /// All points in path order.
    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Point `idx`, if in range.
    pub fn point(&self, idx: usize) -> Option<&ControlPoint> {
        self.points.get(idx)
    }

    /// Mutable point `idx`, if in range.
    pub fn point_mut(&mut self, idx: usize) -> Option<&mut ControlPoint> {
        self.points.get_mut(idx)
    }

    /// Number of points (always `>= 2`).
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Index of the last point.
    pub fn point_idx_max(&self) -> usize {
        self.points.len() - 1
    }

    /// Index of the current point.
    pub fn current(&self) -> usize {
        self.current
    }

    /// Move the cursor; fails for an index past the last point.
    pub fn set_current(&mut self, idx: usize) -> MovePathResult<()> {
        if idx > self.point_idx_max() {
            return Err(MovePathError::validation(format!(
                "point index {idx} out of range 0..={}",
                self.point_idx_max()
            )));
        }
        self.current = idx;
        Ok(())
    }

    /// Append a point and make it current.
    pub fn push(&mut self, point: ControlPoint) -> MovePathResult<()> {
        self.ensure_capacity()?;
        self.points.push(point);
        self.current = self.point_idx_max();
        Ok(())
    }

    /// Insert a point right after the current one and make it current.
    pub fn insert_after_current(&mut self, point: ControlPoint) -> MovePathResult<()> {
        self.ensure_capacity()?;
        self.points.insert(self.current + 1, point);
        self.current += 1;
        Ok(())
    }

    /// Remove the current point; the cursor moves to the previous point.
    pub fn delete_current(&mut self) {
        self.points.remove(self.current);
        if self.points.len() == 1 {
            self.points.push(self.points[0]);
        }
        self.current = self.current.saturating_sub(1).min(self.point_idx_max());
    }

    /// Drop every point and start over with a duplicated default point.
    pub fn reset_points(&mut self) {
        *self = Self::new();
    }

    /// Keep positions and keyframes, restore every other attribute to its default.
    pub fn reset_attributes(&mut self) {
        for p in &mut self.points {
            *p = p.attributes_reset();
        }
    }

    /// Reverse the travel direction.
    ///
    /// Pinned middle points keep their place in time relative to the mirrored sequence: a point
    /// pinned to relative frame `k` ends up pinned to `frame_count - 1 - k`.
    pub fn invert(&mut self, frame_count: u32) {
        self.points.reverse();
        let last = self.point_idx_max();
        let last_frame = frame_count.saturating_sub(1);
        for (idx, p) in self.points.iter_mut().enumerate() {
            if idx == 0 || idx == last || p.keyframe == 0 {
                p.keyframe = 0;
                continue;
            }
            p.keyframe = last_frame.saturating_sub(p.keyframe);
        }
        self.current = last - self.current.min(last);
    }

    /// Set each point's rotation to follow the path direction.
    ///
    /// The direction at a point is taken from its previous to its next neighbour (the adjacent
    /// line at both ends). Successive angles are unwrapped so they never jump by more than
    /// 180 degrees; point 0 receives `start_angle`.
    pub fn rotate_follow(&mut self, start_angle: f64) {
        let n = self.points.len();
        let mut prev_raw: Option<f64> = None;
        let mut base = 0.0;
        let mut unwrapped = 0.0;
        for idx in 0..n {
            let a = self.points[idx.saturating_sub(1)].position;
            let b = self.points[(idx + 1).min(n - 1)].position;
            let (dx, dy) = (b.x - a.x, b.y - a.y);
            let raw = if dx == 0.0 && dy == 0.0 {
                prev_raw.unwrap_or(0.0)
            } else {
                dy.atan2(dx).to_degrees()
            };
            match prev_raw {
                None => {
                    base = raw;
                    unwrapped = raw;
                }
                Some(prev) => {
                    let mut delta = raw - prev;
                    while delta > 180.0 {
                        delta -= 360.0;
                    }
                    while delta < -180.0 {
                        delta += 360.0;
                    }
                    unwrapped += delta;
                }
            }
            prev_raw = Some(raw);
            self.points[idx].rotation = start_angle + (unwrapped - base);
        }
    }

    /// Pixel length of the line ending at `idx` (`0` for `idx == 0` or out of range).
    pub fn line_length(&self, idx: usize) -> f64 {
        if idx == 0 || idx > self.point_idx_max() {
            return 0.0;
        }
        self.points[idx - 1]
            .position
            .distance(self.points[idx].position)
    }

    /// Summed line length over `start..=end` point indices.
    pub fn span_length(&self, start: usize, end: usize) -> f64 {
        ((start + 1)..=end.min(self.point_idx_max()))
            .map(|i| self.line_length(i))
            .sum()
    }

    /// Length of the whole polyline.
    pub fn total_length(&self) -> f64 {
        self.span_length(0, self.point_idx_max())
    }

    /// Multiply every position by `(sx, sy)`.
    pub fn scale_positions(&mut self, sx: f64, sy: f64) {
        for p in &mut self.points {
            p.position.x *= sx;
            p.position.y *= sy;
        }
    }

    /// Write absolute mirrors of all relative keyframes.
    pub fn sync_keyframes_abs(&mut self, span: FrameSpan) {
        for p in &mut self.points {
            p.keyframe_abs = if p.keyframe > 0 {
                span.abs_of_rel(i64::from(p.keyframe))
            } else {
                0
            };
        }
    }

    /// Recompute relative keyframes from their absolute mirrors; mirrors outside `span` unpin.
    pub fn apply_keyframes_abs(&mut self, span: FrameSpan) {
        for p in &mut self.points {
            p.keyframe = if p.keyframe_abs > 0 {
                span.rel_of_abs(p.keyframe_abs)
                    .and_then(|rel| u32::try_from(rel).ok())
                    .unwrap_or(0)
            } else {
                0
            };
        }
    }

    fn ensure_capacity(&self) -> MovePathResult<()> {
        if self.points.len() >= MAX_POINTS {
            return Err(MovePathError::validation(format!(
                "a move path holds at most {MAX_POINTS} points"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/path/model.rs"]
mod tests;
