use crate::{
    animation::accel::Accel,
    foundation::core::Point,
    foundation::math::{clamp01, mix, mix_point},
    path::model::PathModel,
    path::point::{ControlPoint, Perspective},
    schedule::timing::Segment,
    schedule::tween::TweenTick,
};

/// Line and line-local factor chosen for the moving object at one sample.
///
/// Position resolves first; attribute groups without their own acceleration reuse this
/// selection so they follow the object point by point even when position is eased along the
/// path length.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct MovementLineSelection {
    /// Line (1-based point index) the object is on.
    pub line: usize,
    /// Progress along that line in `[0, 1]`.
    pub factor: f64,
    /// Position was resolved in path-length mode.
    pub accelerated: bool,
}

/// Concrete attribute values for one frame or tween.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ResolvedAttributes {
    /// Handle position.
    pub position: Point,
    /// Opacity in percent.
    pub opacity: f64,
    /// Width in percent of the source width.
    pub width_pct: f64,
    /// Height in percent of the source height.
    pub height_pct: f64,
    /// Rotation in degrees.
    pub rotation: f64,
    /// Four-corner warp.
    pub perspective: Perspective,
    /// Selection feather radius.
    pub feather_radius: f64,
    /// Line selection position resolved with.
    pub movement: MovementLineSelection,
    /// Segment the sample lies in.
    pub segment: Segment,
}

/// Pure resolver from a schedule sample to attribute values.
///
/// Acceleration characteristics are read from the segment start point only. An accelerated
/// attribute group blends the segment's start and end values; intermediate points contribute
/// their values only to groups that follow the movement line. Holds no mutable state:
/// resolving the same sample twice yields the same values.
#[derive(Clone, Copy)]
pub struct ParameterResolver<'a> {
    path: &'a PathModel,
}

impl<'a> ParameterResolver<'a> {
    /// Resolver over the points of `path`.
    pub fn new(path: &'a PathModel) -> Self {
        Self { path }
    }

    /// Resolve every attribute group for `tick`.
    pub fn resolve(&self, tick: &TweenTick) -> ResolvedAttributes {
        self.resolve_at(
            tick.segment,
            tick.line,
            tick.line_factor,
            tick.segment_progress,
        )
    }

    /// Resolve from explicit schedule coordinates.
    pub fn resolve_at(
        &self,
        segment: Segment,
        line: usize,
        line_factor: f64,
        segment_progress: f64,
    ) -> ResolvedAttributes {
        let points = self.path.points();
        let line = line.clamp(1, self.path.point_idx_max());
        let accel = points[segment.start].accel;

        let movement = self.resolve_movement(segment, line, line_factor, segment_progress);
        let position = mix_point(
            movement.factor,
            points[movement.line - 1].position,
            points[movement.line].position,
        );

        let scalar = |c: Accel, get: fn(&ControlPoint) -> f64| {
            let (a, b, f) = attribute_span(c, segment, segment_progress, movement);
            mix(f, get(&points[a]), get(&points[b]))
        };

        let (pa, pb, pf) = attribute_span(accel.perspective, segment, segment_progress, movement);

        ResolvedAttributes {
            position,
            opacity: scalar(accel.opacity, |p| p.opacity),
            width_pct: scalar(accel.size, |p| p.width_pct),
            height_pct: scalar(accel.size, |p| p.height_pct),
            rotation: scalar(accel.rotation, |p| p.rotation),
            perspective: Perspective::mix(pf, points[pa].perspective, points[pb].perspective),
            feather_radius: scalar(accel.feather, |p| p.feather_radius),
            movement,
            segment,
        }
    }

    fn resolve_movement(
        &self,
        segment: Segment,
        line: usize,
        line_factor: f64,
        segment_progress: f64,
    ) -> MovementLineSelection {
        let c = self.path.points()[segment.start].accel.position;
        let length = self.path.span_length(segment.start, segment.end);
        if c.is_legacy() || length <= 0.0 {
            return MovementLineSelection {
                line,
                factor: line_factor,
                accelerated: false,
            };
        }
        let (line, factor) = self.line_by_length(segment, length * c.apply(segment_progress));
        MovementLineSelection {
            line,
            factor,
            accelerated: true,
        }
    }

    /// Find the line holding cumulative path length `target` and the local factor on it.
    fn line_by_length(&self, segment: Segment, target: f64) -> (usize, f64) {
        let mut walked = 0.0;
        let mut last_drawn = None;
        for line in segment.lines() {
            let len = self.path.line_length(line);
            if len <= 0.0 {
                continue;
            }
            if walked + len >= target {
                return (line, clamp01((target - walked) / len));
            }
            walked += len;
            last_drawn = Some(line);
        }
        (last_drawn.unwrap_or(segment.end.max(1)), 1.0)
    }
}

/// Point pair and factor an attribute group interpolates between.
///
/// Legacy groups follow the movement line; accelerated groups blend the segment's start and
/// end values by the remapped progress.
fn attribute_span(
    c: Accel,
    segment: Segment,
    segment_progress: f64,
    movement: MovementLineSelection,
) -> (usize, usize, f64) {
    if c.is_legacy() {
        return (movement.line - 1, movement.line, movement.factor);
    }
    (segment.start, segment.end, clamp01(c.apply(segment_progress)))
}

#[cfg(test)]
#[path = "../../tests/unit/resolve/resolver.rs"]
mod tests;
