use crate::{
    foundation::math::{clamp01, floor_one},
    schedule::stepper::SourceStepper,
    schedule::timing::{Segment, SegmentScheduler, TimingTable},
};

/// One sample position: a tween (`twix > 0`) or the real frame (`twix == 0`).
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct TweenTick {
    /// 1-based relative output frame index.
    pub frame: u32,
    /// Tween index, counting down to 0 (the real frame).
    pub twix: u32,
    /// Relative frame position of this sample (0-based, fractional for tweens).
    pub position: f64,
    /// Line the sample lies on (runs from point `line - 1` to point `line`).
    pub line: usize,
    /// Line-local linear factor in `[0, 1]`.
    pub line_factor: f64,
    /// Segment containing `line`.
    pub segment: Segment,
    /// Linear progress through `segment` in `[0, 1]`.
    pub segment_progress: f64,
    /// Source layer / frame index used for this sample, when a source is bound.
    pub source_index: Option<i64>,
}

impl TweenTick {
    /// Tween index 0, the destination frame itself.
    pub fn is_real_frame(&self) -> bool {
        self.twix == 0
    }
}

/// Walks tween sub-steps of destination frames and keeps the source index moving.
///
/// The iterator owns the pass-scoped source stepper; it is created at pass start and dropped at
/// pass end so step-mode state never leaks between passes.
pub struct FrameTweenIterator<'a> {
    table: &'a TimingTable,
    tween_steps: u32,
    stepper: Option<SourceStepper>,
}

impl<'a> FrameTweenIterator<'a> {
    /// Sampler over `table`; `stepper` advances once per tick when present.
    pub fn new(table: &'a TimingTable, tween_steps: u32, stepper: Option<SourceStepper>) -> Self {
        Self {
            table,
            tween_steps,
            stepper,
        }
    }

    /// Sub-steps per destination frame.
    pub fn tween_steps(&self) -> u32 {
        self.tween_steps
    }

    /// Tween multiplier `m = tween_steps + 1`.
    fn multiplier(&self) -> f64 {
        f64::from(self.tween_steps) + 1.0
    }

    /// Compute the sample for `(frame, twix)` without touching the source stepper.
    pub fn locate(&self, frame: u32, twix: u32) -> TweenTick {
        let m = self.multiplier();
        let rel = f64::from(frame.saturating_sub(1));
        let twix_f = f64::from(twix);
        let position = rel - twix_f / m;

        let line = self.table.line_at(position);
        let t_prev = self.table.frames()[line - 1];
        let frames_per_line = floor_one(self.table.frames_per_line(line));
        let line_factor = clamp01(((rel * m - twix_f) - t_prev * m) / (frames_per_line * m));

        let segment = SegmentScheduler::segment_of_line(self.table, line);
        TweenTick {
            frame,
            twix,
            position,
            line,
            line_factor,
            segment,
            segment_progress: self.table.segment_progress(segment, position),
            source_index: self.stepper.as_ref().map(SourceStepper::current),
        }
    }

    /// Produce the sample for `(frame, twix)` and advance the source index afterwards.
    pub fn tick(&mut self, frame: u32, twix: u32) -> TweenTick {
        let tick = self.locate(frame, twix);
        if let Some(stepper) = self.stepper.as_mut() {
            stepper.advance();
        }
        tick
    }

    /// All samples of one destination frame, tweens first (descending) and the real frame last.
    pub fn frame(&mut self, frame: u32) -> FrameTicks<'_, 'a> {
        FrameTicks {
            next_twix: Some(self.tween_steps),
            frame,
            iter: self,
        }
    }
}

/// Iterator over the samples of one destination frame.
pub struct FrameTicks<'i, 'a> {
    iter: &'i mut FrameTweenIterator<'a>,
    frame: u32,
    next_twix: Option<u32>,
}

impl Iterator for FrameTicks<'_, '_> {
    type Item = TweenTick;

    fn next(&mut self) -> Option<Self::Item> {
        let twix = self.next_twix?;
        self.next_twix = twix.checked_sub(1);
        Some(self.iter.tick(self.frame, twix))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/tween.rs"]
mod tests;
