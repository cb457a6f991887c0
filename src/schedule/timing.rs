use crate::{
    foundation::error::{MovePathError, MovePathResult},
    foundation::math::floor_one,
    path::model::PathModel,
};

/// Run of control points between two consecutive keyframes (or the path ends).
///
/// Lines `start + 1 ..= end` belong to the segment; line `i` runs from point `i - 1` to `i`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Segment {
    /// First point of the segment.
    pub start: usize,
    /// Last point of the segment.
    pub end: usize,
}

impl Segment {
    /// Line `line` belongs to this segment.
    pub fn contains_line(self, line: usize) -> bool {
        self.start < line && line <= self.end
    }

    /// Number of lines in the segment.
    pub fn line_count(self) -> usize {
        self.end - self.start
    }

    /// Line indices of the segment.
    pub fn lines(self) -> std::ops::RangeInclusive<usize> {
        (self.start + 1)..=self.end
    }
}

/// Relative frame position (0-based, fractional) at which the object reaches each point.
///
/// `frames()[0] == 0`, the last entry is `frame_count - 1`, and entries increase strictly as
/// long as the destination range has at least two frames.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct TimingTable {
    frames: Vec<f64>,
    frame_count: u32,
    #[serde(skip)]
    pinned: Vec<bool>,
}

impl TimingTable {
    /// Frame position of every point.
    pub fn frames(&self) -> &[f64] {
        &self.frames
    }

    /// Destination frames the table was built for.
    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Point `idx` bounds a segment: either path end or a keyframe the schedule honoured.
    pub fn is_pinned(&self, idx: usize) -> bool {
        self.pinned.get(idx).copied().unwrap_or(false)
    }

    /// Index of the last scheduled point.
    pub fn point_idx_max(&self) -> usize {
        self.frames.len() - 1
    }

    /// Frames spent on line `line` (unfloored).
    pub fn frames_per_line(&self, line: usize) -> f64 {
        match line {
            0 => 0.0,
            l if l < self.frames.len() => self.frames[l] - self.frames[l - 1],
            _ => 0.0,
        }
    }

    /// Line (1-based point index) whose time interval contains relative position `pos`.
    pub fn line_at(&self, pos: f64) -> usize {
        let max = self.frames.len() - 1;
        let below = self.frames[1..].partition_point(|&t| t < pos);
        (1 + below).min(max)
    }

    /// Linear progress of `pos` through `segment`, clamped to `[0, 1]`.
    pub fn segment_progress(&self, segment: Segment, pos: f64) -> f64 {
        let t0 = self.frames[segment.start];
        let t1 = self.frames[segment.end];
        crate::foundation::math::clamp01((pos - t0) / floor_one(t1 - t0))
    }
}

/// Problems found before a render pass; an empty report means the pass may run.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct ValidationReport {
    /// One message per problem found.
    pub problems: Vec<String>,
}

impl ValidationReport {
    /// No problems were found.
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }

    /// One problem per line; empty when everything is fine.
    pub fn message(&self) -> String {
        self.problems.join("\n")
    }

    /// `Ok` when clean, otherwise a validation error carrying [`Self::message`].
    pub fn into_result(self) -> MovePathResult<()> {
        if self.is_ok() {
            Ok(())
        } else {
            Err(MovePathError::validation(self.message()))
        }
    }

    pub(crate) fn push(&mut self, msg: impl Into<String>) {
        self.problems.push(msg.into());
    }
}

/// Splits a path into keyframe-bounded segments and schedules points onto output frames.
pub struct SegmentScheduler;

impl SegmentScheduler {
    /// Build the per-point timing table for a destination range of `frame_count` frames.
    ///
    /// Scanning left to right, every keyframe (and the implicit end keyframe on the last point)
    /// spreads the frames since the previous keyframe evenly over the lines in between. The
    /// pinned point itself is set to its exact target so accumulated rounding never leaks into
    /// the next segment. Keyframes that cannot be honoured (not after the previous one, or not
    /// before the last frame) are treated as unpinned here; [`Self::validate`] reports them.
    #[tracing::instrument(skip(path), fields(points = path.len()))]
    pub fn build_timing_table(path: &PathModel, frame_count: u32) -> TimingTable {
        let max = path.point_idx_max();
        let last_frame = f64::from(frame_count.saturating_sub(1));
        let mut frames = vec![0.0; max + 1];
        let mut pinned = vec![false; max + 1];
        pinned[0] = true;
        let mut run_start = 0usize;
        let mut run_frame = 0.0f64;

        for idx in 1..=max {
            let keyframe = path.points()[idx].keyframe;
            let target = if idx == max {
                Some(last_frame)
            } else if keyframe > 0 {
                let k = f64::from(keyframe);
                if k > run_frame && k < last_frame {
                    Some(k)
                } else {
                    tracing::warn!(point = idx, keyframe, "keyframe ignored while scheduling");
                    None
                }
            } else {
                None
            };

            let Some(target) = target else { continue };
            let frames_per_line = (target - run_frame) / (idx - run_start) as f64;
            for j in (run_start + 1)..idx {
                frames[j] = frames[j - 1] + frames_per_line;
            }
            frames[idx] = target;
            pinned[idx] = true;
            tracing::debug!(from = run_start, to = idx, frames_per_line, "segment scheduled");
            run_start = idx;
            run_frame = target;
        }

        TimingTable {
            frames,
            frame_count,
            pinned,
        }
    }

    /// End point of the segment starting at `start`: the next pinned point, or the last point
    /// when none follows.
    pub fn segment_bounds(table: &TimingTable, start: usize) -> usize {
        let max = table.point_idx_max();
        ((start + 1)..max)
            .find(|&i| table.is_pinned(i))
            .unwrap_or(max)
    }

    /// All segments in path order.
    pub fn segments(table: &TimingTable) -> Vec<Segment> {
        let max = table.point_idx_max();
        let mut out = Vec::new();
        let mut start = 0;
        while start < max {
            let end = Self::segment_bounds(table, start);
            out.push(Segment { start, end });
            start = end;
        }
        out
    }

    /// Segment containing line `line` (clamped into `1..=point_idx_max`).
    pub fn segment_of_line(table: &TimingTable, line: usize) -> Segment {
        let line = line.clamp(1, table.point_idx_max());
        let start = (1..line)
            .rev()
            .find(|&i| table.is_pinned(i))
            .unwrap_or(0);
        Segment {
            start,
            end: Self::segment_bounds(table, start),
        }
    }

    /// 1-based segment number and segment that point `idx` starts or lies inside.
    ///
    /// The last point belongs to the final segment; indices past the end fall back to it too.
    pub fn segment_of_point(table: &TimingTable, idx: usize) -> (usize, Segment) {
        let segments = Self::segments(table);
        let last = segments.len() - 1;
        segments
            .iter()
            .enumerate()
            .find(|(_, s)| s.start <= idx && idx < s.end)
            .map(|(n, s)| (n + 1, *s))
            .unwrap_or((last + 1, segments[last]))
    }

    /// Pre-pass checks for a render pass over `frame_count` frames.
    pub fn validate(path: &PathModel, frame_count: u32, source_selected: bool) -> ValidationReport {
        let mut report = ValidationReport::default();
        let max = path.point_idx_max();
        let last_frame = i64::from(frame_count.saturating_sub(1));

        if !source_selected {
            report.push("No source layer or source animation selected");
        }
        if path.len() > frame_count as usize {
            report.push(format!(
                "{} control points exceed the {} frames of the destination range",
                path.len(),
                frame_count
            ));
        }

        let mut prev_idx = 0usize;
        let mut prev_frame = 0i64;
        for idx in 1..max {
            let keyframe = path.points()[idx].keyframe;
            if keyframe == 0 {
                continue;
            }
            let k = i64::from(keyframe);
            if k > last_frame {
                report.push(format!(
                    "Keyframe {k} at point [{idx}] is beyond the last frame {last_frame}"
                ));
                continue;
            }
            if k <= prev_frame {
                report.push(format!(
                    "Keyframe {k} at point [{idx}] is not in sequence (previous keyframe {prev_frame})"
                ));
                continue;
            }
            let lines = (idx - prev_idx) as i64;
            if k - prev_frame < lines {
                report.push(format!(
                    "Keyframe {k} at point [{idx}] is too close: points [{prev_idx}] to [{idx}] need at least {lines} frames"
                ));
            }
            prev_idx = idx;
            prev_frame = k;
        }

        let lines = (max - prev_idx) as i64;
        if path.len() <= frame_count as usize && last_frame - prev_frame < lines {
            report.push(format!(
                "Too few frames after keyframe {prev_frame}: points [{prev_idx}] to [{max}] need at least {lines} frames"
            ));
        }
        report
    }
}

#[cfg(test)]
#[path = "../../tests/unit/schedule/timing.rs"]
mod tests;
