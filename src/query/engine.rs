use crate::{
    foundation::core::Point,
    foundation::error::{MovePathError, MovePathResult},
    path::model::PathModel,
    resolve::resolver::ParameterResolver,
    schedule::timing::{Segment, SegmentScheduler},
    schedule::tween::FrameTweenIterator,
};

/// Motion statistics of the segment containing one control point.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct QueryResult {
    /// Point the query was made for.
    pub point_index: usize,
    /// 1-based number of the matched segment.
    pub segment_number: usize,
    /// Point range of the matched segment.
    pub segment: Segment,
    /// Summed pixel length of the segment's lines.
    pub segment_length: f64,
    /// Smallest distance travelled between two consecutive samples inside the segment.
    pub min_step: f64,
    /// Largest distance travelled between two consecutive samples inside the segment.
    pub max_step: f64,
    /// Samples (frames and tweens) that fell inside the segment.
    pub samples: usize,
}

/// Runs scheduling and resolution without a raster host.
///
/// Only positions are inspected; the walk stops as soon as the sampled timeline leaves the
/// queried segment.
pub struct QueryEngine<'a> {
    path: &'a PathModel,
    frame_count: u32,
    tween_steps: u32,
}

impl<'a> QueryEngine<'a> {
    /// Query engine over `path` scheduled across `frame_count` frames.
    pub fn new(path: &'a PathModel, frame_count: u32, tween_steps: u32) -> Self {
        Self {
            path,
            frame_count,
            tween_steps,
        }
    }

    /// Walk the schedule and measure the segment containing `point_index`.
    #[tracing::instrument(skip(self), fields(frames = self.frame_count))]
    pub fn query(&self, point_index: usize) -> MovePathResult<QueryResult> {
        if self.frame_count == 0 {
            return Err(MovePathError::validation("query needs at least one frame"));
        }
        let table = SegmentScheduler::build_timing_table(self.path, self.frame_count);
        let (segment_number, segment) = SegmentScheduler::segment_of_point(&table, point_index);
        let resolver = ParameterResolver::new(self.path);
        let mut ticks = FrameTweenIterator::new(&table, self.tween_steps, None);

        let mut prev: Option<Point> = None;
        let mut steps = StepRange::default();
        let mut samples = 0usize;

        'frames: for frame in 1..=self.frame_count {
            for tick in ticks.frame(frame) {
                if tick.position < 0.0 {
                    continue;
                }
                if tick.segment != segment {
                    if samples > 0 {
                        break 'frames;
                    }
                    continue;
                }
                let position = resolver.resolve(&tick).position;
                samples += 1;
                // the first sample has nothing inside the segment to measure against
                if let Some(p) = prev {
                    steps.record(p.distance(position));
                }
                prev = Some(position);
            }
        }

        let result = QueryResult {
            point_index,
            segment_number,
            segment,
            segment_length: self.path.span_length(segment.start, segment.end),
            min_step: steps.min.unwrap_or(0.0),
            max_step: steps.max.unwrap_or(0.0),
            samples,
        };
        tracing::debug!(?result, "query finished");
        Ok(result)
    }
}

#[derive(Default)]
struct StepRange {
    min: Option<f64>,
    max: Option<f64>,
}

impl StepRange {
    fn record(&mut self, d: f64) {
        self.min = Some(self.min.map_or(d, |m| m.min(d)));
        self.max = Some(self.max.map_or(d, |m| m.max(d)));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/query/engine.rs"]
mod tests;
