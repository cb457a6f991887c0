use std::ops::ControlFlow;

use crate::{
    foundation::core::Vec2,
    foundation::error::{MovePathError, MovePathResult},
    path::model::PathModel,
    render::applier::{ApplyContext, FitOptions, FitSizes, TransformApplier},
    render::backend::{ImageId, LayerId, LayerProps, RasterBackend},
    render::compositor::TweenTraceCompositor,
    render::source_cache::SourceFrameCache,
    resolve::resolver::{ParameterResolver, ResolvedAttributes},
    schedule::stepper::SourceStepper,
    schedule::timing::SegmentScheduler,
    schedule::tween::{FrameTweenIterator, TweenTick},
    settings::values::MoveSettings,
};

/// Where the moving object's pixels come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceBinding {
    /// Layers of one multi-layer source image; the step index selects the layer.
    Layers {
        /// Multi-layer source image.
        image: ImageId,
        /// Number of layers in the source image.
        layer_count: usize,
        /// Layer index the stepper starts from.
        initial: usize,
    },
    /// Frames of a source animation; the step index selects the frame number.
    Frames {
        /// First frame number of the source animation.
        first: i64,
        /// Last frame number of the source animation.
        last: i64,
        /// Frame number the stepper starts from.
        initial: i64,
        /// Layer index holding the source frame.
        layer_index: usize,
    },
}

impl SourceBinding {
    /// Pass-scoped stepper walking this source's index range.
    pub fn stepper(&self, settings: &MoveSettings) -> SourceStepper {
        let (first, last, initial) = match *self {
            Self::Layers {
                layer_count,
                initial,
                ..
            } => (
                0,
                i64::try_from(layer_count.saturating_sub(1)).unwrap_or(i64::MAX),
                i64::try_from(initial).unwrap_or(0),
            ),
            Self::Frames {
                first,
                last,
                initial,
                ..
            } => (first, last, initial),
        };
        SourceStepper::new(
            settings.src_stepmode,
            first,
            last,
            initial,
            settings.step_speed_factor,
            settings.tween_steps,
        )
    }
}

/// Per-pass movement state, updated after every sample and handed to progress callbacks.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MovementState {
    /// Destination frame number being processed.
    pub dst_frame: i64,
    /// 1-based relative frame index.
    pub rel_frame: u32,
    /// Tween index of the last sample; 0 is the real frame.
    pub twix: u32,
    /// Source index used by the last sample.
    pub source_index: Option<i64>,
    /// Attributes resolved for the last sample.
    pub attrs: Option<ResolvedAttributes>,
}

/// Progress notification sent after each committed destination frame.
#[derive(Clone, Copy, Debug)]
pub struct RenderProgress<'a> {
    /// Frames committed so far.
    pub frames_done: u32,
    /// Frames in the destination range.
    pub frames_total: u32,
    /// State after the committed frame.
    pub state: &'a MovementState,
}

impl RenderProgress<'_> {
    /// Completed fraction in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.frames_total == 0 {
            1.0
        } else {
            f64::from(self.frames_done) / f64::from(self.frames_total)
        }
    }
}

/// Outcome of a finished or cancelled pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct RenderReport {
    /// Destination frames saved before the pass ended.
    pub frames_committed: u32,
    /// The progress callback requested cancellation.
    pub aborted: bool,
}

/// One complete move-path pass over the destination range.
///
/// Validates, builds the timing table, then walks destination frames in range order; within a
/// frame the tweens come first (descending) and the real frame last. Frames saved before an
/// abort or error stay on the host.
pub struct RenderPass<'a> {
    path: &'a PathModel,
    settings: &'a MoveSettings,
    source: Option<SourceBinding>,
}

impl<'a> RenderPass<'a> {
    /// Pass moving `path` with `settings`; `source` binds a source image for stepping.
    pub fn new(
        path: &'a PathModel,
        settings: &'a MoveSettings,
        source: Option<SourceBinding>,
    ) -> Self {
        Self {
            path,
            settings,
            source,
        }
    }

    /// Pre-flight checks; errors carry the full multi-line report.
    pub fn validate(&self) -> MovePathResult<()> {
        self.settings.validate()?;
        SegmentScheduler::validate(
            self.path,
            self.settings.frame_count(),
            self.source.is_some(),
        )
        .into_result()
    }

    /// Validate, then render every destination frame.
    ///
    /// `progress` runs after each committed frame and may return [`ControlFlow::Break`] to stop
    /// early; open images are closed on every exit path.
    #[tracing::instrument(skip(self, backend, progress), fields(frames = self.settings.frame_count()))]
    pub fn run<B, F>(&self, backend: &mut B, mut progress: F) -> MovePathResult<RenderReport>
    where
        B: RasterBackend + ?Sized,
        F: FnMut(&RenderProgress<'_>) -> ControlFlow<()>,
    {
        self.validate()?;
        let source = self
            .source
            .ok_or_else(|| MovePathError::validation("No source layer or source animation selected"))?;

        let mut cache = SourceFrameCache::new();
        let mut compositor = TweenTraceCompositor::new(self.settings);
        let result = self.run_frames(backend, source, &mut cache, &mut compositor, &mut progress);

        let cleanup = cache
            .release(backend)
            .and_then(|()| compositor.end(backend));
        match (result, cleanup) {
            (Ok(report), Ok(())) => {
                tracing::debug!(?report, "pass finished");
                Ok(report)
            }
            (Ok(_), Err(e)) => Err(e),
            (Err(e), cleanup) => {
                if let Err(cleanup_err) = cleanup {
                    tracing::warn!(error = %cleanup_err, "cleanup after failed pass");
                }
                tracing::error!(error = %e, "pass failed");
                Err(e)
            }
        }
    }

    fn run_frames<B, F>(
        &self,
        backend: &mut B,
        source: SourceBinding,
        cache: &mut SourceFrameCache,
        compositor: &mut TweenTraceCompositor,
        progress: &mut F,
    ) -> MovePathResult<RenderReport>
    where
        B: RasterBackend + ?Sized,
        F: FnMut(&RenderProgress<'_>) -> ControlFlow<()>,
    {
        let settings = self.settings;
        let span = settings.dst_range;
        let frames_total = span.len_frames();
        let table = SegmentScheduler::build_timing_table(self.path, frames_total);
        let resolver = ParameterResolver::new(self.path);
        let applier = TransformApplier::new(settings);
        let mut ticks = FrameTweenIterator::new(
            &table,
            settings.tween_steps,
            Some(source.stepper(settings)),
        );

        let mut state = MovementState::default();
        let mut report = RenderReport::default();

        for (rel, frame_nr) in span.iter() {
            let dst = backend.open_dest_frame(frame_nr)?;
            state.dst_frame = frame_nr;
            state.rel_frame = rel;

            let rendered = self.render_frame(
                backend,
                source,
                cache,
                compositor,
                &mut ticks,
                &resolver,
                &applier,
                dst,
                &mut state,
            );
            let closed = backend.close_image(dst);
            if let Err(close_err) = &closed
                && rendered.is_err()
            {
                tracing::warn!(
                    error = %close_err,
                    frame_nr,
                    "closing destination frame after failure"
                );
            }
            rendered?;
            closed?;
            report.frames_committed += 1;

            let flow = progress(&RenderProgress {
                frames_done: report.frames_committed,
                frames_total,
                state: &state,
            });
            if flow.is_break() {
                tracing::info!(frame_nr, "pass cancelled");
                report.aborted = true;
                break;
            }
        }
        Ok(report)
    }

    /// Render every sample of one destination frame into `dst` and save it.
    #[allow(clippy::too_many_arguments)]
    fn render_frame<B: RasterBackend + ?Sized>(
        &self,
        backend: &mut B,
        source: SourceBinding,
        cache: &mut SourceFrameCache,
        compositor: &mut TweenTraceCompositor,
        ticks: &mut FrameTweenIterator<'_>,
        resolver: &ParameterResolver<'_>,
        applier: &TransformApplier<'_>,
        dst: ImageId,
        state: &mut MovementState,
    ) -> MovePathResult<()> {
        if compositor.is_active() {
            let size = backend.image_size(dst)?;
            compositor.begin(backend, size)?;
        }

        for tick in ticks.frame(state.rel_frame) {
            if !tick.is_real_frame() && tick.position < 0.0 {
                continue;
            }
            let attrs = resolver.resolve(&tick);
            state.twix = tick.twix;
            state.source_index = tick.source_index;
            state.attrs = Some(attrs);
            self.render_tick(backend, source, cache, compositor, dst, &tick, &attrs, applier)?;
        }

        tracing::debug!(frame_nr = state.dst_frame, rel = state.rel_frame, "frame assembled");
        backend.save_dest_frame(dst, state.dst_frame)
    }

    #[allow(clippy::too_many_arguments)]
    fn render_tick<B: RasterBackend + ?Sized>(
        &self,
        backend: &mut B,
        source: SourceBinding,
        cache: &mut SourceFrameCache,
        compositor: &mut TweenTraceCompositor,
        dst: ImageId,
        tick: &TweenTick,
        attrs: &ResolvedAttributes,
        applier: &TransformApplier<'_>,
    ) -> MovePathResult<()> {
        let settings = self.settings;
        let (source_image, source_layer) = fetch_source(backend, cache, source, tick.source_index)?;
        let src_bounds = backend.bounds(source_layer)?;
        let src_offset = Vec2::new(f64::from(src_bounds.x), f64::from(src_bounds.y));

        let (target, position) = if tick.is_real_frame() {
            (dst, settings.dst_layerstack)
        } else {
            let Some(tween_image) = compositor.tween_target() else {
                return Err(MovePathError::render("tween buffer not initialised"));
            };
            (tween_image, 0)
        };

        let layer = backend.copy_layer(source_layer, target, position)?;
        applier.apply(
            backend,
            layer,
            attrs,
            ApplyContext {
                target,
                source_image,
                src_offset,
            },
        )?;

        if tick.is_real_frame() {
            backend.set_props(
                layer,
                LayerProps {
                    opacity: attrs.opacity,
                    mode: settings.src_paintmode,
                    visible: settings.src_force_visible.then_some(true),
                },
            )?;
            if compositor.is_active() {
                compositor.finish_frame(backend, dst, layer, attrs.opacity)?;
            }
        } else {
            compositor.add_tween(
                backend,
                layer,
                tick.twix,
                attrs.opacity,
                settings.src_paintmode,
            )?;
        }
        Ok(())
    }
}

fn fetch_source<B: RasterBackend + ?Sized>(
    backend: &mut B,
    cache: &mut SourceFrameCache,
    source: SourceBinding,
    index: Option<i64>,
) -> MovePathResult<(ImageId, LayerId)> {
    match source {
        SourceBinding::Layers { image, initial, .. } => {
            let idx = index
                .and_then(|i| usize::try_from(i).ok())
                .unwrap_or(initial);
            Ok((image, backend.source_layer(image, idx)?))
        }
        SourceBinding::Frames {
            initial,
            layer_index,
            ..
        } => {
            let image = cache.fetch(backend, index.unwrap_or(initial))?;
            Ok((image, backend.source_layer(image, layer_index)?))
        }
    }
}

/// Inputs of [`render_single_frame`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SingleFrameRequest {
    /// 1-based phase inside the path's timeline.
    pub frame_phase: u32,
    /// Total frames the path is spread over.
    pub total_frames: u32,
    /// Size-fit switches.
    pub fit: FitOptions,
    /// Sizes the fit ratios come from.
    pub sizes: FitSizes,
}

/// Transform `layer` (already inside `target`) as it appears at one phase of the path.
///
/// Used when the object is placed into a single existing image instead of a frame range; the
/// resolved size is pre-scaled by [`FitOptions::prescale`] to compensate for frame and object
/// size differences against the recorded path.
#[tracing::instrument(skip(path, settings, backend))]
pub fn render_single_frame<B: RasterBackend + ?Sized>(
    path: &PathModel,
    settings: &MoveSettings,
    backend: &mut B,
    target: ImageId,
    layer: LayerId,
    request: SingleFrameRequest,
) -> MovePathResult<ResolvedAttributes> {
    settings.validate()?;
    if request.total_frames == 0 {
        return Err(MovePathError::validation("total_frames must be at least 1"));
    }
    let phase = request.frame_phase.clamp(1, request.total_frames);
    let table = SegmentScheduler::build_timing_table(path, request.total_frames);
    let ticks = FrameTweenIterator::new(&table, 0, None);
    let mut attrs = ParameterResolver::new(path).resolve(&ticks.locate(phase, 0));

    let (sx, sy) = request.fit.prescale(request.sizes);
    attrs.width_pct *= sx;
    attrs.height_pct *= sy;

    TransformApplier::new(settings).apply(
        backend,
        layer,
        &attrs,
        ApplyContext {
            target,
            source_image: target,
            src_offset: Vec2::ZERO,
        },
    )?;
    backend.set_props(
        layer,
        LayerProps {
            opacity: attrs.opacity,
            mode: settings.src_paintmode,
            visible: settings.src_force_visible.then_some(true),
        },
    )?;
    Ok(attrs)
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
