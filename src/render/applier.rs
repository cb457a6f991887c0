use crate::{
    foundation::core::{Canvas, Point, Vec2},
    foundation::error::MovePathResult,
    render::backend::{ImageId, LayerBounds, LayerId, RasterBackend, SelectionSource},
    resolve::resolver::ResolvedAttributes,
    settings::values::{MoveSettings, SelectionMode},
};

/// Per-call inputs of [`TransformApplier::apply`] that are not attribute values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ApplyContext {
    /// Image the transformed layer lives in (used for clipping).
    pub target: ImageId,
    /// Image of the fetched source frame, for frame-specific selections.
    pub source_image: ImageId,
    /// Offset of the source layer inside its own image.
    pub src_offset: Vec2,
}

/// Order in which scaling and the perspective warp ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
pub enum TransformOrder {
    /// Enlarging: scale first so the warp works on the final resolution.
    ScaleThenWarp,
    /// Shrinking or unchanged: warp first on the larger original.
    WarpThenScale,
}

/// What [`TransformApplier::apply`] ended up doing to a layer.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ApplyOutcome {
    /// Scale/warp order that ran (or would have run).
    pub order: TransformOrder,
    /// A resize was issued.
    pub scaled: bool,
    /// A perspective warp was issued.
    pub warped: bool,
    /// Rotation exceeded the threshold and was issued.
    pub rotated: bool,
    /// Clipping left nothing visible; the layer was shrunk to 1x1 and moved off canvas.
    pub clipped_away: bool,
    /// Layer bounds after placement and clipping.
    pub bounds: LayerBounds,
}

/// Size-fit switches of the single-frame variant.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Scale width by the frame and object size ratios.
    pub fit_width: bool,
    /// Scale height by the frame and object size ratios.
    pub fit_height: bool,
    /// Use one factor for both axes (the smaller when both fit).
    pub keep_proportions: bool,
}

/// Frame and object sizes feeding the single-frame pre-scale.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FitSizes {
    /// Frame size the path was recorded for.
    pub recorded_frame: Canvas,
    /// Frame size being rendered.
    pub actual_frame: Canvas,
    /// Object size the path was recorded with.
    pub recorded_object: Canvas,
    /// Object size being placed.
    pub actual_object: Canvas,
}

fn ratio(num: u32, den: u32) -> f64 {
    if den == 0 {
        1.0
    } else {
        f64::from(num) / f64::from(den)
    }
}

impl FitOptions {
    /// Multiplicative `(sx, sy)` pre-scale applied to the resolved width/height percentages.
    pub fn prescale(self, sizes: FitSizes) -> (f64, f64) {
        let fw = ratio(sizes.actual_frame.width, sizes.recorded_frame.width);
        let fh = ratio(sizes.actual_frame.height, sizes.recorded_frame.height);
        let ow = ratio(sizes.recorded_object.width, sizes.actual_object.width);
        let oh = ratio(sizes.recorded_object.height, sizes.actual_object.height);

        let sx = if self.fit_width { fw * ow } else { 1.0 };
        let sy = if self.fit_height { fh * oh } else { 1.0 };
        if !self.keep_proportions {
            return (sx, sy);
        }
        let uniform = match (self.fit_width, self.fit_height) {
            (true, true) => sx.min(sy),
            (true, false) => sx,
            (false, true) => sy,
            (false, false) => 1.0,
        };
        (uniform, uniform)
    }
}

/// Applies resolved attributes to one copied layer through the raster host.
///
/// Order: keying, selection masking, scale and perspective (enlarging scales first), rotation,
/// placement by handle, optional clipping.
#[derive(Clone, Copy)]
pub struct TransformApplier<'s> {
    settings: &'s MoveSettings,
}

impl<'s> TransformApplier<'s> {
    /// Applier driven by `settings`.
    pub fn new(settings: &'s MoveSettings) -> Self {
        Self { settings }
    }

    /// Run every enabled transform step on `layer`.
    #[tracing::instrument(skip(self, backend, attrs, ctx))]
    pub fn apply<B: RasterBackend + ?Sized>(
        &self,
        backend: &mut B,
        layer: LayerId,
        attrs: &ResolvedAttributes,
        ctx: ApplyContext,
    ) -> MovePathResult<ApplyOutcome> {
        let settings = self.settings;

        if settings.src_apply_bluebox
            && let Some(bluebox) = settings.bluebox.as_ref()
        {
            backend.apply_bluebox(layer, bluebox)?;
        }

        match settings.src_selmode {
            SelectionMode::Ignore => {}
            SelectionMode::Initial => {
                backend.intersect_selection(layer, SelectionSource::Initial, attrs.feather_radius)?
            }
            SelectionMode::FrameSpecific => backend.intersect_selection(
                layer,
                SelectionSource::Frame(ctx.source_image),
                attrs.feather_radius,
            )?,
        }

        let original = backend.bounds(layer)?;
        let target_size = scaled_size(original.size(), attrs.width_pct, attrs.height_pct);
        let scaled = target_size != original.size();
        let warped = !attrs.perspective.is_identity();
        let order = if attrs.width_pct * attrs.height_pct > 100.0 * 100.0 {
            TransformOrder::ScaleThenWarp
        } else {
            TransformOrder::WarpThenScale
        };

        match order {
            TransformOrder::ScaleThenWarp => {
                if scaled {
                    backend.scale(layer, target_size)?;
                }
                if warped {
                    self.warp(backend, layer, attrs)?;
                }
            }
            TransformOrder::WarpThenScale => {
                if warped {
                    self.warp(backend, layer, attrs)?;
                }
                if scaled {
                    backend.scale(layer, target_size)?;
                }
            }
        }

        let rotated = attrs.rotation.abs() > settings.rotate_threshold;
        if rotated {
            backend.rotate(layer, attrs.rotation)?;
        }

        let placed = backend.bounds(layer)?;
        let (hx, hy) = settings
            .src_handle
            .offset_in(f64::from(placed.width), f64::from(placed.height));
        let x = (attrs.position.x - hx + ctx.src_offset.x).round() as i32;
        let y = (attrs.position.y - hy + ctx.src_offset.y).round() as i32;
        backend.set_offsets(layer, x, y)?;

        let mut bounds = LayerBounds { x, y, ..placed };
        let mut clipped_away = false;
        if settings.clip_to_image {
            let canvas = backend.image_size(ctx.target)?;
            match bounds.clip_to(canvas) {
                Some(visible) if visible != bounds => {
                    backend.resize_layer(layer, visible)?;
                    bounds = visible;
                }
                Some(_) => {}
                None => {
                    tracing::debug!(?bounds, "object fully outside the frame");
                    let off_canvas = LayerBounds {
                        x: -1,
                        y: -1,
                        width: 1,
                        height: 1,
                    };
                    backend.resize_layer(layer, off_canvas)?;
                    bounds = off_canvas;
                    clipped_away = true;
                }
            }
        }

        Ok(ApplyOutcome {
            order,
            scaled,
            warped,
            rotated,
            clipped_away,
            bounds,
        })
    }

    fn warp<B: RasterBackend + ?Sized>(
        &self,
        backend: &mut B,
        layer: LayerId,
        attrs: &ResolvedAttributes,
    ) -> MovePathResult<()> {
        let b = backend.bounds(layer)?;
        let origin = Vec2::new(f64::from(b.x), f64::from(b.y));
        let corners = attrs
            .perspective
            .corners(f64::from(b.width), f64::from(b.height))
            .map(|c: Point| c + origin);
        backend.perspective(layer, corners)
    }
}

/// Target size for percentage scaling, never below 1x1.
pub fn scaled_size(size: Canvas, width_pct: f64, height_pct: f64) -> Canvas {
    let side = |px: u32, pct: f64| {
        let v = (f64::from(px) * pct / 100.0).round();
        if v.is_nan() || v < 1.0 {
            1
        } else if v > f64::from(u32::MAX) {
            u32::MAX
        } else {
            v as u32
        }
    };
    Canvas::new(side(size.width, width_pct), side(size.height, height_pct))
}

#[cfg(test)]
#[path = "../../tests/unit/render/applier.rs"]
mod tests;
