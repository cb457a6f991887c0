use crate::{
    foundation::core::Canvas,
    foundation::error::MovePathResult,
    render::backend::{ImageId, LayerId, LayerProps, RasterBackend},
    settings::values::{MoveSettings, PaintMode},
};

/// Opacity (percent) of tween `twix` for an object at `current_opacity` percent.
///
/// Tween 1 (nearest the real frame) gets `initial * current / 100`; every further step back
/// multiplies by `desc / 100`.
pub fn tween_opacity(initial: f64, desc: f64, twix: u32, current_opacity: f64) -> f64 {
    let steps_back = twix.saturating_sub(1);
    let fade = (desc / 100.0).powi(i32::try_from(steps_back).unwrap_or(i32::MAX));
    initial * current_opacity / 100.0 * fade
}

/// Layers a finished destination frame received from the compositor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameLayers {
    /// Merged tween layer inserted into the frame.
    pub tween: Option<LayerId>,
    /// Trace layer inserted into the frame.
    pub trace: Option<LayerId>,
}

/// Tween buffer and trace accumulator of one pass.
///
/// Both buffers are scratch images created lazily on the first frame, once the destination
/// size is known, and closed by [`Self::end`].
#[derive(Debug)]
pub struct TweenTraceCompositor {
    tween_enabled: bool,
    trace_enabled: bool,
    dst_layerstack: usize,
    tween_initial: f64,
    tween_desc: f64,
    trace_initial: f64,
    trace_desc: f64,
    tween_image: Option<ImageId>,
    tween_layers: usize,
    trace_image: Option<ImageId>,
    trace_acc: Option<LayerId>,
}

impl TweenTraceCompositor {
    /// Compositor for the tween and trace settings of a pass.
    pub fn new(settings: &MoveSettings) -> Self {
        Self {
            tween_enabled: settings.tween_steps > 0,
            trace_enabled: settings.tracelayer_enable,
            dst_layerstack: settings.dst_layerstack,
            tween_initial: settings.tween_opacity_initial,
            tween_desc: settings.tween_opacity_desc,
            trace_initial: settings.trace_opacity_initial,
            trace_desc: settings.trace_opacity_desc,
            tween_image: None,
            tween_layers: 0,
            trace_image: None,
            trace_acc: None,
        }
    }

    /// Tweens or the trace layer are enabled.
    pub fn is_active(&self) -> bool {
        self.tween_enabled || self.trace_enabled
    }

    /// Create scratch buffers sized like the destination frames (no-op after the first call).
    pub fn begin<B: RasterBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        dst_size: Canvas,
    ) -> MovePathResult<()> {
        if self.tween_enabled && self.tween_image.is_none() {
            self.tween_image = Some(backend.new_scratch_image(dst_size)?);
        }
        if self.trace_enabled && self.trace_image.is_none() {
            self.trace_image = Some(backend.new_scratch_image(dst_size)?);
        }
        Ok(())
    }

    /// Image tween layers are copied into, once [`Self::begin`] ran.
    pub fn tween_target(&self) -> Option<ImageId> {
        self.tween_image
    }

    /// Fade a tween layer that was already transformed inside the tween buffer.
    pub fn add_tween<B: RasterBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        layer: LayerId,
        twix: u32,
        current_opacity: f64,
        mode: PaintMode,
    ) -> MovePathResult<()> {
        let opacity = tween_opacity(self.tween_initial, self.tween_desc, twix, current_opacity);
        tracing::trace!(twix, opacity, "tween layer");
        backend.set_props(
            layer,
            LayerProps {
                opacity,
                mode,
                visible: Some(true),
            },
        )?;
        self.tween_layers += 1;
        Ok(())
    }

    /// Assemble the buffers into `dst` below the real object layer.
    ///
    /// The merged tween layer goes directly below the object; the trace layer below that. With
    /// both enabled the tweens are folded into the trace and their own layer is hidden.
    pub fn finish_frame<B: RasterBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        dst: ImageId,
        object: LayerId,
        current_opacity: f64,
    ) -> MovePathResult<FrameLayers> {
        let mut out = FrameLayers::default();
        let mut position = self.dst_layerstack + 1;

        let mut merged_tween = None;
        if let Some(tween_image) = self.tween_image
            && self.tween_layers > 0
        {
            let merged = backend.merge_visible(tween_image)?;
            let inserted = backend.copy_layer(merged, dst, position)?;
            if self.trace_enabled {
                backend.set_props(
                    inserted,
                    LayerProps {
                        opacity: 100.0,
                        mode: PaintMode::Normal,
                        visible: Some(false),
                    },
                )?;
            }
            position += 1;
            merged_tween = Some(merged);
            out.tween = Some(inserted);
        }

        if let Some(trace_image) = self.trace_image {
            if let Some(acc) = self.trace_acc {
                backend.fade_layer(acc, self.trace_desc / 100.0)?;
            }
            if let Some(merged) = merged_tween {
                backend.copy_layer(merged, trace_image, 0)?;
            }
            let copy = backend.copy_layer(object, trace_image, 0)?;
            backend.set_props(
                copy,
                LayerProps {
                    opacity: self.trace_initial * current_opacity / 100.0,
                    mode: PaintMode::Normal,
                    visible: Some(true),
                },
            )?;
            let acc = backend.merge_visible(trace_image)?;
            self.trace_acc = Some(acc);
            out.trace = Some(backend.copy_layer(acc, dst, position)?);
        }

        if let Some(tween_image) = self.tween_image
            && self.tween_layers > 0
        {
            backend.clear_image(tween_image)?;
            self.tween_layers = 0;
        }
        Ok(out)
    }

    /// Close the scratch buffers.
    pub fn end<B: RasterBackend + ?Sized>(&mut self, backend: &mut B) -> MovePathResult<()> {
        self.tween_layers = 0;
        self.trace_acc = None;
        if let Some(image) = self.tween_image.take() {
            backend.close_image(image)?;
        }
        if let Some(image) = self.trace_image.take() {
            backend.close_image(image)?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
