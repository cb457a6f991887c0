use crate::{
    foundation::core::{Canvas, Point},
    foundation::error::MovePathResult,
    settings::values::{BlueBoxSettings, PaintMode},
};

/// Host handle of an image (destination frame, source frame or scratch buffer).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct ImageId(pub u64);

/// Host handle of a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct LayerId(pub u64);

/// Layer rectangle in image coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct LayerBounds {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl LayerBounds {
    /// Width and height as a [`Canvas`].
    pub fn size(self) -> Canvas {
        Canvas::new(self.width, self.height)
    }

    /// Intersection with the `canvas` rectangle anchored at the origin, `None` when empty.
    pub fn clip_to(self, canvas: Canvas) -> Option<Self> {
        let x0 = i64::from(self.x).max(0);
        let y0 = i64::from(self.y).max(0);
        let x1 = (i64::from(self.x) + i64::from(self.width)).min(i64::from(canvas.width));
        let y1 = (i64::from(self.y) + i64::from(self.height)).min(i64::from(canvas.height));
        if x1 <= x0 || y1 <= y0 {
            return None;
        }
        Some(Self {
            x: x0 as i32,
            y: y0 as i32,
            width: (x1 - x0) as u32,
            height: (y1 - y0) as u32,
        })
    }
}

/// Layer attributes set after transformation.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct LayerProps {
    /// Opacity in percent.
    pub opacity: f64,
    /// Blend mode.
    pub mode: PaintMode,
    /// `Some(true)` forces visibility, `None` keeps what the copy inherited.
    pub visible: Option<bool>,
}

/// Selection used to mask the moving object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionSource {
    /// The selection captured from the initial source image by the host.
    Initial,
    /// The selection of the given source frame image.
    Frame(ImageId),
}

/// External raster host.
///
/// Every pixel operation (scale, warp, rotate, keying, merging) is delegated here; the engine
/// only decides which operations run, in which order, with which parameters. Layer stack
/// positions count from the top (0 = topmost).
pub trait RasterBackend {
    /// Open (or load) the destination frame `frame_nr` for editing.
    fn open_dest_frame(&mut self, frame_nr: i64) -> MovePathResult<ImageId>;

    /// Persist a destination frame after all layers have been added.
    fn save_dest_frame(&mut self, image: ImageId, frame_nr: i64) -> MovePathResult<()>;

    /// Load frame `frame_nr` of the source animation.
    fn load_source_frame(&mut self, frame_nr: i64) -> MovePathResult<ImageId>;

    /// Layer at `stack_index` of a source image.
    fn source_layer(&mut self, image: ImageId, stack_index: usize) -> MovePathResult<LayerId>;

    /// Pixel size of an image.
    fn image_size(&self, image: ImageId) -> MovePathResult<Canvas>;

    /// Transparent scratch image used as tween or trace buffer.
    fn new_scratch_image(&mut self, size: Canvas) -> MovePathResult<ImageId>;

    /// Remove every layer of an image.
    fn clear_image(&mut self, image: ImageId) -> MovePathResult<()>;

    /// Release an image handle.
    fn close_image(&mut self, image: ImageId) -> MovePathResult<()>;

    /// Copy `layer` into `dst` at stack position `position`, returning the new layer.
    fn copy_layer(
        &mut self,
        layer: LayerId,
        dst: ImageId,
        position: usize,
    ) -> MovePathResult<LayerId>;

    /// Current rectangle of a layer.
    fn bounds(&self, layer: LayerId) -> MovePathResult<LayerBounds>;

    /// Key out the blue-box colour.
    fn apply_bluebox(&mut self, layer: LayerId, settings: &BlueBoxSettings)
    -> MovePathResult<()>;

    /// Keep only the part of `layer` inside the (feathered) selection.
    fn intersect_selection(
        &mut self,
        layer: LayerId,
        source: SelectionSource,
        feather_radius: f64,
    ) -> MovePathResult<()>;

    /// Scale layer contents to `size`, keeping the layer's top-left offset.
    fn scale(&mut self, layer: LayerId, size: Canvas) -> MovePathResult<()>;

    /// Map the layer's corners onto `corners` (`[tl, tr, bl, br]`, image coordinates).
    fn perspective(&mut self, layer: LayerId, corners: [Point; 4]) -> MovePathResult<()>;

    /// Rotate around the layer centre; the layer grows to hold the rotated contents.
    fn rotate(&mut self, layer: LayerId, degrees: f64) -> MovePathResult<()>;

    /// Move the layer's top-left corner to `(x, y)`.
    fn set_offsets(&mut self, layer: LayerId, x: i32, y: i32) -> MovePathResult<()>;

    /// Crop or extend the layer to `bounds` (image coordinates).
    fn resize_layer(&mut self, layer: LayerId, bounds: LayerBounds) -> MovePathResult<()>;

    /// Apply opacity, blend mode and visibility.
    fn set_props(&mut self, layer: LayerId, props: LayerProps) -> MovePathResult<()>;

    /// Merge all visible layers of `image` into one layer of that image.
    fn merge_visible(&mut self, image: ImageId) -> MovePathResult<LayerId>;

    /// Multiply the layer's alpha by `factor` in `[0, 1]`.
    fn fade_layer(&mut self, layer: LayerId, factor: f64) -> MovePathResult<()>;
}
