use crate::{
    foundation::error::MovePathResult,
    render::backend::{ImageId, RasterBackend},
};

/// Single-slot cache of the most recently loaded source frame.
///
/// Requesting another frame number closes the cached image first, so at most one source
/// frame is held open at any time.
#[derive(Debug, Default)]
pub struct SourceFrameCache {
    slot: Option<(i64, ImageId)>,
}

impl SourceFrameCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Frame number and image currently held open.
    pub fn cached(&self) -> Option<(i64, ImageId)> {
        self.slot
    }

    /// Image of source frame `frame_nr`, loading it on a miss.
    pub fn fetch<B: RasterBackend + ?Sized>(
        &mut self,
        backend: &mut B,
        frame_nr: i64,
    ) -> MovePathResult<ImageId> {
        if let Some((cached_nr, image)) = self.slot {
            if cached_nr == frame_nr {
                tracing::trace!(frame_nr, "source frame cache hit");
                return Ok(image);
            }
            self.slot = None;
            backend.close_image(image)?;
        }
        tracing::trace!(frame_nr, "source frame cache miss");
        let image = backend.load_source_frame(frame_nr)?;
        self.slot = Some((frame_nr, image));
        Ok(image)
    }

    /// Close the cached image, if any.
    pub fn release<B: RasterBackend + ?Sized>(&mut self, backend: &mut B) -> MovePathResult<()> {
        match self.slot.take() {
            Some((_, image)) => backend.close_image(image),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/source_cache.rs"]
mod tests;
