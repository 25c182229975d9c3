use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Context;

use crate::{
    codec::traits::Codec,
    codec::registry::CodecRegistry,
    foundation::core::{Canvas, ColorSpace, Raster, secs_to_nanos},
    foundation::error::{LoopingError, LoopingResult},
    model::frame::Frame,
    model::loop_mode::LoopMode,
    render::compositor::Compositor,
};

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// A decoded animated (or static) image: one codec plus a display scale.
///
/// Cloning is cheap and keeps the same id, so clones share a cache namespace.
#[derive(Clone)]
pub struct LoopImage {
    id: u64,
    codec: Arc<dyn Codec>,
    scale: f64,
    canvas: Canvas,
}

impl LoopImage {
    /// Open `bytes` with the built-in codecs.
    pub fn from_bytes(bytes: &[u8], scale: f64) -> LoopingResult<Self> {
        Self::with_registry(&CodecRegistry::default(), bytes, scale)
    }

    pub fn with_registry(
        registry: &CodecRegistry,
        bytes: &[u8],
        scale: f64,
    ) -> LoopingResult<Self> {
        let codec = registry.open(bytes)?;
        Self::from_codec(Arc::from(codec), scale)
    }

    pub fn from_codec(codec: Arc<dyn Codec>, scale: f64) -> LoopingResult<Self> {
        if codec.frame_count() == 0 {
            return Err(LoopingError::invalid_data("codec reports zero frames"));
        }
        if codec.frame_durations().len() != codec.frame_count() {
            return Err(LoopingError::invalid_data(
                "codec frame durations do not match frame count",
            ));
        }
        let canvas = Canvas::new(codec.canvas_width(), codec.canvas_height())
            .map_err(|_| LoopingError::invalid_data("codec reports an empty canvas"))?;
        let scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        Ok(Self {
            id: NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed),
            codec,
            scale,
            canvas,
        })
    }

    /// Read a file, taking the scale from an `@2x`/`@3x` stem suffix.
    pub fn from_path(path: impl AsRef<Path>) -> LoopingResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)
            .with_context(|| format!("read image '{}'", path.display()))?;
        Self::from_bytes(&bytes, Self::scale_from_path(path))
    }

    /// Display scale implied by an `@2x`/`@3x` file stem suffix.
    pub fn scale_from_path(path: &Path) -> f64 {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        if stem.ends_with("@3x") {
            3.0
        } else if stem.ends_with("@2x") {
            2.0
        } else {
            1.0
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn codec(&self) -> &dyn Codec {
        self.codec.as_ref()
    }

    pub(crate) fn shared_codec(&self) -> Arc<dyn Codec> {
        Arc::clone(&self.codec)
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Display size in points (canvas divided by scale).
    pub fn size(&self) -> (f64, f64) {
        (
            f64::from(self.canvas.width) / self.scale,
            f64::from(self.canvas.height) / self.scale,
        )
    }

    pub fn is_animation(&self) -> bool {
        self.codec.is_animation()
    }

    pub fn has_alpha(&self) -> bool {
        self.codec.has_alpha()
    }

    pub fn frame_count(&self) -> usize {
        self.codec.frame_count()
    }

    pub fn frame_durations(&self) -> &[f64] {
        self.codec.frame_durations()
    }

    pub fn duration(&self) -> f64 {
        self.codec.animation_duration()
    }

    pub fn color_space(&self) -> ColorSpace {
        self.codec.color_space()
    }

    pub fn loop_mode(&self) -> LoopMode {
        LoopMode::from_amount(self.codec.loop_count())
    }

    pub fn frame(&self, index: i64) -> LoopingResult<Frame> {
        self.codec.frame(index)
    }

    /// Rate needed to show the shortest frame at least once.
    pub fn preferred_frames_per_second(&self) -> u32 {
        let min = self
            .frame_durations()
            .iter()
            .copied()
            .filter(|d| *d > 0.0)
            .fold(f64::INFINITY, f64::min);
        if min.is_finite() {
            (1.0 / min).ceil() as u32
        } else {
            0
        }
    }

    /// Composite frame `index` from scratch, without a renderer or cache.
    pub fn image_at_frame(&self, index: i64) -> LoopingResult<Option<Raster>> {
        let target = crate::codec::traits::wrap_index(index, self.frame_count())?;
        if self.codec.are_frames_independent() {
            return self.codec.decode(target as i64);
        }
        let mut compositor = Compositor::new(self.canvas);
        let mut last = None;
        for i in 0..=target {
            match compositor.composite(self.codec.as_ref(), i) {
                Ok(Some(r)) => last = Some(r),
                Ok(None) => {}
                Err(e) if e.is_frame_local() => {
                    tracing::warn!(frame = i, error = %e, "skipping undecodable frame");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(last)
    }

    /// Cumulative end offsets of each frame, in nanoseconds.
    pub(crate) fn cumulative_nanos(&self) -> Vec<i64> {
        let mut acc = 0i64;
        self.frame_durations()
            .iter()
            .map(|d| {
                acc += secs_to_nanos(*d);
                acc
            })
            .collect()
    }
}

impl std::fmt::Debug for LoopImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopImage")
            .field("id", &self.id)
            .field("canvas", &self.canvas)
            .field("scale", &self.scale)
            .field("frame_count", &self.frame_count())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/loop_image.rs"]
mod tests;
