use crate::{
    foundation::core::{ColorSpace, Raster},
    foundation::error::{LoopingError, LoopingResult},
    model::frame::Frame,
};

/// Duration used for frames whose container delay is missing or too short to honor.
pub const DEFAULT_FRAME_DURATION: f64 = 0.1;

/// Delays below this are treated as "unset" by browsers and decoders alike.
pub const MIN_FRAME_DURATION: f64 = 0.011;

/// Format-specific decoder for one image container.
///
/// A codec is immutable once opened. Frame indices are signed and taken modulo
/// [`Codec::frame_count`].
pub trait Codec: Send + Sync {
    fn is_animation(&self) -> bool {
        self.frame_count() > 1
    }

    fn has_alpha(&self) -> bool;

    fn canvas_width(&self) -> u32;

    fn canvas_height(&self) -> u32;

    /// Container loop count; 0 means infinite.
    fn loop_count(&self) -> u32;

    /// Number of frames in one loop cycle, always at least 1.
    fn frame_count(&self) -> usize;

    /// Per-frame display durations in seconds.
    fn frame_durations(&self) -> &[f64];

    fn animation_duration(&self) -> f64 {
        self.frame_durations().iter().sum()
    }

    fn color_space(&self) -> ColorSpace {
        ColorSpace::Srgb
    }

    /// True when every decoded frame is already a full-canvas image and needs no compositing.
    fn are_frames_independent(&self) -> bool;

    fn frame(&self, index: i64) -> LoopingResult<Frame>;

    /// Decode the pixels of one frame, sized to the frame's own rectangle.
    fn decode(&self, index: i64) -> LoopingResult<Option<Raster>>;
}

/// Construction side of a codec, used by the registry.
pub trait CodecOpen: Codec + Sized + 'static {
    const NAME: &'static str;

    fn can_decode(bytes: &[u8]) -> bool;

    fn open(bytes: &[u8]) -> LoopingResult<Self>;
}

/// Map a signed frame index onto `0..frame_count`.
pub fn wrap_index(index: i64, frame_count: usize) -> LoopingResult<usize> {
    if frame_count == 0 {
        return Err(LoopingError::FrameIndexOutOfBounds(index));
    }
    let wrapped = index % (frame_count as i64);
    if wrapped < 0 {
        return Err(LoopingError::FrameIndexOutOfBounds(index));
    }
    Ok(wrapped as usize)
}

pub fn normalize_frame_duration(secs: Option<f64>) -> f64 {
    match secs {
        Some(s) if s.is_finite() && s >= MIN_FRAME_DURATION => s,
        _ => DEFAULT_FRAME_DURATION,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/traits.rs"]
mod tests;
