//! Looping plays animated images: GIF, APNG and animated WebP.
//!
//! A [`LoopImage`] wraps a container [`Codec`] and exposes canvas size, per-frame timing and the
//! loop count. A [`LoopRenderer`] turns elapsed time into the frame that is due, composites it on
//! a dedicated render thread and reports back through [`PlaybackEvent`]s. [`Player`] is the
//! host-facing session on top: one image at a time, completion handling and delegate callbacks.
//!
//! # Pipeline overview
//!
//! 1. **Open**: bytes are sniffed and handed to the first matching codec in a [`CodecRegistry`]
//! 2. **Select**: a clock tick advances the play time; the renderer picks the frame it lands in
//! 3. **Composite**: the render thread replays disposal and blending onto a canvas, with a
//!    [`FrameCache`] of finished rasters
//! 4. **Display**: the raster is delivered to the host in submission order
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Premultiplied RGBA8** end-to-end: every [`Raster`] holds premultiplied pixels.
#![forbid(unsafe_code)]

mod clock;
mod codec;
mod foundation;
mod model;
mod render;
mod session;

pub use clock::source::{ClockSource, ManualClock};
pub use clock::display_link::DisplayLink;
pub use codec::apng::ApngCodec;
pub use codec::traits::{
    Codec, CodecOpen, DEFAULT_FRAME_DURATION, MIN_FRAME_DURATION, normalize_frame_duration,
    wrap_index,
};
pub use codec::gif::GifCodec;
pub use codec::registry::{CodecEntry, CodecRegistry};
pub use codec::sniff::ContainerFormat;
pub use codec::webp::WebPCodec;
pub use foundation::core::{Canvas, ColorSpace, Raster, Rect};
pub use foundation::error::{LoopingError, LoopingResult};
pub use foundation::pixel::{
    PremulRgba8, over, premultiply_rgba8_in_place, unpremultiply_rgba8_in_place,
};
pub use model::frame::Frame;
pub use model::loop_image::LoopImage;
pub use model::loop_mode::LoopMode;
pub use render::cache::{CacheStats, FrameCache};
pub use render::compositor::Compositor;
pub use render::events::PlaybackEvent;
pub use render::renderer::{LoopRenderer, PlaybackState};
pub use session::opts::{CompletionBehavior, PlayerOpts, RendererOpts};
pub use session::player::{CompletionCallback, Player, PlayerDelegate};

#[cfg(test)]
#[path = "../tests/unit/support.rs"]
pub(crate) mod test_support;
