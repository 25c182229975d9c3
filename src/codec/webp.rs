use std::io::Cursor;
use std::sync::Arc;

use crate::{
    codec::traits::{Codec, CodecOpen, normalize_frame_duration, wrap_index},
    codec::sniff,
    foundation::core::Raster,
    foundation::error::{LoopingError, LoopingResult},
    foundation::pixel::premultiply_rgba8_in_place,
    model::frame::Frame,
};

/// WebP codec backed by `image-webp`.
///
/// The decoder composites animation frames onto the full canvas itself, so every frame is
/// independent and covers the canvas. Only the container bytes are retained; each `decode`
/// replays the animation up to the requested frame.
pub struct WebPCodec {
    bytes: Arc<[u8]>,
    width: u32,
    height: u32,
    loop_count: u32,
    has_alpha: bool,
    animated: bool,
    frames: Vec<Frame>,
    durations: Vec<f64>,
}

impl CodecOpen for WebPCodec {
    const NAME: &'static str = "webp";

    fn can_decode(bytes: &[u8]) -> bool {
        sniff::is_webp(bytes)
    }

    #[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
    fn open(bytes: &[u8]) -> LoopingResult<Self> {
        let mut decoder = image_webp::WebPDecoder::new(Cursor::new(bytes))
            .map_err(|e| LoopingError::invalid_data(format!("webp header: {e}")))?;

        let (width, height) = decoder.dimensions();
        let has_alpha = decoder.has_alpha();
        let mut buf = vec![0u8; output_size(&decoder).map_err(LoopingError::invalid_data)?];

        let frame_at = |index: usize, duration: f64| Frame {
            index,
            offset_x: 0,
            offset_y: 0,
            duration,
            width,
            height,
            has_alpha,
            dispose_to_background_color: false,
            blend_with_previous_frame: false,
        };

        if !decoder.is_animated() {
            decoder
                .read_image(&mut buf)
                .map_err(|e| LoopingError::invalid_data(format!("webp image: {e}")))?;
            let duration = normalize_frame_duration(None);
            return Ok(Self {
                bytes: Arc::from(bytes),
                width,
                height,
                loop_count: 0,
                has_alpha,
                animated: false,
                frames: vec![frame_at(0, duration)],
                durations: vec![duration],
            });
        }

        let loop_count = match decoder.loop_count() {
            image_webp::LoopCount::Forever => 0,
            image_webp::LoopCount::Times(n) => u32::from(n.get()),
        };

        // Validate every frame once so truncation is detected up front; pixels are dropped.
        let mut frames = Vec::new();
        let mut durations = Vec::new();
        for index in 0..decoder.num_frames() as usize {
            let delay_ms = match decoder.read_frame(&mut buf) {
                Ok(ms) => ms,
                Err(e) if !frames.is_empty() => {
                    tracing::warn!(error = %e, frames = frames.len(), "webp truncated");
                    break;
                }
                Err(e) => return Err(LoopingError::invalid_data(format!("webp frame: {e}"))),
            };
            let duration = normalize_frame_duration(Some(f64::from(delay_ms) / 1000.0));
            frames.push(frame_at(index, duration));
            durations.push(duration);
        }

        if frames.is_empty() {
            return Err(LoopingError::invalid_data("webp has no frames"));
        }

        tracing::debug!(width, height, frames = frames.len(), loop_count, "webp opened");
        Ok(Self {
            bytes: Arc::from(bytes),
            width,
            height,
            loop_count,
            has_alpha,
            animated: true,
            frames,
            durations,
        })
    }
}

fn output_size<R>(decoder: &image_webp::WebPDecoder<R>) -> Result<usize, &'static str>
where
    R: std::io::BufRead + std::io::Seek,
{
    decoder.output_buffer_size().ok_or("webp canvas too large")
}

fn to_raster(width: u32, height: u32, has_alpha: bool, buf: &[u8]) -> LoopingResult<Raster> {
    let mut rgba = if has_alpha {
        buf.to_vec()
    } else {
        buf.chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect()
    };
    premultiply_rgba8_in_place(&mut rgba);
    Raster::new(width, height, rgba)
}

impl Codec for WebPCodec {
    fn has_alpha(&self) -> bool {
        self.has_alpha
    }

    fn canvas_width(&self) -> u32 {
        self.width
    }

    fn canvas_height(&self) -> u32 {
        self.height
    }

    fn loop_count(&self) -> u32 {
        self.loop_count
    }

    fn frame_count(&self) -> usize {
        self.frames.len()
    }

    fn frame_durations(&self) -> &[f64] {
        &self.durations
    }

    fn are_frames_independent(&self) -> bool {
        true
    }

    fn frame(&self, index: i64) -> LoopingResult<Frame> {
        Ok(self.frames[wrap_index(index, self.frames.len())?])
    }

    fn decode(&self, index: i64) -> LoopingResult<Option<Raster>> {
        let i = wrap_index(index, self.frames.len())?;
        let mut decoder = image_webp::WebPDecoder::new(Cursor::new(&self.bytes[..]))
            .map_err(|e| LoopingError::decode_failed(format!("webp header: {e}")))?;
        let mut buf = vec![0u8; output_size(&decoder).map_err(LoopingError::decode_failed)?];

        if self.animated {
            // Frames composite onto the previous canvas, so replay from the start.
            for _ in 0..=i {
                decoder
                    .read_frame(&mut buf)
                    .map_err(|e| LoopingError::decode_failed(format!("webp frame {i}: {e}")))?;
            }
        } else {
            decoder
                .read_image(&mut buf)
                .map_err(|e| LoopingError::decode_failed(format!("webp image: {e}")))?;
        }

        to_raster(self.width, self.height, self.has_alpha, &buf).map(Some)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/webp.rs"]
mod tests;
