use std::io::Cursor;

use crate::{
    codec::traits::{Codec, CodecOpen, normalize_frame_duration, wrap_index},
    codec::sniff,
    foundation::core::Raster,
    foundation::error::{LoopingError, LoopingResult},
    model::frame::Frame,
};

/// Indexed pixels of one GIF frame, expanded to RGBA on decode.
struct IndexedFrame {
    indices: Vec<u8>,
    palette: Option<Vec<u8>>,
    transparent: Option<u8>,
}

/// GIF87a/GIF89a codec backed by the `gif` crate.
///
/// Frames are partial updates over the canvas, so they always blend with the previous frame and
/// are never independent.
pub struct GifCodec {
    width: u32,
    height: u32,
    loop_count: u32,
    has_alpha: bool,
    global_palette: Option<Vec<u8>>,
    frames: Vec<Frame>,
    durations: Vec<f64>,
    pixels: Vec<IndexedFrame>,
}

impl CodecOpen for GifCodec {
    const NAME: &'static str = "gif";

    fn can_decode(bytes: &[u8]) -> bool {
        sniff::is_gif(bytes)
    }

    #[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
    fn open(bytes: &[u8]) -> LoopingResult<Self> {
        let mut opts = gif::DecodeOptions::new();
        opts.set_color_output(gif::ColorOutput::Indexed);
        let mut decoder = opts
            .read_info(Cursor::new(bytes))
            .map_err(|e| LoopingError::invalid_data(format!("gif header: {e}")))?;

        let width = u32::from(decoder.width());
        let height = u32::from(decoder.height());
        if width == 0 || height == 0 {
            return Err(LoopingError::invalid_data("gif canvas has zero size"));
        }
        let global_palette = decoder.global_palette().map(<[u8]>::to_vec);

        let mut frames = Vec::new();
        let mut durations = Vec::new();
        let mut pixels = Vec::new();
        loop {
            let next = match decoder.read_next_frame() {
                Ok(next) => next,
                Err(e) if !frames.is_empty() => {
                    tracing::warn!(error = %e, frames = frames.len(), "gif truncated");
                    break;
                }
                Err(e) => return Err(LoopingError::invalid_data(format!("gif frame: {e}"))),
            };
            let Some(f) = next else {
                break;
            };

            let duration = normalize_frame_duration(Some(f64::from(f.delay) / 100.0));
            frames.push(Frame {
                index: frames.len(),
                offset_x: u32::from(f.left),
                offset_y: u32::from(f.top),
                duration,
                width: u32::from(f.width),
                height: u32::from(f.height),
                has_alpha: f.transparent.is_some(),
                dispose_to_background_color: f.dispose == gif::DisposalMethod::Background,
                blend_with_previous_frame: true,
            });
            durations.push(duration);
            pixels.push(IndexedFrame {
                indices: f.buffer.to_vec(),
                palette: f.palette.clone(),
                transparent: f.transparent,
            });
        }

        if frames.is_empty() {
            return Err(LoopingError::invalid_data("gif has no frames"));
        }

        // The NETSCAPE extension is only known once frames have been read.
        let loop_count = match decoder.repeat() {
            gif::Repeat::Infinite => 0,
            gif::Repeat::Finite(0) => 1,
            gif::Repeat::Finite(n) => u32::from(n),
        };
        let has_alpha = frames.iter().any(|f| f.has_alpha);

        tracing::debug!(width, height, frames = frames.len(), loop_count, "gif opened");
        Ok(Self {
            width,
            height,
            loop_count,
            has_alpha,
            global_palette,
            frames,
            durations,
            pixels,
        })
    }
}

impl Codec for GifCodec {
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
        false
    }

    fn frame(&self, index: i64) -> LoopingResult<Frame> {
        Ok(self.frames[wrap_index(index, self.frames.len())?])
    }

    fn decode(&self, index: i64) -> LoopingResult<Option<Raster>> {
        let i = wrap_index(index, self.frames.len())?;
        let frame = &self.frames[i];
        let px = &self.pixels[i];

        let len = (frame.width as usize) * (frame.height as usize);
        if px.indices.len() < len {
            return Err(LoopingError::IncompleteFrame(i));
        }
        let palette = px
            .palette
            .as_deref()
            .or(self.global_palette.as_deref())
            .ok_or_else(|| LoopingError::decode_failed(format!("gif frame {i} has no palette")))?;

        let mut rgba = Vec::with_capacity(len * 4);
        for &ix in &px.indices[..len] {
            if px.transparent == Some(ix) {
                rgba.extend_from_slice(&[0, 0, 0, 0]);
                continue;
            }
            let at = usize::from(ix) * 3;
            match palette.get(at..at + 3) {
                Some(rgb) => rgba.extend_from_slice(&[rgb[0], rgb[1], rgb[2], 255]),
                // Out-of-palette indices render black, as browsers do.
                None => rgba.extend_from_slice(&[0, 0, 0, 255]),
            }
        }

        Raster::new(frame.width, frame.height, rgba).map(Some)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/gif.rs"]
mod tests;
