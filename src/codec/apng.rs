use std::io::Cursor;
use std::sync::Arc;

use crate::{
    codec::traits::{Codec, CodecOpen, normalize_frame_duration, wrap_index},
    codec::sniff,
    foundation::core::{ColorSpace, Raster},
    foundation::error::{LoopingError, LoopingResult},
    foundation::pixel::premultiply_rgba8_in_place,
    model::frame::Frame,
};

/// Animated and static PNG codec backed by the `png` crate.
///
/// `open` walks every frame once to collect fcTL metadata and then keeps only the container
/// bytes. The png reader is a forward-only stream, so `decode` restarts it and skips ahead.
pub struct ApngCodec {
    bytes: Arc<[u8]>,
    skip_default_image: bool,
    width: u32,
    height: u32,
    loop_count: u32,
    has_alpha: bool,
    independent: bool,
    color_space: ColorSpace,
    frames: Vec<Frame>,
    durations: Vec<f64>,
}

impl CodecOpen for ApngCodec {
    const NAME: &'static str = "apng";

    fn can_decode(bytes: &[u8]) -> bool {
        sniff::is_png(bytes)
    }

    #[tracing::instrument(skip(bytes), fields(len = bytes.len()))]
    fn open(bytes: &[u8]) -> LoopingResult<Self> {
        let mut reader = open_reader(bytes)
            .map_err(|e| LoopingError::invalid_data(format!("png header: {e}")))?;

        let info = reader.info();
        let (width, height) = (info.width, info.height);
        let animation = info.animation_control;
        let default_is_frame = info.frame_control.is_some();
        let color_space = info
            .icc_profile
            .as_ref()
            .map(|icc| ColorSpace::Icc(Arc::new(icc.to_vec())))
            .unwrap_or_default();

        let mut buf = vec![0u8; reader.output_buffer_size()];
        let Some(actl) = animation else {
            let raster = read_frame(&mut reader, &mut buf)?;
            let has_alpha = raster_has_alpha(&raster);
            let frame = Frame {
                index: 0,
                offset_x: 0,
                offset_y: 0,
                duration: normalize_frame_duration(None),
                width,
                height,
                has_alpha,
                dispose_to_background_color: false,
                blend_with_previous_frame: false,
            };
            return Ok(Self {
                bytes: Arc::from(bytes),
                skip_default_image: false,
                width,
                height,
                loop_count: 0,
                has_alpha,
                independent: true,
                color_space,
                durations: vec![frame.duration],
                frames: vec![frame],
            });
        };

        if !default_is_frame {
            // The IDAT image is a fallback for non-APNG viewers and not part of the animation.
            read_frame(&mut reader, &mut buf)?;
        }

        let mut frames = Vec::new();
        let mut durations = Vec::new();
        for _ in 0..actl.num_frames {
            let raster = match read_frame(&mut reader, &mut buf) {
                Ok(r) => r,
                Err(e) if !frames.is_empty() => {
                    tracing::warn!(error = %e, frames = frames.len(), "apng truncated");
                    break;
                }
                Err(e) => return Err(e),
            };
            let fctl = reader
                .info()
                .frame_control
                .ok_or_else(|| LoopingError::invalid_data("apng frame without fcTL"))?;

            let den = if fctl.delay_den == 0 { 100 } else { fctl.delay_den };
            let duration =
                normalize_frame_duration(Some(f64::from(fctl.delay_num) / f64::from(den)));
            frames.push(Frame {
                index: frames.len(),
                offset_x: fctl.x_offset,
                offset_y: fctl.y_offset,
                duration,
                width: raster.width,
                height: raster.height,
                has_alpha: raster_has_alpha(&raster),
                dispose_to_background_color: fctl.dispose_op == png::DisposeOp::Background,
                blend_with_previous_frame: fctl.blend_op == png::BlendOp::Over,
            });
            durations.push(duration);
        }

        if frames.is_empty() {
            return Err(LoopingError::invalid_data("apng has no frames"));
        }

        let has_alpha = frames.iter().any(|f| f.has_alpha);
        tracing::debug!(width, height, frames = frames.len(), "apng opened");
        Ok(Self {
            bytes: Arc::from(bytes),
            skip_default_image: !default_is_frame,
            width,
            height,
            loop_count: actl.num_plays,
            has_alpha,
            independent: false,
            color_space,
            frames,
            durations,
        })
    }
}

fn open_reader(bytes: &[u8]) -> Result<png::Reader<Cursor<&[u8]>>, png::DecodingError> {
    let mut decoder = png::Decoder::new(Cursor::new(bytes));
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    decoder.read_info()
}

fn read_frame(reader: &mut png::Reader<Cursor<&[u8]>>, buf: &mut [u8]) -> LoopingResult<Raster> {
    let out = reader
        .next_frame(buf)
        .map_err(|e| LoopingError::invalid_data(format!("png frame: {e}")))?;
    let data = &buf[..out.buffer_size()];

    let mut rgba = match out.color_type {
        png::ColorType::Rgba => data.to_vec(),
        png::ColorType::Rgb => data
            .chunks_exact(3)
            .flat_map(|p| [p[0], p[1], p[2], 255])
            .collect(),
        png::ColorType::GrayscaleAlpha => data
            .chunks_exact(2)
            .flat_map(|p| [p[0], p[0], p[0], p[1]])
            .collect(),
        png::ColorType::Grayscale => data.iter().flat_map(|&g| [g, g, g, 255]).collect(),
        png::ColorType::Indexed => {
            return Err(LoopingError::decode_failed("png palette was not expanded"));
        }
    };
    premultiply_rgba8_in_place(&mut rgba);
    Raster::new(out.width, out.height, rgba)
}

fn raster_has_alpha(raster: &Raster) -> bool {
    raster.rgba8_premul.chunks_exact(4).any(|p| p[3] != 255)
}

impl Codec for ApngCodec {
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

    fn color_space(&self) -> ColorSpace {
        self.color_space.clone()
    }

    fn are_frames_independent(&self) -> bool {
        self.independent
    }

    fn frame(&self, index: i64) -> LoopingResult<Frame> {
        Ok(self.frames[wrap_index(index, self.frames.len())?])
    }

    fn decode(&self, index: i64) -> LoopingResult<Option<Raster>> {
        let i = wrap_index(index, self.frames.len())?;
        let mut reader = open_reader(&self.bytes)
            .map_err(|e| LoopingError::decode_failed(format!("png header: {e}")))?;
        let mut buf = vec![0u8; reader.output_buffer_size()];

        let skip = i + usize::from(self.skip_default_image);
        for _ in 0..skip {
            reader
                .next_frame(&mut buf)
                .map_err(|e| LoopingError::decode_failed(format!("png frame: {e}")))?;
        }
        read_frame(&mut reader, &mut buf)
            .map(Some)
            .map_err(|e| LoopingError::decode_failed(e.to_string()))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/apng.rs"]
mod tests;
