use crate::{
    codec::traits::Codec,
    foundation::core::{Canvas, Raster, Rect},
    foundation::error::LoopingResult,
    foundation::pixel::over,
    model::frame::Frame,
};

/// Persistent canvas that accumulates partial frames according to their dispose and blend flags.
pub struct Compositor {
    canvas: Canvas,
    buf: Vec<u8>,
    previous: Option<Frame>,
}

/// Pixel span of a clipped draw rectangle in row-major (top-down) coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct RowSpan {
    x0: u32,
    x1: u32,
    row0: u32,
    row1: u32,
}

impl RowSpan {
    /// Convert a y-up canvas rectangle into top-down rows.
    fn from_rect(rect: Rect, canvas: Canvas) -> Option<Self> {
        let w = f64::from(canvas.width);
        let h = f64::from(canvas.height);
        let x0 = rect.x0.clamp(0.0, w) as u32;
        let x1 = rect.x1.clamp(0.0, w) as u32;
        let row0 = (h - rect.y1).clamp(0.0, h) as u32;
        let row1 = (h - rect.y0).clamp(0.0, h) as u32;
        (x0 < x1 && row0 < row1).then_some(Self { x0, x1, row0, row1 })
    }
}

impl Compositor {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            buf: vec![0u8; canvas.byte_len()],
            previous: None,
        }
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Index of the frame the canvas currently holds.
    pub fn current_index(&self) -> Option<usize> {
        self.previous.map(|f| f.index)
    }

    /// Clear the canvas and forget the previous frame.
    pub fn reset(&mut self) {
        self.buf.fill(0);
        self.previous = None;
    }

    /// Load a cached composited raster as the canvas state after `frame`.
    pub fn restore(&mut self, raster: &Raster, frame: Frame) {
        if raster.byte_len() == self.buf.len() {
            self.buf.copy_from_slice(&raster.rgba8_premul);
            self.previous = Some(frame);
        } else {
            tracing::warn!(frame = frame.index, "cached raster does not match canvas; resetting");
            self.reset();
        }
    }

    pub fn snapshot(&self) -> Raster {
        Raster {
            width: self.canvas.width,
            height: self.canvas.height,
            rgba8_premul: std::sync::Arc::new(self.buf.clone()),
        }
    }

    /// Draw frame `index` onto the canvas and return the composited snapshot.
    ///
    /// Nothing is modified when the frame fails to decode or decodes to nothing.
    pub fn composite(&mut self, codec: &dyn Codec, index: usize) -> LoopingResult<Option<Raster>> {
        let frame = codec.frame(index as i64)?;
        let Some(pixels) = codec.decode(index as i64)? else {
            return Ok(None);
        };

        if let Some(prev) = self.previous
            && prev.dispose_to_background_color
        {
            self.clear_rect(prev.draw_rect(self.canvas));
        }
        let rect = frame.draw_rect(self.canvas);
        if !frame.blend_with_previous_frame {
            self.clear_rect(rect);
        }
        self.draw(rect, &frame, &pixels);
        self.previous = Some(frame);

        Ok(Some(self.snapshot()))
    }

    fn clear_rect(&mut self, rect: Rect) {
        let Some(span) = RowSpan::from_rect(rect, self.canvas) else {
            return;
        };
        let stride = self.canvas.width as usize * 4;
        for row in span.row0..span.row1 {
            let start = row as usize * stride + span.x0 as usize * 4;
            let end = row as usize * stride + span.x1 as usize * 4;
            self.buf[start..end].fill(0);
        }
    }

    fn draw(&mut self, rect: Rect, frame: &Frame, pixels: &Raster) {
        let Some(span) = RowSpan::from_rect(rect, self.canvas) else {
            return;
        };
        let stride = self.canvas.width as usize * 4;
        let src_stride = pixels.width as usize * 4;
        for row in span.row0..span.row1 {
            let Some(sy) = row.checked_sub(frame.offset_y) else {
                continue;
            };
            if sy >= pixels.height {
                continue;
            }
            for x in span.x0..span.x1 {
                let Some(sx) = x.checked_sub(frame.offset_x) else {
                    continue;
                };
                if sx >= pixels.width {
                    continue;
                }
                let s = sy as usize * src_stride + sx as usize * 4;
                let d = row as usize * stride + x as usize * 4;
                let src = &pixels.rgba8_premul[s..s + 4];
                let dst = &mut self.buf[d..d + 4];
                let out = over(
                    [dst[0], dst[1], dst[2], dst[3]],
                    [src[0], src[1], src[2], src[3]],
                );
                dst.copy_from_slice(&out);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/compositor.rs"]
mod tests;
