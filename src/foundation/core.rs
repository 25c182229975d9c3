use std::sync::Arc;

use crate::foundation::error::{LoopingError, LoopingResult};

pub use kurbo::Rect;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// Pixel dimensions of an image canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> LoopingResult<Self> {
        if width == 0 || height == 0 {
            return Err(LoopingError::validation("canvas dimensions must be > 0"));
        }
        Ok(Self { width, height })
    }

    /// Full canvas rectangle in pixel space.
    pub fn bounds(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    pub fn byte_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

/// Colorspace a decoded image is tagged with.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ColorSpace {
    /// Device sRGB; the default for containers without color information.
    #[default]
    Srgb,
    /// Embedded ICC profile bytes, carried through untouched.
    Icc(Arc<Vec<u8>>),
}

/// Immutable premultiplied RGBA8 raster.
///
/// Pixel storage is shared, so cloning a raster (for example out of the frame cache) never copies
/// pixels.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

impl Raster {
    pub fn new(width: u32, height: u32, rgba8_premul: Vec<u8>) -> LoopingResult<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if rgba8_premul.len() != expected {
            return Err(LoopingError::decode_failed(format!(
                "raster {width}x{height} expects {expected} bytes, got {}",
                rgba8_premul.len()
            )));
        }
        Ok(Self {
            width,
            height,
            rgba8_premul: Arc::new(rgba8_premul),
        })
    }

    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba8_premul: Arc::new(vec![0u8; (width as usize) * (height as usize) * 4]),
        }
    }

    pub fn byte_len(&self) -> usize {
        self.rgba8_premul.len()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = &self.rgba8_premul[i..i + 4];
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Copy out straight (non-premultiplied) RGBA8 bytes, e.g. for PNG export.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.rgba8_premul.as_ref().clone();
        crate::foundation::pixel::unpremultiply_rgba8_in_place(&mut out);
        out
    }
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("pixels_ptr", &Arc::as_ptr(&self.rgba8_premul))
            .finish()
    }
}

pub(crate) fn secs_to_nanos(secs: f64) -> i64 {
    (secs * NANOS_PER_SEC).round() as i64
}

pub(crate) fn nanos_to_secs(nanos: i64) -> f64 {
    nanos as f64 / NANOS_PER_SEC
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
