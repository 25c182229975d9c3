use crate::foundation::core::{Canvas, Rect};

/// Immutable description of one frame of a loop image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Frame {
    /// Position within one loop cycle (starts at 0).
    pub index: usize,
    /// Horizontal offset within the canvas, from the left edge.
    pub offset_x: u32,
    /// Vertical offset within the canvas, from the top edge.
    pub offset_y: u32,
    /// Display duration in seconds.
    pub duration: f64,
    /// Drawing width of the frame.
    pub width: u32,
    /// Drawing height of the frame.
    pub height: u32,
    /// Whether the frame carries an alpha component.
    pub has_alpha: bool,
    /// Clear this frame's rectangle before the next frame is drawn.
    pub dispose_to_background_color: bool,
    /// Draw over the existing canvas content instead of replacing it.
    pub blend_with_previous_frame: bool,
}

impl Frame {
    /// Key under which the composited raster of this frame is cached.
    pub fn cache_key(&self) -> String {
        self.index.to_string()
    }

    /// Drawing rectangle in the canvas' y-up coordinate space, expanded to integral bounds and
    /// clipped to the canvas.
    pub fn draw_rect(&self, canvas: Canvas) -> Rect {
        let canvas_h = f64::from(canvas.height);
        let h = f64::from(self.height);
        let x = f64::from(self.offset_x);
        let y = canvas_h - h - f64::from(self.offset_y);
        Rect::new(x, y, x + f64::from(self.width), y + h)
            .expand()
            .intersect(canvas.bounds())
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Frame(blendWithPreviousFrame: {}, disposeToBackgroundColor: {}, duration: {}ms, \
             hasAlpha: {}, index: {}, offset: {{{}, {}}}, size: {{{}, {}}})",
            self.blend_with_previous_frame,
            self.dispose_to_background_color,
            (self.duration * 1000.0) as i64,
            self.has_alpha,
            self.index,
            self.offset_x,
            self.offset_y,
            self.width,
            self.height
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/model/frame.rs"]
mod tests;
