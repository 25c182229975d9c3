/// Periodic tick source driving a renderer.
///
/// Only the renderer that owns a clock flips its paused flag or changes its rate.
pub trait ClockSource: Send {
    fn is_paused(&self) -> bool;

    fn set_paused(&mut self, paused: bool);

    /// Target tick rate; 0 means the source's native rate.
    fn preferred_frames_per_second(&self) -> u32;

    fn set_preferred_frames_per_second(&mut self, fps: u32);
}

/// Clock whose ticks are driven by the host, e.g. tests or offline rendering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManualClock {
    paused: bool,
    fps: u32,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            paused: true,
            fps: 0,
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for ManualClock {
    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    fn preferred_frames_per_second(&self) -> u32 {
        self.fps
    }

    fn set_preferred_frames_per_second(&mut self, fps: u32) {
        self.fps = fps;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/clock/source.rs"]
mod tests;
