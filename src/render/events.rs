use crate::{foundation::core::Raster, model::loop_mode::LoopMode};

/// Notifications delivered to the host, in the order they happened.
#[derive(Clone, Debug, PartialEq)]
pub enum PlaybackEvent {
    DidStartPlaying,
    DidPausePlaying,
    DidStopPlaying,
    DidCompletePlaying(LoopMode),
    DidRenderFrame {
        index: usize,
        cache_hit: bool,
    },
    /// `raster` is `None` after a stop cleared the canvas.
    DidDisplayImage {
        raster: Option<Raster>,
        frame_index: Option<usize>,
    },
}

impl PlaybackEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DidStartPlaying => "did_start_playing",
            Self::DidPausePlaying => "did_pause_playing",
            Self::DidStopPlaying => "did_stop_playing",
            Self::DidCompletePlaying(_) => "did_complete_playing",
            Self::DidRenderFrame { .. } => "did_render_frame",
            Self::DidDisplayImage { .. } => "did_display_image",
        }
    }
}
