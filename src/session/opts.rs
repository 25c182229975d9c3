use std::path::Path;

use crate::{
    foundation::error::{LoopingError, LoopingResult},
    model::loop_mode::LoopMode,
};

/// Options controlling a [`crate::LoopRenderer`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RendererOpts {
    /// Keep composited frames in the per-image cache.
    pub use_cache: bool,
    /// Playback rate multiplier. Negative plays backwards, 0 freezes.
    pub playback_speed: f64,
    /// Override of the container's own loop count, applied to animated images only.
    pub view_loop_mode: Option<LoopMode>,
    /// Upper bound on cached pixel bytes. `None` caches every frame.
    pub cache_max_bytes: Option<usize>,
}

impl Default for RendererOpts {
    fn default() -> Self {
        Self {
            use_cache: true,
            playback_speed: 1.0,
            view_loop_mode: None,
            cache_max_bytes: None,
        }
    }
}

/// What a [`crate::Player`] does once its loop mode has been played through.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionBehavior {
    /// Stop and clear the displayed image.
    #[default]
    Stop,
    /// Pause on the last displayed frame.
    Pause,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct PlayerOpts {
    pub renderer: RendererOpts,
    pub completion_behavior: CompletionBehavior,
    /// Start playing as soon as an image is set. Off by default, so a freshly built player
    /// stays idle until `play` or an opt-in config.
    pub autoplay: bool,
}

impl PlayerOpts {
    pub fn from_json_str(s: &str) -> LoopingResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| LoopingError::validation(format!("parse player options JSON: {e}")))
    }

    pub fn from_path(path: impl AsRef<Path>) -> LoopingResult<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path).map_err(|e| {
            LoopingError::validation(format!("open player options '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&s)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/opts.rs"]
mod tests;
