use std::sync::mpsc;
use std::time::Duration;

use crate::{
    clock::source::ClockSource,
    foundation::core::{nanos_to_secs, secs_to_nanos},
    foundation::error::LoopingResult,
    model::loop_image::LoopImage,
    model::loop_mode::LoopMode,
    render::cache::CacheStats,
    render::events::PlaybackEvent,
    render::worker::{Job, RenderWorker},
    session::opts::RendererOpts,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Time-driven playback state machine for one image.
///
/// The renderer decides which frame is due on every tick and hands the decode and compositing
/// work to its render thread. Every event, including state changes, is routed through that thread
/// so the host observes them in submission order.
pub struct LoopRenderer {
    image: LoopImage,
    clock: Box<dyn ClockSource>,
    worker: RenderWorker,
    events: mpsc::Receiver<PlaybackEvent>,
    /// End offset of each frame within one cycle.
    cumulative: Vec<i64>,
    total: i64,
    state: PlaybackState,
    accumulator: i64,
    last_displayed: Option<usize>,
    speed: f64,
    view_loop_mode: Option<LoopMode>,
    use_cache: bool,
    completed: bool,
}

impl LoopRenderer {
    pub fn new(
        image: LoopImage,
        clock: Box<dyn ClockSource>,
        opts: RendererOpts,
    ) -> LoopingResult<Self> {
        let (tx, rx) = mpsc::channel();
        let worker = RenderWorker::spawn(&image, opts.use_cache, opts.cache_max_bytes, tx)?;
        let cumulative = image.cumulative_nanos();
        let total = cumulative.last().copied().unwrap_or(0);

        let mut r = Self {
            image,
            clock,
            worker,
            events: rx,
            cumulative,
            total,
            state: PlaybackState::Stopped,
            accumulator: 0,
            last_displayed: None,
            speed: 1.0,
            view_loop_mode: opts.view_loop_mode,
            use_cache: opts.use_cache,
            completed: false,
        };
        r.clock.set_paused(true);
        r.set_playback_speed(opts.playback_speed);
        Ok(r)
    }

    pub fn image(&self) -> &LoopImage {
        &self.image
    }

    pub fn clock(&self) -> &dyn ClockSource {
        self.clock.as_ref()
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Frame most recently sent to the render thread.
    pub fn displayed_frame(&self) -> Option<usize> {
        self.last_displayed
    }

    /// Accumulated play time in seconds (negative when playing backwards).
    pub fn elapsed(&self) -> f64 {
        nanos_to_secs(self.accumulator)
    }

    pub fn playback_speed(&self) -> f64 {
        self.speed
    }

    pub fn view_loop_mode(&self) -> Option<LoopMode> {
        self.view_loop_mode
    }

    pub fn use_cache(&self) -> bool {
        self.use_cache
    }

    /// Loop mode in force: the view override for animations, the container's otherwise.
    pub fn loop_mode(&self) -> LoopMode {
        if self.image.is_animation() {
            self.view_loop_mode.unwrap_or_else(|| self.image.loop_mode())
        } else {
            self.image.loop_mode()
        }
    }

    pub fn start(&mut self) -> bool {
        if self.state == PlaybackState::Playing {
            return false;
        }
        if self.completed {
            // Playing again after completion starts a new run from the beginning.
            self.accumulator = 0;
            self.completed = false;
        }
        self.state = PlaybackState::Playing;
        self.clock.set_paused(false);
        tracing::debug!(image = self.image.id(), "start");
        self.emit(PlaybackEvent::DidStartPlaying);
        true
    }

    pub fn pause(&mut self) -> bool {
        if self.state != PlaybackState::Playing {
            return false;
        }
        self.state = PlaybackState::Paused;
        self.clock.set_paused(true);
        tracing::debug!(image = self.image.id(), "pause");
        self.emit(PlaybackEvent::DidPausePlaying);
        true
    }

    pub fn stop(&mut self) -> bool {
        if self.state == PlaybackState::Stopped && self.last_displayed.is_none() {
            return false;
        }
        self.state = PlaybackState::Stopped;
        self.clock.set_paused(true);
        self.accumulator = 0;
        self.last_displayed = None;
        self.completed = false;

        let generation = self.worker.bump_generation();
        self.worker.submit(Job::Reset { generation });
        tracing::debug!(image = self.image.id(), generation, "stop");
        self.emit(PlaybackEvent::DidStopPlaying);
        true
    }

    /// Advance playback by `elapsed` wall-clock seconds.
    pub fn tick(&mut self, elapsed: f64) {
        if self.state != PlaybackState::Playing
            || self.speed == 0.0
            || self.completed
            || !elapsed.is_finite()
        {
            return;
        }

        if !self.image.is_animation() || self.total <= 0 {
            self.show(0);
            self.complete();
            return;
        }

        self.accumulator = self
            .accumulator
            .saturating_add(secs_to_nanos(elapsed * self.speed));

        let position = self.accumulator.rem_euclid(self.total);
        let looped = self.accumulator.unsigned_abs() / self.total.unsigned_abs();
        let amount = u64::from(self.loop_mode().amount());
        let done = amount != 0 && looped >= amount;

        let target = if !done {
            self.frame_at(position)
        } else if self.speed > 0.0 {
            self.cumulative.len() - 1
        } else {
            0
        };
        self.show(target);
        if done {
            self.complete();
        }
    }

    /// Jump to `progress` of the frame range and render that frame before returning.
    pub fn seek(&mut self, progress: f64, resume: bool) {
        if self.state == PlaybackState::Playing {
            self.pause();
        } else {
            self.state = PlaybackState::Paused;
            self.clock.set_paused(true);
        }

        let progress = if progress.is_finite() {
            progress.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let last = self.cumulative.len() - 1;
        let index = ((last as f64) * progress).round() as usize;
        let start = if index == 0 {
            0
        } else {
            self.cumulative[index - 1]
        };
        self.accumulator = if self.speed < 0.0 && start > 0 {
            start - self.total
        } else {
            start
        };
        self.completed = false;

        tracing::debug!(image = self.image.id(), progress, index, "seek");
        self.last_displayed = None;
        self.show(index);
        self.flush();

        if resume {
            self.start();
        }
    }

    /// Non-finite speeds freeze playback.
    pub fn set_playback_speed(&mut self, speed: f64) {
        self.speed = if speed.is_finite() { speed } else { 0.0 };
        let fps = self.refresh_rate();
        self.clock.set_preferred_frames_per_second(fps);
        tracing::debug!(speed = self.speed, fps, "playback speed");
    }

    /// Tick rate needed to show every frame at the current speed; 0 when frozen.
    pub fn refresh_rate(&self) -> u32 {
        if self.speed == 0.0 {
            return 0;
        }
        let min = self
            .image
            .frame_durations()
            .iter()
            .copied()
            .filter(|d| *d > 0.0)
            .fold(f64::INFINITY, f64::min);
        if min.is_finite() {
            (self.speed.abs() / min).ceil() as u32
        } else {
            0
        }
    }

    pub fn set_view_loop_mode(&mut self, mode: Option<LoopMode>) {
        self.view_loop_mode = mode;
    }

    pub fn set_use_cache(&mut self, enabled: bool) {
        self.use_cache = enabled;
        self.worker.submit(Job::SetUseCache(enabled));
    }

    pub fn clear_cache(&self) {
        self.worker.submit(Job::ClearCache);
    }

    /// Composite every frame into the cache on the render thread.
    pub fn preheat_cache(&self) {
        if self.use_cache {
            self.worker.submit(Job::Preheat);
        }
    }

    pub fn handle_memory_pressure(&self) {
        tracing::debug!(image = self.image.id(), "memory pressure; clearing frame cache");
        self.clear_cache();
    }

    /// Wait until every job submitted so far has run.
    pub fn flush(&self) {
        self.worker.sync();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.worker.sync().unwrap_or_default()
    }

    pub fn drain_events(&self) -> Vec<PlaybackEvent> {
        self.events.try_iter().collect()
    }

    pub fn wait_event(&self, timeout: Duration) -> Option<PlaybackEvent> {
        self.events.recv_timeout(timeout).ok()
    }

    fn frame_at(&self, position: i64) -> usize {
        self.cumulative
            .iter()
            .position(|&end| end > position)
            .unwrap_or(self.cumulative.len() - 1)
    }

    fn show(&mut self, index: usize) {
        if self.last_displayed == Some(index) {
            return;
        }
        self.last_displayed = Some(index);
        self.worker.submit(Job::Render {
            index,
            generation: self.worker.generation(),
        });
    }

    fn complete(&mut self) {
        self.completed = true;
        let mode = self.loop_mode();
        tracing::debug!(image = self.image.id(), %mode, "complete");
        self.worker.submit(Job::Emit {
            event: PlaybackEvent::DidCompletePlaying(mode),
            generation: Some(self.worker.generation()),
        });
    }

    fn emit(&self, event: PlaybackEvent) {
        self.worker.submit(Job::Emit {
            event,
            generation: None,
        });
    }
}

impl std::fmt::Debug for LoopRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopRenderer")
            .field("image", &self.image)
            .field("state", &self.state)
            .field("accumulator", &self.accumulator)
            .field("last_displayed", &self.last_displayed)
            .field("speed", &self.speed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/renderer.rs"]
mod tests;
