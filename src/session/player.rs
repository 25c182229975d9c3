use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::{
    clock::source::{ClockSource, ManualClock},
    clock::display_link::DisplayLink,
    foundation::core::Raster,
    foundation::error::LoopingResult,
    model::loop_image::LoopImage,
    model::loop_mode::LoopMode,
    render::events::PlaybackEvent,
    render::renderer::LoopRenderer,
    session::opts::{CompletionBehavior, PlayerOpts},
};

/// Receives player notifications. Every method defaults to doing nothing.
pub trait PlayerDelegate: Send {
    fn did_start_playing(&mut self, _image: &LoopImage) {}

    fn did_pause_playing(&mut self, _image: &LoopImage) {}

    fn did_stop_playing(&mut self, _image: &LoopImage) {}

    fn did_finish_playing(&mut self, _image: &LoopImage, _loop_mode: LoopMode) {}

    fn did_render_frame(&mut self, _index: usize, _from_cache: bool) {}

    fn did_display(&mut self, _raster: Option<&Raster>, _frame_index: Option<usize>) {}
}

/// Called once with `true` when playback completes, or `false` when it is stopped first.
pub type CompletionCallback = Box<dyn FnOnce(bool) + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ClockKind {
    Manual,
    DisplayLink,
}

/// Host-side playback session: one image at a time, with completion handling and delegate
/// dispatch on the caller's thread.
pub struct Player {
    opts: PlayerOpts,
    clock_kind: ClockKind,
    renderer: Option<LoopRenderer>,
    ticks: Option<mpsc::Receiver<f64>>,
    delegate: Option<Box<dyn PlayerDelegate>>,
    completion: Option<CompletionCallback>,
    displayed: Option<Raster>,
    displayed_index: Option<usize>,
}

impl Player {
    /// Player driven by a real-time [`DisplayLink`].
    pub fn new(opts: PlayerOpts) -> Self {
        Self::with_clock(opts, ClockKind::DisplayLink)
    }

    /// Player whose time only moves through [`Player::advance`].
    pub fn manual(opts: PlayerOpts) -> Self {
        Self::with_clock(opts, ClockKind::Manual)
    }

    fn with_clock(opts: PlayerOpts, clock_kind: ClockKind) -> Self {
        Self {
            opts,
            clock_kind,
            renderer: None,
            ticks: None,
            delegate: None,
            completion: None,
            displayed: None,
            displayed_index: None,
        }
    }

    pub fn opts(&self) -> &PlayerOpts {
        &self.opts
    }

    pub fn set_delegate(&mut self, delegate: Option<Box<dyn PlayerDelegate>>) {
        self.delegate = delegate;
    }

    pub fn image(&self) -> Option<&LoopImage> {
        self.renderer.as_ref().map(LoopRenderer::image)
    }

    pub fn renderer(&self) -> Option<&LoopRenderer> {
        self.renderer.as_ref()
    }

    /// Replace the current image, stopping the previous one first.
    pub fn set_image(&mut self, image: Option<LoopImage>) -> LoopingResult<()> {
        self.stop();
        self.settle();
        self.renderer = None;
        self.ticks = None;
        self.displayed = None;
        self.displayed_index = None;

        let Some(image) = image else {
            return Ok(());
        };
        let clock: Box<dyn ClockSource> = match self.clock_kind {
            ClockKind::Manual => Box::new(ManualClock::new()),
            ClockKind::DisplayLink => {
                let (link, ticks) = DisplayLink::spawn()?;
                self.ticks = Some(ticks);
                Box::new(link)
            }
        };
        self.renderer = Some(LoopRenderer::new(image, clock, self.opts.renderer.clone())?);
        if self.opts.autoplay {
            self.play(None, None, None);
        }
        Ok(())
    }

    pub fn is_playing(&self) -> bool {
        self.renderer.as_ref().is_some_and(LoopRenderer::is_playing)
    }

    /// Last raster handed to [`PlayerDelegate::did_display`].
    pub fn displayed(&self) -> Option<&Raster> {
        self.displayed.as_ref()
    }

    pub fn displayed_index(&self) -> Option<usize> {
        self.displayed_index
    }

    /// Start playing, optionally overriding the loop mode and cache use.
    pub fn play(
        &mut self,
        loop_mode: Option<LoopMode>,
        use_cache: Option<bool>,
        completion: Option<CompletionCallback>,
    ) {
        if let Some(mode) = loop_mode {
            self.set_loop_mode(Some(mode));
        }
        if let Some(use_cache) = use_cache {
            self.set_use_cache(use_cache);
        }
        if let Some(completion) = completion {
            self.completion = Some(completion);
        }
        if let Some(r) = self.renderer.as_mut() {
            r.start();
        }
    }

    pub fn play_once(&mut self, completion: Option<CompletionCallback>) {
        self.play(Some(LoopMode::Once), Some(false), completion);
    }

    pub fn play_repeat(&mut self, amount: u32, completion: Option<CompletionCallback>) {
        self.play(Some(LoopMode::from_amount(amount)), Some(true), completion);
    }

    pub fn play_indefinitely(&mut self, completion: Option<CompletionCallback>) {
        self.play(Some(LoopMode::Infinite), Some(true), completion);
    }

    pub fn pause(&mut self) {
        if let Some(r) = self.renderer.as_mut() {
            r.pause();
        }
    }

    pub fn stop(&mut self) {
        if let Some(r) = self.renderer.as_mut() {
            r.stop();
        }
    }

    pub fn seek(&mut self, progress: f64, resume: bool) {
        if let Some(r) = self.renderer.as_mut() {
            r.seek(progress, resume);
        }
        self.pump();
    }

    pub fn set_loop_mode(&mut self, mode: Option<LoopMode>) {
        self.opts.renderer.view_loop_mode = mode;
        if let Some(r) = self.renderer.as_mut() {
            r.set_view_loop_mode(mode);
        }
    }

    pub fn set_use_cache(&mut self, enabled: bool) {
        self.opts.renderer.use_cache = enabled;
        if let Some(r) = self.renderer.as_mut() {
            r.set_use_cache(enabled);
        }
    }

    pub fn set_playback_speed(&mut self, speed: f64) {
        self.opts.renderer.playback_speed = speed;
        if let Some(r) = self.renderer.as_mut() {
            r.set_playback_speed(speed);
        }
    }

    pub fn set_completion_behavior(&mut self, behavior: CompletionBehavior) {
        self.opts.completion_behavior = behavior;
    }

    pub fn did_receive_memory_warning(&self) {
        if let Some(r) = self.renderer.as_ref() {
            r.handle_memory_pressure();
        }
    }

    /// Apply pending display-link ticks and dispatch renderer events; returns the number of
    /// events dispatched.
    pub fn pump(&mut self) -> usize {
        if let (Some(ticks), Some(r)) = (self.ticks.as_ref(), self.renderer.as_mut()) {
            for dt in ticks.try_iter() {
                r.tick(dt);
            }
        }
        let events = self
            .renderer
            .as_ref()
            .map(LoopRenderer::drain_events)
            .unwrap_or_default();
        let n = events.len();
        for event in events {
            self.dispatch(event);
        }
        n
    }

    /// Tick a manual clock by `elapsed` seconds and dispatch everything that results.
    pub fn advance(&mut self, elapsed: f64) {
        if let Some(r) = self.renderer.as_mut() {
            r.tick(elapsed);
        }
        self.settle();
    }

    /// Block until playback is no longer running, or `timeout` passes. Returns whether playback
    /// settled.
    pub fn run_until_idle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.pump();
            if !self.is_playing() {
                self.settle();
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let Some(ticks) = self.ticks.as_ref() else {
                // Nothing else will move a manual clock.
                return false;
            };
            match ticks.recv_timeout(deadline - now) {
                Ok(dt) => {
                    if let Some(r) = self.renderer.as_mut() {
                        r.tick(dt);
                    }
                }
                Err(mpsc::RecvTimeoutError::Timeout) => return false,
                Err(mpsc::RecvTimeoutError::Disconnected) => return !self.is_playing(),
            }
        }
    }

    /// Flush the render thread and dispatch until no events remain, including those caused by
    /// dispatching.
    fn settle(&mut self) {
        loop {
            if let Some(r) = self.renderer.as_ref() {
                r.flush();
            }
            if self.pump() == 0 {
                break;
            }
        }
    }

    fn dispatch(&mut self, event: PlaybackEvent) {
        let Some(renderer) = self.renderer.as_mut() else {
            return;
        };
        let image = renderer.image();
        match event {
            PlaybackEvent::DidStartPlaying => {
                if let Some(d) = self.delegate.as_mut() {
                    d.did_start_playing(image);
                }
            }
            PlaybackEvent::DidPausePlaying => {
                if let Some(d) = self.delegate.as_mut() {
                    d.did_pause_playing(image);
                }
            }
            PlaybackEvent::DidStopPlaying => {
                if let Some(d) = self.delegate.as_mut() {
                    d.did_stop_playing(image);
                }
                if let Some(done) = self.completion.take() {
                    done(false);
                }
            }
            PlaybackEvent::DidCompletePlaying(mode) => {
                if let Some(d) = self.delegate.as_mut() {
                    d.did_finish_playing(image, mode);
                }
                if let Some(done) = self.completion.take() {
                    done(true);
                }
                let stop = image.is_animation()
                    && self.opts.completion_behavior == CompletionBehavior::Stop;
                if stop {
                    renderer.stop();
                } else {
                    renderer.pause();
                }
            }
            PlaybackEvent::DidRenderFrame { index, cache_hit } => {
                if let Some(d) = self.delegate.as_mut() {
                    d.did_render_frame(index, cache_hit);
                }
            }
            PlaybackEvent::DidDisplayImage {
                raster,
                frame_index,
            } => {
                if let Some(d) = self.delegate.as_mut() {
                    d.did_display(raster.as_ref(), frame_index);
                }
                self.displayed = raster;
                self.displayed_index = frame_index;
            }
        }
    }
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player")
            .field("opts", &self.opts)
            .field("renderer", &self.renderer)
            .field("displayed_index", &self.displayed_index)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/player.rs"]
mod tests;
