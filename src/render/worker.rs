use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, mpsc};
use std::thread::JoinHandle;

use anyhow::Context;
use rayon::prelude::*;

use crate::{
    codec::traits::Codec,
    foundation::core::Raster,
    foundation::error::LoopingResult,
    model::loop_image::LoopImage,
    render::cache::{CacheStats, FrameCache},
    render::compositor::Compositor,
    render::events::PlaybackEvent,
};

/// Work items executed strictly in submission order on the render thread.
pub(crate) enum Job {
    Render { index: usize, generation: u64 },
    Preheat,
    ClearCache,
    SetUseCache(bool),
    /// Clear the canvas and display nothing.
    Reset { generation: u64 },
    /// Forward an event once everything queued before it has run. With a generation, the event
    /// is dropped if a stop happened in between.
    Emit {
        event: PlaybackEvent,
        generation: Option<u64>,
    },
    Sync(mpsc::Sender<CacheStats>),
}

/// Compositor and cache, owned by the render thread alone.
pub(crate) struct RenderState {
    codec: Arc<dyn Codec>,
    compositor: Compositor,
    cache: FrameCache,
}

impl RenderState {
    pub(crate) fn new(image: &LoopImage, use_cache: bool, max_bytes: Option<usize>) -> Self {
        let mut cache = FrameCache::new(image.id(), image.frame_count(), max_bytes);
        cache.set_enabled(use_cache);
        Self {
            codec: image.shared_codec(),
            compositor: Compositor::new(image.canvas()),
            cache,
        }
    }

    pub(crate) fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub(crate) fn set_use_cache(&mut self, enabled: bool) {
        self.cache.set_enabled(enabled);
    }

    pub(crate) fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub(crate) fn reset(&mut self) {
        self.compositor.reset();
    }

    /// Produce the composited raster of `index`, with whether it came from the cache.
    ///
    /// Returns `None` when the frame could not be decoded; the caller keeps showing whatever it
    /// showed before.
    pub(crate) fn render(&mut self, index: usize) -> LoopingResult<Option<(Raster, bool)>> {
        let independent = self.codec.are_frames_independent();
        if let Some(hit) = self.cache.get(&index.to_string()) {
            if !independent {
                let frame = self.codec.frame(index as i64)?;
                self.compositor.restore(&hit, frame);
            }
            return Ok(Some((hit, true)));
        }

        if independent {
            return match self.codec.decode(index as i64) {
                Ok(Some(raster)) => {
                    self.cache.insert(index.to_string(), raster.clone());
                    Ok(Some((raster, false)))
                }
                Ok(None) => Ok(None),
                Err(e) if e.is_frame_local() => {
                    tracing::warn!(frame = index, error = %e, "skipping undecodable frame");
                    Ok(None)
                }
                Err(e) => Err(e),
            };
        }

        let start = self.replay_start(index)?;
        let mut out = None;
        for i in start..=index {
            match self.compositor.composite(self.codec.as_ref(), i) {
                Ok(Some(raster)) => {
                    self.cache.insert(i.to_string(), raster.clone());
                    if i == index {
                        out = Some((raster, false));
                    }
                }
                Ok(None) => {}
                Err(e) if e.is_frame_local() => {
                    tracing::warn!(frame = i, error = %e, "skipping undecodable frame");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    /// Pick the first frame to composite so that the canvas ends up holding `index`.
    fn replay_start(&mut self, index: usize) -> LoopingResult<usize> {
        let current = self.compositor.current_index().filter(|&k| k < index);
        if current == Some(index.wrapping_sub(1)) {
            return Ok(index);
        }

        let floor = current.map_or(0, |k| k + 1);
        for j in (floor..index).rev() {
            if let Some(cached) = self.cache.peek(&j.to_string()).cloned() {
                let frame = self.codec.frame(j as i64)?;
                self.compositor.restore(&cached, frame);
                tracing::trace!(target = index, anchor = j, "replaying from cached frame");
                return Ok(j + 1);
            }
        }

        match current {
            Some(k) => Ok(k + 1),
            None => {
                self.compositor.reset();
                Ok(0)
            }
        }
    }

    /// Fill the cache with every frame.
    #[tracing::instrument(skip(self), fields(cache = self.cache.name()))]
    pub(crate) fn preheat(&mut self) {
        if !self.cache.is_enabled() {
            tracing::debug!("cache disabled; skipping preheat");
            return;
        }
        let n = self.codec.frame_count();

        if self.codec.are_frames_independent() {
            let missing: Vec<usize> = (0..n)
                .filter(|i| !self.cache.contains(&i.to_string()))
                .collect();
            let codec = self.codec.as_ref();
            let decoded: Vec<(usize, LoopingResult<Option<Raster>>)> = missing
                .par_iter()
                .map(|&i| (i, codec.decode(i as i64)))
                .collect();
            for (i, res) in decoded {
                match res {
                    Ok(Some(raster)) => {
                        self.cache.insert(i.to_string(), raster);
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!(frame = i, error = %e, "preheat skipped frame"),
                }
            }
        } else {
            let mut scratch = Compositor::new(self.compositor.canvas());
            for i in 0..n {
                match scratch.composite(self.codec.as_ref(), i) {
                    Ok(Some(raster)) => {
                        self.cache.insert(i.to_string(), raster);
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!(frame = i, error = %e, "preheat skipped frame"),
                }
            }
        }
        tracing::debug!(entries = self.cache.len(), "preheat finished");
    }
}

/// Serialized render thread for one image.
pub(crate) struct RenderWorker {
    jobs: Option<mpsc::Sender<Job>>,
    handle: Option<JoinHandle<()>>,
    generation: Arc<AtomicU64>,
}

impl RenderWorker {
    pub(crate) fn spawn(
        image: &LoopImage,
        use_cache: bool,
        max_bytes: Option<usize>,
        events: mpsc::Sender<PlaybackEvent>,
    ) -> LoopingResult<Self> {
        let (tx, rx) = mpsc::channel::<Job>();
        let generation = Arc::new(AtomicU64::new(0));
        let mut state = RenderState::new(image, use_cache, max_bytes);
        let current = Arc::clone(&generation);

        let handle = std::thread::Builder::new()
            .name(format!("looping-render-{}", image.id()))
            .spawn(move || run(&mut state, &rx, &events, &current))
            .context("spawn render worker")?;

        Ok(Self {
            jobs: Some(tx),
            handle: Some(handle),
            generation,
        })
    }

    pub(crate) fn submit(&self, job: Job) {
        let Some(jobs) = self.jobs.as_ref() else {
            return;
        };
        if jobs.send(job).is_err() {
            tracing::warn!("render worker is gone; dropping job");
        }
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Invalidate every job submitted so far.
    pub(crate) fn bump_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Block until every queued job has run.
    pub(crate) fn sync(&self) -> Option<CacheStats> {
        let (tx, rx) = mpsc::channel();
        self.submit(Job::Sync(tx));
        rx.recv().ok()
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        self.jobs = None;
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("render worker panicked");
        }
    }
}

fn run(
    state: &mut RenderState,
    jobs: &mpsc::Receiver<Job>,
    events: &mpsc::Sender<PlaybackEvent>,
    current: &AtomicU64,
) {
    let is_current = |g: u64| g == current.load(Ordering::SeqCst);
    // A closed event channel only means nobody is listening anymore.
    let emit = |event: PlaybackEvent| {
        let _ = events.send(event);
    };

    while let Ok(job) = jobs.recv() {
        match job {
            Job::Render { index, generation } => {
                if !is_current(generation) {
                    tracing::trace!(frame = index, "dropping stale render");
                    continue;
                }
                match state.render(index) {
                    Ok(Some((raster, cache_hit))) => {
                        if !is_current(generation) {
                            continue;
                        }
                        emit(PlaybackEvent::DidRenderFrame { index, cache_hit });
                        emit(PlaybackEvent::DidDisplayImage {
                            raster: Some(raster),
                            frame_index: Some(index),
                        });
                    }
                    Ok(None) => {}
                    Err(e) => tracing::warn!(frame = index, error = %e, "render failed"),
                }
            }
            Job::Preheat => state.preheat(),
            Job::ClearCache => state.clear_cache(),
            Job::SetUseCache(enabled) => state.set_use_cache(enabled),
            Job::Reset { generation } => {
                state.reset();
                if is_current(generation) {
                    emit(PlaybackEvent::DidDisplayImage {
                        raster: None,
                        frame_index: None,
                    });
                }
            }
            Job::Emit { event, generation } => {
                if generation.is_none_or(is_current) {
                    emit(event);
                }
            }
            Job::Sync(reply) => {
                let _ = reply.send(state.stats());
            }
        }
    }
    tracing::debug!("render worker exiting");
}

#[cfg(test)]
#[path = "../../tests/unit/render/worker.rs"]
mod tests;
