use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, mpsc};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use anyhow::Context;

use crate::{clock::source::ClockSource, foundation::error::LoopingResult};

const NATIVE_FPS: u32 = 60;

#[derive(Debug)]
struct LinkState {
    paused: bool,
    fps: u32,
    shutdown: bool,
}

type Shared = Arc<(Mutex<LinkState>, Condvar)>;

/// Threaded clock that sends the measured wall time between fires over a channel.
///
/// Starts paused. Paused time is not reported as elapsed.
pub struct DisplayLink {
    shared: Shared,
    // Mirrors of the shared state, so reads never block on the timer thread.
    paused: bool,
    fps: u32,
    handle: Option<JoinHandle<()>>,
}

impl DisplayLink {
    pub fn spawn() -> LoopingResult<(Self, mpsc::Receiver<f64>)> {
        let shared: Shared = Arc::new((
            Mutex::new(LinkState {
                paused: true,
                fps: 0,
                shutdown: false,
            }),
            Condvar::new(),
        ));
        let (tx, rx) = mpsc::channel();
        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name("looping-display-link".to_string())
            .spawn(move || run(&thread_shared, &tx))
            .context("spawn display link")?;
        Ok((
            Self {
                shared,
                paused: true,
                fps: 0,
                handle: Some(handle),
            },
            rx,
        ))
    }

    fn update(&self, f: impl FnOnce(&mut LinkState)) {
        let (lock, cvar) = &*self.shared;
        f(&mut lock_state(lock));
        cvar.notify_all();
    }
}

impl ClockSource for DisplayLink {
    fn is_paused(&self) -> bool {
        self.paused
    }

    fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
        self.update(|s| s.paused = paused);
    }

    fn preferred_frames_per_second(&self) -> u32 {
        self.fps
    }

    fn set_preferred_frames_per_second(&mut self, fps: u32) {
        self.fps = fps;
        self.update(|s| s.fps = fps);
    }
}

impl Drop for DisplayLink {
    fn drop(&mut self) {
        self.update(|s| s.shutdown = true);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for DisplayLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DisplayLink")
            .field("paused", &self.paused)
            .field("fps", &self.fps)
            .finish_non_exhaustive()
    }
}

fn lock_state(lock: &Mutex<LinkState>) -> MutexGuard<'_, LinkState> {
    lock.lock().unwrap_or_else(PoisonError::into_inner)
}

fn interval(fps: u32) -> Duration {
    let fps = if fps == 0 { NATIVE_FPS } else { fps };
    Duration::from_secs_f64(1.0 / f64::from(fps))
}

fn run(shared: &Shared, tx: &mpsc::Sender<f64>) {
    let (lock, cvar) = &**shared;
    let mut state = lock_state(lock);
    let mut last = Instant::now();

    loop {
        if state.shutdown {
            break;
        }
        if state.paused {
            state = cvar.wait(state).unwrap_or_else(PoisonError::into_inner);
            last = Instant::now();
            continue;
        }

        let deadline = last + interval(state.fps);
        let now = Instant::now();
        if now < deadline {
            state = cvar
                .wait_timeout(state, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
            continue;
        }

        let elapsed = now.duration_since(last).as_secs_f64();
        last = now;
        drop(state);
        if tx.send(elapsed).is_err() {
            tracing::debug!("display link receiver dropped; stopping");
            return;
        }
        state = lock_state(lock);
    }
    tracing::debug!("display link stopped");
}

#[cfg(test)]
#[path = "../../tests/unit/clock/display_link.rs"]
mod tests;
