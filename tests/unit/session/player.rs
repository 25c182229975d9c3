use std::sync::{Arc, Mutex};

use super::*;
use crate::test_support::SyntheticCodec;

#[derive(Clone, Default)]
struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }

    fn push(&self, s: String) {
        self.0.lock().unwrap().push(s);
    }
}

impl PlayerDelegate for Recorder {
    fn did_start_playing(&mut self, _image: &LoopImage) {
        self.push("start".into());
    }

    fn did_pause_playing(&mut self, _image: &LoopImage) {
        self.push("pause".into());
    }

    fn did_stop_playing(&mut self, _image: &LoopImage) {
        self.push("stop".into());
    }

    fn did_finish_playing(&mut self, _image: &LoopImage, loop_mode: LoopMode) {
        self.push(format!("finish {loop_mode}"));
    }

    fn did_render_frame(&mut self, index: usize, from_cache: bool) {
        self.push(format!("render {index} {from_cache}"));
    }
}

fn image(durations: &[f64]) -> LoopImage {
    LoopImage::from_codec(Arc::new(SyntheticCodec::full(2, 2, durations)), 1.0).unwrap()
}

fn player(opts: PlayerOpts, durations: &[f64]) -> (Player, Recorder) {
    let rec = Recorder::default();
    let mut p = Player::manual(opts);
    p.set_delegate(Some(Box::new(rec.clone())));
    p.set_image(Some(image(durations))).unwrap();
    (p, rec)
}

fn completion_flag() -> (Arc<Mutex<Option<bool>>>, CompletionCallback) {
    let flag = Arc::new(Mutex::new(None));
    let f = flag.clone();
    (flag, Box::new(move |done| *f.lock().unwrap() = Some(done)))
}

#[test]
fn play_once_completes_then_stops() {
    let (mut p, rec) = player(PlayerOpts::default(), &[0.1, 0.2, 0.1, 0.2]);
    let (flag, cb) = completion_flag();
    p.play_once(Some(cb));
    assert!(!p.renderer().unwrap().use_cache());
    for _ in 0..12 {
        p.advance(0.05);
    }
    assert_eq!(*flag.lock().unwrap(), Some(true));
    assert!(!p.is_playing());
    assert_eq!(p.displayed(), None);
    assert_eq!(
        rec.take(),
        vec![
            "start",
            "render 0 false",
            "render 1 false",
            "render 2 false",
            "render 3 false",
            "finish once",
            "stop",
        ]
    );
}

#[test]
fn pause_behavior_keeps_last_frame() {
    let opts = PlayerOpts {
        completion_behavior: CompletionBehavior::Pause,
        ..PlayerOpts::default()
    };
    let (mut p, rec) = player(opts, &[0.1, 0.1]);
    p.play_repeat(2, None);
    for _ in 0..8 {
        p.advance(0.05);
    }
    assert!(!p.is_playing());
    assert_eq!(p.displayed_index(), Some(1));
    assert!(p.displayed().is_some());
    let events = rec.take();
    assert_eq!(events.last().map(String::as_str), Some("pause"));
    assert!(events.contains(&"finish repeat(2)".to_string()));
}

#[test]
fn stopping_first_reports_false() {
    let (mut p, _rec) = player(PlayerOpts::default(), &[0.1, 0.1]);
    let (flag, cb) = completion_flag();
    p.play_indefinitely(Some(cb));
    p.advance(0.05);
    p.stop();
    p.advance(0.0);
    assert_eq!(*flag.lock().unwrap(), Some(false));
}

#[test]
fn static_images_pause_on_completion() {
    let (mut p, rec) = player(PlayerOpts::default(), &[0.1]);
    p.play(None, None, None);
    p.advance(0.05);
    assert_eq!(p.displayed_index(), Some(0));
    assert_eq!(rec.take().last().map(String::as_str), Some("pause"));
}

#[test]
fn autoplay_starts_when_image_is_set() {
    let opts = PlayerOpts {
        autoplay: true,
        ..PlayerOpts::default()
    };
    let (mut p, _rec) = player(opts, &[0.1, 0.1]);
    assert!(p.is_playing());
    p.set_image(None).unwrap();
    assert!(p.image().is_none());
    assert!(!p.is_playing());
}

#[test]
fn memory_warning_clears_cache() {
    let (mut p, _rec) = player(PlayerOpts::default(), &[0.1, 0.1, 0.1]);
    p.renderer().unwrap().preheat_cache();
    assert_eq!(p.renderer().unwrap().cache_stats().entries, 3);
    p.did_receive_memory_warning();
    assert_eq!(p.renderer().unwrap().cache_stats().entries, 0);
    p.seek(1.0, false);
    assert_eq!(p.displayed_index(), Some(2));
}

#[test]
fn manual_player_cannot_idle_while_playing() {
    let (mut p, _rec) = player(PlayerOpts::default(), &[0.1, 0.1]);
    p.play_indefinitely(None);
    assert!(!p.run_until_idle(Duration::from_millis(10)));
    p.pause();
    assert!(p.run_until_idle(Duration::from_millis(10)));
}
