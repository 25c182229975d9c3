use super::*;
use crate::test_support::{encode_animated_webp, encode_webp};

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

#[test]
fn static_webp_is_single_independent_frame() {
    let bytes = encode_webp(3, 2, [10, 20, 30, 255]);
    assert!(WebPCodec::can_decode(&bytes));
    let codec = WebPCodec::open(&bytes).unwrap();
    assert_eq!((codec.canvas_width(), codec.canvas_height()), (3, 2));
    assert_eq!(codec.frame_count(), 1);
    assert!(codec.are_frames_independent());
    assert_eq!(codec.frame_durations(), &[0.1]);
    let r = codec.decode(0).unwrap().unwrap();
    assert_eq!(r.pixel(2, 1), Some([10, 20, 30, 255]));
}

#[test]
fn reads_animation_metadata() {
    let bytes = encode_animated_webp(4, 2, &[(RED, 50), (BLUE, 5)], 2);
    assert!(WebPCodec::can_decode(&bytes));
    let codec = WebPCodec::open(&bytes).unwrap();
    assert_eq!((codec.canvas_width(), codec.canvas_height()), (4, 2));
    assert!(codec.is_animation());
    assert_eq!(codec.frame_count(), 2);
    assert_eq!(codec.loop_count(), 2);
    // 5 ms is below the minimum and falls back to the default delay.
    assert_eq!(codec.frame_durations(), &[0.05, 0.1]);
    assert!(codec.are_frames_independent());

    let f1 = codec.frame(1).unwrap();
    assert_eq!((f1.offset_x, f1.offset_y, f1.width, f1.height), (0, 0, 4, 2));
    assert!(!f1.blend_with_previous_frame);
    assert!(!f1.dispose_to_background_color);
}

#[test]
fn zero_loop_count_means_forever() {
    let bytes = encode_animated_webp(2, 2, &[(RED, 100), (BLUE, 100)], 0);
    assert_eq!(WebPCodec::open(&bytes).unwrap().loop_count(), 0);
}

#[test]
fn decodes_each_animation_frame() {
    let bytes = encode_animated_webp(4, 2, &[(RED, 50), (BLUE, 50)], 0);
    let codec = WebPCodec::open(&bytes).unwrap();
    assert_eq!(codec.decode(0).unwrap().unwrap().pixel(3, 1), Some(RED));
    assert_eq!(codec.decode(1).unwrap().unwrap().pixel(0, 0), Some(BLUE));
    assert_eq!(codec.decode(3).unwrap().unwrap().pixel(2, 1), Some(BLUE));
}

#[test]
fn decode_returns_fresh_frame_each_call() {
    let bytes = encode_animated_webp(2, 2, &[(RED, 50), (BLUE, 50)], 0);
    let codec = WebPCodec::open(&bytes).unwrap();
    let a = codec.decode(1).unwrap().unwrap();
    let b = codec.decode(1).unwrap().unwrap();
    assert_eq!(a.rgba8_premul, b.rgba8_premul);
    assert!(!Arc::ptr_eq(&a.rgba8_premul, &b.rgba8_premul));
    assert_eq!(Arc::strong_count(&a.rgba8_premul), 1);
}

#[test]
fn rejects_garbage_after_riff_header() {
    let err = WebPCodec::open(b"RIFF\x04\x00\x00\x00WEBPjunk").err().unwrap();
    assert!(matches!(err, LoopingError::InvalidContainerData(_)));
}
