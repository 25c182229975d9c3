use std::path::PathBuf;

use super::*;
use crate::test_support::{GifFrameSpec, SyntheticCodec, encode_gif};

fn synthetic(durations: &[f64]) -> SyntheticCodec {
    SyntheticCodec::full(4, 2, durations)
}

#[test]
fn invalid_scales_fall_back_to_one() {
    for scale in [0.0, -2.0, f64::NAN, f64::INFINITY] {
        let img = LoopImage::from_codec(Arc::new(synthetic(&[0.1])), scale).unwrap();
        assert_eq!(img.scale(), 1.0);
    }
    let img = LoopImage::from_codec(Arc::new(synthetic(&[0.1])), 2.0).unwrap();
    assert_eq!(img.size(), (2.0, 1.0));
    assert_eq!(img.canvas(), Canvas::new(4, 2).unwrap());
}

#[test]
fn zero_frame_codecs_are_rejected() {
    let err = LoopImage::from_codec(Arc::new(synthetic(&[])), 1.0).unwrap_err();
    assert!(matches!(err, LoopingError::InvalidContainerData(_)));
}

#[test]
fn mismatched_durations_are_rejected() {
    let mut codec = synthetic(&[0.1, 0.1]);
    codec.durations.pop();
    assert!(LoopImage::from_codec(Arc::new(codec), 1.0).is_err());
}

#[test]
fn every_image_gets_its_own_id() {
    let a = LoopImage::from_codec(Arc::new(synthetic(&[0.1])), 1.0).unwrap();
    let b = LoopImage::from_codec(Arc::new(synthetic(&[0.1])), 1.0).unwrap();
    assert_ne!(a.id(), b.id());
    assert_eq!(a.clone().id(), a.id());
}

#[test]
fn timing_and_loop_mode_come_from_the_codec() {
    let img = LoopImage::from_codec(
        Arc::new(synthetic(&[0.1, 0.05, 0.2]).with_loop_count(2)),
        1.0,
    )
    .unwrap();
    assert!(img.is_animation());
    assert_eq!(img.frame_count(), 3);
    assert!((img.duration() - 0.35).abs() < 1e-9);
    assert_eq!(img.loop_mode(), LoopMode::Repeat { amount: 2 });
    assert_eq!(img.preferred_frames_per_second(), 20);
    assert_eq!(img.cumulative_nanos(), vec![100_000_000, 150_000_000, 350_000_000]);
    assert_eq!(img.frame(4).unwrap().index, 1);
}

#[test]
fn image_at_frame_composites_from_the_start() {
    let img = LoopImage::from_codec(Arc::new(synthetic(&[0.1, 0.1, 0.1])), 1.0).unwrap();
    let raster = img.image_at_frame(2).unwrap().unwrap();
    assert_eq!(raster.pixel(0, 0), Some([90, 0, 0, 255]));
    // Indices wrap around the frame count.
    let wrapped = img.image_at_frame(5).unwrap().unwrap();
    assert_eq!(wrapped, raster);
}

#[test]
fn image_at_frame_skips_failing_frames() {
    let codec = synthetic(&[0.1, 0.1, 0.1]).failing_at(2);
    let img = LoopImage::from_codec(Arc::new(codec), 1.0).unwrap();
    let raster = img.image_at_frame(2).unwrap().unwrap();
    assert_eq!(raster.pixel(0, 0), Some([50, 0, 0, 255]));
}

#[test]
fn independent_frames_are_decoded_directly() {
    let codec = Arc::new(synthetic(&[0.1, 0.1, 0.1]).independent());
    let img = LoopImage::from_codec(codec.clone(), 1.0).unwrap();
    img.image_at_frame(2).unwrap();
    assert_eq!(codec.decode_count(), 1);
}

#[test]
fn gif_bytes_open_through_the_default_registry() {
    let bytes = encode_gif(
        2,
        2,
        &[
            GifFrameSpec::full(2, 2, [255, 0, 0], 10),
            GifFrameSpec::full(2, 2, [0, 0, 255], 20),
        ],
        Some(gif::Repeat::Infinite),
    );
    let img = LoopImage::from_bytes(&bytes, 1.0).unwrap();
    assert_eq!(img.frame_durations(), &[0.1, 0.2]);
    assert_eq!(img.loop_mode(), LoopMode::Infinite);
    assert!(matches!(
        img.image_at_frame(-1),
        Err(LoopingError::FrameIndexOutOfBounds(-1))
    ));
    let second = img.image_at_frame(1).unwrap().unwrap();
    assert_eq!(second.pixel(1, 1), Some([0, 0, 255, 255]));
}

#[test]
fn garbage_bytes_have_no_codec() {
    let err = LoopImage::from_bytes(b"definitely not an image", 1.0).unwrap_err();
    assert!(matches!(err, LoopingError::NoMatchingCodec));
}

#[test]
fn retina_suffix_sets_scale() {
    assert_eq!(LoopImage::scale_from_path(&PathBuf::from("spinner@2x.gif")), 2.0);
    assert_eq!(LoopImage::scale_from_path(&PathBuf::from("a/b/spinner@3x.png")), 3.0);
    assert_eq!(LoopImage::scale_from_path(&PathBuf::from("spinner.gif")), 1.0);
}

#[test]
fn missing_files_report_the_path() {
    let err = LoopImage::from_path("/nonexistent/looping/spinner.gif").unwrap_err();
    assert!(err.to_string().contains("spinner.gif"));
}
