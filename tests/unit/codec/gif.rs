use super::*;
use crate::test_support::{GifFrameSpec, encode_gif};

fn four_frame_gif() -> Vec<u8> {
    let frames = [
        GifFrameSpec::full(4, 4, [255, 0, 0], 10),
        GifFrameSpec::full(4, 4, [0, 255, 0], 20),
        GifFrameSpec::full(4, 4, [0, 0, 255], 10),
        GifFrameSpec::full(4, 4, [255, 255, 255], 20),
    ];
    encode_gif(4, 4, &frames, Some(gif::Repeat::Infinite))
}

#[test]
fn reads_metadata() {
    let codec = GifCodec::open(&four_frame_gif()).unwrap();
    assert_eq!(codec.canvas_width(), 4);
    assert_eq!(codec.canvas_height(), 4);
    assert_eq!(codec.frame_count(), 4);
    assert!(codec.is_animation());
    assert!(!codec.are_frames_independent());
    assert_eq!(codec.frame_durations(), &[0.1, 0.2, 0.1, 0.2]);
    assert!((codec.animation_duration() - 0.6).abs() < 1e-9);
    assert_eq!(codec.loop_count(), 0);
}

#[test]
fn loop_count_maps_netscape_extension() {
    let one = [GifFrameSpec::full(2, 2, [1, 2, 3], 10); 2];
    let absent = GifCodec::open(&encode_gif(2, 2, &one, None)).unwrap();
    assert_eq!(absent.loop_count(), 1);
    let three = GifCodec::open(&encode_gif(2, 2, &one, Some(gif::Repeat::Finite(3)))).unwrap();
    assert_eq!(three.loop_count(), 3);
}

#[test]
fn zero_delay_uses_default_duration() {
    let frames = [GifFrameSpec::full(2, 2, [1, 2, 3], 0)];
    let codec = GifCodec::open(&encode_gif(2, 2, &frames, None)).unwrap();
    assert_eq!(codec.frame_durations(), &[0.1]);
    assert!(!codec.is_animation());
}

#[test]
fn frame_geometry_and_disposal() {
    let frames = [
        GifFrameSpec::full(4, 4, [9, 9, 9], 10),
        GifFrameSpec {
            left: 1,
            top: 2,
            width: 2,
            height: 1,
            fill: None,
            delay_cs: 10,
            dispose: gif::DisposalMethod::Background,
        },
    ];
    let codec = GifCodec::open(&encode_gif(4, 4, &frames, None)).unwrap();
    let f = codec.frame(1).unwrap();
    assert_eq!((f.offset_x, f.offset_y, f.width, f.height), (1, 2, 2, 1));
    assert!(f.dispose_to_background_color);
    assert!(f.blend_with_previous_frame);
    assert!(f.has_alpha);
    assert!(!codec.frame(0).unwrap().dispose_to_background_color);

    let raster = codec.decode(1).unwrap().unwrap();
    assert_eq!((raster.width, raster.height), (2, 1));
    assert_eq!(raster.pixel(0, 0), Some([0, 0, 0, 0]));
}

#[test]
fn decode_expands_palette_and_wraps_index() {
    let codec = GifCodec::open(&four_frame_gif()).unwrap();
    let r = codec.decode(5).unwrap().unwrap();
    assert_eq!(r.pixel(3, 3), Some([0, 255, 0, 255]));
    assert_eq!(codec.frame(4).unwrap().index, 0);
    assert!(matches!(
        codec.decode(-1),
        Err(LoopingError::FrameIndexOutOfBounds(-1))
    ));
}

#[test]
fn header_only_data_is_invalid() {
    let err = GifCodec::open(b"GIF89a").err().unwrap();
    assert!(matches!(err, LoopingError::InvalidContainerData(_)));
}
