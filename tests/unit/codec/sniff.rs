use super::*;

#[test]
fn sniffs_known_headers() {
    assert_eq!(ContainerFormat::sniff(b"GIF89a\x01\x00"), Some(ContainerFormat::Gif));
    assert_eq!(ContainerFormat::sniff(b"GIF87a"), Some(ContainerFormat::Gif));
    assert_eq!(ContainerFormat::sniff(&PNG_SIGNATURE), Some(ContainerFormat::Png));
    assert_eq!(
        ContainerFormat::sniff(b"RIFF\x10\x00\x00\x00WEBPVP8X"),
        Some(ContainerFormat::WebP)
    );
    assert_eq!(
        ContainerFormat::sniff(b"\x00\x00\x00\x18ftypheic\x00\x00\x00\x00"),
        Some(ContainerFormat::Heic)
    );
}

#[test]
fn rejects_unknown_and_truncated_data() {
    assert_eq!(ContainerFormat::sniff(b""), None);
    assert_eq!(ContainerFormat::sniff(b"GIF8"), None);
    assert_eq!(ContainerFormat::sniff(b"RIFF\x10\x00\x00\x00WAVE"), None);
    assert_eq!(ContainerFormat::sniff(b"\x01\x00\x00\x18ftypheic"), None);
    assert_eq!(ContainerFormat::sniff(b"hello world!"), None);
}
