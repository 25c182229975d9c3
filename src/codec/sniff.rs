/// Container formats recognized from their leading bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerFormat {
    Gif,
    Png,
    WebP,
    Heic,
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const HEIC_BRANDS: [&[u8; 4]; 6] = [b"mif1", b"msf1", b"heic", b"heix", b"hevc", b"hevx"];

impl ContainerFormat {
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if is_gif(bytes) {
            Some(Self::Gif)
        } else if is_png(bytes) {
            Some(Self::Png)
        } else if is_webp(bytes) {
            Some(Self::WebP)
        } else if is_heic(bytes) {
            Some(Self::Heic)
        } else {
            None
        }
    }
}

pub fn is_gif(bytes: &[u8]) -> bool {
    bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a")
}

pub fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(&PNG_SIGNATURE)
}

pub fn is_webp(bytes: &[u8]) -> bool {
    bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP"
}

/// ISO-BMFF `ftyp` box with a HEIF brand.
pub fn is_heic(bytes: &[u8]) -> bool {
    if bytes.len() < 12 || bytes[0] != 0 {
        return false;
    }
    let brand = &bytes[8..12];
    HEIC_BRANDS.iter().any(|b| brand == b.as_slice())
}

#[cfg(test)]
#[path = "../../tests/unit/codec/sniff.rs"]
mod tests;
