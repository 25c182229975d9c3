use crate::{
    codec::{
        apng::ApngCodec,
        gif::GifCodec,
        traits::{Codec, CodecOpen},
        webp::WebPCodec,
    },
    foundation::error::{LoopingError, LoopingResult},
};

/// One registered container format.
#[derive(Clone, Copy)]
pub struct CodecEntry {
    pub name: &'static str,
    pub can_decode: fn(&[u8]) -> bool,
    pub open: fn(&[u8]) -> LoopingResult<Box<dyn Codec>>,
}

impl CodecEntry {
    pub fn of<T: CodecOpen>() -> Self {
        Self {
            name: T::NAME,
            can_decode: T::can_decode,
            open: |bytes| Ok(Box::new(T::open(bytes)?)),
        }
    }
}

impl std::fmt::Debug for CodecEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Ordered list of codecs queried by content sniffing. The first match wins.
#[derive(Clone, Debug)]
pub struct CodecRegistry {
    entries: Vec<CodecEntry>,
}

impl CodecRegistry {
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn register(&mut self, entry: CodecEntry) -> &mut Self {
        self.entries.push(entry);
        self
    }

    pub fn register_codec<T: CodecOpen>(&mut self) -> &mut Self {
        self.register(CodecEntry::of::<T>())
    }

    pub fn entries(&self) -> &[CodecEntry] {
        &self.entries
    }

    pub fn resolve(&self, bytes: &[u8]) -> LoopingResult<&CodecEntry> {
        self.entries
            .iter()
            .find(|e| (e.can_decode)(bytes))
            .ok_or(LoopingError::NoMatchingCodec)
    }

    /// Resolve and open `bytes` with the first matching codec.
    #[tracing::instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn open(&self, bytes: &[u8]) -> LoopingResult<Box<dyn Codec>> {
        let entry = self.resolve(bytes)?;
        tracing::debug!(codec = entry.name, "opening container");
        (entry.open)(bytes)
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        let mut r = Self::empty();
        r.register_codec::<GifCodec>()
            .register_codec::<ApngCodec>()
            .register_codec::<WebPCodec>();
        r
    }
}

#[cfg(test)]
#[path = "../../tests/unit/codec/registry.rs"]
mod tests;
