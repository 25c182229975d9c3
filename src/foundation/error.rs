/// Convenience result type used across looping.
pub type LoopingResult<T> = Result<T, LoopingError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum LoopingError {
    /// No registered codec accepts the byte buffer.
    #[error("no matching codec for the provided data")]
    NoMatchingCodec,

    /// Malformed header or demux failure while opening a container.
    #[error("invalid container data: {0}")]
    InvalidContainerData(String),

    /// A frame index that does not map to a frame after modulo normalization.
    #[error("frame index out of bounds: {0}")]
    FrameIndexOutOfBounds(i64),

    /// A frame whose data is not fully present in the container.
    #[error("incomplete frame at index {0}")]
    IncompleteFrame(usize),

    /// A frame that could not be decoded into pixels.
    #[error("decode failed: {0}")]
    DecodeFailed(String),

    /// Invalid user-provided options or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// Wrapped lower-level error from dependencies, IO or worker threads.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LoopingError {
    /// Build a [`LoopingError::InvalidContainerData`] value.
    pub fn invalid_data(msg: impl Into<String>) -> Self {
        Self::InvalidContainerData(msg.into())
    }

    /// Build a [`LoopingError::DecodeFailed`] value.
    pub fn decode_failed(msg: impl Into<String>) -> Self {
        Self::DecodeFailed(msg.into())
    }

    /// Build a [`LoopingError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Per-frame failures are recovered by skipping the frame; everything else is terminal.
    pub fn is_frame_local(&self) -> bool {
        matches!(self, Self::IncompleteFrame(_) | Self::DecodeFailed(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
