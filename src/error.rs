use thiserror::Error;

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;

/// Errors raised by the reader and writer buffers and their backends
#[derive(Error, Debug)]
pub enum AudioError {
    /// Input or output could not be opened or identified
    #[error("Open error: {0}")]
    OpenError(String),

    /// No usable sample layout, or a decoded layout the reader cannot convert
    #[error("Format error: {0}")]
    FormatError(String),

    /// The underlying seek primitive failed
    #[error("Seek error: {0}")]
    SeekError(String),

    /// Decoding failed
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// Encoding failed
    #[error("Encode error: {0}")]
    EncodeError(String),

    /// Container write failed
    #[error("Write error: {0}")]
    WriteError(String),

    /// A flush was requested with nothing buffered
    #[error("Flush error: {0}")]
    FlushError(String),

    /// Invalid channel configuration
    #[error("Invalid channel configuration: expected {expected}, got {got}")]
    InvalidChannels {
        /// Expected number of channels
        expected: usize,
        /// Got number of channels
        got: usize,
    },

    /// Invalid sample rate
    #[error("Invalid sample rate: {rate}")]
    InvalidSampleRate {
        /// The invalid sample rate
        rate: u32,
    },

    /// Buffer-related error
    #[error("Buffer error: {0}")]
    BufferError(String),
}

impl AudioError {
    /// Whether this error belongs to the format family (negotiation, layout, rate, channels)
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            AudioError::FormatError(_)
                | AudioError::InvalidChannels { .. }
                | AudioError::InvalidSampleRate { .. }
        )
    }
}

impl From<symphonia::core::errors::Error> for AudioError {
    fn from(err: symphonia::core::errors::Error) -> Self {
        AudioError::DecodeError(format!("error decoding audio: {}", err))
    }
}
