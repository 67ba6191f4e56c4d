//! Audio processing pipelines

pub mod copy;

pub use copy::copy;

/// Audio processing pipeline result
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProcessingStats {
    /// Real frames moved from input to output
    pub frames_processed: u64,
    /// Read calls made
    pub chunks: u64,
}
