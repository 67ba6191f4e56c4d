//! Core audio types and structures

/// Stream constants, timing arithmetic and frame types
pub mod audio;
/// Native sample layouts and float conversion
pub mod format;

pub use audio::{DecodedData, DecodedFrame, EncodedPacket, StreamInfo, StreamKind};
pub use format::{BitDepth, NativeBuffer, SampleFormat};
