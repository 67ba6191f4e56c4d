#![warn(missing_docs)]

//! # sndshim: stereo float audio in and out of container files
//!
//! Two buffers sit between a caller and the codec backends:
//!
//! - [`Reader`] opens any input symphonia can demux, picks the best audio
//!   stream and serves it as interleaved 44.1kHz stereo `f32` pairs. After
//!   the source runs out it keeps serving silence.
//! - [`Writer`] accumulates interleaved pairs into fixed-size frames, packs
//!   them into the encoder's native sample layout and writes them to a WAV
//!   or raw PCM container on a file or stdout.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sndshim::{Reader, Writer};
//! use std::path::Path;
//!
//! let mut reader = Reader::open("input.flac")?;
//! let mut writer = Writer::open(Some(Path::new("output.wav")), None)?;
//!
//! let mut buf = vec![0.0f32; 1024 * 2];
//! while !reader.eof() {
//!     let frames = reader.read(&mut buf)?;
//!     writer.write(&buf[..frames * 2])?;
//! }
//!
//! reader.close();
//! writer.close()?;
//! # Ok::<(), sndshim::AudioError>(())
//! ```

/// Core audio types and structures
pub mod core;
/// Error types for audio operations
pub mod error;
/// Input demuxing and decoding
pub mod decoder;
/// Output encoding and muxing
pub mod encoder;
/// Reader and writer buffers
pub mod stream;
/// Audio processing pipelines
pub mod processor;

pub use crate::core::{SampleFormat, StreamInfo};
pub use error::{AudioError, AudioResult};
pub use stream::{Reader, Writer};

use log::debug;
use std::sync::Once;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Register codecs and output formats. Safe to call any number of times;
/// every `open` calls it.
pub fn init() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = symphonia::default::get_probe();
        let _ = symphonia::default::get_codecs();
        let formats = encoder::output_formats();
        debug!("sndshim {} initialised, {} output formats", VERSION, formats.len());
    });
}
