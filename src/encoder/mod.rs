//! Encoder and muxer seams for the writer

pub mod pcm;
pub mod raw;
pub mod registry;
pub mod wav;

pub use pcm::{Codec, PcmEncoder};
pub use raw::RawMuxer;
pub use registry::{OutputFormat, guess_format, output_formats};
pub use wav::WavMuxer;

use crate::core::{EncodedPacket, NativeBuffer, SampleFormat};
use crate::error::{AudioError, AudioResult};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Parameters the writer requests from an encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Codec being encoded
    pub codec: Codec,
    /// Negotiated native sample layout
    pub sample_format: SampleFormat,
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: usize,
    /// Target bit rate in bits per second
    pub bit_rate: u32,
}

/// What an opened encoder reports back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderInfo {
    /// Channels the encoder settled on
    pub channels: usize,
    /// Frames per submitted frame; 0 means any size is accepted
    pub frame_size: usize,
}

/// Trait for audio encoders
pub trait Encoder {
    /// Encoder name
    fn name(&self) -> &str;

    /// Sample layouts this encoder accepts
    fn sample_formats(&self) -> &[SampleFormat];

    /// Open the encoder with the negotiated parameters
    fn open(&mut self, config: &EncoderConfig) -> AudioResult<EncoderInfo>;

    /// Encode one frame; `None` means the encoder buffered it without output
    fn encode(
        &mut self,
        format: SampleFormat,
        samples: &NativeBuffer,
        frames: usize,
    ) -> AudioResult<Option<EncodedPacket>>;
}

/// Trait for output containers
pub trait Muxer {
    /// Container format name
    fn format_name(&self) -> &str;

    /// Codec the container uses unless told otherwise
    fn default_codec(&self) -> Codec;

    /// Create an output stream, returning its index
    fn add_stream(&mut self, config: &EncoderConfig) -> AudioResult<usize>;

    /// Open the sink and write the container header
    fn write_header(&mut self) -> AudioResult<()>;

    /// Write one packet in stream order
    fn write_packet(&mut self, packet: EncodedPacket) -> AudioResult<()>;

    /// Write the container trailer and flush the sink
    fn write_trailer(&mut self) -> AudioResult<()>;
}

/// Find the encoder for a codec
pub fn find_encoder(codec: Codec) -> Box<dyn Encoder> {
    Box::new(PcmEncoder::new(codec))
}

/// Where encoded output goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sink {
    /// A local file
    File(PathBuf),
    /// The process's standard output
    Pipe,
}

impl Sink {
    /// Sink for an optional output path; no path, `-` and `pipe:1` mean stdout
    pub fn from_path(path: Option<&Path>) -> Self {
        match path {
            None => Sink::Pipe,
            Some(p) if p == Path::new("-") || p == Path::new("pipe:1") => Sink::Pipe,
            Some(p) => Sink::File(p.to_path_buf()),
        }
    }

    /// File extension of the sink path, if any
    pub fn extension(&self) -> Option<&str> {
        match self {
            Sink::File(path) => path.extension().and_then(|e| e.to_str()),
            Sink::Pipe => None,
        }
    }

    /// Open the sink for sequential writing
    pub fn open(&self) -> AudioResult<Box<dyn Write>> {
        match self {
            Sink::File(path) => {
                let file = File::create(path).map_err(|e| {
                    AudioError::OpenError(format!(
                        "could not open output file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Ok(Box::new(BufWriter::new(file)))
            }
            Sink::Pipe => Ok(Box::new(BufWriter::new(io::stdout()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sink_from_path() {
        assert_eq!(Sink::from_path(None), Sink::Pipe);
        assert_eq!(Sink::from_path(Some(Path::new("-"))), Sink::Pipe);
        assert_eq!(Sink::from_path(Some(Path::new("pipe:1"))), Sink::Pipe);
        assert_eq!(
            Sink::from_path(Some(Path::new("out.wav"))),
            Sink::File(PathBuf::from("out.wav"))
        );
    }

    #[test]
    fn test_sink_extension() {
        assert_eq!(Sink::File(PathBuf::from("a/b.f32le")).extension(), Some("f32le"));
        assert_eq!(Sink::File(PathBuf::from("noext")).extension(), None);
        assert_eq!(Sink::Pipe.extension(), None);
    }

    #[test]
    fn test_sink_open_bad_directory() {
        let sink = Sink::File(PathBuf::from("/nonexistent/dir/out.wav"));
        assert!(matches!(sink.open(), Err(AudioError::OpenError(_))));
    }

    #[test]
    fn test_find_encoder() {
        let encoder = find_encoder(Codec::PcmF32Le);
        assert_eq!(encoder.name(), "pcm_f32le");
        assert_eq!(encoder.sample_formats(), &[SampleFormat::F32]);
    }
}
