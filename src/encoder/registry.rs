//! Output formats known to the writer

use crate::encoder::{Codec, Muxer, RawMuxer, Sink, WavMuxer};
use crate::error::{AudioError, AudioResult};
use log::debug;
use std::sync::OnceLock;

/// Container implementation behind an output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Container {
    /// RIFF WAVE via hound
    Wav,
    /// Headerless sample bytes
    Raw,
}

/// A registered output format
#[derive(Debug, Clone)]
pub struct OutputFormat {
    /// Short name used as a format hint
    pub name: &'static str,
    /// Human-readable description
    pub long_name: &'static str,
    /// File extensions that select this format
    pub extensions: &'static [&'static str],
    /// Container implementation
    pub container: Container,
    /// Default audio codec
    pub codec: Codec,
}

impl OutputFormat {
    /// Create a muxer for this format writing to `sink`
    pub fn create_muxer(&self, sink: Sink) -> Box<dyn Muxer> {
        match self.container {
            Container::Wav => Box::new(WavMuxer::new(sink, self.codec)),
            Container::Raw => Box::new(RawMuxer::new(self.name, sink, self.codec)),
        }
    }
}

fn register_all() -> Vec<OutputFormat> {
    let formats = vec![
        OutputFormat {
            name: "wav",
            long_name: "WAV / WAVE (Waveform Audio)",
            extensions: &["wav"],
            container: Container::Wav,
            codec: Codec::PcmS16Le,
        },
        OutputFormat {
            name: "s16le",
            long_name: "PCM signed 16-bit little-endian",
            extensions: &["s16le", "pcm"],
            container: Container::Raw,
            codec: Codec::PcmS16Le,
        },
        OutputFormat {
            name: "s32le",
            long_name: "PCM signed 32-bit little-endian",
            extensions: &["s32le"],
            container: Container::Raw,
            codec: Codec::PcmS32Le,
        },
        OutputFormat {
            name: "f32le",
            long_name: "PCM 32-bit floating-point little-endian",
            extensions: &["f32le", "raw"],
            container: Container::Raw,
            codec: Codec::PcmF32Le,
        },
        OutputFormat {
            name: "f64le",
            long_name: "PCM 64-bit floating-point little-endian",
            extensions: &["f64le"],
            container: Container::Raw,
            codec: Codec::PcmF64Le,
        },
    ];
    debug!(
        "registered output formats: {}",
        formats.iter().map(|f| f.name).collect::<Vec<_>>().join(", ")
    );
    formats
}

/// All registered output formats, built on first use
pub fn output_formats() -> &'static [OutputFormat] {
    static FORMATS: OnceLock<Vec<OutputFormat>> = OnceLock::new();
    FORMATS.get_or_init(register_all)
}

/// Resolve the output format from a hint, or else from the sink's extension.
pub fn guess_format(hint: Option<&str>, sink: &Sink) -> AudioResult<&'static OutputFormat> {
    let formats = output_formats();

    if let Some(name) = hint {
        return formats
            .iter()
            .find(|f| f.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| AudioError::OpenError(format!("unknown output format '{}'", name)));
    }

    let ext = sink.extension().ok_or_else(|| {
        AudioError::OpenError(
            "unable to create output context: no format hint and no file extension".to_string(),
        )
    })?;

    formats
        .iter()
        .find(|f| f.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
        .ok_or_else(|| {
            AudioError::OpenError(format!("unable to create output context for '.{}'", ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_registry_is_built_once() {
        let a = output_formats().as_ptr();
        let b = output_formats().as_ptr();
        assert_eq!(a, b);
    }

    #[test]
    fn test_guess_from_hint() {
        let format = guess_format(Some("F32LE"), &Sink::Pipe).unwrap();
        assert_eq!(format.codec, Codec::PcmF32Le);
    }

    #[test]
    fn test_guess_from_extension() {
        let sink = Sink::File(PathBuf::from("out.WAV"));
        let format = guess_format(None, &sink).unwrap();
        assert_eq!(format.name, "wav");
        assert_eq!(format.codec, Codec::PcmS16Le);
    }

    #[test]
    fn test_hint_wins_over_extension() {
        let sink = Sink::File(PathBuf::from("out.wav"));
        let format = guess_format(Some("s32le"), &sink).unwrap();
        assert_eq!(format.container, Container::Raw);
    }

    #[test]
    fn test_pipe_without_hint_fails() {
        let result = guess_format(None, &Sink::Pipe);
        assert!(matches!(result, Err(AudioError::OpenError(_))));
    }

    #[test]
    fn test_unknown_names() {
        assert!(guess_format(Some("mp3"), &Sink::Pipe).is_err());
        let sink = Sink::File(PathBuf::from("out.xyz"));
        assert!(guess_format(None, &sink).is_err());
    }

    #[test]
    fn test_create_muxer() {
        let format = guess_format(Some("wav"), &Sink::Pipe).unwrap();
        let muxer = format.create_muxer(Sink::Pipe);
        assert_eq!(muxer.format_name(), "wav");
        assert_eq!(muxer.default_codec(), Codec::PcmS16Le);
    }
}
