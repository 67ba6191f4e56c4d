use crate::core::{EncodedPacket, NativeBuffer, SampleFormat};
use crate::encoder::{Encoder, EncoderConfig, EncoderInfo};
use crate::error::{AudioError, AudioResult};
use log::debug;

/// Codecs the writer can encode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Codec {
    /// Signed 16-bit little-endian PCM
    PcmS16Le,
    /// Signed 32-bit little-endian PCM
    PcmS32Le,
    /// 32-bit float little-endian PCM
    PcmF32Le,
    /// 64-bit float little-endian PCM
    PcmF64Le,
}

impl Codec {
    /// Codec name
    pub fn name(&self) -> &'static str {
        match self {
            Codec::PcmS16Le => "pcm_s16le",
            Codec::PcmS32Le => "pcm_s32le",
            Codec::PcmF32Le => "pcm_f32le",
            Codec::PcmF64Le => "pcm_f64le",
        }
    }

    /// The one interleaved layout this codec stores
    pub fn sample_format(&self) -> SampleFormat {
        match self {
            Codec::PcmS16Le => SampleFormat::S16,
            Codec::PcmS32Le => SampleFormat::S32,
            Codec::PcmF32Le => SampleFormat::F32,
            Codec::PcmF64Le => SampleFormat::F64,
        }
    }
}

/// PCM encoder: packets carry the interleaved samples as they are
pub struct PcmEncoder {
    codec: Codec,
    formats: [SampleFormat; 1],
    opened: bool,
    /// Timestamp of the next packet, in frames
    next_pts: u64,
}

impl PcmEncoder {
    /// Create an encoder for a PCM codec
    pub fn new(codec: Codec) -> Self {
        PcmEncoder {
            codec,
            formats: [codec.sample_format()],
            opened: false,
            next_pts: 0,
        }
    }
}

impl Encoder for PcmEncoder {
    fn name(&self) -> &str {
        self.codec.name()
    }

    fn sample_formats(&self) -> &[SampleFormat] {
        &self.formats
    }

    fn open(&mut self, config: &EncoderConfig) -> AudioResult<EncoderInfo> {
        if !self.formats.contains(&config.sample_format) {
            return Err(AudioError::OpenError(format!(
                "could not open codec {}: sample format {} not supported",
                self.codec.name(),
                config.sample_format
            )));
        }
        if config.sample_rate == 0 || config.channels == 0 {
            return Err(AudioError::OpenError(format!(
                "could not open codec {}: {} Hz, {} channels",
                self.codec.name(),
                config.sample_rate,
                config.channels
            )));
        }

        // PCM has no bit rate knob; the requested one is ignored
        debug!(
            "opened {} ({} Hz, {} channels)",
            self.codec.name(),
            config.sample_rate,
            config.channels
        );
        self.opened = true;

        Ok(EncoderInfo {
            channels: config.channels,
            frame_size: 0,
        })
    }

    fn encode(
        &mut self,
        format: SampleFormat,
        samples: &NativeBuffer,
        frames: usize,
    ) -> AudioResult<Option<EncodedPacket>> {
        if !self.opened {
            return Err(AudioError::EncodeError(format!(
                "{} used before open",
                self.codec.name()
            )));
        }
        if format != self.codec.sample_format() {
            return Err(AudioError::EncodeError(format!(
                "{} cannot encode {} samples",
                self.codec.name(),
                format
            )));
        }
        if samples.len() < frames * 2 {
            return Err(AudioError::EncodeError(format!(
                "frame of {} frames needs {} samples, got {}",
                frames,
                frames * 2,
                samples.len()
            )));
        }

        let packet = EncodedPacket {
            stream_index: 0,
            pts: self.next_pts,
            duration: frames as u64,
            format,
            data: samples.head(frames * 2),
        };
        self.next_pts += frames as u64;

        Ok(Some(packet))
    }
}
