use crate::core::format::{NativeBuffer, SampleFormat};
use symphonia::core::units::TimeBase;

/// Sample rate of every stream crossing the reader/writer boundary
pub const SAMPLE_RATE: u32 = 44100;

/// Channel count of every stream crossing the reader/writer boundary
pub const CHANNELS: usize = 2;

/// Frames of silence synthesized per refill once the source is exhausted
pub const SILENCE_FRAMES: usize = 1024;

/// Frame size used when an encoder accepts any size
pub const DEFAULT_FRAME_SIZE: usize = 1024;

/// Bit rate requested from every encoder
pub const BIT_RATE: u32 = 128_000;

/// Unit of container durations and seek targets before rescaling
pub const MICROS_PER_SECOND: u64 = 1_000_000;

/// Whole seconds covered by `frames` at [`SAMPLE_RATE`].
///
/// The remainder is discarded, so seek targets have one-second granularity.
pub fn frames_to_whole_seconds(frames: u64) -> u64 {
    frames / SAMPLE_RATE as u64
}

/// Rescale a microsecond timestamp into `time_base` units, rounding to nearest.
///
/// Returns `None` for a degenerate time base.
pub fn rescale_micros(micros: u64, time_base: TimeBase) -> Option<u64> {
    if time_base.numer == 0 || time_base.denom == 0 {
        return None;
    }
    let num = micros as u128 * time_base.denom as u128;
    let den = time_base.numer as u128 * MICROS_PER_SECOND as u128;
    u64::try_from((num + den / 2) / den).ok()
}

/// Convert a timestamp in `time_base` units into microseconds, rounding to nearest.
pub fn timestamp_to_micros(ts: u64, time_base: TimeBase) -> Option<u64> {
    rescale_rounded(ts, time_base, MICROS_PER_SECOND)
}

/// Convert a timestamp in `time_base` units into frames at [`SAMPLE_RATE`],
/// rounding to nearest.
///
/// Goes straight from ticks to frames, so a stream counted in samples keeps
/// its exact length.
pub fn timestamp_to_frames(ts: u64, time_base: TimeBase) -> Option<u64> {
    rescale_rounded(ts, time_base, SAMPLE_RATE as u64)
}

fn rescale_rounded(ts: u64, time_base: TimeBase, units_per_second: u64) -> Option<u64> {
    if time_base.denom == 0 {
        return None;
    }
    let num = ts as u128 * time_base.numer as u128 * units_per_second as u128;
    let den = time_base.denom as u128;
    u64::try_from((num + den / 2) / den).ok()
}

/// Kind of media carried by a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Decodable audio
    Audio,
    /// Anything the audio decoders cannot handle
    Other,
}

/// Stream information reported by a demuxer
#[derive(Debug, Clone)]
pub struct StreamInfo {
    /// Stream index (packets carry it to identify their stream)
    pub index: u32,
    /// Media kind
    pub kind: StreamKind,
    /// Codec name (e.g., "pcm_s16le", "mp3", "flac")
    pub codec: String,
    /// Sample rate in Hz if known
    pub sample_rate: Option<u32>,
    /// Number of channels if known
    pub channels: Option<usize>,
    /// Time base for timestamps and seeking
    pub time_base: Option<TimeBase>,
    /// Stream length in time base units if known
    pub n_frames: Option<u64>,
    /// Whether the container marks this stream as its default
    pub is_default: bool,
}

impl StreamInfo {
    /// Create info for an audio stream
    pub fn audio(index: u32, codec: impl Into<String>) -> Self {
        StreamInfo {
            index,
            kind: StreamKind::Audio,
            codec: codec.into(),
            sample_rate: None,
            channels: None,
            time_base: None,
            n_frames: None,
            is_default: false,
        }
    }

    /// Create info for a stream no audio decoder handles
    pub fn other(index: u32) -> Self {
        StreamInfo {
            kind: StreamKind::Other,
            ..StreamInfo::audio(index, "none")
        }
    }

    /// Set sample rate
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    /// Set channel count
    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = Some(channels);
        self
    }

    /// Set time base
    pub fn with_time_base(mut self, time_base: TimeBase) -> Self {
        self.time_base = Some(time_base);
        self
    }

    /// Set stream length in time base units
    pub fn with_frames(mut self, n_frames: u64) -> Self {
        self.n_frames = Some(n_frames);
        self
    }

    /// Mark as the container default
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Time base, falling back to one tick per sample
    pub fn effective_time_base(&self) -> TimeBase {
        self.time_base
            .unwrap_or_else(|| {
                TimeBase::new(1, self.sample_rate.filter(|&r| r > 0).unwrap_or(SAMPLE_RATE))
            })
    }

    /// Stream duration in microseconds if length and time base are known
    pub fn duration_micros(&self) -> Option<u64> {
        let n_frames = self.n_frames?;
        timestamp_to_micros(n_frames, self.effective_time_base())
    }

    /// Stream length in frames at [`SAMPLE_RATE`] if length and time base are known
    pub fn duration_frames(&self) -> Option<u64> {
        let n_frames = self.n_frames?;
        timestamp_to_frames(n_frames, self.effective_time_base())
    }
}

/// Sample payload of a decoded frame
#[derive(Debug, Clone)]
pub enum DecodedData {
    /// A layout from the supported table
    Native {
        /// Native sample layout
        format: SampleFormat,
        /// Samples in that layout
        buffer: NativeBuffer,
    },
    /// A layout the reader does not convert (u8, s24, ...)
    Unsupported(&'static str),
}

/// One decoded frame in the decoder's native layout
#[derive(Debug, Clone)]
pub struct DecodedFrame {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Number of channels
    pub channels: usize,
    /// Samples per channel
    pub frames: usize,
    /// Sample payload
    pub data: DecodedData,
}

impl DecodedFrame {
    /// Create a frame in a supported native layout
    pub fn native(
        sample_rate: u32,
        channels: usize,
        frames: usize,
        format: SampleFormat,
        buffer: NativeBuffer,
    ) -> Self {
        DecodedFrame {
            sample_rate,
            channels,
            frames,
            data: DecodedData::Native { format, buffer },
        }
    }

    /// Check if frame is empty
    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }
}

/// One encoded packet handed from an encoder to a muxer
#[derive(Debug, Clone)]
pub struct EncodedPacket {
    /// Output stream the packet belongs to
    pub stream_index: usize,
    /// Presentation timestamp in frames
    pub pts: u64,
    /// Frames covered by this packet
    pub duration: u64,
    /// Layout of the payload
    pub format: SampleFormat,
    /// Encoded payload
    pub data: NativeBuffer,
}
