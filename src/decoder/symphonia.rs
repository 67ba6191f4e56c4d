use crate::core::{DecodedData, DecodedFrame, NativeBuffer, SampleFormat, StreamInfo};
use crate::decoder::{Demuxer, FrameDecoder};
use crate::error::{AudioError, AudioResult};
use log::{debug, trace};
use std::fs::File;
use std::path::Path;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader, Packet, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

/// Symphonia-based demuxer
pub struct SymphoniaDemuxer {
    /// Format reader for the probed container
    reader: Box<dyn FormatReader>,
    /// Streams described once at open
    streams: Vec<StreamInfo>,
}

impl SymphoniaDemuxer {
    /// Probe a file and open its container
    pub fn from_file<P: AsRef<Path>>(path: P) -> AudioResult<Self> {
        let path = path.as_ref();

        let file = File::open(path).map_err(|e| {
            AudioError::OpenError(format!("unable to open input {}: {}", path.display(), e))
        })?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| AudioError::OpenError(format!("unable to find stream info: {}", e)))?;

        let reader = probed.format;
        let streams = describe_tracks(reader.as_ref());
        debug!("probed {}: {} stream(s)", path.display(), streams.len());

        Ok(SymphoniaDemuxer { reader, streams })
    }
}

fn describe_tracks(reader: &dyn FormatReader) -> Vec<StreamInfo> {
    let default_id = reader.default_track().map(|t| t.id);
    let codecs = symphonia::default::get_codecs();

    reader
        .tracks()
        .iter()
        .map(|track| {
            let params = &track.codec_params;
            let descriptor = codecs.get_codec(params.codec);

            let mut info = match descriptor {
                Some(d) if params.codec != CODEC_TYPE_NULL => {
                    StreamInfo::audio(track.id, d.short_name)
                }
                _ => StreamInfo::other(track.id),
            };
            if let Some(rate) = params.sample_rate {
                info = info.with_sample_rate(rate);
            }
            if let Some(channels) = params.channels {
                info = info.with_channels(channels.count());
            }
            if let Some(time_base) = params.time_base {
                info = info.with_time_base(time_base);
            }
            if let Some(n_frames) = params.n_frames {
                info = info.with_frames(n_frames);
            }
            if Some(track.id) == default_id {
                info = info.as_default();
            }
            info
        })
        .collect()
}

impl Demuxer for SymphoniaDemuxer {
    fn streams(&self) -> Vec<StreamInfo> {
        self.streams.clone()
    }

    fn open_decoder(&self, stream_index: u32) -> AudioResult<Box<dyn FrameDecoder>> {
        let track = self
            .reader
            .tracks()
            .iter()
            .find(|t| t.id == stream_index)
            .ok_or_else(|| {
                AudioError::OpenError(format!("no stream with index {}", stream_index))
            })?;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| AudioError::OpenError(format!("can't open decoder: {}", e)))?;

        Ok(Box::new(SymphoniaFrameDecoder { decoder }))
    }

    fn read_packet(&mut self) -> AudioResult<Option<Packet>> {
        match self.reader.next_packet() {
            Ok(packet) => Ok(Some(packet)),
            Err(SymphoniaError::IoError(ref e))
                if e.kind() == std::io::ErrorKind::UnexpectedEof =>
            {
                Ok(None)
            }
            Err(e) => Err(AudioError::DecodeError(format!("unable to read packet: {}", e))),
        }
    }

    fn seek(&mut self, stream_index: u32, timestamp: u64) -> AudioResult<()> {
        let seeked = self
            .reader
            .seek(
                SeekMode::Accurate,
                SeekTo::TimeStamp {
                    ts: timestamp,
                    track_id: stream_index,
                },
            )
            .map_err(|e| AudioError::SeekError(format!("unable to seek in stream: {}", e)))?;

        trace!(
            "seeked stream {}: required ts {}, actual ts {}",
            seeked.track_id, seeked.required_ts, seeked.actual_ts
        );
        Ok(())
    }
}

/// Symphonia codec wrapped as a frame decoder
pub struct SymphoniaFrameDecoder {
    decoder: Box<dyn symphonia::core::codecs::Decoder>,
}

impl FrameDecoder for SymphoniaFrameDecoder {
    fn decode(&mut self, packet: &Packet) -> AudioResult<DecodedFrame> {
        let decoded = self.decoder.decode(packet)?;
        Ok(to_decoded_frame(decoded))
    }

    fn reset(&mut self) {
        self.decoder.reset();
    }
}

/// Copy a symphonia buffer out as a planar native frame
fn to_decoded_frame(buffer: AudioBufferRef<'_>) -> DecodedFrame {
    let spec = *buffer.spec();
    let frames = buffer.frames();

    let data = match buffer {
        AudioBufferRef::S16(buf) => {
            native(SampleFormat::S16P, NativeBuffer::I16(planes(buf.as_ref())))
        }
        AudioBufferRef::S32(buf) => {
            native(SampleFormat::S32P, NativeBuffer::I32(planes(buf.as_ref())))
        }
        AudioBufferRef::F32(buf) => {
            native(SampleFormat::F32P, NativeBuffer::F32(planes(buf.as_ref())))
        }
        AudioBufferRef::F64(buf) => {
            native(SampleFormat::F64P, NativeBuffer::F64(planes(buf.as_ref())))
        }
        AudioBufferRef::U8(_) => DecodedData::Unsupported("u8"),
        AudioBufferRef::U16(_) => DecodedData::Unsupported("u16"),
        AudioBufferRef::U24(_) => DecodedData::Unsupported("u24"),
        AudioBufferRef::U32(_) => DecodedData::Unsupported("u32"),
        AudioBufferRef::S8(_) => DecodedData::Unsupported("s8"),
        AudioBufferRef::S24(_) => DecodedData::Unsupported("s24"),
    };

    DecodedFrame {
        sample_rate: spec.rate,
        channels: spec.channels.count(),
        frames,
        data,
    }
}

fn native(format: SampleFormat, buffer: NativeBuffer) -> DecodedData {
    DecodedData::Native { format, buffer }
}

/// Channel planes laid end to end
fn planes<S: Sample>(buf: &AudioBuffer<S>) -> Vec<S> {
    let channels = buf.spec().channels.count();
    let mut out = Vec::with_capacity(buf.frames() * channels);
    for ch in 0..channels {
        out.extend_from_slice(buf.chan(ch));
    }
    out
}
