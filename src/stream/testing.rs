//! In-memory backends and fixture helpers for tests

use crate::core::audio::{CHANNELS, SAMPLE_RATE};
use crate::core::format::pack;
use crate::core::{DecodedFrame, EncodedPacket, NativeBuffer, SampleFormat, StreamInfo};
use crate::decoder::{Demuxer, FrameDecoder};
use crate::encoder::{Codec, Encoder, EncoderConfig, EncoderInfo, Muxer};
use crate::error::{AudioError, AudioResult};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use symphonia::core::formats::Packet;

/// Write a 16-bit WAV whose sample for (frame, channel) is `sample(frame, channel)`
pub fn write_wav(
    path: &Path,
    sample_rate: u32,
    channels: u16,
    frames: usize,
    sample: impl Fn(usize, usize) -> f32,
) {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    for frame in 0..frames {
        for ch in 0..channels as usize {
            writer
                .write_sample((sample(frame, ch) * 32767.0) as i16)
                .unwrap();
        }
    }
    writer.finalize().unwrap();
}

/// Build a 44.1kHz stereo decoded frame by packing interleaved floats into `format`
pub fn stereo_frame(format: SampleFormat, samples: &[f32]) -> DecodedFrame {
    let frames = samples.len() / 2;
    let mut buffer = NativeBuffer::zeroed(format.bit_depth(), samples.len());
    pack(format, &mut buffer, samples, frames).unwrap();
    DecodedFrame::native(SAMPLE_RATE, CHANNELS, frames, format, buffer)
}

/// Demuxer replaying a fixed list of (stream, frame) packets
pub struct MockDemuxer {
    streams: Vec<StreamInfo>,
    packets: Vec<u32>,
    frames: Rc<RefCell<Vec<DecodedFrame>>>,
    position: usize,
    seeks: Rc<RefCell<Vec<(u32, u64)>>>,
    fail_seek: bool,
}

impl MockDemuxer {
    /// Demuxer with the given streams and no packets yet
    pub fn new(streams: Vec<StreamInfo>) -> Self {
        MockDemuxer {
            streams,
            packets: Vec::new(),
            frames: Rc::new(RefCell::new(Vec::new())),
            position: 0,
            seeks: Rc::new(RefCell::new(Vec::new())),
            fail_seek: false,
        }
    }

    /// Single 44.1kHz stereo stream at index 0 with one tick per sample
    pub fn stereo() -> Self {
        MockDemuxer::new(vec![
            StreamInfo::audio(0, "mock")
                .with_sample_rate(SAMPLE_RATE)
                .with_channels(CHANNELS),
        ])
    }

    /// Append a packet for `stream` that decodes to `frame`
    pub fn with_packet(mut self, stream: u32, frame: DecodedFrame) -> Self {
        self.packets.push(stream);
        self.frames.borrow_mut().push(frame);
        self
    }

    /// Make every seek fail
    pub fn failing_seek(mut self) -> Self {
        self.fail_seek = true;
        self
    }

    /// Shared log of (stream, timestamp) seek requests
    pub fn seek_log(&self) -> Rc<RefCell<Vec<(u32, u64)>>> {
        Rc::clone(&self.seeks)
    }
}

impl Demuxer for MockDemuxer {
    fn streams(&self) -> Vec<StreamInfo> {
        self.streams.clone()
    }

    fn open_decoder(&self, _stream_index: u32) -> AudioResult<Box<dyn FrameDecoder>> {
        Ok(Box::new(MockDecoder {
            frames: Rc::clone(&self.frames),
        }))
    }

    fn read_packet(&mut self) -> AudioResult<Option<Packet>> {
        let Some(&stream) = self.packets.get(self.position) else {
            return Ok(None);
        };
        let frames = self.frames.borrow()[self.position].frames as u64;
        let packet = Packet::new_from_slice(stream, self.position as u64, frames, &[]);
        self.position += 1;
        Ok(Some(packet))
    }

    fn seek(&mut self, stream_index: u32, timestamp: u64) -> AudioResult<()> {
        self.seeks.borrow_mut().push((stream_index, timestamp));
        if self.fail_seek {
            return Err(AudioError::SeekError("mock seek failure".to_string()));
        }

        let frames = self.frames.borrow();
        let mut start = 0u64;
        self.position = self.packets.len();
        for (i, &stream) in self.packets.iter().enumerate() {
            if stream != stream_index {
                continue;
            }
            let end = start + frames[i].frames as u64;
            if end > timestamp {
                self.position = i;
                break;
            }
            start = end;
        }
        Ok(())
    }
}

/// Decoder handing back the frame stored for a packet's timestamp
struct MockDecoder {
    frames: Rc<RefCell<Vec<DecodedFrame>>>,
}

impl FrameDecoder for MockDecoder {
    fn decode(&mut self, packet: &Packet) -> AudioResult<DecodedFrame> {
        self.frames
            .borrow()
            .get(packet.ts() as usize)
            .cloned()
            .ok_or_else(|| AudioError::DecodeError("unknown mock packet".to_string()))
    }
}

/// Everything the mock encoder and muxer saw
#[derive(Default)]
pub struct MockLog {
    /// Native frames submitted to the encoder
    pub encoded: Vec<(SampleFormat, NativeBuffer)>,
    /// Packets written to the container
    pub packets: Vec<EncodedPacket>,
    /// Whether the header was written
    pub header: bool,
    /// Whether the trailer was written
    pub trailer: bool,
}

/// Shared handle on a [`MockLog`]
pub type SharedLog = Rc<RefCell<MockLog>>;

/// Encoder advertising arbitrary formats and a fixed frame size
pub struct MockEncoder {
    formats: Vec<SampleFormat>,
    frame_size: usize,
    channels: Option<usize>,
    fail_encode: bool,
    log: SharedLog,
}

impl MockEncoder {
    /// Encoder advertising `formats` with the given frame size
    pub fn new(formats: &[SampleFormat], frame_size: usize, log: &SharedLog) -> Self {
        MockEncoder {
            formats: formats.to_vec(),
            frame_size,
            channels: None,
            fail_encode: false,
            log: Rc::clone(log),
        }
    }

    /// Report this channel count from open regardless of the request
    pub fn with_channels(mut self, channels: usize) -> Self {
        self.channels = Some(channels);
        self
    }

    /// Make every encode call fail
    pub fn failing(mut self) -> Self {
        self.fail_encode = true;
        self
    }
}

impl Encoder for MockEncoder {
    fn name(&self) -> &str {
        "mock"
    }

    fn sample_formats(&self) -> &[SampleFormat] {
        &self.formats
    }

    fn open(&mut self, config: &EncoderConfig) -> AudioResult<EncoderInfo> {
        Ok(EncoderInfo {
            channels: self.channels.unwrap_or(config.channels),
            frame_size: self.frame_size,
        })
    }

    fn encode(
        &mut self,
        format: SampleFormat,
        samples: &NativeBuffer,
        frames: usize,
    ) -> AudioResult<Option<EncodedPacket>> {
        if self.fail_encode {
            return Err(AudioError::EncodeError("mock encode failure".to_string()));
        }
        self.log
            .borrow_mut()
            .encoded
            .push((format, samples.clone()));
        Ok(Some(EncodedPacket {
            stream_index: 0,
            pts: 0,
            duration: frames as u64,
            format,
            data: samples.clone(),
        }))
    }
}

/// Muxer recording packets in memory
pub struct MockMuxer {
    fail_write: bool,
    log: SharedLog,
}

impl MockMuxer {
    /// Muxer recording into `log`
    pub fn new(log: &SharedLog) -> Self {
        MockMuxer {
            fail_write: false,
            log: Rc::clone(log),
        }
    }

    /// Make every packet write fail
    pub fn failing(mut self) -> Self {
        self.fail_write = true;
        self
    }
}

impl Muxer for MockMuxer {
    fn format_name(&self) -> &str {
        "mock"
    }

    fn default_codec(&self) -> Codec {
        Codec::PcmF32Le
    }

    fn add_stream(&mut self, _config: &EncoderConfig) -> AudioResult<usize> {
        Ok(0)
    }

    fn write_header(&mut self) -> AudioResult<()> {
        self.log.borrow_mut().header = true;
        Ok(())
    }

    fn write_packet(&mut self, packet: EncodedPacket) -> AudioResult<()> {
        if self.fail_write {
            return Err(AudioError::WriteError("mock write failure".to_string()));
        }
        self.log.borrow_mut().packets.push(packet);
        Ok(())
    }

    fn write_trailer(&mut self) -> AudioResult<()> {
        self.log.borrow_mut().trailer = true;
        Ok(())
    }
}

/// Turn the packets a mock muxer recorded back into a demuxer
pub fn replay(log: &SharedLog) -> MockDemuxer {
    log.borrow()
        .packets
        .iter()
        .fold(MockDemuxer::stereo(), |demuxer, packet| {
            let frames = packet.data.len() / CHANNELS;
            demuxer.with_packet(
                0,
                DecodedFrame::native(
                    SAMPLE_RATE,
                    CHANNELS,
                    frames,
                    packet.format,
                    packet.data.clone(),
                ),
            )
        })
}
