use crate::core::audio::{
    CHANNELS, MICROS_PER_SECOND, SAMPLE_RATE, SILENCE_FRAMES, frames_to_whole_seconds,
    rescale_micros,
};
use crate::core::format::unpack;
use crate::core::{DecodedData, DecodedFrame};
use crate::decoder::{self, Demuxer, FrameDecoder, select_best_stream};
use crate::error::{AudioError, AudioResult};
use log::{debug, trace};
use std::path::Path;
use symphonia::core::units::TimeBase;

/// Decoder-side buffer: serves interleaved 44.1kHz stereo float pairs from one
/// audio stream of an input.
///
/// Once the source is exhausted the reader keeps producing silence, so callers
/// can pull indefinitely. [`Reader::eof`] turns true on the read that drains the
/// last real frame (that read comes back short); [`Reader::is_padding`] turns
/// true once silence is actually being served.
pub struct Reader {
    demuxer: Box<dyn Demuxer>,
    decoder: Box<dyn FrameDecoder>,
    /// Selected stream, fixed at open
    stream_index: u32,
    time_base: TimeBase,
    /// Interleaved pairs of the most recent frame
    buffer: Vec<f32>,
    /// Next frame to hand out, in `[0, buffer_frames()]`
    cursor: usize,
    eof: bool,
    padding: bool,
}

impl Reader {
    /// Open the best audio stream of a file
    pub fn open<P: AsRef<Path>>(path: P) -> AudioResult<Self> {
        crate::init();
        let demuxer = decoder::from_file(path)?;
        Self::from_demuxer(demuxer)
    }

    /// Open the best audio stream of an already opened demuxer
    pub fn from_demuxer(demuxer: Box<dyn Demuxer>) -> AudioResult<Self> {
        let streams = demuxer.streams();
        let stream = select_best_stream(&streams)
            .ok_or_else(|| AudioError::OpenError("can't find audio stream".to_string()))?;

        let decoder = demuxer.open_decoder(stream.index)?;
        let time_base = stream.effective_time_base();

        debug!(
            "reading stream {} ({}): time_base={}/{}",
            stream.index, stream.codec, time_base.numer, time_base.denom
        );

        Ok(Reader {
            demuxer,
            decoder,
            stream_index: stream.index,
            time_base,
            buffer: Vec::new(),
            cursor: 0,
            eof: false,
            padding: false,
        })
    }

    /// Index of the stream being read
    pub fn stream_index(&self) -> u32 {
        self.stream_index
    }

    /// Time base of the stream being read
    pub fn time_base(&self) -> TimeBase {
        self.time_base
    }

    fn buffer_frames(&self) -> usize {
        self.buffer.len() / CHANNELS
    }

    /// Fill `target` with interleaved pairs, returning the number of frames written.
    ///
    /// The count is short only on the call that exhausts the source.
    pub fn read(&mut self, target: &mut [f32]) -> AudioResult<usize> {
        if target.len() % CHANNELS != 0 {
            return Err(AudioError::BufferError(format!(
                "read target of {} samples is not whole stereo frames",
                target.len()
            )));
        }

        let frames = target.len() / CHANNELS;
        for i in 0..frames {
            if self.cursor >= self.buffer_frames() {
                self.refill()?;
            }

            if self.cursor >= self.buffer_frames() {
                trace!("short read: {} of {} frames", i, frames);
                return Ok(i);
            }

            let from = self.cursor * CHANNELS;
            target[i * CHANNELS..(i + 1) * CHANNELS]
                .copy_from_slice(&self.buffer[from..from + CHANNELS]);
            self.cursor += 1;
        }

        Ok(frames)
    }

    fn refill(&mut self) -> AudioResult<()> {
        if self.eof {
            self.fill_silence();
            return Ok(());
        }

        loop {
            let Some(packet) = self.demuxer.read_packet()? else {
                debug!("end of stream {}", self.stream_index);
                self.eof = true;
                self.buffer.clear();
                self.cursor = 0;
                return Ok(());
            };

            if packet.track_id() != self.stream_index {
                continue;
            }

            let frame = self.decoder.decode(&packet)?;
            if frame.is_empty() {
                continue;
            }

            return self.load_frame(frame);
        }
    }

    fn fill_silence(&mut self) {
        self.resize_buffer(SILENCE_FRAMES);
        self.buffer.fill(0.0);
        self.cursor = 0;
        self.padding = true;
    }

    fn resize_buffer(&mut self, frames: usize) {
        if frames != self.buffer_frames() {
            trace!("reallocating reader buffer: {} frames", frames);
            self.buffer.resize(frames * CHANNELS, 0.0);
        }
    }

    fn load_frame(&mut self, frame: DecodedFrame) -> AudioResult<()> {
        if frame.sample_rate != SAMPLE_RATE {
            return Err(AudioError::InvalidSampleRate {
                rate: frame.sample_rate,
            });
        }
        if frame.channels != CHANNELS {
            return Err(AudioError::InvalidChannels {
                expected: CHANNELS,
                got: frame.channels,
            });
        }

        let (format, buffer) = match frame.data {
            DecodedData::Native { format, buffer } => (format, buffer),
            DecodedData::Unsupported(name) => {
                return Err(AudioError::FormatError(format!(
                    "unsupported decoded sample layout: {}",
                    name
                )));
            }
        };

        self.resize_buffer(frame.frames);
        unpack(format, &buffer, &mut self.buffer, frame.frames)?;
        self.cursor = 0;
        Ok(())
    }

    /// Seek to a frame offset.
    ///
    /// The offset is truncated to whole seconds before being rescaled to the
    /// stream time base.
    pub fn seek(&mut self, frame_offset: u64) -> AudioResult<()> {
        self.eof = false;
        self.padding = false;
        self.buffer = Vec::new();
        self.cursor = 0;

        let seconds = frames_to_whole_seconds(frame_offset);
        let micros = seconds.checked_mul(MICROS_PER_SECOND).ok_or_else(|| {
            AudioError::SeekError(format!("seek target frame {} out of range", frame_offset))
        })?;
        let target = rescale_micros(micros, self.time_base).ok_or_else(|| {
            AudioError::SeekError(format!(
                "cannot express {} us in time base {}/{}",
                micros, self.time_base.numer, self.time_base.denom
            ))
        })?;

        debug!(
            "seeking to frame {} ({} s, ts {} in {}/{})",
            frame_offset, seconds, target, self.time_base.numer, self.time_base.denom
        );

        self.demuxer.seek(self.stream_index, target)?;
        self.decoder.reset();
        Ok(())
    }

    /// Whether the source has been exhausted
    pub fn eof(&self) -> bool {
        self.eof
    }

    /// Whether reads are now serving synthesized silence
    pub fn is_padding(&self) -> bool {
        self.padding
    }

    /// Length of the input in frames at 44.1kHz; 0 if unknown
    pub fn frame_count(&self) -> u64 {
        self.demuxer.duration_frames().unwrap_or(0)
    }

    /// Channel count of the delivered stream
    pub fn channel_count(&self) -> usize {
        CHANNELS
    }

    /// Sample rate of the delivered stream
    pub fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    /// Release the decoder and close the input
    pub fn close(self) {
        debug!("closing reader on stream {}", self.stream_index);
    }
}
