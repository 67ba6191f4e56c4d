use crate::core::audio::{BIT_RATE, CHANNELS, DEFAULT_FRAME_SIZE, SAMPLE_RATE};
use crate::core::format::{negotiate, pack};
use crate::core::{NativeBuffer, SampleFormat};
use crate::encoder::{self, Encoder, EncoderConfig, Muxer, Sink, guess_format};
use crate::error::{AudioError, AudioResult};
use log::{debug, trace};
use std::path::Path;

/// Encoder-side buffer: accumulates interleaved float pairs into fixed-size
/// frames and hands each full frame to the encoder and muxer.
pub struct Writer {
    muxer: Box<dyn Muxer>,
    encoder: Box<dyn Encoder>,
    stream_index: usize,
    /// Negotiated native layout
    format: SampleFormat,
    /// Frames per submitted frame
    frame_size: usize,
    /// Native frame handed to the encoder
    native: NativeBuffer,
    /// Pending interleaved pairs, `frame_size` frames long
    samples: Vec<f32>,
    /// Frames buffered so far, always below `frame_size` between calls
    cursor: usize,
    frames_flushed: u64,
}

impl Writer {
    /// Open an output.
    ///
    /// `path` of `None`, `-` or `pipe:1` writes to stdout. The container is
    /// picked from `hint`, or else from the path's extension.
    ///
    /// WAV to stdout is held in memory until [`Writer::close`], since the
    /// header sizes are only known at the end; raw formats stream directly.
    pub fn open(path: Option<&Path>, hint: Option<&str>) -> AudioResult<Self> {
        crate::init();

        let sink = Sink::from_path(path);
        let output = guess_format(hint, &sink)?;
        debug!("output format: {} ({})", output.name, output.long_name);

        let muxer = output.create_muxer(sink);
        let encoder = encoder::find_encoder(muxer.default_codec());
        Self::open_with(muxer, encoder)
    }

    /// Open a writer on an existing muxer and encoder pair
    pub fn open_with(
        mut muxer: Box<dyn Muxer>,
        mut encoder: Box<dyn Encoder>,
    ) -> AudioResult<Self> {
        let format = negotiate(encoder.sample_formats())?;

        let config = EncoderConfig {
            codec: muxer.default_codec(),
            sample_format: format,
            sample_rate: SAMPLE_RATE,
            channels: CHANNELS,
            bit_rate: BIT_RATE,
        };

        let stream_index = muxer.add_stream(&config)?;
        let info = encoder.open(&config)?;

        if info.channels != CHANNELS {
            return Err(AudioError::OpenError(format!(
                "{} opened with {} channels, expected {}",
                encoder.name(),
                info.channels,
                CHANNELS
            )));
        }

        let frame_size = if info.frame_size == 0 {
            DEFAULT_FRAME_SIZE
        } else {
            info.frame_size
        };

        debug!(
            "writer: {} in {}, sample format {}, {} frames per frame",
            encoder.name(),
            muxer.format_name(),
            format,
            frame_size
        );

        muxer.write_header()?;

        Ok(Writer {
            muxer,
            encoder,
            stream_index,
            format,
            frame_size,
            native: NativeBuffer::zeroed(format.bit_depth(), frame_size * CHANNELS),
            samples: vec![0.0; frame_size * CHANNELS],
            cursor: 0,
            frames_flushed: 0,
        })
    }

    /// Frames per encoded frame
    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    /// Native layout frames are packed into
    pub fn sample_format(&self) -> SampleFormat {
        self.format
    }

    /// Number of frames submitted to the encoder so far
    pub fn frames_flushed(&self) -> u64 {
        self.frames_flushed
    }

    /// Stereo frames waiting for the next flush
    pub fn buffered_frames(&self) -> usize {
        self.cursor
    }

    /// Append one stereo frame, flushing when the frame buffer fills
    pub fn write_sample(&mut self, left: f32, right: f32) -> AudioResult<()> {
        let at = self.cursor * CHANNELS;
        self.samples[at] = left;
        self.samples[at + 1] = right;
        self.cursor += 1;

        if self.cursor == self.frame_size {
            self.flush()?;
        }
        Ok(())
    }

    /// Append interleaved pairs, returning the number of frames taken
    pub fn write(&mut self, samples: &[f32]) -> AudioResult<usize> {
        if samples.len() % CHANNELS != 0 {
            return Err(AudioError::BufferError(format!(
                "write of {} samples is not whole stereo frames",
                samples.len()
            )));
        }

        for pair in samples.chunks_exact(CHANNELS) {
            self.write_sample(pair[0], pair[1])?;
        }
        Ok(samples.len() / CHANNELS)
    }

    fn flush(&mut self) -> AudioResult<()> {
        if self.cursor == 0 {
            return Err(AudioError::FlushError("no buffered frames".to_string()));
        }

        // the buffer is reusable even if encoding fails below
        self.cursor = 0;

        pack(self.format, &mut self.native, &self.samples, self.frame_size)?;

        match self.encoder.encode(self.format, &self.native, self.frame_size)? {
            Some(mut packet) => {
                packet.stream_index = self.stream_index;
                self.muxer.write_packet(packet)?;
            }
            None => trace!("encoder buffered frame {}", self.frames_flushed),
        }

        self.frames_flushed += 1;
        Ok(())
    }

    /// Pad and flush any partial frame, then write the trailer and close the sink
    pub fn close(mut self) -> AudioResult<()> {
        if self.cursor > 0 {
            trace!(
                "padding final frame: {} of {} frames",
                self.cursor, self.frame_size
            );
            self.samples[self.cursor * CHANNELS..].fill(0.0);
            self.cursor = self.frame_size;
            self.flush()?;
        }

        self.muxer.write_trailer()?;
        debug!(
            "writer closed after {} frames of {}",
            self.frames_flushed, self.frame_size
        );
        Ok(())
    }
}
