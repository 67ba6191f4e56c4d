use crate::core::{EncodedPacket, NativeBuffer};
use crate::encoder::{Codec, EncoderConfig, Muxer, Sink};
use crate::error::{AudioError, AudioResult};
use hound::{WavSpec, WavWriter};
use log::debug;
use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufWriter, Cursor, Seek, SeekFrom, Write};
use std::rc::Rc;

trait WriteSeek: Write + Seek {}

impl<T: Write + Seek> WriteSeek for T {}

/// In-memory WAV image for the stdout pipe, which cannot seek back to patch sizes.
///
/// The whole stream is held until the trailer, so memory grows with the
/// output length and a run that fails before the trailer emits nothing.
#[derive(Clone, Default)]
struct PipeBuffer(Rc<RefCell<Cursor<Vec<u8>>>>);

impl Write for PipeBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Seek for PipeBuffer {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.0.borrow_mut().seek(pos)
    }
}

/// WAV container muxer.
///
/// File sinks are written as they go. A pipe sink is assembled in memory and
/// copied to stdout by [`Muxer::write_trailer`].
pub struct WavMuxer {
    sink: Sink,
    codec: Codec,
    spec: Option<WavSpec>,
    writer: Option<WavWriter<Box<dyn WriteSeek>>>,
    pipe: Option<PipeBuffer>,
}

impl WavMuxer {
    /// Create a WAV muxer writing `codec` samples to `sink`
    pub fn new(sink: Sink, codec: Codec) -> Self {
        WavMuxer {
            sink,
            codec,
            spec: None,
            writer: None,
            pipe: None,
        }
    }

    fn spec_for(config: &EncoderConfig) -> AudioResult<WavSpec> {
        let (bits_per_sample, sample_format) = match config.codec {
            Codec::PcmS16Le => (16, hound::SampleFormat::Int),
            Codec::PcmS32Le => (32, hound::SampleFormat::Int),
            Codec::PcmF32Le => (32, hound::SampleFormat::Float),
            Codec::PcmF64Le => {
                return Err(AudioError::OpenError(format!(
                    "wav muxer cannot store {}",
                    config.codec.name()
                )));
            }
        };

        let channels = u16::try_from(config.channels).map_err(|_| AudioError::InvalidChannels {
            expected: 2,
            got: config.channels,
        })?;

        Ok(WavSpec {
            channels,
            sample_rate: config.sample_rate,
            bits_per_sample,
            sample_format,
        })
    }

    fn write_samples(
        writer: &mut WavWriter<Box<dyn WriteSeek>>,
        data: &NativeBuffer,
    ) -> Result<(), hound::Error> {
        match data {
            NativeBuffer::I16(v) => v.iter().try_for_each(|&s| writer.write_sample(s)),
            NativeBuffer::I32(v) => v.iter().try_for_each(|&s| writer.write_sample(s)),
            NativeBuffer::F32(v) => v.iter().try_for_each(|&s| writer.write_sample(s)),
            NativeBuffer::F64(_) => Err(hound::Error::Unsupported),
        }
    }
}

impl Muxer for WavMuxer {
    fn format_name(&self) -> &str {
        "wav"
    }

    fn default_codec(&self) -> Codec {
        self.codec
    }

    fn add_stream(&mut self, config: &EncoderConfig) -> AudioResult<usize> {
        if self.spec.is_some() {
            return Err(AudioError::OpenError(
                "wav holds a single audio stream".to_string(),
            ));
        }
        self.spec = Some(Self::spec_for(config)?);
        Ok(0)
    }

    fn write_header(&mut self) -> AudioResult<()> {
        let spec = self
            .spec
            .ok_or_else(|| AudioError::OpenError("wav header needs a stream".to_string()))?;

        let target: Box<dyn WriteSeek> = match &self.sink {
            Sink::File(path) => {
                let file = File::create(path).map_err(|e| {
                    AudioError::OpenError(format!(
                        "could not open output file {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Box::new(BufWriter::new(file))
            }
            Sink::Pipe => {
                let pipe = PipeBuffer::default();
                self.pipe = Some(pipe.clone());
                Box::new(pipe)
            }
        };

        let writer = WavWriter::new(target, spec)
            .map_err(|e| AudioError::OpenError(format!("unable to write wav header: {}", e)))?;
        debug!(
            "wav header written: {} Hz, {} channels, {} bits",
            spec.sample_rate, spec.channels, spec.bits_per_sample
        );
        self.writer = Some(writer);
        Ok(())
    }

    fn write_packet(&mut self, packet: EncodedPacket) -> AudioResult<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| AudioError::WriteError("wav header not written".to_string()))?;

        if packet.format.is_planar() {
            return Err(AudioError::WriteError(format!(
                "wav stores interleaved samples, got {}",
                packet.format
            )));
        }

        Self::write_samples(writer, &packet.data)
            .map_err(|e| AudioError::WriteError(format!("unable to write audio frame: {}", e)))
    }

    fn write_trailer(&mut self) -> AudioResult<()> {
        if let Some(writer) = self.writer.take() {
            writer
                .finalize()
                .map_err(|e| AudioError::WriteError(format!("unable to finalize wav: {}", e)))?;
        }

        if let Some(pipe) = self.pipe.take() {
            let bytes = pipe.0.borrow();
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(bytes.get_ref())
                .and_then(|_| stdout.flush())
                .map_err(|e| AudioError::WriteError(format!("unable to write to pipe: {}", e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SampleFormat;
    use tempfile::NamedTempFile;

    fn config(codec: Codec) -> EncoderConfig {
        EncoderConfig {
            codec,
            sample_format: codec.sample_format(),
            sample_rate: 44100,
            channels: 2,
            bit_rate: 128_000,
        }
    }

    fn packet(format: SampleFormat, data: NativeBuffer) -> EncodedPacket {
        EncodedPacket {
            stream_index: 0,
            pts: 0,
            duration: (data.len() / 2) as u64,
            format,
            data,
        }
    }

    #[test]
    fn test_wav_muxer_writes_readable_file() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut muxer = WavMuxer::new(Sink::File(temp_file.path().to_path_buf()), Codec::PcmS16Le);

        muxer.add_stream(&config(Codec::PcmS16Le)).unwrap();
        muxer.write_header().unwrap();
        muxer
            .write_packet(packet(SampleFormat::S16, NativeBuffer::I16(vec![1, -1, 100, -100])))
            .unwrap();
        muxer.write_trailer().unwrap();

        let reader = hound::WavReader::open(temp_file.path()).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.spec().bits_per_sample, 16);
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![1, -1, 100, -100]);
    }

    #[test]
    fn test_wav_muxer_float() {
        let temp_file = NamedTempFile::new().unwrap();
        let mut muxer = WavMuxer::new(Sink::File(temp_file.path().to_path_buf()), Codec::PcmF32Le);

        muxer.add_stream(&config(Codec::PcmF32Le)).unwrap();
        muxer.write_header().unwrap();
        muxer
            .write_packet(packet(SampleFormat::F32, NativeBuffer::F32(vec![0.5, -0.25])))
            .unwrap();
        muxer.write_trailer().unwrap();

        let reader = hound::WavReader::open(temp_file.path()).unwrap();
        assert_eq!(reader.spec().sample_format, hound::SampleFormat::Float);
        assert_eq!(reader.len(), 2);
    }

    #[test]
    fn test_wav_muxer_rejects_doubles() {
        let mut muxer = WavMuxer::new(Sink::Pipe, Codec::PcmF64Le);
        let result = muxer.add_stream(&config(Codec::PcmF64Le));
        assert!(matches!(result, Err(AudioError::OpenError(_))));
    }

    #[test]
    fn test_wav_muxer_packet_before_header() {
        let mut muxer = WavMuxer::new(Sink::Pipe, Codec::PcmS16Le);
        let result = muxer.write_packet(packet(SampleFormat::S16, NativeBuffer::I16(vec![0, 0])));
        assert!(matches!(result, Err(AudioError::WriteError(_))));
    }

    #[test]
    fn test_pipe_image_is_complete_after_finalize() {
        let pipe = PipeBuffer::default();
        let spec = WavMuxer::spec_for(&config(Codec::PcmS16Le)).unwrap();
        let target: Box<dyn WriteSeek> = Box::new(pipe.clone());
        let mut writer = WavWriter::new(target, spec).unwrap();
        for s in [1i16, -1, 2, -2, 3, -3] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let bytes = pipe.0.borrow().get_ref().clone();
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.duration(), 3);
        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples, vec![1, -1, 2, -2, 3, -3]);
    }

    #[test]
    fn test_wav_muxer_single_stream() {
        let mut muxer = WavMuxer::new(Sink::Pipe, Codec::PcmS16Le);
        muxer.add_stream(&config(Codec::PcmS16Le)).unwrap();
        assert!(muxer.add_stream(&config(Codec::PcmS16Le)).is_err());
    }
}
