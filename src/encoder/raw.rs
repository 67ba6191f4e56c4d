use crate::core::{EncodedPacket, NativeBuffer};
use crate::encoder::{Codec, EncoderConfig, Muxer, Sink};
use crate::error::{AudioError, AudioResult};
use std::io::{self, Write};

/// Headerless PCM container: packets are written back to back as little-endian bytes
pub struct RawMuxer {
    name: &'static str,
    sink: Sink,
    codec: Codec,
    has_stream: bool,
    out: Option<Box<dyn Write>>,
}

impl RawMuxer {
    /// Create a raw muxer named `name` carrying `codec`
    pub fn new(name: &'static str, sink: Sink, codec: Codec) -> Self {
        RawMuxer {
            name,
            sink,
            codec,
            has_stream: false,
            out: None,
        }
    }
}

fn write_le(out: &mut dyn Write, data: &NativeBuffer) -> io::Result<()> {
    match data {
        NativeBuffer::I16(v) => v.iter().try_for_each(|s| out.write_all(&s.to_le_bytes())),
        NativeBuffer::I32(v) => v.iter().try_for_each(|s| out.write_all(&s.to_le_bytes())),
        NativeBuffer::F32(v) => v.iter().try_for_each(|s| out.write_all(&s.to_le_bytes())),
        NativeBuffer::F64(v) => v.iter().try_for_each(|s| out.write_all(&s.to_le_bytes())),
    }
}

impl Muxer for RawMuxer {
    fn format_name(&self) -> &str {
        self.name
    }

    fn default_codec(&self) -> Codec {
        self.codec
    }

    fn add_stream(&mut self, config: &EncoderConfig) -> AudioResult<usize> {
        if self.has_stream {
            return Err(AudioError::OpenError(format!(
                "{} holds a single audio stream",
                self.name
            )));
        }
        if config.codec != self.codec {
            return Err(AudioError::OpenError(format!(
                "{} carries {}, not {}",
                self.name,
                self.codec.name(),
                config.codec.name()
            )));
        }
        self.has_stream = true;
        Ok(0)
    }

    fn write_header(&mut self) -> AudioResult<()> {
        if !self.has_stream {
            return Err(AudioError::OpenError(format!("{} needs a stream", self.name)));
        }
        self.out = Some(self.sink.open()?);
        Ok(())
    }

    fn write_packet(&mut self, packet: EncodedPacket) -> AudioResult<()> {
        let out = self
            .out
            .as_mut()
            .ok_or_else(|| AudioError::WriteError(format!("{} sink not open", self.name)))?;

        if packet.format != self.codec.sample_format() {
            return Err(AudioError::WriteError(format!(
                "{} cannot store {} samples",
                self.name, packet.format
            )));
        }

        write_le(out.as_mut(), &packet.data)
            .map_err(|e| AudioError::WriteError(format!("unable to write audio frame: {}", e)))
    }

    fn write_trailer(&mut self) -> AudioResult<()> {
        if let Some(mut out) = self.out.take() {
            out.flush().map_err(|e| {
                AudioError::WriteError(format!("unable to flush {}: {}", self.name, e))
            })?;
        }
        Ok(())
    }
}
