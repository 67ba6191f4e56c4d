//! Native sample layouts and conversion to and from interleaved float pairs

use crate::error::{AudioError, AudioResult};
use std::fmt;

/// Scale between float samples and 16-bit integers
const I16_SCALE: f32 = 0x7fff as f32;

/// Scale between float samples and 32-bit integers
const I32_SCALE: f64 = 0x7fff_ffff as f64;

/// Storage width of one native sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitDepth {
    /// 16-bit signed (-32768 to 32767)
    I16,
    /// 32-bit signed
    I32,
    /// 32-bit floating point
    F32,
    /// 64-bit floating point
    F64,
}

impl BitDepth {
    /// Largest absolute error a float sample picks up when stored at this width
    pub fn quantization_step(&self) -> f32 {
        match self {
            BitDepth::I16 => 1.0 / I16_SCALE,
            BitDepth::I32 => (1.0 / I32_SCALE) as f32,
            BitDepth::F32 | BitDepth::F64 => 0.0,
        }
    }
}

/// Native sample layout: a width plus interleaved or planar storage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleFormat {
    /// Interleaved 16-bit signed
    S16,
    /// Planar 16-bit signed
    S16P,
    /// Interleaved 32-bit signed
    S32,
    /// Planar 32-bit signed
    S32P,
    /// Interleaved 32-bit float
    F32,
    /// Planar 32-bit float
    F32P,
    /// Interleaved 64-bit float
    F64,
    /// Planar 64-bit float
    F64P,
}

impl SampleFormat {
    /// Storage width
    pub fn bit_depth(&self) -> BitDepth {
        match self {
            SampleFormat::S16 | SampleFormat::S16P => BitDepth::I16,
            SampleFormat::S32 | SampleFormat::S32P => BitDepth::I32,
            SampleFormat::F32 | SampleFormat::F32P => BitDepth::F32,
            SampleFormat::F64 | SampleFormat::F64P => BitDepth::F64,
        }
    }

    /// Whether each channel occupies its own contiguous region
    pub fn is_planar(&self) -> bool {
        matches!(
            self,
            SampleFormat::S16P | SampleFormat::S32P | SampleFormat::F32P | SampleFormat::F64P
        )
    }

    /// Short name, as codec libraries spell it
    pub fn name(&self) -> &'static str {
        match self {
            SampleFormat::S16 => "s16",
            SampleFormat::S16P => "s16p",
            SampleFormat::S32 => "s32",
            SampleFormat::S32P => "s32p",
            SampleFormat::F32 => "flt",
            SampleFormat::F32P => "fltp",
            SampleFormat::F64 => "dbl",
            SampleFormat::F64P => "dblp",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Owned samples in a native width
#[derive(Debug, Clone, PartialEq)]
pub enum NativeBuffer {
    /// 16-bit signed samples
    I16(Vec<i16>),
    /// 32-bit signed samples
    I32(Vec<i32>),
    /// 32-bit float samples
    F32(Vec<f32>),
    /// 64-bit float samples
    F64(Vec<f64>),
}

impl NativeBuffer {
    /// Allocate `len` zeroed samples of the given width
    pub fn zeroed(depth: BitDepth, len: usize) -> Self {
        match depth {
            BitDepth::I16 => NativeBuffer::I16(vec![0; len]),
            BitDepth::I32 => NativeBuffer::I32(vec![0; len]),
            BitDepth::F32 => NativeBuffer::F32(vec![0.0; len]),
            BitDepth::F64 => NativeBuffer::F64(vec![0.0; len]),
        }
    }

    /// Width of the stored samples
    pub fn bit_depth(&self) -> BitDepth {
        match self {
            NativeBuffer::I16(_) => BitDepth::I16,
            NativeBuffer::I32(_) => BitDepth::I32,
            NativeBuffer::F32(_) => BitDepth::F32,
            NativeBuffer::F64(_) => BitDepth::F64,
        }
    }

    /// Number of stored samples across all channels
    pub fn len(&self) -> usize {
        match self {
            NativeBuffer::I16(v) => v.len(),
            NativeBuffer::I32(v) => v.len(),
            NativeBuffer::F32(v) => v.len(),
            NativeBuffer::F64(v) => v.len(),
        }
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copy of the first `len` samples (or all of them if fewer)
    pub fn head(&self, len: usize) -> NativeBuffer {
        match self {
            NativeBuffer::I16(v) => NativeBuffer::I16(v[..len.min(v.len())].to_vec()),
            NativeBuffer::I32(v) => NativeBuffer::I32(v[..len.min(v.len())].to_vec()),
            NativeBuffer::F32(v) => NativeBuffer::F32(v[..len.min(v.len())].to_vec()),
            NativeBuffer::F64(v) => NativeBuffer::F64(v[..len.min(v.len())].to_vec()),
        }
    }
}

type PackFn = fn(&mut NativeBuffer, &[f32], usize) -> AudioResult<()>;
type UnpackFn = fn(&NativeBuffer, &mut [f32], usize) -> AudioResult<()>;

struct FormatEntry {
    format: SampleFormat,
    pack: PackFn,
    unpack: UnpackFn,
}

/// Supported layouts, in encoder negotiation preference order.
static FORMAT_TABLE: [FormatEntry; 8] = [
    FormatEntry { format: SampleFormat::S16, pack: pack_s16, unpack: unpack_s16 },
    FormatEntry { format: SampleFormat::S16P, pack: pack_s16p, unpack: unpack_s16p },
    FormatEntry { format: SampleFormat::S32, pack: pack_s32, unpack: unpack_s32 },
    FormatEntry { format: SampleFormat::S32P, pack: pack_s32p, unpack: unpack_s32p },
    FormatEntry { format: SampleFormat::F64, pack: pack_f64, unpack: unpack_f64 },
    FormatEntry { format: SampleFormat::F64P, pack: pack_f64p, unpack: unpack_f64p },
    FormatEntry { format: SampleFormat::F32, pack: pack_f32, unpack: unpack_f32 },
    FormatEntry { format: SampleFormat::F32P, pack: pack_f32p, unpack: unpack_f32p },
];

fn entry(format: SampleFormat) -> AudioResult<&'static FormatEntry> {
    FORMAT_TABLE
        .iter()
        .find(|e| e.format == format)
        .ok_or_else(|| AudioError::FormatError(format!("sample format {} not supported", format)))
}

/// Supported layouts in negotiation preference order
pub fn preference_order() -> impl Iterator<Item = SampleFormat> {
    FORMAT_TABLE.iter().map(|e| e.format)
}

/// Pick the first layout in preference order that `available` advertises.
pub fn negotiate(available: &[SampleFormat]) -> AudioResult<SampleFormat> {
    preference_order()
        .find(|candidate| available.contains(candidate))
        .ok_or_else(|| {
            let names: Vec<&str> = available.iter().map(|f| f.name()).collect();
            AudioError::FormatError(format!(
                "no suitable sample format found (encoder offers: [{}])",
                names.join(", ")
            ))
        })
}

/// Clamp a float sample into [-1, 1]
pub fn clamp(v: f32) -> f32 {
    v.clamp(-1.0, 1.0)
}

/// Pack `frames` interleaved float pairs into `target` in `format`.
///
/// Samples are clamped first. Planar layouts put the left channel at
/// `[0, frames)` and the right channel at `[frames, 2 * frames)`.
pub fn pack(
    format: SampleFormat,
    target: &mut NativeBuffer,
    samples: &[f32],
    frames: usize,
) -> AudioResult<()> {
    (entry(format)?.pack)(target, samples, frames)
}

/// Unpack `frames` stereo frames stored in `format` into interleaved float pairs.
pub fn unpack(
    format: SampleFormat,
    source: &NativeBuffer,
    target: &mut [f32],
    frames: usize,
) -> AudioResult<()> {
    (entry(format)?.unpack)(source, target, frames)
}

fn mismatch(format: SampleFormat, found: BitDepth) -> AudioError {
    AudioError::FormatError(format!(
        "sample format {} does not match a {:?} buffer",
        format, found
    ))
}

fn check_len(what: &str, have: usize, frames: usize) -> AudioResult<()> {
    if have < frames * 2 {
        return Err(AudioError::BufferError(format!(
            "{} holds {} samples, {} frames need {}",
            what,
            have,
            frames,
            frames * 2
        )));
    }
    Ok(())
}

fn store<T: Copy>(
    target: &mut [T],
    samples: &[f32],
    frames: usize,
    planar: bool,
    convert: fn(f32) -> T,
) -> AudioResult<()> {
    check_len("float buffer", samples.len(), frames)?;
    check_len("native buffer", target.len(), frames)?;

    for i in 0..frames {
        let left = convert(clamp(samples[i * 2]));
        let right = convert(clamp(samples[i * 2 + 1]));
        if planar {
            target[i] = left;
            target[i + frames] = right;
        } else {
            target[i * 2] = left;
            target[i * 2 + 1] = right;
        }
    }
    Ok(())
}

fn load<T: Copy>(
    source: &[T],
    target: &mut [f32],
    frames: usize,
    planar: bool,
    convert: fn(T) -> f32,
) -> AudioResult<()> {
    check_len("native buffer", source.len(), frames)?;
    check_len("float buffer", target.len(), frames)?;

    for i in 0..frames {
        let (left, right) = if planar {
            (source[i], source[i + frames])
        } else {
            (source[i * 2], source[i * 2 + 1])
        };
        target[i * 2] = convert(left);
        target[i * 2 + 1] = convert(right);
    }
    Ok(())
}

fn to_s16(v: f32) -> i16 {
    (v * I16_SCALE) as i16
}

fn to_s32(v: f32) -> i32 {
    (v as f64 * I32_SCALE) as i32
}

fn to_f32(v: f32) -> f32 {
    v
}

fn to_f64(v: f32) -> f64 {
    v as f64
}

fn from_s16(s: i16) -> f32 {
    s as f32 / I16_SCALE
}

fn from_s32(s: i32) -> f32 {
    (s as f64 / I32_SCALE) as f32
}

fn from_f32(s: f32) -> f32 {
    s
}

fn from_f64(s: f64) -> f32 {
    s as f32
}

fn pack_s16(target: &mut NativeBuffer, samples: &[f32], frames: usize) -> AudioResult<()> {
    pack_i16_into(SampleFormat::S16, target, samples, frames)
}

fn pack_s16p(target: &mut NativeBuffer, samples: &[f32], frames: usize) -> AudioResult<()> {
    pack_i16_into(SampleFormat::S16P, target, samples, frames)
}

fn pack_s32(target: &mut NativeBuffer, samples: &[f32], frames: usize) -> AudioResult<()> {
    pack_i32_into(SampleFormat::S32, target, samples, frames)
}

fn pack_s32p(target: &mut NativeBuffer, samples: &[f32], frames: usize) -> AudioResult<()> {
    pack_i32_into(SampleFormat::S32P, target, samples, frames)
}

fn pack_f32(target: &mut NativeBuffer, samples: &[f32], frames: usize) -> AudioResult<()> {
    pack_f32_into(SampleFormat::F32, target, samples, frames)
}

fn pack_f32p(target: &mut NativeBuffer, samples: &[f32], frames: usize) -> AudioResult<()> {
    pack_f32_into(SampleFormat::F32P, target, samples, frames)
}

fn pack_f64(target: &mut NativeBuffer, samples: &[f32], frames: usize) -> AudioResult<()> {
    pack_f64_into(SampleFormat::F64, target, samples, frames)
}

fn pack_f64p(target: &mut NativeBuffer, samples: &[f32], frames: usize) -> AudioResult<()> {
    pack_f64_into(SampleFormat::F64P, target, samples, frames)
}

fn pack_i16_into(
    format: SampleFormat,
    target: &mut NativeBuffer,
    samples: &[f32],
    frames: usize,
) -> AudioResult<()> {
    match target {
        NativeBuffer::I16(t) => store(t, samples, frames, format.is_planar(), to_s16),
        other => Err(mismatch(format, other.bit_depth())),
    }
}

fn pack_i32_into(
    format: SampleFormat,
    target: &mut NativeBuffer,
    samples: &[f32],
    frames: usize,
) -> AudioResult<()> {
    match target {
        NativeBuffer::I32(t) => store(t, samples, frames, format.is_planar(), to_s32),
        other => Err(mismatch(format, other.bit_depth())),
    }
}

fn pack_f32_into(
    format: SampleFormat,
    target: &mut NativeBuffer,
    samples: &[f32],
    frames: usize,
) -> AudioResult<()> {
    match target {
        NativeBuffer::F32(t) => store(t, samples, frames, format.is_planar(), to_f32),
        other => Err(mismatch(format, other.bit_depth())),
    }
}

fn pack_f64_into(
    format: SampleFormat,
    target: &mut NativeBuffer,
    samples: &[f32],
    frames: usize,
) -> AudioResult<()> {
    match target {
        NativeBuffer::F64(t) => store(t, samples, frames, format.is_planar(), to_f64),
        other => Err(mismatch(format, other.bit_depth())),
    }
}

fn unpack_s16(source: &NativeBuffer, target: &mut [f32], frames: usize) -> AudioResult<()> {
    unpack_from(SampleFormat::S16, source, target, frames)
}

fn unpack_s16p(source: &NativeBuffer, target: &mut [f32], frames: usize) -> AudioResult<()> {
    unpack_from(SampleFormat::S16P, source, target, frames)
}

fn unpack_s32(source: &NativeBuffer, target: &mut [f32], frames: usize) -> AudioResult<()> {
    unpack_from(SampleFormat::S32, source, target, frames)
}

fn unpack_s32p(source: &NativeBuffer, target: &mut [f32], frames: usize) -> AudioResult<()> {
    unpack_from(SampleFormat::S32P, source, target, frames)
}

fn unpack_f32(source: &NativeBuffer, target: &mut [f32], frames: usize) -> AudioResult<()> {
    unpack_from(SampleFormat::F32, source, target, frames)
}

fn unpack_f32p(source: &NativeBuffer, target: &mut [f32], frames: usize) -> AudioResult<()> {
    unpack_from(SampleFormat::F32P, source, target, frames)
}

fn unpack_f64(source: &NativeBuffer, target: &mut [f32], frames: usize) -> AudioResult<()> {
    unpack_from(SampleFormat::F64, source, target, frames)
}

fn unpack_f64p(source: &NativeBuffer, target: &mut [f32], frames: usize) -> AudioResult<()> {
    unpack_from(SampleFormat::F64P, source, target, frames)
}

fn unpack_from(
    format: SampleFormat,
    source: &NativeBuffer,
    target: &mut [f32],
    frames: usize,
) -> AudioResult<()> {
    let planar = format.is_planar();
    match (format.bit_depth(), source) {
        (BitDepth::I16, NativeBuffer::I16(s)) => load(s, target, frames, planar, from_s16),
        (BitDepth::I32, NativeBuffer::I32(s)) => load(s, target, frames, planar, from_s32),
        (BitDepth::F32, NativeBuffer::F32(s)) => load(s, target, frames, planar, from_f32),
        (BitDepth::F64, NativeBuffer::F64(s)) => load(s, target, frames, planar, from_f64),
        (_, other) => Err(mismatch(format, other.bit_depth())),
    }
}
