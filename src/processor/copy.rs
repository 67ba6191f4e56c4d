use crate::core::audio::CHANNELS;
use crate::error::{AudioError, AudioResult};
use crate::processor::ProcessingStats;
use crate::stream::{Reader, Writer};
use log::debug;

/// Copy every remaining frame of `reader` into `writer`, `chunk_frames` at a time.
///
/// Stops at the end of the source; the silence a reader serves afterwards is
/// never written.
pub fn copy(
    reader: &mut Reader,
    writer: &mut Writer,
    chunk_frames: usize,
) -> AudioResult<ProcessingStats> {
    if chunk_frames == 0 {
        return Err(AudioError::BufferError("copy chunk must hold at least one frame".to_string()));
    }

    let mut buf = vec![0.0f32; chunk_frames * CHANNELS];
    let mut stats = ProcessingStats::default();

    while !reader.eof() {
        let frames = reader.read(&mut buf)?;
        writer.write(&buf[..frames * CHANNELS])?;
        stats.frames_processed += frames as u64;
        stats.chunks += 1;
    }

    debug!(
        "copied {} frames in {} chunks",
        stats.frames_processed, stats.chunks
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SampleFormat;
    use crate::stream::testing::{MockDemuxer, MockEncoder, MockLog, MockMuxer, stereo_frame};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_copy_moves_real_frames_only() {
        let demuxer = MockDemuxer::stereo()
            .with_packet(0, stereo_frame(SampleFormat::F32, &[0.25; 1000]))
            .with_packet(0, stereo_frame(SampleFormat::F32, &[0.5; 600]));
        let mut reader = Reader::from_demuxer(Box::new(demuxer)).unwrap();

        let log = Rc::new(RefCell::new(MockLog::default()));
        let mut writer = Writer::open_with(
            Box::new(MockMuxer::new(&log)),
            Box::new(MockEncoder::new(&[SampleFormat::F32], 256, &log)),
        )
        .unwrap();

        let stats = copy(&mut reader, &mut writer, 300).unwrap();
        assert_eq!(stats.frames_processed, 800);
        assert_eq!(stats.chunks, 3);
        assert!(!reader.is_padding());

        assert_eq!(writer.frames_flushed(), 3);
        assert_eq!(writer.buffered_frames(), 32);
        writer.close().unwrap();
        assert_eq!(log.borrow().packets.len(), 4);
    }

    #[test]
    fn test_copy_rejects_empty_chunk() {
        let mut reader = Reader::from_demuxer(Box::new(MockDemuxer::stereo())).unwrap();
        let log = Rc::new(RefCell::new(MockLog::default()));
        let mut writer = Writer::open_with(
            Box::new(MockMuxer::new(&log)),
            Box::new(MockEncoder::new(&[SampleFormat::S16], 0, &log)),
        )
        .unwrap();

        let result = copy(&mut reader, &mut writer, 0);
        assert!(matches!(result, Err(AudioError::BufferError(_))));
    }
}
