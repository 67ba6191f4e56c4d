//! Demuxer and decoder seams for the reader

pub mod symphonia;

pub use self::symphonia::SymphoniaDemuxer;

use crate::core::{DecodedFrame, StreamInfo, StreamKind};
use crate::error::AudioResult;
use std::cmp::Reverse;
use std::path::Path;
use ::symphonia::core::formats::Packet;

/// Container reader: stream discovery, packet reads and timestamp seeks
pub trait Demuxer {
    /// Streams found in the input
    fn streams(&self) -> Vec<StreamInfo>;

    /// Open a decoder for one stream
    fn open_decoder(&self, stream_index: u32) -> AudioResult<Box<dyn FrameDecoder>>;

    /// Read the next packet of any stream; `None` marks the end of the input
    fn read_packet(&mut self) -> AudioResult<Option<Packet>>;

    /// Seek `stream_index` to `timestamp`, expressed in that stream's time base
    fn seek(&mut self, stream_index: u32, timestamp: u64) -> AudioResult<()>;

    /// Container duration in microseconds if known
    fn duration_micros(&self) -> Option<u64> {
        self.streams().iter().filter_map(|s| s.duration_micros()).max()
    }

    /// Length of the longest stream in frames at 44.1kHz if known
    fn duration_frames(&self) -> Option<u64> {
        self.streams().iter().filter_map(|s| s.duration_frames()).max()
    }
}

/// Decoder turning packets of one stream into native frames
pub trait FrameDecoder {
    /// Decode one packet into a frame
    fn decode(&mut self, packet: &Packet) -> AudioResult<DecodedFrame>;

    /// Drop decoder state after a seek
    fn reset(&mut self) {}
}

/// Pick the best audio stream: the container default, then the longest,
/// then the lowest index.
pub fn select_best_stream(streams: &[StreamInfo]) -> Option<&StreamInfo> {
    streams
        .iter()
        .filter(|s| s.kind == StreamKind::Audio)
        .min_by_key(|s| (Reverse(s.is_default), Reverse(s.n_frames.unwrap_or(0)), s.index))
}

/// Open a demuxer for a file path
pub fn from_file<P: AsRef<Path>>(path: P) -> AudioResult<Box<dyn Demuxer>> {
    SymphoniaDemuxer::from_file(path).map(|d| Box::new(d) as Box<dyn Demuxer>)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_stream_prefers_default() {
        let streams = vec![
            StreamInfo::audio(0, "mp3").with_frames(500),
            StreamInfo::audio(1, "flac").with_frames(100).as_default(),
        ];
        assert_eq!(select_best_stream(&streams).unwrap().index, 1);
    }

    #[test]
    fn test_best_stream_prefers_longest_then_lowest_index() {
        let streams = vec![
            StreamInfo::other(0),
            StreamInfo::audio(1, "aac").with_frames(100),
            StreamInfo::audio(2, "aac").with_frames(300),
            StreamInfo::audio(3, "aac").with_frames(300),
        ];
        assert_eq!(select_best_stream(&streams).unwrap().index, 2);
    }

    #[test]
    fn test_best_stream_ignores_non_audio() {
        let streams = vec![StreamInfo::other(0), StreamInfo::other(1)];
        assert!(select_best_stream(&streams).is_none());
    }

    #[test]
    fn test_from_file_missing() {
        assert!(from_file("/nonexistent/file.wav").is_err());
    }
}
