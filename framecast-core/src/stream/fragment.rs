//! Frame fragmentation.
//!
//! Splits an encoded frame into datagram-sized chunks. Pure: the output
//! is a function of the inputs alone, with no side effects.

use bytes::Bytes;

use crate::error::CastError;
use crate::stream::chunk::{Chunk, ChunkHeader};
use crate::stream::types::EncodedFrame;

/// Most chunks a single frame may span — the 8-bit index space.
pub const MAX_CHUNKS: usize = u8::MAX as usize;

/// Split `frame.data` into `ceil(len / max_payload)` chunks in ascending
/// index order, covering the payload with no gaps and no overlaps. Every
/// chunk carries the frame's `frame_id`, `timestamp_ms` and the identical
/// total `chunk_count`.
///
/// An empty payload yields an empty chunk list. A payload that would span
/// more than [`MAX_CHUNKS`] chunks is a configuration error (the quality
/// or payload-size settings produce frames the index space cannot
/// address) and is signalled, never truncated.
pub fn fragment(frame: &EncodedFrame, max_payload: usize) -> Result<Vec<Chunk>, CastError> {
    if max_payload == 0 {
        return Err(CastError::Config(
            "max_payload must be at least 1 byte".into(),
        ));
    }
    if frame.data.is_empty() {
        return Ok(Vec::new());
    }

    let chunk_count = frame.data.len().div_ceil(max_payload);
    if chunk_count > MAX_CHUNKS {
        return Err(CastError::FrameTooLarge {
            size: frame.data.len(),
            chunks: chunk_count,
            max: MAX_CHUNKS,
        });
    }

    let mut chunks = Vec::with_capacity(chunk_count);
    for (index, piece) in frame.data.chunks(max_payload).enumerate() {
        chunks.push(Chunk {
            header: ChunkHeader {
                frame_id: frame.frame_id,
                chunk_index: index as u8,
                chunk_count: chunk_count as u8,
                timestamp_ms: frame.timestamp_ms,
            },
            payload: Bytes::copy_from_slice(piece),
        });
    }

    Ok(chunks)
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn encoded(len: usize) -> EncodedFrame {
        EncodedFrame {
            frame_id: 42,
            timestamp_ms: 1234.5,
            data: (0..len).map(|i| (i % 251) as u8).collect(),
        }
    }

    #[test]
    fn splits_130000_bytes_into_three_chunks() {
        let frame = encoded(130_000);
        let chunks = fragment(&frame, 60_000).unwrap();

        assert_eq!(chunks.len(), 3);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.header.frame_id, 42);
            assert_eq!(chunk.header.chunk_index, i as u8);
            assert_eq!(chunk.header.chunk_count, 3);
            assert_eq!(chunk.header.timestamp_ms, 1234.5);
        }
        assert_eq!(chunks[0].payload.len(), 60_000);
        assert_eq!(chunks[1].payload.len(), 60_000);
        assert_eq!(chunks[2].payload.len(), 10_000);
    }

    #[test]
    fn concatenation_restores_payload() {
        let frame = encoded(7_919);
        let chunks = fragment(&frame, 1_000).unwrap();

        let mut rebuilt = Vec::new();
        for chunk in &chunks {
            rebuilt.extend_from_slice(&chunk.payload);
        }
        assert_eq!(rebuilt, frame.data);
    }

    #[test]
    fn exact_multiple_has_no_empty_tail() {
        let frame = encoded(4_000);
        let chunks = fragment(&frame, 1_000).unwrap();
        assert_eq!(chunks.len(), 4);
        assert!(chunks.iter().all(|c| c.payload.len() == 1_000));
    }

    #[test]
    fn empty_payload_yields_no_chunks() {
        let frame = encoded(0);
        assert!(fragment(&frame, 60_000).unwrap().is_empty());
    }

    #[test]
    fn single_byte_single_chunk() {
        let frame = encoded(1);
        let chunks = fragment(&frame, 60_000).unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].header.chunk_count, 1);
    }

    #[test]
    fn oversized_frame_is_an_error() {
        // 256 chunks needed — one past the index space.
        let frame = encoded(256 * 100);
        let result = fragment(&frame, 100);
        assert!(matches!(result, Err(CastError::FrameTooLarge { chunks: 256, .. })));
    }

    #[test]
    fn zero_max_payload_is_an_error() {
        let frame = encoded(10);
        assert!(matches!(fragment(&frame, 0), Err(CastError::Config(_))));
    }
}
