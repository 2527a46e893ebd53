//! Receiver-side frame reassembly.
//!
//! Chunks arrive in arbitrary order — duplicated, reordered, or never
//! completing. The reassembler buffers them per `frame_id`, emits a
//! complete payload once every index has arrived, and evicts partial
//! frames that go quiet past the staleness window.
//!
//! Because `frame_id` is only 8 bits wide, a long-running sender reuses
//! identifiers; `timestamp_ms` is the tie-breaker. A chunk whose
//! timestamp differs from the buffered entry for the same id supersedes
//! that entry — it belongs to a newer frame that wrapped the counter.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tracing::warn;

use crate::error::CastError;
use crate::stream::chunk::Chunk;
use crate::stream::types::ReassembledFrame;

// ── DroppedFrame ─────────────────────────────────────────────────

/// Record of a partial frame that was abandoned (superseded or stale).
#[derive(Debug, Clone, PartialEq)]
pub struct DroppedFrame {
    pub frame_id: u8,
    pub timestamp_ms: f64,
    /// Chunks that had arrived before the drop.
    pub received: usize,
    pub chunk_count: u8,
}

// ── PartialFrame ─────────────────────────────────────────────────

#[derive(Debug)]
struct PartialFrame {
    timestamp_ms: f64,
    chunk_count: u8,
    /// Distinct indices received so far (duplicates don't count twice).
    received: usize,
    chunks: Vec<Option<Bytes>>,
    /// Arrival time of the most recent chunk, for staleness eviction.
    last_chunk_at: Instant,
}

impl PartialFrame {
    fn dropped(&self, frame_id: u8) -> DroppedFrame {
        DroppedFrame {
            frame_id,
            timestamp_ms: self.timestamp_ms,
            received: self.received,
            chunk_count: self.chunk_count,
        }
    }
}

// ── Reassembler ──────────────────────────────────────────────────

/// Per-`frame_id` chunk buffer with staleness eviction.
///
/// Holds at most 256 entries by construction (the key is a `u8`).
/// Frames are emitted in the order their last chunk completes, which is
/// not necessarily `frame_id` order.
#[derive(Debug)]
pub struct Reassembler {
    staleness: Duration,
    pending: HashMap<u8, PartialFrame>,
    dropped: u64,
    completed: u64,
}

impl Reassembler {
    /// Create a reassembler that abandons partial frames after no chunk
    /// has arrived for `staleness`.
    pub fn new(staleness: Duration) -> Self {
        Self {
            staleness,
            pending: HashMap::new(),
            dropped: 0,
            completed: 0,
        }
    }

    /// Feed one received chunk.
    ///
    /// Returns the reassembled frame when this chunk completed it.
    /// Duplicate indices are idempotent (last write wins, counted once).
    /// A chunk that contradicts its buffer — out-of-range index or a
    /// `chunk_count` differing from the buffered one under the same
    /// timestamp — is rejected without disturbing the buffer.
    pub fn accept(
        &mut self,
        chunk: Chunk,
        now: Instant,
    ) -> Result<Option<ReassembledFrame>, CastError> {
        let header = chunk.header;
        if header.chunk_count == 0 {
            return Err(CastError::ChunkMismatch("chunk_count is zero"));
        }
        if header.chunk_index >= header.chunk_count {
            return Err(CastError::ChunkMismatch("chunk_index out of range"));
        }

        // A differing timestamp under the same id means the 8-bit counter
        // wrapped: the buffered partial is stale and loses its slot.
        if let Some(partial) = self.pending.get(&header.frame_id) {
            if partial.timestamp_ms != header.timestamp_ms {
                let dropped = partial.dropped(header.frame_id);
                warn!(
                    frame_id = dropped.frame_id,
                    received = dropped.received,
                    chunk_count = dropped.chunk_count,
                    "partial frame superseded by wrapped frame_id; dropping"
                );
                self.pending.remove(&header.frame_id);
                self.dropped += 1;
            }
        }

        let partial = self
            .pending
            .entry(header.frame_id)
            .or_insert_with(|| PartialFrame {
                timestamp_ms: header.timestamp_ms,
                chunk_count: header.chunk_count,
                received: 0,
                chunks: vec![None; header.chunk_count as usize],
                last_chunk_at: now,
            });

        if partial.chunk_count != header.chunk_count {
            return Err(CastError::ChunkMismatch("chunk_count changed mid-frame"));
        }

        let index = header.chunk_index as usize;
        if partial.chunks[index].is_none() {
            partial.received += 1;
        }
        partial.chunks[index] = Some(chunk.payload);
        partial.last_chunk_at = now;

        if partial.received < partial.chunk_count as usize {
            return Ok(None);
        }

        // Complete: concatenate in index order and release the slot.
        if let Some(done) = self.pending.remove(&header.frame_id) {
            let mut payload = Vec::new();
            for slot in done.chunks.into_iter().flatten() {
                payload.extend_from_slice(&slot);
            }
            self.completed += 1;
            return Ok(Some(ReassembledFrame {
                frame_id: header.frame_id,
                timestamp_ms: done.timestamp_ms,
                payload,
            }));
        }
        Ok(None)
    }

    /// Drop every partial frame whose last chunk arrived longer than the
    /// staleness window ago. Returns the evicted records; an incomplete
    /// frame with a permanently missing chunk must never linger.
    pub fn evict_stale(&mut self, now: Instant) -> Vec<DroppedFrame> {
        let staleness = self.staleness;
        let stale_ids: Vec<u8> = self
            .pending
            .iter()
            .filter(|(_, partial)| now.duration_since(partial.last_chunk_at) > staleness)
            .map(|(id, _)| *id)
            .collect();

        let mut evicted = Vec::with_capacity(stale_ids.len());
        for id in stale_ids {
            if let Some(partial) = self.pending.remove(&id) {
                let dropped = partial.dropped(id);
                warn!(
                    frame_id = dropped.frame_id,
                    received = dropped.received,
                    chunk_count = dropped.chunk_count,
                    "partial frame stale; dropping"
                );
                self.dropped += 1;
                evicted.push(dropped);
            }
        }
        evicted
    }

    /// Partial frames currently buffered.
    pub fn pending_frames(&self) -> usize {
        self.pending.len()
    }

    /// Frames abandoned so far (superseded or stale).
    pub fn dropped_frames(&self) -> u64 {
        self.dropped
    }

    /// Frames emitted so far.
    pub fn completed_frames(&self) -> u64 {
        self.completed
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::fragment::fragment;
    use crate::stream::types::EncodedFrame;

    fn encoded(frame_id: u8, timestamp_ms: f64, len: usize) -> EncodedFrame {
        EncodedFrame {
            frame_id,
            timestamp_ms,
            data: (0..len).map(|i| (i % 249) as u8).collect(),
        }
    }

    fn reassembler() -> Reassembler {
        Reassembler::new(Duration::from_millis(200))
    }

    #[test]
    fn reassembles_chunks_delivered_out_of_order() {
        let frame = encoded(9, 100.0, 130_000);
        let chunks = fragment(&frame, 60_000).unwrap();
        assert_eq!(chunks.len(), 3);

        let mut r = reassembler();
        let now = Instant::now();

        // Delivery order [2, 0, 1].
        assert!(r.accept(chunks[2].clone(), now).unwrap().is_none());
        assert!(r.accept(chunks[0].clone(), now).unwrap().is_none());
        let done = r.accept(chunks[1].clone(), now).unwrap().unwrap();

        assert_eq!(done.frame_id, 9);
        assert_eq!(done.timestamp_ms, 100.0);
        assert_eq!(done.payload.len(), 130_000);
        assert_eq!(done.payload, frame.data);
        assert_eq!(r.pending_frames(), 0);
    }

    #[test]
    fn reassembles_reversed_and_duplicated_delivery() {
        let frame = encoded(3, 7.0, 10_000);
        let chunks = fragment(&frame, 1_000).unwrap();

        let mut r = reassembler();
        let now = Instant::now();

        let mut delivery: Vec<Chunk> = chunks.iter().rev().cloned().collect();
        // Duplicate a few mid-stream; duplicates must not complete early.
        delivery.insert(3, chunks[8].clone());
        delivery.insert(5, chunks[2].clone());

        let mut emitted = None;
        for chunk in delivery {
            if let Some(frame) = r.accept(chunk, now).unwrap() {
                assert!(emitted.is_none(), "emitted more than once");
                emitted = Some(frame);
            }
        }

        assert_eq!(emitted.unwrap().payload, frame.data);
    }

    #[test]
    fn duplicate_of_every_chunk_does_not_complete_early() {
        let frame = encoded(1, 1.0, 3_000);
        let chunks = fragment(&frame, 1_000).unwrap();
        let mut r = reassembler();
        let now = Instant::now();

        // Two copies of chunk 0 and one of chunk 1: only 2 distinct of 3.
        assert!(r.accept(chunks[0].clone(), now).unwrap().is_none());
        assert!(r.accept(chunks[0].clone(), now).unwrap().is_none());
        assert!(r.accept(chunks[1].clone(), now).unwrap().is_none());
        assert_eq!(r.pending_frames(), 1);

        let done = r.accept(chunks[2].clone(), now).unwrap();
        assert!(done.is_some());
    }

    #[test]
    fn wrapped_frame_id_supersedes_stale_partial() {
        // Two frames 256 apart in sequence share frame_id but not timestamp.
        let old = encoded(5, 1_000.0, 2_000);
        let new = encoded(5, 2_000.0, 2_000);
        let old_chunks = fragment(&old, 1_000).unwrap();
        let new_chunks = fragment(&new, 1_000).unwrap();

        let mut r = reassembler();
        let now = Instant::now();

        // Old frame gets one of its two chunks, then the wrapped frame
        // arrives. The partial must be discarded, never merged.
        assert!(r.accept(old_chunks[0].clone(), now).unwrap().is_none());
        assert!(r.accept(new_chunks[1].clone(), now).unwrap().is_none());
        assert_eq!(r.dropped_frames(), 1);

        let done = r.accept(new_chunks[0].clone(), now).unwrap().unwrap();
        assert_eq!(done.timestamp_ms, 2_000.0);
        assert_eq!(done.payload, new.data);
    }

    #[test]
    fn stale_partial_is_evicted_and_never_emitted() {
        let frame = encoded(8, 50.0, 3_000);
        let chunks = fragment(&frame, 1_000).unwrap();

        let mut r = reassembler();
        let start = Instant::now();

        // Missing exactly one chunk.
        assert!(r.accept(chunks[0].clone(), start).unwrap().is_none());
        assert!(r.accept(chunks[2].clone(), start).unwrap().is_none());

        // Inside the window: still pending.
        assert!(r.evict_stale(start + Duration::from_millis(100)).is_empty());
        assert_eq!(r.pending_frames(), 1);

        // Past the window: evicted and reported.
        let evicted = r.evict_stale(start + Duration::from_millis(250));
        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].frame_id, 8);
        assert_eq!(evicted[0].received, 2);
        assert_eq!(r.pending_frames(), 0);
        assert_eq!(r.dropped_frames(), 1);

        // The late straggler starts a fresh buffer, it cannot emit.
        let late = r
            .accept(chunks[1].clone(), start + Duration::from_millis(260))
            .unwrap();
        assert!(late.is_none());
    }

    #[test]
    fn new_chunk_refreshes_staleness_clock() {
        let frame = encoded(2, 9.0, 3_000);
        let chunks = fragment(&frame, 1_000).unwrap();

        let mut r = reassembler();
        let start = Instant::now();

        assert!(r.accept(chunks[0].clone(), start).unwrap().is_none());
        // A chunk arriving at t=150ms pushes the deadline past t=250ms.
        assert!(
            r.accept(chunks[1].clone(), start + Duration::from_millis(150))
                .unwrap()
                .is_none()
        );
        assert!(r.evict_stale(start + Duration::from_millis(250)).is_empty());
        assert_eq!(r.pending_frames(), 1);
    }

    #[test]
    fn rejects_out_of_range_index() {
        let mut r = reassembler();
        let chunk = Chunk {
            header: crate::stream::chunk::ChunkHeader {
                frame_id: 1,
                chunk_index: 3,
                chunk_count: 3,
                timestamp_ms: 1.0,
            },
            payload: Bytes::from_static(b"x"),
        };
        assert!(matches!(
            r.accept(chunk, Instant::now()),
            Err(CastError::ChunkMismatch(_))
        ));
    }

    #[test]
    fn rejects_inconsistent_chunk_count() {
        let frame = encoded(4, 5.0, 2_000);
        let chunks = fragment(&frame, 1_000).unwrap();
        let mut r = reassembler();
        let now = Instant::now();

        assert!(r.accept(chunks[0].clone(), now).unwrap().is_none());

        let mut bad = chunks[1].clone();
        bad.header.chunk_count = 4;
        assert!(matches!(
            r.accept(bad, now),
            Err(CastError::ChunkMismatch(_))
        ));
        // The original buffer is undisturbed.
        assert_eq!(r.pending_frames(), 1);
    }
}
