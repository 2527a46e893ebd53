//! Wire format for a single datagram.
//!
//! Every datagram carries a fixed 11-byte header followed by up to
//! `max_payload` bytes of chunk payload:
//!
//! ```text
//! frame_id:     u8   (1)
//! chunk_index:  u8   (1)
//! chunk_count:  u8   (1)
//! timestamp_ms: f64  (8, little-endian bit pattern)
//! ```
//!
//! No padding, no alignment. All chunks of one frame carry identical
//! `frame_id`, `chunk_count` and `timestamp_ms`; `chunk_index` runs
//! `0..chunk_count`.

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::CastError;

// ── Constants ────────────────────────────────────────────────────

/// Encoded header size on the wire.
pub const HEADER_SIZE: usize = 11;

/// Default maximum chunk payload per datagram, chosen to stay under the
/// practical UDP datagram ceiling (~65507 bytes) with header room to spare.
pub const DEFAULT_MAX_PAYLOAD: usize = 60000;

// ── ChunkHeader ──────────────────────────────────────────────────

/// Per-chunk metadata prepended to each datagram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChunkHeader {
    /// 8-bit cyclic frame identifier.
    pub frame_id: u8,
    /// Position of this chunk within the frame (`< chunk_count`).
    pub chunk_index: u8,
    /// Total chunks making up the frame (`1..=255`).
    pub chunk_count: u8,
    /// Unix-epoch milliseconds; shared by all chunks of the frame and
    /// the tie-breaker when `frame_id` wraps.
    pub timestamp_ms: f64,
}

impl ChunkHeader {
    /// Serialize to bytes.
    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0] = self.frame_id;
        buf[1] = self.chunk_index;
        buf[2] = self.chunk_count;
        buf[3..11].copy_from_slice(&self.timestamp_ms.to_le_bytes());
        buf
    }

    /// Deserialize from the leading bytes of a datagram.
    pub fn decode(data: &[u8]) -> Result<Self, CastError> {
        if data.len() < HEADER_SIZE {
            return Err(CastError::InvalidHeader("datagram shorter than header"));
        }
        let mut ts = [0u8; 8];
        ts.copy_from_slice(&data[3..11]);
        Ok(Self {
            frame_id: data[0],
            chunk_index: data[1],
            chunk_count: data[2],
            timestamp_ms: f64::from_le_bytes(ts),
        })
    }
}

// ── Chunk ────────────────────────────────────────────────────────

/// One datagram-sized fragment of an encoded frame: header + payload.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub header: ChunkHeader,
    pub payload: Bytes,
}

impl Chunk {
    /// Assemble the on-wire datagram: header bytes then payload verbatim.
    pub fn to_datagram(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HEADER_SIZE + self.payload.len());
        buf.put_slice(&self.header.encode());
        buf.put_slice(&self.payload);
        buf.freeze()
    }

    /// Parse a received datagram. Trailing bytes after the header are the
    /// chunk payload verbatim (possibly empty).
    pub fn from_datagram(data: &[u8]) -> Result<Self, CastError> {
        let header = ChunkHeader::decode(data)?;
        Ok(Self {
            header,
            payload: Bytes::copy_from_slice(&data[HEADER_SIZE..]),
        })
    }
}

/// Current wall-clock time as Unix-epoch milliseconds, the unit carried
/// in [`ChunkHeader::timestamp_ms`].
pub fn unix_time_ms() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs_f64() * 1000.0)
        .unwrap_or(0.0)
}

// ── Tests ────────────────────────────────────────────────────────
