//! Domain-specific error types for the framecast pipeline.
//!
//! All fallible operations return `Result<T, CastError>`.
//! No panics on invalid input — every error is typed and recoverable,
//! and only `Config` errors are fatal (at startup, before the loop runs).

use thiserror::Error;

/// The canonical error type for the frame transport.
#[derive(Debug, Error)]
pub enum CastError {
    // ── Configuration Errors ─────────────────────────────────────
    /// Invalid startup settings. Fatal: surfaced before the pipeline runs.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An encoded frame needs more chunks than the 8-bit index can address.
    #[error("frame too large: {size} bytes would need {chunks} chunks (max {max})")]
    FrameTooLarge {
        size: usize,
        chunks: usize,
        max: usize,
    },

    // ── Pipeline Errors ──────────────────────────────────────────
    /// A single frame failed to compress. The frame is dropped; the
    /// pipeline continues.
    #[error("encode failed: {0}")]
    Encode(String),

    /// The frame source failed to produce or rewind.
    #[error("frame source error: {0}")]
    Source(String),

    // ── Transport Errors ─────────────────────────────────────────
    /// The socket layer reported an error.
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// A pipeline channel hung up (normal during shutdown).
    #[error("channel closed")]
    ChannelClosed,

    // ── Protocol Errors ──────────────────────────────────────────
    /// A datagram was too short to hold a chunk header.
    #[error("invalid chunk header: {0}")]
    InvalidHeader(&'static str),

    /// A chunk contradicts the buffer it belongs to.
    #[error("chunk mismatch: {0}")]
    ChunkMismatch(&'static str),
}

// ── Convenient From implementations ──────────────────────────────

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for CastError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        CastError::ChannelClosed
    }
}

impl From<image::ImageError> for CastError {
    fn from(e: image::ImageError) -> Self {
        CastError::Encode(e.to_string())
    }
}
