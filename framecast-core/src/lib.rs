//! # framecast-core
//!
//! Core library for the framecast paced frame transport.
//!
//! This crate contains:
//! - **Wire protocol**: `ChunkHeader`, `Chunk` — the fixed 11-byte
//!   datagram header and its codec
//! - **Fragmentation**: `fragment` — splits an encoded frame into
//!   datagram-sized chunks
//! - **Reassembly**: `Reassembler` — rebuilds frames from chunks under
//!   loss, duplication and reordering
//! - **Dispatch**: `Dispatcher` — bounded work queue + worker pool for
//!   concurrent encode/transmit
//! - **Pacing**: `Pacer` — fixed-interval capture loop driven by the
//!   display refresh rate
//! - **Seams**: `VideoSource`, `FrameEncoder`, `DatagramSink` — the
//!   narrow interfaces the pipeline consumes its collaborators through
//! - **Error**: `CastError` — typed, `thiserror`-based error hierarchy

pub mod config;
pub mod error;
pub mod refresh;
pub mod stream;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use config::{DispatcherConfig, PacerConfig, ReassemblerConfig};
pub use error::CastError;
pub use refresh::{DEFAULT_REFRESH_RATE, detect_refresh_rate};
pub use stream::{
    Chunk, ChunkHeader, DatagramSink, Dispatcher, EncodedFrame, FrameEncoder, JpegFrameEncoder,
    Pacer, PixelFormat, RawFrame, ReassembledFrame, Reassembler, ReceiverStats, StreamReceiver,
    TestPatternSource, UdpSink, VideoSource, fragment,
};
