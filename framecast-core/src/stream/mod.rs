//! # Frame transport pipeline
//!
//! Streams a looping video source as JPEG frames over UDP, paced at the
//! display's refresh rate. Compressed frames routinely exceed a single
//! datagram, so each is fragmented behind an 11-byte header and
//! reassembled on the far side under loss, duplication and reordering.
//!
//! ```text
//! SENDER                                        RECEIVER
//! ┌──────────────────────────┐                  ┌──────────────────────┐
//! │ VideoSource              │                  │ UdpSocket            │
//! │   ↓ (pulled by Pacer)    │                  │   ↓                  │
//! │ Dispatcher worker pool   │      UDP         │ Reassembler          │
//! │   FrameEncoder (JPEG)    │  ──────────►     │   ↓                  │
//! │   fragment()             │                  │ ReassembledFrame     │
//! │   DatagramSink::send     │                  │ channel → consumer   │
//! └──────────────────────────┘                  └──────────────────────┘
//! ```
//!
//! Chunks of one frame leave a single worker in ascending index order,
//! but frames on different workers race freely — `frame_id` and
//! `timestamp_ms` in every header are what let the receiver sort it out.
//!
//! ## Sub-modules
//!
//! | Module       | Purpose                                            |
//! |--------------|----------------------------------------------------|
//! | `types`      | Shared frame types handed between pipeline stages  |
//! | `chunk`      | 11-byte wire header and datagram codec             |
//! | `fragment`   | Payload → chunk splitting (pure)                   |
//! | `reassembly` | Per-`frame_id` buffering and staleness eviction    |
//! | `encode`     | `FrameEncoder` seam + JPEG implementation          |
//! | `source`     | `VideoSource` seam + synthetic test pattern        |
//! | `transport`  | `DatagramSink` seam + UDP implementation           |
//! | `dispatch`   | Bounded work queue + fixed worker pool             |
//! | `pacer`      | Fixed-interval capture loop                        |
//! | `receiver`   | Receive loop publishing completed frames           |

pub mod chunk;
pub mod dispatch;
pub mod encode;
pub mod fragment;
pub mod pacer;
pub mod reassembly;
pub mod receiver;
pub mod source;
pub mod transport;
pub mod types;

// ── Re-exports ───────────────────────────────────────────────────

pub use chunk::{Chunk, ChunkHeader, DEFAULT_MAX_PAYLOAD, HEADER_SIZE};
pub use dispatch::Dispatcher;
pub use encode::{FrameEncoder, JpegFrameEncoder};
pub use fragment::{MAX_CHUNKS, fragment};
pub use pacer::Pacer;
pub use reassembly::{DroppedFrame, Reassembler};
pub use receiver::{ReceiverStats, StreamReceiver};
pub use source::{TestPatternSource, VideoSource};
pub use transport::{DatagramSink, UdpSink};
pub use types::{EncodedFrame, PixelFormat, RawFrame, ReassembledFrame};
