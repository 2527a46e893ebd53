//! Shared frame types used between pipeline stages.
//!
//! `RawFrame` is handed **by value** from the source through the pacer to
//! exactly one dispatcher worker — ownership transfer is the isolation
//! mechanism, so no two tasks ever hold the same pixel buffer.

use std::time::Instant;

// ── PixelFormat ──────────────────────────────────────────────────

/// Pixel layout for raw frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 3 bytes per pixel: Red, Green, Blue.
    Rgb8,
    /// 4 bytes per pixel: Red, Green, Blue, Alpha.
    Rgba8,
    /// 4 bytes per pixel: Blue, Green, Red, Alpha (typical OS capture).
    Bgra8,
}

impl PixelFormat {
    /// Bytes consumed by a single pixel in this format.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
        }
    }
}

// ── RawFrame ─────────────────────────────────────────────────────

/// One decoded, uncompressed image pulled from a [`VideoSource`].
///
/// Rows are packed tightly: `data.len() == width * height * bpp`.
///
/// [`VideoSource`]: crate::stream::source::VideoSource
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel layout.
    pub format: PixelFormat,
    /// Packed pixel data.
    pub data: Vec<u8>,
    /// Monotonic timestamp taken when the frame was produced.
    pub timestamp: Instant,
}

impl RawFrame {
    /// Byte size the packed bitmap must occupy.
    pub fn byte_len(&self) -> usize {
        self.width as usize * self.height as usize * self.format.bytes_per_pixel()
    }
}

// ── EncodedFrame ─────────────────────────────────────────────────

/// The compressed payload for one frame, tagged for the wire.
///
/// Immutable once produced; owned by the worker that encoded it until
/// fully fragmented and handed to the transport.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    /// 8-bit cyclic frame identifier (`sequence % 256`).
    pub frame_id: u8,
    /// Unix-epoch milliseconds, stamped at submission. Disambiguates a
    /// reused `frame_id` after the identifier space wraps.
    pub timestamp_ms: f64,
    /// Compressed bytes (JPEG).
    pub data: Vec<u8>,
}

// ── ReassembledFrame ─────────────────────────────────────────────

/// A complete payload rebuilt by the receiver.
///
/// Frames are emitted in the order their *last* chunk arrives, not in
/// `frame_id` order — consumers needing presentation order must key on
/// `timestamp_ms`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReassembledFrame {
    pub frame_id: u8,
    pub timestamp_ms: f64,
    pub payload: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_len_matches_format() {
        let frame = RawFrame {
            width: 4,
            height: 2,
            format: PixelFormat::Rgb8,
            data: vec![0; 24],
            timestamp: Instant::now(),
        };
        assert_eq!(frame.byte_len(), 24);
        assert_eq!(frame.byte_len(), frame.data.len());
    }

    #[test]
    fn bytes_per_pixel() {
        assert_eq!(PixelFormat::Rgb8.bytes_per_pixel(), 3);
        assert_eq!(PixelFormat::Rgba8.bytes_per_pixel(), 4);
        assert_eq!(PixelFormat::Bgra8.bytes_per_pixel(), 4);
    }
}
