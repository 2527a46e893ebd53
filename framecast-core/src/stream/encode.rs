//! Frame compression seam.
//!
//! The pipeline calls the codec through [`FrameEncoder`] so workers can
//! be tested without a real codec. The production implementation is
//! JPEG via the `image` crate.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{ImageBuffer, RgbImage};

use crate::error::CastError;
use crate::stream::types::{PixelFormat, RawFrame};

// ── FrameEncoder ─────────────────────────────────────────────────

/// Compresses one raw frame into a byte payload.
///
/// Implementations must be callable from several workers at once.
pub trait FrameEncoder: Send + Sync {
    /// Compress `frame` at `quality` (0..=100, clamped to the codec's
    /// supported floor). Fails with [`CastError::Encode`] on invalid
    /// input; the caller drops the frame and continues.
    fn encode(&self, frame: &RawFrame, quality: u8) -> Result<Vec<u8>, CastError>;
}

// ── JpegFrameEncoder ─────────────────────────────────────────────

/// JPEG compression through the `image` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct JpegFrameEncoder;

impl JpegFrameEncoder {
    pub fn new() -> Self {
        Self
    }
}

impl FrameEncoder for JpegFrameEncoder {
    fn encode(&self, frame: &RawFrame, quality: u8) -> Result<Vec<u8>, CastError> {
        if frame.data.len() != frame.byte_len() {
            return Err(CastError::Encode(format!(
                "pixel buffer is {} bytes, expected {} for {}x{}",
                frame.data.len(),
                frame.byte_len(),
                frame.width,
                frame.height,
            )));
        }

        let rgb = to_rgb(frame);
        let img: RgbImage = ImageBuffer::from_raw(frame.width, frame.height, rgb)
            .ok_or_else(|| CastError::Encode("pixel buffer does not match dimensions".into()))?;

        let mut buf = Cursor::new(Vec::new());
        // The codec floor is quality 1.
        let encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
        img.write_with_encoder(encoder)?;

        Ok(buf.into_inner())
    }
}

/// Repack any supported pixel layout as tightly packed RGB.
fn to_rgb(frame: &RawFrame) -> Vec<u8> {
    match frame.format {
        PixelFormat::Rgb8 => frame.data.clone(),
        PixelFormat::Rgba8 => frame
            .data
            .chunks_exact(4)
            .flat_map(|px| [px[0], px[1], px[2]])
            .collect(),
        PixelFormat::Bgra8 => frame
            .data
            .chunks_exact(4)
            .flat_map(|px| [px[2], px[1], px[0]])
            .collect(),
    }
}

// ── Tests ────────────────────────────────────────────────────────
