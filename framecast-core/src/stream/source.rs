//! Frame source seam.
//!
//! Video decoding itself is out of scope — the pacer consumes whatever
//! implements [`VideoSource`]. The crate ships [`TestPatternSource`],
//! a synthetic animated pattern used by the sender binary and the tests.

use std::time::Instant;

use crate::error::CastError;
use crate::stream::types::{PixelFormat, RawFrame};

// ── VideoSource ──────────────────────────────────────────────────

/// Produces decoded frames for the pacer.
///
/// The pacer owns its source exclusively; no other component touches it.
/// `next_frame` returning `Ok(None)` signals end-of-stream, after which
/// the pacer calls [`rewind`](Self::rewind) and pulls again — sources
/// loop rather than terminate. Resources are released by dropping the
/// source.
pub trait VideoSource: Send {
    /// Pull the next decoded frame, or `None` at end-of-stream.
    fn next_frame(&mut self) -> Result<Option<RawFrame>, CastError>;

    /// Seek back to the first frame.
    fn rewind(&mut self) -> Result<(), CastError>;
}

// ── TestPatternSource ────────────────────────────────────────────

/// Synthetic source: an animated RGB gradient with a sweeping bar.
///
/// Yields `frames_per_loop` frames, then reports end-of-stream so the
/// pacer's rewind path is exercised exactly like a looping file source.
#[derive(Debug)]
pub struct TestPatternSource {
    width: u32,
    height: u32,
    frames_per_loop: u64,
    cursor: u64,
    /// Advances across rewinds so the pattern keeps moving.
    phase: u64,
}

impl TestPatternSource {
    pub fn new(width: u32, height: u32, frames_per_loop: u64) -> Result<Self, CastError> {
        if width == 0 || height == 0 {
            return Err(CastError::Config(
                "test pattern dimensions must be non-zero".into(),
            ));
        }
        if frames_per_loop == 0 {
            return Err(CastError::Config(
                "test pattern needs at least one frame per loop".into(),
            ));
        }
        Ok(Self {
            width,
            height,
            frames_per_loop,
            cursor: 0,
            phase: 0,
        })
    }

    fn render(&self) -> Vec<u8> {
        let (w, h) = (self.width as usize, self.height as usize);
        let t = self.phase as usize;
        let bar = t % w;
        let mut data = Vec::with_capacity(w * h * 3);

        for y in 0..h {
            for x in 0..w {
                if x == bar {
                    data.extend_from_slice(&[255, 255, 255]);
                } else {
                    data.push(((x + t) % 256) as u8);
                    data.push(((y + t / 2) % 256) as u8);
                    data.push(((x + y) % 256) as u8);
                }
            }
        }
        data
    }
}

impl VideoSource for TestPatternSource {
    fn next_frame(&mut self) -> Result<Option<RawFrame>, CastError> {
        if self.cursor >= self.frames_per_loop {
            return Ok(None);
        }
        let frame = RawFrame {
            width: self.width,
            height: self.height,
            format: PixelFormat::Rgb8,
            data: self.render(),
            timestamp: Instant::now(),
        };
        self.cursor += 1;
        self.phase += 1;
        Ok(Some(frame))
    }

    fn rewind(&mut self) -> Result<(), CastError> {
        self.cursor = 0;
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────
