//! Pipeline configuration structs.
//!
//! These are embedded as tables inside the binaries' TOML config files,
//! so they derive serde with full defaults.

use serde::{Deserialize, Serialize};

use crate::error::CastError;
use crate::stream::chunk::DEFAULT_MAX_PAYLOAD;

// ── DispatcherConfig ─────────────────────────────────────────────

/// Tuning for the encode/transmit worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Concurrent encode+transmit workers.
    pub workers: usize,
    /// Queued-but-unstarted frames kept before the oldest is shed.
    pub queue_capacity: usize,
    /// JPEG quality 0..=100.
    pub quality: u8,
    /// Maximum chunk payload bytes per datagram.
    pub max_payload: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            workers: 3,
            queue_capacity: 8,
            quality: 50,
            max_payload: DEFAULT_MAX_PAYLOAD,
        }
    }
}

impl DispatcherConfig {
    /// Reject settings that cannot produce a working pipeline.
    /// Fatal at startup, never retried.
    pub fn validate(&self) -> Result<(), CastError> {
        if self.workers == 0 {
            return Err(CastError::Config("workers must be at least 1".into()));
        }
        if self.queue_capacity == 0 {
            return Err(CastError::Config("queue_capacity must be at least 1".into()));
        }
        if self.quality > 100 {
            return Err(CastError::Config(format!(
                "quality {} out of range (0..=100)",
                self.quality
            )));
        }
        if self.max_payload == 0 {
            return Err(CastError::Config("max_payload must be at least 1".into()));
        }
        Ok(())
    }
}

// ── PacerConfig ──────────────────────────────────────────────────

/// Target cadence for the capture loop.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PacerConfig {
    /// Frames per second; the sender derives this from the display
    /// refresh probe unless overridden.
    pub target_fps: u32,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self { target_fps: 60 }
    }
}

impl PacerConfig {
    pub fn validate(&self) -> Result<(), CastError> {
        if self.target_fps == 0 {
            return Err(CastError::Config("target_fps must be at least 1".into()));
        }
        Ok(())
    }
}

// ── ReassemblerConfig ────────────────────────────────────────────

/// Receiver-side buffering policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ReassemblerConfig {
    /// Milliseconds a partial frame may sit without a new chunk before
    /// it is dropped. A small multiple of the pacing interval.
    pub staleness_ms: u64,
}

impl Default for ReassemblerConfig {
    fn default() -> Self {
        Self { staleness_ms: 200 }
    }
}

impl ReassemblerConfig {
    pub fn validate(&self) -> Result<(), CastError> {
        if self.staleness_ms == 0 {
            return Err(CastError::Config("staleness_ms must be at least 1".into()));
        }
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────
