//! Configuration for the sender.

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use framecast_core::{CastError, DispatcherConfig, PacerConfig};

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderConfig {
    /// Destination and socket settings.
    pub network: NetworkConfig,
    /// Frame production settings.
    pub video: VideoConfig,
    /// Worker pool, quality and chunking.
    pub dispatch: DispatcherConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Receiver host.
    pub destination: String,
    /// Receiver UDP port.
    pub port: u16,
    /// Advisory socket-buffer sizing, also the receiver's datagram
    /// buffer floor. Must exceed the largest datagram.
    pub send_buffer_hint: usize,
}

/// Frame production configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    /// Output frame width after resize.
    pub width: u32,
    /// Output frame height after resize.
    pub height: u32,
    /// Frames per loop of the built-in pattern source.
    pub frames_per_loop: u64,
    /// Target frames per second. 0 probes the display refresh rate.
    pub target_fps: u32,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
}

// ── Defaults ─────────────────────────────────────────────────────

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            destination: "127.0.0.1".into(),
            port: 9999,
            send_buffer_hint: 65_536,
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            frames_per_loop: 600,
            target_fps: 0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

// ── Loading ──────────────────────────────────────────────────────

impl SenderConfig {
    /// Load configuration from a TOML file, falling back to defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("invalid config {}: {e}; using defaults", path.display());
                Self::default()
            }),
            Err(_) => {
                tracing::info!("no config at {}; using defaults", path.display());
                Self::default()
            }
        }
    }

    /// Reject settings that cannot start the pipeline. Fatal at startup.
    pub fn validate(&self) -> Result<(), CastError> {
        self.dispatch.validate()?;
        if self.video.width == 0 || self.video.height == 0 {
            return Err(CastError::Config("video dimensions must be non-zero".into()));
        }
        if self.video.frames_per_loop == 0 {
            return Err(CastError::Config(
                "frames_per_loop must be at least 1".into(),
            ));
        }
        let max_datagram = framecast_core::stream::HEADER_SIZE + self.dispatch.max_payload;
        if self.network.send_buffer_hint < max_datagram {
            return Err(CastError::Config(format!(
                "send_buffer_hint {} is below the largest datagram ({max_datagram})",
                self.network.send_buffer_hint
            )));
        }
        Ok(())
    }

    /// The resolved destination socket address.
    pub fn destination(&self) -> Result<SocketAddr, CastError> {
        format!("{}:{}", self.network.destination, self.network.port)
            .parse()
            .map_err(|e| CastError::Config(format!("bad destination address: {e}")))
    }

    /// Pacing settings, with `detected_hz` filling an unset target.
    pub fn to_pacer_config(&self, detected_hz: u32) -> PacerConfig {
        PacerConfig {
            target_fps: if self.video.target_fps > 0 {
                self.video.target_fps
            } else {
                detected_hz
            },
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
