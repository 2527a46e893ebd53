//! Configuration for the receiver.

use std::net::SocketAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};

use framecast_core::{CastError, ReassemblerConfig};
use framecast_core::stream::HEADER_SIZE;

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiverConfig {
    pub network: NetworkConfig,
    pub reassembly: ReassemblerConfig,
    pub logging: LoggingConfig,
}

/// Network configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Interface to bind.
    pub listen: String,
    /// UDP port to bind.
    pub port: u16,
    /// Datagram buffer size; must exceed the largest expected datagram
    /// (the sender's header + max_payload).
    pub recv_buffer: usize,
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
            listen: "0.0.0.0".into(),
            port: 9999,
            recv_buffer: 65_536,
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

impl ReceiverConfig {
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

    pub fn validate(&self) -> Result<(), CastError> {
        self.reassembly.validate()?;
        if self.network.recv_buffer <= HEADER_SIZE {
            return Err(CastError::Config(format!(
                "recv_buffer {} cannot hold a datagram",
                self.network.recv_buffer
            )));
        }
        Ok(())
    }

    /// The resolved bind address.
    pub fn bind_addr(&self) -> Result<SocketAddr, CastError> {
        format!("{}:{}", self.network.listen, self.network.port)
            .parse()
            .map_err(|e| CastError::Config(format!("bad listen address: {e}")))
    }
}

// ── Tests ────────────────────────────────────────────────────────
