//! framecast receiver — entry point.
//!
//! ```text
//! framecast-receiver                  Listen per framecast-receiver.toml
//! framecast-receiver --config <path>  Load a custom config TOML
//! framecast-receiver --port <port>    Override the listen port
//! framecast-receiver --gen-config     Write default config to stdout
//! ```
//!
//! Completed frames are consumed and summarised; wiring them into a
//! decoder/display is the embedding application's job.

mod config;

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::UdpSocket;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use framecast_core::StreamReceiver;
use framecast_core::stream::chunk::unix_time_ms;

use crate::config::ReceiverConfig;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "framecast-receiver", about = "framecast UDP frame receiver")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "framecast-receiver.toml")]
    config: PathBuf,

    /// Override the listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&ReceiverConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let mut config = ReceiverConfig::load(&cli.config);
    if let Some(port) = cli.port {
        config.network.port = port;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    config.validate()?;
    let bind_addr = config.bind_addr()?;

    info!("framecast-receiver v{}", env!("CARGO_PKG_VERSION"));
    info!("listening on {bind_addr}");
    info!("staleness window: {} ms", config.reassembly.staleness_ms);

    let socket = UdpSocket::bind(bind_addr).await?;
    let (receiver, mut frames) =
        StreamReceiver::new(socket, config.reassembly, config.network.recv_buffer)?;
    let stats = receiver.stats_receiver();
    let stop = receiver.stop_handle();

    // Ctrl-C handler.
    let stop_clone = stop.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received — shutting down");
        stop_clone.store(false, std::sync::atomic::Ordering::SeqCst);
    });

    let recv_handle = tokio::spawn(receiver.run());

    // Consume frames and report once a second.
    let mut report = tokio::time::interval(Duration::from_secs(1));
    report.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            frame = frames.recv() => {
                match frame {
                    Some(frame) => {
                        // End-to-end latency from the sender's stamp.
                        let latency_ms = unix_time_ms() - frame.timestamp_ms;
                        debug!(
                            frame_id = frame.frame_id,
                            bytes = frame.payload.len(),
                            latency_ms,
                            "frame delivered"
                        );
                    }
                    None => break,
                }
            }
            _ = report.tick() => {
                let s = stats.borrow().clone();
                info!(
                    fps = s.fps,
                    completed = s.frames_completed,
                    dropped = s.frames_dropped,
                    malformed = s.malformed_datagrams,
                    bytes = s.bytes_received,
                    "stream stats"
                );
            }
        }
    }

    let _ = recv_handle.await;
    info!("receiver stopped");

    Ok(())
}
