//! framecast sender — entry point.
//!
//! ```text
//! framecast-sender                    Stream with framecast-sender.toml
//! framecast-sender --config <path>    Load a custom config TOML
//! framecast-sender --destination <ip> Override the receiver host
//! framecast-sender --port <port>      Override the receiver port
//! framecast-sender --gen-config       Write default config to stdout
//! ```

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use framecast_core::{
    Dispatcher, JpegFrameEncoder, Pacer, TestPatternSource, UdpSink, detect_refresh_rate,
};

use crate::config::SenderConfig;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "framecast-sender", about = "framecast paced UDP frame sender")]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, default_value = "framecast-sender.toml")]
    config: PathBuf,

    /// Override the receiver host.
    #[arg(short, long)]
    destination: Option<String>,

    /// Override the receiver UDP port.
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

    // --gen-config: dump defaults and exit.
    if cli.gen_config {
        let text = toml::to_string_pretty(&SenderConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    // Load config, apply CLI overrides.
    let mut config = SenderConfig::load(&cli.config);
    if let Some(destination) = cli.destination {
        config.network.destination = destination;
    }
    if let Some(port) = cli.port {
        config.network.port = port;
    }

    // Init tracing.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    config.validate()?;
    let destination = config.destination()?;

    // Target rate: explicit config wins, otherwise probe the display.
    let pacer_config = config.to_pacer_config(detect_refresh_rate());

    info!("framecast-sender v{}", env!("CARGO_PKG_VERSION"));
    info!("destination: {destination}");
    info!("target FPS: {}", pacer_config.target_fps);
    info!(
        "frame size: {}x{} @ quality {}",
        config.video.width, config.video.height, config.dispatch.quality
    );
    info!(
        "workers: {}, max chunk payload: {}, send buffer hint: {}",
        config.dispatch.workers, config.dispatch.max_payload, config.network.send_buffer_hint
    );

    // Wire the pipeline: source → pacer → dispatcher → UDP.
    let sink = Arc::new(UdpSink::connect(destination).await?);
    let dispatcher = Dispatcher::spawn(
        config.dispatch.clone(),
        Arc::new(JpegFrameEncoder::new()),
        sink,
    )?;
    let source = TestPatternSource::new(
        config.video.width,
        config.video.height,
        config.video.frames_per_loop,
    )?;
    let pacer = Pacer::new(Box::new(source), dispatcher, pacer_config)?;
    let stop = pacer.stop_handle();

    // Ctrl-C handler.
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Ctrl-C received — shutting down");
        stop.store(false, std::sync::atomic::Ordering::SeqCst);
    });

    pacer.run().await?;
    info!("sender stopped");

    Ok(())
}
