//! Receiver-side stream service.
//!
//! Binds a UDP socket, feeds every datagram through the [`Reassembler`],
//! and publishes complete frames on an `mpsc` channel in completion
//! order. A periodic tick evicts stale partial frames so a permanently
//! missing chunk can never pin memory. Statistics are published on a
//! `watch` channel for the consumer to render.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::config::ReassemblerConfig;
use crate::error::CastError;
use crate::stream::chunk::{Chunk, HEADER_SIZE};
use crate::stream::reassembly::Reassembler;
use crate::stream::types::ReassembledFrame;

/// Completed frames buffered for a slow consumer before new completions
/// are shed.
const FRAME_CHANNEL_CAPACITY: usize = 8;

// ── ReceiverStats ────────────────────────────────────────────────

/// Running statistics exposed to the consumer.
#[derive(Debug, Clone, Default)]
pub struct ReceiverStats {
    /// Smoothed frames per second over the recent window.
    pub fps: f64,
    /// Frames fully reassembled and delivered.
    pub frames_completed: u64,
    /// Partial frames dropped (stale or superseded).
    pub frames_dropped: u64,
    /// Datagrams that failed header parsing or chunk validation.
    pub malformed_datagrams: u64,
    /// Total bytes received off the socket.
    pub bytes_received: u64,
}

// ── StreamReceiver ───────────────────────────────────────────────

/// Datagram-to-frame receive loop.
pub struct StreamReceiver {
    socket: UdpSocket,
    reassembler: Reassembler,
    staleness: Duration,
    recv_buffer_bytes: usize,
    running: Arc<AtomicBool>,
    frame_tx: mpsc::Sender<ReassembledFrame>,
    stats_tx: watch::Sender<ReceiverStats>,
    stats_rx: watch::Receiver<ReceiverStats>,
}

impl StreamReceiver {
    /// Wrap a bound socket. `recv_buffer_bytes` must hold the largest
    /// expected datagram (header + `max_payload`); the sender's
    /// send-buffer hint is the natural value.
    ///
    /// Returns the receiver and the channel that yields completed frames.
    pub fn new(
        socket: UdpSocket,
        config: ReassemblerConfig,
        recv_buffer_bytes: usize,
    ) -> Result<(Self, mpsc::Receiver<ReassembledFrame>), CastError> {
        config.validate()?;
        if recv_buffer_bytes <= HEADER_SIZE {
            return Err(CastError::Config(format!(
                "recv_buffer_bytes {recv_buffer_bytes} cannot hold a header ({HEADER_SIZE} bytes) plus payload"
            )));
        }

        let staleness = Duration::from_millis(config.staleness_ms);
        let (frame_tx, frame_rx) = mpsc::channel(FRAME_CHANNEL_CAPACITY);
        let (stats_tx, stats_rx) = watch::channel(ReceiverStats::default());

        Ok((
            Self {
                socket,
                reassembler: Reassembler::new(staleness),
                staleness,
                recv_buffer_bytes,
                running: Arc::new(AtomicBool::new(false)),
                frame_tx,
                stats_tx,
                stats_rx,
            },
            frame_rx,
        ))
    }

    /// A cloneable stop handle.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Obtain a `watch::Receiver` for statistics.
    pub fn stats_receiver(&self) -> watch::Receiver<ReceiverStats> {
        self.stats_rx.clone()
    }

    /// Run the receive loop until the stop handle flips or the frame
    /// consumer goes away.
    pub async fn run(mut self) -> Result<(), CastError> {
        self.running.store(true, Ordering::SeqCst);
        let local = self.socket.local_addr()?;
        info!(%local, "receiver listening");

        let mut buf = vec![0u8; self.recv_buffer_bytes];
        // Evict well inside the window so stale buffers go promptly.
        let mut tick = tokio::time::interval(self.staleness / 2);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut malformed: u64 = 0;
        let mut bytes_received: u64 = 0;
        let mut completion_times: Vec<Instant> = Vec::with_capacity(120);

        while self.running.load(Ordering::SeqCst) {
            tokio::select! {
                received = self.socket.recv_from(&mut buf) => {
                    let (len, _) = received?;
                    bytes_received += len as u64;

                    let chunk = match Chunk::from_datagram(&buf[..len]) {
                        Ok(chunk) => chunk,
                        Err(e) => {
                            malformed += 1;
                            debug!(error = %e, len, "discarding malformed datagram");
                            continue;
                        }
                    };

                    match self.reassembler.accept(chunk, Instant::now()) {
                        Ok(Some(frame)) => {
                            completion_times.push(Instant::now());
                            if completion_times.len() > 60 {
                                completion_times.remove(0);
                            }
                            match self.frame_tx.try_send(frame) {
                                Ok(()) => {}
                                Err(mpsc::error::TrySendError::Full(frame)) => {
                                    // Consumer can't keep up — shed the frame.
                                    warn!(
                                        frame_id = frame.frame_id,
                                        "consumer backlog full; dropping completed frame"
                                    );
                                }
                                Err(mpsc::error::TrySendError::Closed(_)) => {
                                    info!("frame consumer gone; stopping receiver");
                                    break;
                                }
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            malformed += 1;
                            debug!(error = %e, "discarding inconsistent chunk");
                        }
                    }
                }
                _ = tick.tick() => {
                    self.reassembler.evict_stale(Instant::now());
                    let _ = self.stats_tx.send(ReceiverStats {
                        fps: smoothed_fps(&completion_times),
                        frames_completed: self.reassembler.completed_frames(),
                        frames_dropped: self.reassembler.dropped_frames(),
                        malformed_datagrams: malformed,
                        bytes_received,
                    });
                }
            }
        }

        self.running.store(false, Ordering::SeqCst);
        info!("receiver stopped");
        Ok(())
    }
}

/// Average completion rate over the recorded window.
fn smoothed_fps(completion_times: &[Instant]) -> f64 {
    if completion_times.len() < 2 {
        return 0.0;
    }
    let first = completion_times[0];
    let last = completion_times[completion_times.len() - 1];
    let span = last.duration_since(first).as_secs_f64();
    if span > 0.0 {
        (completion_times.len() - 1) as f64 / span
    } else {
        0.0
    }
}

// ── Tests ────────────────────────────────────────────────────────
