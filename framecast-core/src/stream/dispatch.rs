//! Frame dispatch: a bounded work queue drained by a fixed worker pool.
//!
//! The pacer submits owned frames; each worker independently encodes,
//! fragments, and transmits one frame at a time. Submission never blocks
//! the pacing loop — when the queue is full the **oldest** unstarted
//! frame is shed, so the freshest frame always survives. A failure in
//! one worker is logged and confined to that frame.
//!
//! Because the pool plus the queue bound how many frames are in flight
//! between encode start and transmit completion, the 8-bit identifier
//! space never holds two live frames with the same id.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::config::DispatcherConfig;
use crate::error::CastError;
use crate::stream::chunk::unix_time_ms;
use crate::stream::encode::FrameEncoder;
use crate::stream::fragment::fragment;
use crate::stream::transport::DatagramSink;
use crate::stream::types::{EncodedFrame, RawFrame};

/// How long an idle worker sleeps between shutdown-flag checks.
const IDLE_RECHECK: Duration = Duration::from_millis(50);

// ── FrameJob ─────────────────────────────────────────────────────

/// One unit of work: an owned frame plus its wire tags, stamped at
/// submission time.
#[derive(Debug)]
struct FrameJob {
    frame: RawFrame,
    frame_id: u8,
    timestamp_ms: f64,
    sequence: u64,
}

// ── Shared worker state ──────────────────────────────────────────

/// Everything the workers share: the queue, the wake-up signal, the
/// shutdown flag, the counters, and the pipeline handles.
struct Shared {
    queue: Mutex<VecDeque<FrameJob>>,
    notify: Notify,
    closed: AtomicBool,
    submitted: AtomicU64,
    completed: AtomicU64,
    shed: AtomicU64,
    failed: AtomicU64,
    encoder: Arc<dyn FrameEncoder>,
    sink: Arc<dyn DatagramSink>,
    quality: u8,
    max_payload: usize,
}

// ── Dispatcher ───────────────────────────────────────────────────

/// Bounded concurrency pool for encode + fragment + transmit.
pub struct Dispatcher {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
    queue_capacity: usize,
}

impl Dispatcher {
    /// Validate `config` and spawn the worker pool.
    pub fn spawn(
        config: DispatcherConfig,
        encoder: Arc<dyn FrameEncoder>,
        sink: Arc<dyn DatagramSink>,
    ) -> Result<Self, CastError> {
        config.validate()?;

        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            closed: AtomicBool::new(false),
            submitted: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            shed: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            encoder,
            sink,
            quality: config.quality,
            max_payload: config.max_payload,
        });

        let workers = (0..config.workers)
            .map(|worker_id| tokio::spawn(worker_loop(worker_id, Arc::clone(&shared))))
            .collect();

        Ok(Self {
            shared,
            workers,
            queue_capacity: config.queue_capacity,
        })
    }

    /// Hand one owned frame to the pool.
    ///
    /// Stamps `frame_id = sequence % 256` and the wall-clock timestamp,
    /// then enqueues. Returns quickly in all cases — on overflow the
    /// oldest queued job is dropped, never the caller's time.
    pub async fn submit(&self, frame: RawFrame, sequence: u64) {
        let job = FrameJob {
            frame,
            frame_id: (sequence % 256) as u8,
            timestamp_ms: unix_time_ms(),
            sequence,
        };

        {
            let mut queue = self.shared.queue.lock().await;
            if queue.len() >= self.queue_capacity {
                if let Some(shed) = queue.pop_front() {
                    warn!(
                        sequence = shed.sequence,
                        frame_id = shed.frame_id,
                        "worker queue full; shedding oldest queued frame"
                    );
                    self.shared.shed.fetch_add(1, Ordering::Relaxed);
                }
            }
            queue.push_back(job);
        }

        self.shared.submitted.fetch_add(1, Ordering::Relaxed);
        self.shared.notify.notify_one();
    }

    /// Stop intake, drain the queue, and join every worker exactly once.
    /// In-flight jobs run to completion.
    pub async fn shutdown(self) {
        self.shared.closed.store(true, Ordering::SeqCst);
        self.shared.notify.notify_waiters();
        for handle in self.workers {
            let _ = handle.await;
        }
    }

    /// Frames accepted by `submit`.
    pub fn frames_submitted(&self) -> u64 {
        self.shared.submitted.load(Ordering::Relaxed)
    }

    /// Frames fully encoded and transmitted.
    pub fn frames_completed(&self) -> u64 {
        self.shared.completed.load(Ordering::Relaxed)
    }

    /// Frames shed under queue overflow.
    pub fn frames_shed(&self) -> u64 {
        self.shared.shed.load(Ordering::Relaxed)
    }

    /// Frames lost to encode or transmit errors.
    pub fn frames_failed(&self) -> u64 {
        self.shared.failed.load(Ordering::Relaxed)
    }
}

// ── Worker ───────────────────────────────────────────────────────

async fn worker_loop(worker_id: usize, shared: Arc<Shared>) {
    loop {
        let job = {
            let mut queue = shared.queue.lock().await;
            queue.pop_front()
        };

        match job {
            Some(job) => {
                let sequence = job.sequence;
                match process_job(job, &shared).await {
                    Ok(chunks) => {
                        shared.completed.fetch_add(1, Ordering::Relaxed);
                        debug!(worker_id, sequence, chunks, "frame transmitted");
                    }
                    Err(e) => {
                        // One bad frame never takes the pool down.
                        shared.failed.fetch_add(1, Ordering::Relaxed);
                        warn!(worker_id, sequence, error = %e, "frame dropped");
                    }
                }
            }
            None => {
                if shared.closed.load(Ordering::SeqCst) {
                    break;
                }
                // Bounded wait so a shutdown signalled between the pop and
                // this await is noticed on the next pass.
                let _ = tokio::time::timeout(IDLE_RECHECK, shared.notify.notified()).await;
            }
        }
    }
}

/// Encode, fragment, and transmit one frame. Returns the chunk count.
async fn process_job(job: FrameJob, shared: &Shared) -> Result<usize, CastError> {
    let data = shared.encoder.encode(&job.frame, shared.quality)?;
    let encoded = EncodedFrame {
        frame_id: job.frame_id,
        timestamp_ms: job.timestamp_ms,
        data,
    };

    let chunks = fragment(&encoded, shared.max_payload)?;
    for chunk in &chunks {
        shared.sink.send(&chunk.to_datagram()).await?;
    }
    Ok(chunks.len())
}

// ── Tests ────────────────────────────────────────────────────────
