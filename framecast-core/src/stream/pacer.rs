//! Fixed-interval capture pacing.
//!
//! The pacer is the only component that touches the frame source. Each
//! iteration pulls one frame, hands ownership to the dispatcher, then
//! sleeps for whatever remains of the target interval. Processing jitter
//! is absorbed within a single iteration — a slow tick shortens the next
//! sleep to zero but never goes negative and never accumulates drift
//! compensation across iterations.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::PacerConfig;
use crate::error::CastError;
use crate::stream::dispatch::Dispatcher;
use crate::stream::source::VideoSource;

/// Remaining sleep for one iteration: never negative.
fn sleep_budget(interval: Duration, elapsed: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

// ── Pacer ────────────────────────────────────────────────────────

/// Drives the capture loop at `1 / target_fps`.
///
/// Owns the [`VideoSource`] exclusively and a [`Dispatcher`]; both are
/// released exactly once when [`run`](Self::run) returns — the
/// dispatcher by an explicit drain, the source by drop.
pub struct Pacer {
    source: Box<dyn VideoSource>,
    dispatcher: Dispatcher,
    interval: Duration,
    running: Arc<AtomicBool>,
    sequence: u64,
}

impl Pacer {
    pub fn new(
        source: Box<dyn VideoSource>,
        dispatcher: Dispatcher,
        config: PacerConfig,
    ) -> Result<Self, CastError> {
        config.validate()?;
        Ok(Self {
            source,
            dispatcher,
            interval: Duration::from_secs_f64(1.0 / config.target_fps as f64),
            running: Arc::new(AtomicBool::new(false)),
            sequence: 0,
        })
    }

    /// A cloneable handle that stops the loop from another task.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// The pacing interval derived from the configured rate.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run until the stop handle flips.
    ///
    /// End-of-stream rewinds the source and keeps going; a source error
    /// skips the tick. On exit the dispatcher is drained and joined, and
    /// dropping `self` releases the source.
    pub async fn run(mut self) -> Result<(), CastError> {
        self.running.store(true, Ordering::SeqCst);
        info!(interval_ms = self.interval.as_millis() as u64, "pacer started");

        while self.running.load(Ordering::SeqCst) {
            let tick_start = Instant::now();

            match self.source.next_frame() {
                Ok(Some(frame)) => {
                    self.dispatcher.submit(frame, self.sequence).await;
                    self.sequence += 1;
                }
                Ok(None) => {
                    // Loop the source back to its first frame.
                    if let Err(e) = self.source.rewind() {
                        warn!(error = %e, "source rewind failed; retrying next tick");
                    }
                    tokio::task::yield_now().await;
                    continue;
                }
                Err(e) => {
                    warn!(error = %e, "source error; skipping tick");
                }
            }

            let budget = sleep_budget(self.interval, tick_start.elapsed());
            if budget.is_zero() {
                // Behind schedule — don't sleep, but don't starve others.
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(budget).await;
            }
        }

        info!(frames = self.sequence, "pacer stopped; draining dispatcher");
        self.dispatcher.shutdown().await;
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────
