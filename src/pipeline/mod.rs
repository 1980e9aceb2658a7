//! The ingestion and durable-logging pipeline.
//!
//! Data path: transport pump pushes decoded [`crate::frame::Sample`]s into
//! the [`ingest`] queue; a single flush task formats them into log lines,
//! accumulates them in a [`batch::BatchAccumulator`], and on every timer tick
//! evaluates the [`rotation`] policy and appends the drained batch through a
//! [`writer::LogSink`]. All file I/O lives on the flush task; the producer
//! side never blocks on disk.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

pub mod batch;
pub mod flush;
pub mod ingest;
pub mod rotation;
pub mod writer;

/// Shared pipeline counters, readable from any thread.
///
/// `dropped_batches` exists because storage failures are deliberately not
/// surfaced to the producer side; without a counter they would be silent.
#[derive(Debug, Default)]
pub struct PipelineStats {
    /// Samples accepted into the ingest queue.
    pub samples_enqueued: AtomicU64,
    /// Frames rejected by the decoder (too short).
    pub frames_rejected: AtomicU64,
    /// Samples dropped by a bounded queue's overflow policy.
    pub samples_dropped: AtomicU64,
    /// Flush cycles that appended a batch successfully.
    pub batches_flushed: AtomicU64,
    /// Log lines written to disk.
    pub lines_written: AtomicU64,
    /// Batches lost to storage failures (accepted-loss policy).
    pub dropped_batches: AtomicU64,
}

impl PipelineStats {
    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::SeqCst);
    }

    /// A plain-value copy of the counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            samples_enqueued: self.samples_enqueued.load(Ordering::SeqCst),
            frames_rejected: self.frames_rejected.load(Ordering::SeqCst),
            samples_dropped: self.samples_dropped.load(Ordering::SeqCst),
            batches_flushed: self.batches_flushed.load(Ordering::SeqCst),
            lines_written: self.lines_written.load(Ordering::SeqCst),
            dropped_batches: self.dropped_batches.load(Ordering::SeqCst),
        }
    }
}

/// Point-in-time view of [`PipelineStats`].
#[derive(Clone, Copy, Debug, Default, Serialize)]
#[allow(missing_docs)]
pub struct StatsSnapshot {
    pub samples_enqueued: u64,
    pub frames_rejected: u64,
    pub samples_dropped: u64,
    pub batches_flushed: u64,
    pub lines_written: u64,
    pub dropped_batches: u64,
}
