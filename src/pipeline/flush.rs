//! The periodic flush task.
//!
//! A single tokio task owns the accumulator, the file cursor, and the sink.
//! It selects over the ingest queue (format and buffer each sample) and a
//! fixed-period timer (rotate if due, then append the drained batch). When
//! the queue closes it drains what is left and performs one final flush, so
//! stopping a session never silently discards buffered data.
//!
//! A storage failure costs exactly the in-flight batch: the error is logged,
//! `dropped_batches` is bumped, and the task keeps accepting new samples.
//! There is no retry.

use crate::pipeline::batch::BatchAccumulator;
use crate::pipeline::ingest::IngestReceiver;
use crate::pipeline::rotation::{FileCursor, RotationPolicy};
use crate::pipeline::writer::LogSink;
use crate::pipeline::PipelineStats;
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Consumer-side worker: receives samples, batches lines, flushes on a timer.
pub struct FlushWorker {
    rx: IngestReceiver,
    sink: Box<dyn LogSink>,
    rotation: RotationPolicy,
    file_prefix: String,
    interval: Duration,
    stats: Arc<PipelineStats>,
}

impl FlushWorker {
    /// Assemble a worker. `interval` is the flush-cycle period.
    pub fn new(
        rx: IngestReceiver,
        sink: Box<dyn LogSink>,
        rotation: RotationPolicy,
        file_prefix: impl Into<String>,
        interval: Duration,
        stats: Arc<PipelineStats>,
    ) -> Self {
        Self {
            rx,
            sink,
            rotation,
            file_prefix: file_prefix.into(),
            interval,
            stats,
        }
    }

    /// Run until the ingest queue closes, then drain and final-flush.
    pub async fn run(mut self) {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; consume it so the first
        // flush cycle happens one full interval from now.
        ticker.tick().await;

        let mut acc = BatchAccumulator::new();
        let mut cursor = FileCursor::open(&self.rotation, &self.file_prefix, Local::now());

        loop {
            tokio::select! {
                sample = self.rx.recv() => match sample {
                    Some(sample) => acc.append(sample.log_line()),
                    None => break,
                },
                _ = ticker.tick() => {
                    Self::flush(
                        &mut *self.sink,
                        &self.rotation,
                        &self.file_prefix,
                        &self.stats,
                        &mut acc,
                        &mut cursor,
                    )
                    .await;
                }
            }
        }

        // Queue closed: pick up anything still in flight, flush once more.
        while let Some(sample) = self.rx.try_recv() {
            acc.append(sample.log_line());
        }
        Self::flush(
            &mut *self.sink,
            &self.rotation,
            &self.file_prefix,
            &self.stats,
            &mut acc,
            &mut cursor,
        )
        .await;
        debug!("flush worker stopped");
    }

    async fn flush(
        sink: &mut dyn LogSink,
        rotation: &RotationPolicy,
        file_prefix: &str,
        stats: &Arc<PipelineStats>,
        acc: &mut BatchAccumulator,
        cursor: &mut FileCursor,
    ) {
        if acc.is_empty() {
            return;
        }

        let now = Local::now();
        if rotation.should_rotate(cursor, now) {
            let next = FileCursor::open(rotation, file_prefix, now);
            debug!(
                from = cursor.file_name(),
                to = next.file_name(),
                "rotating output file"
            );
            *cursor = next;
        }

        let batch = acc.drain_batch();
        match sink.append_lines(cursor.file_name(), &batch).await {
            Ok(()) => {
                cursor.advance(batch.len());
                PipelineStats::add(&stats.batches_flushed, 1);
                PipelineStats::add(&stats.lines_written, batch.len() as u64);
            }
            Err(e) => {
                // Accepted loss: the drained batch is gone, the pipeline
                // keeps running.
                warn!(error = %e, lines = batch.len(), "flush failed, batch dropped");
                PipelineStats::add(&stats.dropped_batches, 1);
            }
        }
    }
}
