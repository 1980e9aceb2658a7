//! Recording session orchestration.
//!
//! A [`RecordingSession`] wires one device stream end to end: a pump task
//! that drives the transport (scan, connect, decode, gate, enqueue) and a
//! flush task that owns batching and file I/O. The two meet only at the
//! ingest queue.
//!
//! Samples are persisted only while the `recording_active` flag is set. The
//! flag is independent of connection state: frames arriving while the flag
//! is off are discarded, and toggling the flag does not touch the
//! connection.
//!
//! Stopping a session follows a fixed order: the flag flips synchronously,
//! the pump is told to shut down and closes the transport, the queue closes
//! behind it, and the flush task drains and performs a final flush before
//! exiting. Nothing buffered is silently discarded.

use crate::config::StreamConfig;
use crate::connection::{ConnectionState, ConnectionSupervisor};
use crate::frame::{Framing, LineFramer};
use crate::pipeline::flush::FlushWorker;
use crate::pipeline::ingest;
use crate::pipeline::writer::LogSink;
use crate::pipeline::{PipelineStats, StatsSnapshot};
use crate::transport::{FrameSource, TransportEvent};
use chrono::Local;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A running acquisition session for one device stream.
pub struct RecordingSession {
    recording_active: Arc<AtomicBool>,
    stats: Arc<PipelineStats>,
    state_rx: watch::Receiver<ConnectionState>,
    shutdown_tx: watch::Sender<bool>,
    pump: JoinHandle<()>,
    flusher: JoinHandle<()>,
}

impl RecordingSession {
    /// Spawn the pump and flush tasks for `stream`.
    ///
    /// The session starts with recording active. `sink` receives the drained
    /// batches; pass a [`crate::pipeline::writer::CsvAppender`] for real
    /// files.
    pub fn start(
        stream: StreamConfig,
        batch_interval: Duration,
        mut source: Box<dyn FrameSource>,
        sink: Box<dyn LogSink>,
    ) -> Self {
        let recording_active = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(PipelineStats::default());
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let supervisor = ConnectionSupervisor::new(stream.auto_rescan);
        let state_rx = supervisor.subscribe();

        let (tx, rx) = ingest::channel(stream.queue, stats.clone());

        let flusher = tokio::spawn(
            FlushWorker::new(
                rx,
                sink,
                stream.rotation,
                stream.file_prefix.clone(),
                batch_interval,
                stats.clone(),
            )
            .run(),
        );

        let active = recording_active.clone();
        let pump_stats = stats.clone();
        let pump = tokio::spawn(async move {
            info!(stream = %stream.id, device = %stream.device_name, "starting acquisition");
            if supervisor
                .start_scan(source.as_mut(), &stream.device_name)
                .await
                .is_err()
            {
                // State already carries the error; nothing to pump.
                let _ = source.close().await;
                return;
            }

            let mut framer = match stream.framing {
                Framing::NewlineDelimited => {
                    Some(LineFramer::new(stream.layout.min_frame_bytes()))
                }
                Framing::Datagram => None,
            };

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    event = source.next_event() => match event {
                        None => break,
                        Some(TransportEvent::Frame(raw)) => {
                            if !active.load(Ordering::SeqCst) {
                                continue;
                            }
                            let frames = match framer.as_mut() {
                                Some(framer) => framer.push(&raw),
                                None => vec![raw],
                            };
                            for raw in frames {
                                match stream.layout.decode(&raw, Local::now()) {
                                    Ok(sample) => tx.push(sample).await,
                                    Err(e) => {
                                        debug!(error = %e, "dropping undecodable frame");
                                        PipelineStats::add(&pump_stats.frames_rejected, 1);
                                    }
                                }
                            }
                        }
                        Some(TransportEvent::Link(link)) => {
                            if supervisor.on_link_event(link) {
                                if let Err(e) = supervisor
                                    .start_scan(source.as_mut(), &stream.device_name)
                                    .await
                                {
                                    warn!(error = %e, "automatic rescan failed");
                                }
                            }
                        }
                    }
                }
            }

            if let Err(e) = source.close().await {
                warn!(error = %e, "transport close failed");
            }
            // Dropping `tx` here closes the queue; the flush worker drains
            // and exits after its final flush.
        });

        Self {
            recording_active,
            stats,
            state_rx,
            shutdown_tx,
            pump,
            flusher,
        }
    }

    /// Handle for toggling whether decoded samples are persisted.
    pub fn recording_handle(&self) -> Arc<AtomicBool> {
        self.recording_active.clone()
    }

    /// Shared pipeline counters.
    pub fn stats(&self) -> Arc<PipelineStats> {
        self.stats.clone()
    }

    /// Observe connection state changes.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Stop accepting samples, let the in-flight flush complete, release the
    /// transport and file resources, and return the final counters.
    pub async fn stop(self) -> StatsSnapshot {
        self.recording_active.store(false, Ordering::SeqCst);
        let _ = self.shutdown_tx.send(true);

        if let Err(e) = self.pump.await {
            warn!(error = %e, "pump task did not shut down cleanly");
        }
        if let Err(e) = self.flusher.await {
            warn!(error = %e, "flush task did not shut down cleanly");
        }

        let snapshot = self.stats.snapshot();
        info!(
            lines = snapshot.lines_written,
            dropped_batches = snapshot.dropped_batches,
            "session stopped"
        );
        snapshot
    }
}
