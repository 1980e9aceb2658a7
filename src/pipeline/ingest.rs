//! Producer/consumer hand-off channel.
//!
//! The transport callback pushes [`Sample`]s here; the flush task receives
//! them. The channel is the only synchronization primitive between the two
//! sides. Pushing never performs formatting or file I/O, and with the
//! default policy it never waits.
//!
//! The original system used an unlimited channel; that is still the default,
//! but a bounded capacity with an explicit overflow policy can be configured
//! instead so a stalled consumer cannot grow memory without bound.

use crate::frame::Sample;
use crate::pipeline::PipelineStats;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

/// Queue capacity policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum QueuePolicy {
    /// No capacity limit (the original behavior).
    #[default]
    Unbounded,
    /// Fixed capacity with an explicit overflow policy.
    Bounded {
        /// Maximum queued samples.
        capacity: usize,
        /// What to do when the queue is full.
        on_full: OverflowPolicy,
    },
}

/// What a full bounded queue does with a new sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverflowPolicy {
    /// Drop the incoming sample and count it.
    DropNewest,
    /// Wait for space. Opts the producer into backpressure; use only when
    /// the transport can tolerate it.
    Block,
}

enum SenderInner {
    Unbounded(mpsc::UnboundedSender<Sample>),
    Bounded {
        tx: mpsc::Sender<Sample>,
        on_full: OverflowPolicy,
    },
}

enum ReceiverInner {
    Unbounded(mpsc::UnboundedReceiver<Sample>),
    Bounded(mpsc::Receiver<Sample>),
}

/// Producer handle; owned by the transport pump.
pub struct IngestSender {
    inner: SenderInner,
    stats: Arc<PipelineStats>,
}

/// Consumer handle; owned by the flush task.
pub struct IngestReceiver {
    inner: ReceiverInner,
}

/// Create the hand-off channel for the given policy.
pub fn channel(policy: QueuePolicy, stats: Arc<PipelineStats>) -> (IngestSender, IngestReceiver) {
    match policy {
        QueuePolicy::Unbounded => {
            let (tx, rx) = mpsc::unbounded_channel();
            (
                IngestSender {
                    inner: SenderInner::Unbounded(tx),
                    stats,
                },
                IngestReceiver {
                    inner: ReceiverInner::Unbounded(rx),
                },
            )
        }
        QueuePolicy::Bounded { capacity, on_full } => {
            let (tx, rx) = mpsc::channel(capacity);
            (
                IngestSender {
                    inner: SenderInner::Bounded { tx, on_full },
                    stats,
                },
                IngestReceiver {
                    inner: ReceiverInner::Bounded(rx),
                },
            )
        }
    }
}

impl IngestSender {
    /// Hand a sample to the consumer side.
    ///
    /// Awaits only under `OverflowPolicy::Block` on a full queue; otherwise
    /// returns immediately. A sample pushed after the receiver is gone is
    /// discarded silently (the session is shutting down).
    pub async fn push(&self, sample: Sample) {
        match &self.inner {
            SenderInner::Unbounded(tx) => {
                if tx.send(sample).is_ok() {
                    PipelineStats::add(&self.stats.samples_enqueued, 1);
                }
            }
            SenderInner::Bounded { tx, on_full } => match on_full {
                OverflowPolicy::DropNewest => match tx.try_send(sample) {
                    Ok(()) => PipelineStats::add(&self.stats.samples_enqueued, 1),
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        trace!("ingest queue full, dropping sample");
                        PipelineStats::add(&self.stats.samples_dropped, 1);
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {}
                },
                OverflowPolicy::Block => {
                    if tx.send(sample).await.is_ok() {
                        PipelineStats::add(&self.stats.samples_enqueued, 1);
                    }
                }
            },
        }
    }
}

impl IngestReceiver {
    /// Receive the next sample; `None` once the sender is dropped and the
    /// queue is drained.
    pub async fn recv(&mut self) -> Option<Sample> {
        match &mut self.inner {
            ReceiverInner::Unbounded(rx) => rx.recv().await,
            ReceiverInner::Bounded(rx) => rx.recv().await,
        }
    }

    /// Non-blocking receive, used while draining at shutdown.
    pub fn try_recv(&mut self) -> Option<Sample> {
        match &mut self.inner {
            ReceiverInner::Unbounded(rx) => rx.try_recv().ok(),
            ReceiverInner::Bounded(rx) => rx.try_recv().ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;

    fn sample(value: f32) -> Sample {
        Sample {
            captured_at: Local::now(),
            device_tick: None,
            readings: vec![value],
        }
    }

    #[tokio::test]
    async fn unbounded_preserves_fifo_order() {
        let stats = Arc::new(PipelineStats::default());
        let (tx, mut rx) = channel(QueuePolicy::Unbounded, stats.clone());

        for i in 0..100 {
            tx.push(sample(i as f32)).await;
        }
        drop(tx);

        let mut received = Vec::new();
        while let Some(s) = rx.recv().await {
            received.push(s.readings[0]);
        }
        assert_eq!(received, (0..100).map(|i| i as f32).collect::<Vec<_>>());
        assert_eq!(stats.snapshot().samples_enqueued, 100);
    }

    #[tokio::test]
    async fn bounded_drop_newest_counts_overflow() {
        let stats = Arc::new(PipelineStats::default());
        let (tx, mut rx) = channel(
            QueuePolicy::Bounded {
                capacity: 2,
                on_full: OverflowPolicy::DropNewest,
            },
            stats.clone(),
        );

        for i in 0..5 {
            tx.push(sample(i as f32)).await;
        }

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.samples_enqueued, 2);
        assert_eq!(snapshot.samples_dropped, 3);

        // The oldest two survived.
        assert_eq!(rx.recv().await.map(|s| s.readings[0]), Some(0.0));
        assert_eq!(rx.recv().await.map(|s| s.readings[0]), Some(1.0));
    }

    #[tokio::test]
    async fn push_after_receiver_dropped_is_quiet() {
        let stats = Arc::new(PipelineStats::default());
        let (tx, rx) = channel(QueuePolicy::Unbounded, stats.clone());
        drop(rx);

        tx.push(sample(1.0)).await;
        assert_eq!(stats.snapshot().samples_enqueued, 0);
    }
}
