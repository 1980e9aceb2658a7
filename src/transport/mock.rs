//! Mock transport implementation.
//!
//! Stands in for real BLE/USB hardware in tests and demos. Two modes:
//!
//! - **Scripted**: replays a fixed sequence of events with per-event delays
//!   (configurable byte sequences and timing).
//! - **Generator**: produces synthetic frames of a given layout at a fixed
//!   rate, indefinitely. Used by the `record` subcommand.

use crate::error::{AcqError, AcqResult};
use crate::frame::{FrameLayout, RawFrame};
use crate::transport::{FrameSource, TransportEvent};
use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use rand::Rng;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::time::sleep;

/// One step of a scripted mock: wait, then deliver the event.
#[derive(Clone, Debug)]
pub struct ScriptStep {
    /// Delay before the event is delivered.
    pub delay: Duration,
    /// The event to deliver.
    pub event: TransportEvent,
}

impl ScriptStep {
    /// A frame delivered after `delay_ms` milliseconds.
    pub fn frame_after(delay_ms: u64, raw: impl Into<RawFrame>) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            event: TransportEvent::Frame(raw.into()),
        }
    }

    /// A link event delivered after `delay_ms` milliseconds.
    pub fn link_after(delay_ms: u64, link: crate::transport::LinkEvent) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            event: TransportEvent::Link(link),
        }
    }
}

enum Mode {
    Scripted(VecDeque<ScriptStep>),
    Generator {
        layout: FrameLayout,
        period: Duration,
        tick: u32,
    },
}

/// Simulated frame source.
pub struct MockFrameSource {
    mode: Mode,
    fail_scan: Option<String>,
    scan_delay: Duration,
}

impl MockFrameSource {
    /// A scripted source that replays `steps` in order, then reports
    /// exhaustion.
    pub fn scripted(steps: Vec<ScriptStep>) -> Self {
        Self {
            mode: Mode::Scripted(steps.into()),
            fail_scan: None,
            scan_delay: Duration::from_millis(1),
        }
    }

    /// A generator producing synthetic frames of `layout` at `rate_hz`.
    pub fn generator(layout: FrameLayout, rate_hz: f64) -> Self {
        Self {
            mode: Mode::Generator {
                layout,
                period: Duration::from_secs_f64(1.0 / rate_hz.max(0.001)),
                tick: 0,
            },
            fail_scan: None,
            scan_delay: Duration::from_millis(1),
        }
    }

    /// Make the next `scan` call fail with `message`.
    pub fn failing_scan(mut self, message: impl Into<String>) -> Self {
        self.fail_scan = Some(message.into());
        self
    }

    /// Override the simulated scan duration.
    pub fn with_scan_delay(mut self, delay: Duration) -> Self {
        self.scan_delay = delay;
        self
    }
}

#[async_trait]
impl FrameSource for MockFrameSource {
    async fn scan(&mut self, _target_name: &str) -> AcqResult<()> {
        sleep(self.scan_delay).await;
        match self.fail_scan.take() {
            Some(message) => Err(AcqError::Connection(message)),
            None => Ok(()),
        }
    }

    async fn connect(&mut self) -> AcqResult<()> {
        Ok(())
    }

    async fn next_event(&mut self) -> Option<TransportEvent> {
        match &mut self.mode {
            Mode::Scripted(steps) => {
                let step = steps.pop_front()?;
                sleep(step.delay).await;
                Some(step.event)
            }
            Mode::Generator {
                layout,
                period,
                tick,
            } => {
                sleep(*period).await;
                *tick = tick.wrapping_add(1);
                let frame = synthetic_frame(*layout, *tick);
                Some(TransportEvent::Frame(frame))
            }
        }
    }

    async fn close(&mut self) -> AcqResult<()> {
        Ok(())
    }
}

fn synthetic_frame(layout: FrameLayout, tick: u32) -> Bytes {
    let readings: Vec<f32> = (0..layout.readings())
        .map(|_| rand::thread_rng().gen_range(-100.0..100.0))
        .collect();
    match layout {
        FrameLayout::TickPrefixed { .. } => encode_tick_frame(tick, &readings),
        FrameLayout::Plain { .. } => encode_plain_frame(&readings),
    }
}

/// Encode a tick-prefixed frame (little-endian, as the devices send it).
pub fn encode_tick_frame(tick: u32, readings: &[f32]) -> Bytes {
    let mut buf = BytesMut::with_capacity(4 + 4 * readings.len());
    buf.put_u32_le(tick);
    for r in readings {
        buf.put_f32_le(*r);
    }
    buf.freeze()
}

/// Encode a plain frame of little-endian f32 readings.
pub fn encode_plain_frame(readings: &[f32]) -> Bytes {
    let mut buf = BytesMut::with_capacity(4 * readings.len());
    for r in readings {
        buf.put_f32_le(*r);
    }
    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LinkEvent;

    #[tokio::test]
    async fn scripted_source_replays_in_order() {
        let mut source = MockFrameSource::scripted(vec![
            ScriptStep::frame_after(0, encode_plain_frame(&[1.0])),
            ScriptStep::link_after(0, LinkEvent::Down),
        ]);

        assert!(matches!(
            source.next_event().await,
            Some(TransportEvent::Frame(_))
        ));
        assert!(matches!(
            source.next_event().await,
            Some(TransportEvent::Link(LinkEvent::Down))
        ));
        assert!(source.next_event().await.is_none());
    }

    #[tokio::test]
    async fn failing_scan_fails_once() {
        let mut source =
            MockFrameSource::scripted(Vec::new()).failing_scan("Device not found");
        assert!(source.scan("EEG").await.is_err());
        assert!(source.scan("EEG").await.is_ok());
    }

    #[tokio::test]
    async fn generator_produces_layout_sized_frames() {
        let layout = FrameLayout::TickPrefixed { readings: 4 };
        let mut source = MockFrameSource::generator(layout, 1000.0);
        match source.next_event().await {
            Some(TransportEvent::Frame(raw)) => assert_eq!(raw.len(), 20),
            other => panic!("expected frame, got {other:?}"),
        }
    }
}
