//! Binary frame decoding.
//!
//! A transport delivers opaque [`RawFrame`]s; this module turns them into
//! typed [`Sample`]s. Decoding is a pure function of the frame layout and the
//! input bytes: no shared state, deterministic, idempotent on the same bytes.
//!
//! Two fixed layouts cover the devices in this system:
//!
//! - [`FrameLayout::TickPrefixed`]: a little-endian u32 device tick followed
//!   by N little-endian f32 readings (4 + 4·N bytes).
//! - [`FrameLayout::Plain`]: N little-endian f32 readings, no tick (4·N
//!   bytes). The 5-channel EEG notification uses this shape.
//!
//! Serial transports deliver an undelimited byte stream instead of discrete
//! notifications; [`LineFramer`] splits that stream on `\n` and keeps only
//! chunks of exactly the expected frame length.

use bytes::{Buf, Bytes};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An undecoded byte frame as delivered by the transport layer.
pub type RawFrame = Bytes;

/// Decode failure. The offending frame is dropped and counted; it never
/// affects connection state or the rest of the pipeline.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("frame too short: got {got} bytes, need {need}")]
    TooShort { got: usize, need: usize },
}

/// Fixed binary layout of a transport's frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FrameLayout {
    /// u32 device tick, then `readings` f32 values, all little-endian.
    TickPrefixed {
        /// Number of f32 readings following the tick.
        readings: usize,
    },
    /// `readings` little-endian f32 values, nothing else.
    Plain {
        /// Number of f32 readings in the frame.
        readings: usize,
    },
}

impl FrameLayout {
    /// Minimum (and exact) number of bytes a frame of this layout occupies.
    pub fn min_frame_bytes(&self) -> usize {
        match self {
            FrameLayout::TickPrefixed { readings } => 4 + 4 * readings,
            FrameLayout::Plain { readings } => 4 * readings,
        }
    }

    /// Number of readings per frame.
    pub fn readings(&self) -> usize {
        match self {
            FrameLayout::TickPrefixed { readings } | FrameLayout::Plain { readings } => *readings,
        }
    }

    /// Decode a raw frame into a [`Sample`].
    ///
    /// `captured_at` is the wall-clock arrival time supplied by the caller so
    /// that decoding itself stays deterministic. Trailing bytes beyond the
    /// layout's length are ignored.
    pub fn decode(
        &self,
        raw: &[u8],
        captured_at: DateTime<Local>,
    ) -> Result<Sample, DecodeError> {
        let need = self.min_frame_bytes();
        if raw.len() < need {
            return Err(DecodeError::TooShort {
                got: raw.len(),
                need,
            });
        }

        let mut buf = raw;
        let device_tick = match self {
            FrameLayout::TickPrefixed { .. } => Some(buf.get_u32_le()),
            FrameLayout::Plain { .. } => None,
        };
        let readings = (0..self.readings()).map(|_| buf.get_f32_le()).collect();

        Ok(Sample {
            captured_at,
            device_tick,
            readings,
        })
    }
}

/// How a transport's byte deliveries map to frames.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Framing {
    /// Each delivery is one complete frame (BLE notifications).
    #[default]
    Datagram,
    /// Deliveries are an undelimited stream; frames are separated by `\n`
    /// (USB-serial).
    NewlineDelimited,
}

/// A decoded, typed reading set with its capture timestamp.
///
/// Immutable once created; produced by [`FrameLayout::decode`] and consumed
/// exactly once by the batching consumer.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    /// Wall-clock time the frame arrived.
    pub captured_at: DateTime<Local>,
    /// Device-side tick counter, when the layout carries one. Decoded but not
    /// written to the log line.
    pub device_tick: Option<u32>,
    /// Channel readings, in frame order.
    pub readings: Vec<f32>,
}

impl Sample {
    /// Format this sample as a CSV log line:
    /// `"HH:MM:SS.mmm,v1,v2,...\n"`, no quoting, no header.
    pub fn log_line(&self) -> String {
        let mut line = self.captured_at.format("%H:%M:%S%.3f").to_string();
        for value in &self.readings {
            line.push(',');
            // `{:?}` keeps a decimal point on whole values (1.0, not 1).
            line.push_str(&format!("{value:?}"));
        }
        line.push('\n');
        line
    }
}

/// Splits a serial byte stream into candidate frames on `\n`.
///
/// Bytes accumulate until a newline; a delimited chunk is emitted only when
/// its length matches the expected frame length exactly, otherwise it is
/// discarded as line noise.
#[derive(Debug)]
pub struct LineFramer {
    pending: Vec<u8>,
    frame_len: usize,
}

impl LineFramer {
    /// Create a framer expecting `frame_len` bytes between newlines.
    pub fn new(frame_len: usize) -> Self {
        Self {
            pending: Vec::with_capacity(frame_len),
            frame_len,
        }
    }

    /// Feed a chunk of received bytes, returning any complete frames.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<RawFrame> {
        let mut frames = Vec::new();
        for &byte in chunk {
            if byte == b'\n' {
                if self.pending.len() == self.frame_len {
                    frames.push(Bytes::from(std::mem::take(&mut self.pending)));
                } else {
                    self.pending.clear();
                }
            } else {
                self.pending.push(byte);
            }
        }
        frames
    }
}
