//! Transport seam.
//!
//! The concrete BLE/USB SDKs live outside this crate; what the pipeline needs
//! from them is captured by [`FrameSource`]: scan for a named device, connect,
//! then deliver a push-style stream of [`TransportEvent`]s. Tests and the
//! `record` subcommand use [`mock::MockFrameSource`] in place of hardware.

use crate::error::AcqResult;
use crate::frame::RawFrame;
use async_trait::async_trait;

pub mod mock;

pub use mock::MockFrameSource;

/// Something a transport reports upward: a raw frame or a link status change.
#[derive(Clone, Debug)]
pub enum TransportEvent {
    /// A raw byte frame (one notification, or one chunk of a serial stream).
    Frame(RawFrame),
    /// Link status change reported by the transport.
    Link(LinkEvent),
}

/// Transport-reported link status change.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkEvent {
    /// Link (re)established.
    Up,
    /// Link dropped.
    Down,
}

/// A source of raw frames from an external device.
///
/// Implementations wrap a transport SDK; all methods are driven from the
/// session's pump task, never concurrently.
#[async_trait]
pub trait FrameSource: Send {
    /// Scan for the device advertising `target_name`. Resolves once found,
    /// errors on timeout or empty result.
    async fn scan(&mut self, target_name: &str) -> AcqResult<()>;

    /// Establish the link after a successful scan.
    async fn connect(&mut self) -> AcqResult<()>;

    /// Wait for the next transport event. `None` means the source is
    /// exhausted and no further events will arrive.
    async fn next_event(&mut self) -> Option<TransportEvent>;

    /// Release the transport's resources.
    async fn close(&mut self) -> AcqResult<()>;
}
