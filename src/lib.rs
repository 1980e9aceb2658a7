//! # Biosignal DAQ Core Library
//!
//! Core library for the `biosignal_daq` application: a device-data ingestion
//! and durable logging pipeline for physiological signals (EEG over BLE,
//! auxiliary sensors over USB-serial). The transport SDKs, any UI, and
//! platform permission plumbing live outside this crate; what this crate
//! owns is the path from raw device bytes to rotating CSV files.
//!
//! ## Crate Structure
//!
//! - **`config`**: strongly-typed configuration loaded from TOML and
//!   environment variables. See `config::AcqConfig`.
//! - **`connection`**: the device connection state machine, published through
//!   a watch channel for any number of observers.
//! - **`error`**: the `AcqError` enum for centralized error handling.
//! - **`frame`**: binary frame layouts, decoding into `Sample`s, and the
//!   newline splitter for serial streams.
//! - **`pipeline`**: the producer/consumer hand-off queue, batch
//!   accumulator, rotation policy, storage sink, and the periodic flush
//!   task.
//! - **`session`**: wires a transport and a sink into a running recording
//!   session with a recording-active gate and graceful shutdown.
//! - **`tracing_setup`**: structured logging initialization.
//! - **`transport`**: the `FrameSource` seam the real SDKs plug into, plus a
//!   mock implementation for tests and demos.

pub mod config;
pub mod connection;
pub mod error;
pub mod frame;
pub mod pipeline;
pub mod session;
pub mod tracing_setup;
pub mod transport;

pub use config::AcqConfig;
pub use connection::ConnectionState;
pub use error::{AcqError, AcqResult};
pub use frame::{DecodeError, FrameLayout, Sample};
pub use session::RecordingSession;
