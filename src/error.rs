//! Custom error types for the application.
//!
//! This module defines the primary error type, `AcqError`, using the
//! `thiserror` crate. Decode failures have their own small type,
//! [`crate::frame::DecodeError`], because they are handled entirely at the
//! transport boundary and never travel through the pipeline.
//!
//! Propagation policy: decode and storage errors are contained at their
//! component boundary and surface only as log events and counters. Connection
//! errors surface as [`crate::connection::ConnectionState::Error`] for
//! observers. Nothing unwinds across the producer/consumer hand-off.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AcqResult<T> = std::result::Result<T, AcqError>;

/// Application-level error taxonomy.
#[derive(Error, Debug)]
pub enum AcqError {
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Configuration validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Connection error: {0}")]
    Connection(String),
}
