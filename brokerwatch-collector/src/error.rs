//! Error types for the collector.

use thiserror::Error;

/// Errors surfaced by a [`MetricSource`](crate::MetricSource).
///
/// These never reach snapshot callers: the worker absorbs them, tears the
/// connection down and retries after the configured delay.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Establishing the connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// Subscribing to discovered metric topics failed.
    #[error("subscription failed: {0}")]
    Subscription(String),

    /// Processing buffered publications failed, usually connection loss.
    #[error("publication processing failed: {0}")]
    Publication(String),

    /// The source did not respond in time.
    #[error("source request timed out")]
    Timeout,
}

/// The worker task has terminated; no further snapshots will be served.
///
/// This is the only error a snapshot caller can observe. Connection trouble
/// is invisible on the caller side: requests simply wait out reconnect
/// windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("metrics collector is not running")]
pub struct CollectorStopped;
