//! Collector configuration.

use std::time::Duration;

/// Fixed sleep between reconnect attempts after a failure.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);

/// How long the worker waits for a snapshot request before looping back to
/// drain publications.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for a [`Collector`](crate::Collector).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectorConfig {
    /// Name of the broker to collect from, passed through to the source's
    /// connect call.
    pub target: String,
    /// Fixed sleep between reconnect attempts.
    pub retry_delay: Duration,
    /// Idle wait for a snapshot request per serving-loop iteration.
    pub request_timeout: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            retry_delay: DEFAULT_RETRY_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}
