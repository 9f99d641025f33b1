//! The collector: configuration, spawn, and the caller-facing handles.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;

use brokerwatch_types::RegistrySnapshot;

use crate::config::CollectorConfig;
use crate::error::{CollectorStopped, SourceError};
use crate::source::MetricSource;
use crate::worker::Worker;

/// One snapshot request travelling from a handle to the worker.
///
/// Each request carries its own reply channel, so replies cannot cross
/// between callers and a request queued across a reconnect is answered by
/// the next session instead of being lost.
pub(crate) struct SnapshotRequest {
    /// Refresh the registry from the cached publications before replying.
    pub(crate) refresh: bool,
    pub(crate) reply: oneshot::Sender<RegistrySnapshot>,
}

/// The entry point: owns the configuration and spawns the worker.
///
/// See the crate-level documentation for a full example.
#[derive(Debug)]
pub struct Collector {
    config: CollectorConfig,
}

impl Collector {
    /// Create a collector with the given settings.
    pub fn new(config: CollectorConfig) -> Self {
        Self { config }
    }

    /// Create a builder for configuring the collector.
    pub fn builder() -> CollectorBuilder {
        CollectorBuilder::new()
    }

    /// Spawn the background worker owning `source`.
    ///
    /// Must be called within a tokio runtime. Returns the cloneable caller
    /// handle and the stop handle; the worker runs until stopped or until
    /// every [`CollectorHandle`] clone is dropped.
    pub fn spawn<S>(self, source: S) -> (CollectorHandle, StopHandle)
    where
        S: MetricSource + 'static,
    {
        // Capacity 1: the worker consumes one request and sends one reply
        // per serving-loop iteration; extra callers queue on the channel.
        let (request_tx, request_rx) = mpsc::channel(1);
        let (ready_tx, ready_rx) = watch::channel(false);
        let (stop_tx, stop_rx) = watch::channel(false);
        let status = Arc::new(RwLock::new(CollectorStatus::default()));

        let worker = Worker {
            source,
            config: self.config,
            requests: request_rx,
            ready: Some(ready_tx),
            shutdown: stop_rx,
            status: status.clone(),
        };
        let task = tokio::spawn(worker.run());

        (
            CollectorHandle {
                requests: request_tx,
                ready: ready_rx,
                status,
            },
            StopHandle {
                stop: stop_tx,
                task,
            },
        )
    }
}

/// Builder for configuring a [`Collector`].
#[derive(Debug, Default)]
pub struct CollectorBuilder {
    target: Option<String>,
    retry_delay: Option<Duration>,
    request_timeout: Option<Duration>,
}

impl CollectorBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the broker to collect from.
    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    /// Sleep between reconnect attempts. Defaults to 10 seconds.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Idle wait for a snapshot request per serving-loop iteration.
    /// Defaults to 10 seconds.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Build the collector.
    pub fn build(self) -> Collector {
        let mut config = CollectorConfig::default();
        if let Some(target) = self.target {
            config.target = target;
        }
        if let Some(delay) = self.retry_delay {
            config.retry_delay = delay;
        }
        if let Some(timeout) = self.request_timeout {
            config.request_timeout = timeout;
        }
        Collector { config }
    }
}

/// Caller-facing handle: wait for startup, request snapshots, read status.
///
/// Cloneable; any number of tasks may hold one. Every snapshot call is an
/// independent request/reply exchange, so concurrent callers cannot receive
/// each other's replies.
#[derive(Clone)]
pub struct CollectorHandle {
    requests: mpsc::Sender<SnapshotRequest>,
    ready: watch::Receiver<bool>,
    status: Arc<RwLock<CollectorStatus>>,
}

impl CollectorHandle {
    /// Wait until the worker's first successful connection.
    ///
    /// Resolves immediately once that has ever happened, including after
    /// later disconnects. Errs only if the worker stopped before connecting
    /// once.
    pub async fn ready(&self) -> Result<(), CollectorStopped> {
        let mut ready = self.ready.clone();
        ready
            .wait_for(|connected| *connected)
            .await
            .map(|_| ())
            .map_err(|_| CollectorStopped)
    }

    /// Request a point-in-time snapshot of the registry.
    ///
    /// With `refresh` set, the worker folds the cached publications into the
    /// registry before replying; otherwise the reply carries the values as
    /// of the last refresh.
    ///
    /// Connection trouble is invisible here: during a reconnect window the
    /// future stays pending until the worker serves again. An error means
    /// the worker has terminated.
    pub async fn snapshot(&self, refresh: bool) -> Result<RegistrySnapshot, CollectorStopped> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.requests
            .send(SnapshotRequest {
                refresh,
                reply: reply_tx,
            })
            .await
            .map_err(|_| CollectorStopped)?;
        reply_rx.await.map_err(|_| CollectorStopped)
    }

    /// A copy of the current reconnect observability counters.
    pub fn status(&self) -> CollectorStatus {
        self.status.read().clone()
    }
}

impl std::fmt::Debug for CollectorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectorHandle")
            .field("ready", &*self.ready.borrow())
            .finish()
    }
}

/// Reconnect observability shared between the worker and its handles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectorStatus {
    /// Connection attempts made so far, successful or not.
    pub connect_attempts: u64,
    /// Whether a connection is currently established.
    pub connected: bool,
    /// Text of the most recent connect or serve error.
    pub last_error: Option<String>,
}

impl CollectorStatus {
    pub(crate) fn record_error(&mut self, err: &SourceError) {
        self.last_error = Some(err.to_string());
    }
}

/// Controls worker shutdown.
///
/// The shutdown flag is polled at the reconnect boundary, so a healthy
/// connected worker keeps serving until its connection next drops; dropping
/// every [`CollectorHandle`] instead stops it promptly at the next serving
/// pass.
#[derive(Debug)]
pub struct StopHandle {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl StopHandle {
    /// Set the shutdown flag and hand back the worker task for awaiting.
    pub fn stop(self) -> JoinHandle<()> {
        let _ = self.stop.send(true);
        self.task
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_match_config_defaults() {
        let collector = Collector::builder().build();
        assert_eq!(collector.config, CollectorConfig::default());
    }

    #[test]
    fn builder_overrides() {
        let collector = Collector::builder()
            .target("broker-1")
            .retry_delay(Duration::from_secs(3))
            .request_timeout(Duration::from_millis(250))
            .build();

        assert_eq!(collector.config.target, "broker-1");
        assert_eq!(collector.config.retry_delay, Duration::from_secs(3));
        assert_eq!(collector.config.request_timeout, Duration::from_millis(250));
    }

    #[test]
    fn new_takes_a_prebuilt_config() {
        let config = CollectorConfig {
            target: "broker-2".to_string(),
            ..CollectorConfig::default()
        };
        let collector = Collector::new(config.clone());
        assert_eq!(collector.config, config);
    }

    #[test]
    fn status_starts_empty() {
        let status = CollectorStatus::default();
        assert_eq!(status.connect_attempts, 0);
        assert!(!status.connected);
        assert!(status.last_error.is_none());
    }

    #[test]
    fn record_error_keeps_the_latest_text() {
        let mut status = CollectorStatus::default();
        status.record_error(&SourceError::Timeout);
        status.record_error(&SourceError::Connection("refused".to_string()));

        assert_eq!(
            status.last_error.as_deref(),
            Some("connection failed: refused")
        );
    }
}
