//! The background worker: connection lifecycle and the serving loop.
//!
//! One spawned task owns the source, the registry, the request receiver and
//! the ready latch. All registry mutation happens here; the request/reply
//! rendezvous is what keeps snapshot reads race-free without locks.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, timeout};
use tracing::{debug, error, info, warn};

use crate::collector::{CollectorStatus, SnapshotRequest};
use crate::config::CollectorConfig;
use crate::error::SourceError;
use crate::registry::{self, MetricRegistry};
use crate::source::MetricSource;

/// Why a connection session ended.
enum SessionEnd {
    /// Connect failed or the serving loop hit an error; retry after the
    /// fixed delay.
    Retry,
    /// Every snapshot handle is gone; nothing can ever ask again.
    HandlesDropped,
}

pub(crate) struct Worker<S> {
    pub(crate) source: S,
    pub(crate) config: CollectorConfig,
    pub(crate) requests: mpsc::Receiver<SnapshotRequest>,
    /// Ready latch; taken and fired on the first successful connect only.
    pub(crate) ready: Option<watch::Sender<bool>>,
    pub(crate) shutdown: watch::Receiver<bool>,
    pub(crate) status: Arc<RwLock<CollectorStatus>>,
}

impl<S: MetricSource> Worker<S> {
    /// Run until the shutdown flag is set or every handle is dropped.
    ///
    /// The flag is polled once per connection attempt; it does not interrupt
    /// an in-progress drain, idle wait or backoff sleep.
    pub(crate) async fn run(mut self) {
        while !*self.shutdown.borrow() {
            if let SessionEnd::HandlesDropped = self.session().await {
                info!("every snapshot handle dropped, stopping metrics worker");
                return;
            }
            sleep(self.config.retry_delay).await;
        }
        info!("shutdown requested, stopping metrics worker");
    }

    /// One pass through the lifecycle: connect, build the registry, serve
    /// until something goes wrong.
    async fn session(&mut self) -> SessionEnd {
        self.status.write().connect_attempts += 1;

        if let Err(err) = self.source.connect(&self.config.target).await {
            warn!(broker = %self.config.target, error = %err, "failed to connect to metrics source");
            self.status.write().record_error(&err);
            self.source.disconnect().await;
            return SessionEnd::Retry;
        }

        if let Some(ready) = self.ready.take() {
            // The latch fires exactly once per worker lifetime; reconnects
            // never touch it again.
            ready.send_replace(true);
        }
        info!(broker = %self.config.target, "connected to metrics source");
        self.status.write().connected = true;

        let mut registry = registry::build(self.source.catalog());

        let end = match self.serve(&mut registry).await {
            Ok(()) => SessionEnd::HandlesDropped,
            Err(err) => {
                error!(error = %err, "metrics worker error");
                self.status.write().record_error(&err);
                SessionEnd::Retry
            }
        };

        self.source.disconnect().await;
        self.status.write().connected = false;
        end
    }

    /// The inner loop: alternate between draining publications and racing a
    /// request arrival against the idle timeout.
    ///
    /// Refreshing and replying both happen here, inside the same iteration,
    /// so a snapshot can never observe a half-written refresh.
    async fn serve(&mut self, registry: &mut MetricRegistry) -> Result<(), SourceError> {
        loop {
            self.source.drain_publications().await?;

            match timeout(self.config.request_timeout, self.requests.recv()).await {
                Ok(Some(request)) => {
                    if request.refresh {
                        registry::refresh(registry, &mut self.source);
                    }
                    // A caller that gave up on its reply is not an error.
                    let _ = request.reply.send(registry.snapshot());
                }
                Ok(None) => return Ok(()),
                Err(_elapsed) => {
                    debug!(
                        timeout = ?self.config.request_timeout,
                        "no snapshot requests within the idle window"
                    );
                }
            }
        }
    }
}
