//! The metric source abstraction.
//!
//! A [`MetricSource`] is the collector's window onto an external
//! metrics-publishing broker. It owns the connection, the discovered catalog
//! and the per-element publication caches; the worker drives it through this
//! trait and never touches the broker directly.

use async_trait::async_trait;

use brokerwatch_types::{MetricCatalog, MetricId, RawValue};

use crate::error::SourceError;

/// Contract the collector requires from a metrics source.
///
/// The worker owns the source exclusively for the lifetime of the collector,
/// so implementations need no internal locking on the collector's account.
#[async_trait]
pub trait MetricSource: Send {
    /// Connect to `target` and subscribe to every discoverable metric topic.
    ///
    /// Called again after a failure; implementations must tolerate repeated
    /// attempts.
    async fn connect(&mut self, target: &str) -> Result<(), SourceError>;

    /// Process one round of buffered publication messages into the catalog's
    /// sample caches. An error signals connection loss.
    async fn drain_publications(&mut self) -> Result<(), SourceError>;

    /// The metric metadata discovered by the last successful connect.
    fn catalog(&self) -> &MetricCatalog;

    /// Mutable catalog access, used by the refresh cycle to consume the
    /// sample caches.
    fn catalog_mut(&mut self) -> &mut MetricCatalog;

    /// Convert a raw cached sample into a reportable value.
    fn normalize(&self, id: &MetricId, label: &str, raw: RawValue) -> f64;

    /// Release the connection. Also called after a failed connect.
    async fn disconnect(&mut self);
}
