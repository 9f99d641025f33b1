//! # brokerwatch-collector
//!
//! A background worker that keeps a connection to a message broker's metrics
//! publication stream, folds published samples into a registry, and serves
//! point-in-time snapshots of that registry on request.
//!
//! The broker itself stays behind the [`MetricSource`] trait: the source owns
//! the connection, topic discovery and publication decoding, while this crate
//! owns the hard part - a single worker task that simultaneously drains
//! publications, recovers from connection loss with fixed backoff, answers
//! snapshot requests without races, and signals startup exactly once.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use brokerwatch_collector::{Collector, MetricSource, SourceError};
//! use brokerwatch_types::{MetricCatalog, MetricId, RawValue};
//! # use async_trait::async_trait;
//! # struct BrokerSource { catalog: MetricCatalog }
//! # #[async_trait]
//! # impl MetricSource for BrokerSource {
//! #     async fn connect(&mut self, _target: &str) -> Result<(), SourceError> { Ok(()) }
//! #     async fn drain_publications(&mut self) -> Result<(), SourceError> { Ok(()) }
//! #     fn catalog(&self) -> &MetricCatalog { &self.catalog }
//! #     fn catalog_mut(&mut self) -> &mut MetricCatalog { &mut self.catalog }
//! #     fn normalize(&self, _id: &MetricId, _label: &str, raw: RawValue) -> f64 { raw as f64 }
//! #     async fn disconnect(&mut self) {}
//! # }
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = BrokerSource { catalog: MetricCatalog::new() };
//!
//!     let (handle, stop) = Collector::builder()
//!         .target("broker-1")
//!         .build()
//!         .spawn(source);
//!
//!     // Resolves once, on the first successful connection.
//!     handle.ready().await.expect("collector stopped");
//!
//!     // Fetch a snapshot, refreshing values from cached publications first.
//!     let snapshot = handle.snapshot(true).await.expect("collector stopped");
//!     println!("serving {} metrics", snapshot.len());
//!
//!     stop.stop();
//! }
//! ```
//!
//! ## Concurrency model
//!
//! All registry mutation happens on the worker task. A snapshot request and
//! its reply are one rendezvous: when the `refresh` flag is set the worker
//! refreshes and replies inside the same serving-loop iteration, so the
//! snapshot a caller receives can never be concurrently mutated - the
//! channel exchange is the lock. Handles are cloneable and each request
//! carries its own reply channel, so concurrent callers cannot receive each
//! other's replies.
//!
//! Connection errors never reach callers. The worker absorbs them, tears the
//! connection down, retries on a fixed delay, and rebuilds the registry from
//! the rediscovered catalog on every reconnect; snapshot requests issued in
//! the meantime wait until serving resumes. Callers needing bounded latency
//! should wrap the exchange in their own timeout.

mod collector;
mod config;
mod error;
pub mod registry;
mod source;
mod worker;

pub use collector::{
    Collector, CollectorBuilder, CollectorHandle, CollectorStatus, StopHandle,
};
pub use config::{CollectorConfig, DEFAULT_REQUEST_TIMEOUT, DEFAULT_RETRY_DELAY};
pub use error::{CollectorStopped, SourceError};
pub use registry::MetricRegistry;
pub use source::MetricSource;

// Re-export the schema types for convenience.
pub use brokerwatch_types::{
    MetricCatalog, MetricClass, MetricDefinition, MetricElement, MetricId, MetricType,
    RawValue, RegistrySnapshot,
};
