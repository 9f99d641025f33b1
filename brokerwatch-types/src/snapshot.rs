//! Registry snapshots - the point-in-time view handed to callers.

use alloc::collections::BTreeMap;
use alloc::string::String;

use crate::MetricDefinition;

/// A point-in-time copy of the metric registry.
///
/// Snapshots are produced by the collector worker in reply to a snapshot
/// request and are never mutated afterwards; the worker keeps its own working
/// registry and clones it per reply.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RegistrySnapshot {
    /// Unix timestamp in milliseconds when this snapshot was taken.
    pub timestamp_ms: u64,
    /// False when the registry build found duplicate keys. The data is still
    /// served in degraded form (first definition per key wins).
    pub valid: bool,
    /// Definitions keyed by the derived `class/type/metric` string.
    pub metrics: BTreeMap<String, MetricDefinition>,
}

impl RegistrySnapshot {
    /// Create a snapshot stamped with the current time.
    #[cfg(feature = "std")]
    pub fn new(valid: bool, metrics: BTreeMap<String, MetricDefinition>) -> Self {
        Self {
            timestamp_ms: current_timestamp_ms(),
            valid,
            metrics,
        }
    }

    /// Create a snapshot with a specific timestamp.
    pub fn with_timestamp(
        timestamp_ms: u64,
        valid: bool,
        metrics: BTreeMap<String, MetricDefinition>,
    ) -> Self {
        Self {
            timestamp_ms,
            valid,
            metrics,
        }
    }

    /// Get the definition registered under `key`.
    pub fn get(&self, key: &str) -> Option<&MetricDefinition> {
        self.metrics.get(key)
    }

    /// The normalized value published for `label` under `key`.
    pub fn value(&self, key: &str, label: &str) -> Option<f64> {
        self.metrics.get(key).and_then(|definition| definition.value(label))
    }

    /// Number of registered metrics.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Check if the snapshot holds no metrics.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Iterate over all definitions in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &MetricDefinition)> {
        self.metrics.iter()
    }
}

/// Get current timestamp in milliseconds since Unix epoch.
#[cfg(feature = "std")]
fn current_timestamp_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
