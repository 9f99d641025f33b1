//! Metric identity and registry key derivation.

use alloc::string::String;
use core::fmt;

/// Separator joining the class, type and element names into a registry key.
pub const KEY_SEPARATOR: char = '/';

/// Fully-qualified identity of one metric element: the class it belongs to,
/// the type within that class, and the element name itself.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricId {
    /// Name of the owning class.
    pub class: String,
    /// Name of the owning type.
    pub metric_type: String,
    /// The element name.
    pub metric: String,
}

impl MetricId {
    /// Create an id from the three level names.
    pub fn new(
        class: impl Into<String>,
        metric_type: impl Into<String>,
        metric: impl Into<String>,
    ) -> Self {
        Self {
            class: class.into(),
            metric_type: metric_type.into(),
            metric: metric.into(),
        }
    }

    /// Derive the registry lookup key: the three names joined by
    /// [`KEY_SEPARATOR`].
    ///
    /// Uniqueness is defined over the derived string, not the triple. Names
    /// that themselves contain the separator can make two distinct ids derive
    /// the same key; the registry build treats that as a duplicate.
    pub fn key(&self) -> String {
        let mut key = String::with_capacity(
            self.class.len() + self.metric_type.len() + self.metric.len() + 2,
        );
        key.push_str(&self.class);
        key.push(KEY_SEPARATOR);
        key.push_str(&self.metric_type);
        key.push(KEY_SEPARATOR);
        key.push_str(&self.metric);
        key
    }
}

impl fmt::Display for MetricId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{sep}{}{sep}{}",
            self.class,
            self.metric_type,
            self.metric,
            sep = KEY_SEPARATOR
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_joins_the_three_names() {
        let id = MetricId::new("cpu", "user", "busy_percent");
        assert_eq!(id.key(), "cpu/user/busy_percent");
    }

    #[test]
    fn display_matches_key() {
        let id = MetricId::new("disk", "log", "bytes_written");
        assert_eq!(alloc::format!("{id}"), id.key());
    }

    #[test]
    fn distinct_ids_can_derive_the_same_key() {
        // Separators inside names collapse the hierarchy: these two ids are
        // different triples but collide once joined.
        let a = MetricId::new("disk/log", "write", "bytes");
        let b = MetricId::new("disk", "log/write", "bytes");

        assert_ne!(a, b);
        assert_eq!(a.key(), b.key());
    }
}
