//! Metric definitions - the registry's per-metric entries.

use alloc::collections::BTreeMap;
use alloc::string::String;

/// One registered metric.
///
/// The name and description are fixed when the registry is built; `values`
/// is rewritten from scratch on every refresh cycle, never merged.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricDefinition {
    /// The element name this definition was created from.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Label -> normalized value, one entry per monitored object instance.
    pub values: BTreeMap<String, f64>,
}

impl MetricDefinition {
    /// Create a definition with no values yet.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            values: BTreeMap::new(),
        }
    }

    /// The normalized value for `label`, if one was published.
    pub fn value(&self, label: &str) -> Option<f64> {
        self.values.get(label).copied()
    }

    /// Check if no values were published in the last refresh cycle.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_definition_has_no_values() {
        let definition = MetricDefinition::new("busy_percent", "CPU busy percentage");
        assert_eq!(definition.name, "busy_percent");
        assert!(definition.is_empty());
        assert_eq!(definition.value("cpu0"), None);
    }

    #[test]
    fn value_lookup() {
        let mut definition = MetricDefinition::new("busy_percent", "CPU busy percentage");
        definition.values.insert("cpu0".into(), 42.5);

        assert!(!definition.is_empty());
        assert_eq!(definition.value("cpu0"), Some(42.5));
        assert_eq!(definition.value("cpu1"), None);
    }
}
