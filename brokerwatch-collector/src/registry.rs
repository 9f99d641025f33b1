//! The metric registry and its build/refresh cycle.
//!
//! The registry is rebuilt from the source catalog on every (re)connection.
//! Its key set is fixed for the lifetime of that connection; only the values
//! are rewritten, exclusively on the worker task.

use std::collections::BTreeMap;

use tracing::error;

use brokerwatch_types::{
    MetricCatalog, MetricDefinition, MetricId, RawValue, RegistrySnapshot,
};

use crate::source::MetricSource;

/// Working state for one connection lifetime: definitions keyed by the
/// derived `class/type/metric` string, plus a validity flag.
#[derive(Debug, Clone, Default)]
pub struct MetricRegistry {
    metrics: BTreeMap<String, MetricDefinition>,
    invalid: bool,
}

impl MetricRegistry {
    /// Create an empty, valid registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a definition under `key`, keeping any existing entry.
    ///
    /// Returns false when the key was already taken; the new definition is
    /// discarded in that case.
    pub fn insert(&mut self, key: impl Into<String>, definition: MetricDefinition) -> bool {
        use std::collections::btree_map::Entry;
        match self.metrics.entry(key.into()) {
            Entry::Vacant(slot) => {
                slot.insert(definition);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Flag the registry as degraded by a duplicate key.
    pub fn mark_invalid(&mut self) {
        self.invalid = true;
    }

    /// False once a duplicate key was found during the build.
    pub fn is_valid(&self) -> bool {
        !self.invalid
    }

    /// Get the definition registered under `key`.
    pub fn get(&self, key: &str) -> Option<&MetricDefinition> {
        self.metrics.get(key)
    }

    /// Mutable access to the definition registered under `key`.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut MetricDefinition> {
        self.metrics.get_mut(key)
    }

    /// Iterate over the registered keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.metrics.keys()
    }

    /// Iterate mutably over every definition.
    pub fn definitions_mut(&mut self) -> impl Iterator<Item = &mut MetricDefinition> {
        self.metrics.values_mut()
    }

    /// Number of registered metrics.
    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    /// Check if the registry holds no metrics.
    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    /// Clone the current contents into a timestamped snapshot.
    pub fn snapshot(&self) -> RegistrySnapshot {
        RegistrySnapshot::new(self.is_valid(), self.metrics.clone())
    }
}

/// Build a registry from the discovered catalog.
///
/// Every element of every single-object type gets one definition, keyed by
/// [`MetricId::key`]. Per-object types are skipped; their metrics are
/// resolved per object at query time. A colliding key keeps the first
/// definition and marks the whole registry invalid - the degraded registry
/// is still returned so a misconfigured catalog does not take metrics
/// collection down.
pub fn build(catalog: &MetricCatalog) -> MetricRegistry {
    let mut registry = MetricRegistry::new();

    for class in &catalog.classes {
        for metric_type in &class.types {
            if metric_type.is_per_object() {
                continue;
            }
            for element in &metric_type.elements {
                let id = MetricId::new(&class.name, &metric_type.name, &element.name);
                let definition = MetricDefinition::new(&element.name, &element.description);
                if !registry.insert(id.key(), definition) {
                    error!(key = %id, "duplicate metric key, keeping the first definition");
                    registry.mark_invalid();
                }
            }
        }
    }

    registry
}

/// Cached samples drained from one catalog element.
struct SampleBatch {
    id: MetricId,
    samples: BTreeMap<String, RawValue>,
}

/// Rewrite every registered metric's values from the source's cached
/// publication samples.
///
/// Each definition's value map is discarded and rebuilt - a full replace,
/// never a merge - and the consumed caches are cleared so the next cycle
/// only sees samples published since this one. Runs on the worker task only,
/// never concurrently with a snapshot reply.
pub fn refresh<S>(registry: &mut MetricRegistry, source: &mut S)
where
    S: MetricSource + ?Sized,
{
    for definition in registry.definitions_mut() {
        definition.values.clear();
    }

    for batch in drain_samples(source.catalog_mut()) {
        let Some(definition) = registry.get_mut(&batch.id.key()) else {
            continue;
        };
        for (label, raw) in batch.samples {
            let value = source.normalize(&batch.id, &label, raw);
            definition.values.insert(label, value);
        }
    }
}

/// Consume the sample caches of every single-object element.
///
/// Per-object caches are left untouched; they belong to the query-time path.
fn drain_samples(catalog: &mut MetricCatalog) -> Vec<SampleBatch> {
    let mut batches = Vec::new();

    for class in &mut catalog.classes {
        for metric_type in &mut class.types {
            if metric_type.is_per_object() {
                continue;
            }
            for element in &mut metric_type.elements {
                let samples = element.take_samples();
                if samples.is_empty() {
                    continue;
                }
                batches.push(SampleBatch {
                    id: MetricId::new(&class.name, &metric_type.name, &element.name),
                    samples,
                });
            }
        }
    }

    batches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use async_trait::async_trait;

    /// Source backed by a plain catalog, normalizing by a fixed scale.
    struct ScaledSource {
        catalog: MetricCatalog,
        scale: f64,
    }

    impl ScaledSource {
        fn identity(catalog: MetricCatalog) -> Self {
            Self { catalog, scale: 1.0 }
        }
    }

    #[async_trait]
    impl MetricSource for ScaledSource {
        async fn connect(&mut self, _target: &str) -> Result<(), SourceError> {
            Ok(())
        }

        async fn drain_publications(&mut self) -> Result<(), SourceError> {
            Ok(())
        }

        fn catalog(&self) -> &MetricCatalog {
            &self.catalog
        }

        fn catalog_mut(&mut self) -> &mut MetricCatalog {
            &mut self.catalog
        }

        fn normalize(&self, _id: &MetricId, _label: &str, raw: RawValue) -> f64 {
            raw as f64 * self.scale
        }

        async fn disconnect(&mut self) {}
    }

    fn cpu_catalog() -> MetricCatalog {
        MetricCatalog::builder()
            .class("cpu", |class| {
                class
                    .metric_type("user", "$SYS/broker/cpu/user", |t| {
                        t.element("busy_percent", "CPU busy percentage")
                    })
                    .metric_type("system", "$SYS/broker/cpu/system", |t| {
                        t.element("busy_percent", "CPU busy percentage")
                    })
            })
            .build()
    }

    #[test]
    fn build_registers_every_single_object_element() {
        let registry = build(&cpu_catalog());

        assert!(registry.is_valid());
        assert_eq!(registry.len(), 2);
        let keys: Vec<_> = registry.keys().cloned().collect();
        assert_eq!(keys, vec!["cpu/system/busy_percent", "cpu/user/busy_percent"]);
    }

    #[test]
    fn build_skips_per_object_types() {
        let catalog = MetricCatalog::builder()
            .class("queue", |class| {
                class
                    .metric_type("depth", "$SYS/broker/queue/*/depth", |t| {
                        t.element("current", "Current queue depth")
                    })
                    .metric_type("summary", "$SYS/broker/queue/summary", |t| {
                        t.element("total", "Total queued messages")
                    })
            })
            .build();

        let registry = build(&catalog);

        assert!(registry.is_valid());
        assert_eq!(registry.len(), 1);
        assert!(registry.get("queue/summary/total").is_some());
        assert!(registry.get("queue/depth/current").is_none());
    }

    #[test]
    fn build_flags_duplicates_and_keeps_the_first_definition() {
        let catalog = MetricCatalog::builder()
            .class("cpu", |class| {
                class.metric_type("user", "$SYS/broker/cpu/user", |t| {
                    t.element("busy_percent", "first description")
                        .element("busy_percent", "second description")
                })
            })
            .build();

        let registry = build(&catalog);

        assert!(!registry.is_valid());
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("cpu/user/busy_percent").map(|d| d.description.as_str()),
            Some("first description")
        );
    }

    #[test]
    fn insert_is_first_writer_wins() {
        let mut registry = MetricRegistry::new();
        assert!(registry.insert("k", MetricDefinition::new("a", "first")));
        assert!(!registry.insert("k", MetricDefinition::new("b", "second")));
        assert_eq!(registry.get("k").map(|d| d.name.as_str()), Some("a"));
    }

    #[test]
    fn refresh_round_trips_identity_samples() {
        let mut source = ScaledSource::identity(cpu_catalog());
        let mut registry = build(source.catalog());

        let element = &mut source.catalog.classes[0].types[0].elements[0];
        element.record_sample("a", 10);
        element.record_sample("b", 20);

        refresh(&mut registry, &mut source);

        let definition = registry.get("cpu/user/busy_percent").unwrap();
        assert_eq!(definition.value("a"), Some(10.0));
        assert_eq!(definition.value("b"), Some(20.0));
        assert_eq!(definition.values.len(), 2);

        // The consumed cache is empty afterwards.
        assert!(source.catalog.classes[0].types[0].elements[0].samples.is_empty());
    }

    #[test]
    fn refresh_applies_the_normalization_function() {
        let mut source = ScaledSource {
            catalog: cpu_catalog(),
            scale: 0.5,
        };
        let mut registry = build(source.catalog());

        source.catalog.classes[0].types[0].elements[0].record_sample("a", 10);

        refresh(&mut registry, &mut source);

        assert_eq!(
            registry.get("cpu/user/busy_percent").unwrap().value("a"),
            Some(5.0)
        );
    }

    #[test]
    fn refresh_twice_without_new_samples_yields_empty_values() {
        let mut source = ScaledSource::identity(cpu_catalog());
        let mut registry = build(source.catalog());

        source.catalog.classes[0].types[0].elements[0].record_sample("a", 10);

        refresh(&mut registry, &mut source);
        assert!(!registry.get("cpu/user/busy_percent").unwrap().is_empty());

        refresh(&mut registry, &mut source);
        assert!(registry.get("cpu/user/busy_percent").unwrap().is_empty());
    }

    #[test]
    fn refresh_replaces_values_instead_of_merging() {
        let mut source = ScaledSource::identity(cpu_catalog());
        let mut registry = build(source.catalog());

        source.catalog.classes[0].types[0].elements[0].record_sample("a", 10);
        refresh(&mut registry, &mut source);

        source.catalog.classes[0].types[0].elements[0].record_sample("b", 20);
        refresh(&mut registry, &mut source);

        let definition = registry.get("cpu/user/busy_percent").unwrap();
        assert_eq!(definition.value("a"), None);
        assert_eq!(definition.value("b"), Some(20.0));
    }

    #[test]
    fn refresh_leaves_per_object_caches_alone() {
        let catalog = MetricCatalog::builder()
            .class("queue", |class| {
                class.metric_type("depth", "$SYS/broker/queue/*/depth", |t| {
                    t.element("current", "Current queue depth")
                })
            })
            .build();
        let mut source = ScaledSource::identity(catalog);
        let mut registry = build(source.catalog());

        source.catalog.classes[0].types[0].elements[0].record_sample("orders", 7);

        refresh(&mut registry, &mut source);

        // The per-object cache still holds its sample for the query-time path.
        assert_eq!(
            source.catalog.classes[0].types[0].elements[0].samples.get("orders"),
            Some(&7)
        );
        assert!(registry.is_empty());
    }

    #[test]
    fn snapshot_is_a_detached_copy() {
        let mut source = ScaledSource::identity(cpu_catalog());
        let mut registry = build(source.catalog());

        source.catalog.classes[0].types[0].elements[0].record_sample("a", 10);
        refresh(&mut registry, &mut source);

        let snapshot = registry.snapshot();
        assert!(snapshot.valid);
        assert_eq!(snapshot.value("cpu/user/busy_percent", "a"), Some(10.0));

        // Later refreshes do not reach into snapshots already handed out.
        refresh(&mut registry, &mut source);
        assert_eq!(snapshot.value("cpu/user/busy_percent", "a"), Some(10.0));
        assert!(registry.get("cpu/user/busy_percent").unwrap().is_empty());
    }

    #[test]
    fn snapshot_carries_the_validity_flag() {
        let mut registry = MetricRegistry::new();
        registry.insert("k", MetricDefinition::new("a", "first"));
        registry.mark_invalid();

        let snapshot = registry.snapshot();
        assert!(!snapshot.valid);
        assert_eq!(snapshot.len(), 1);
    }
}
