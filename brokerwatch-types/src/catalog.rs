//! The source catalog - metric metadata discovered on connection.
//!
//! A source discovers its metric topics once per connection and exposes them
//! as a nested tree: classes contain types, types contain elements. Each
//! element also carries a cache of raw publication samples that the
//! collector's refresh cycle consumes.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

/// A raw sample value cached from a publication, before normalization.
pub type RawValue = i64;

/// Wildcard marking a topic template as per-object.
///
/// A type whose topic template contains this marker publishes one stream per
/// monitored object. Those metrics are resolved per object at query time and
/// never enter the registry.
pub const OBJECT_WILDCARD: &str = "*";

/// The full metric metadata tree discovered from a source.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricCatalog {
    /// Top-level metric classes (e.g. "cpu", "queue").
    pub classes: Vec<MetricClass>,
}

impl MetricCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder for constructing catalogs.
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Number of elements across every class and type.
    pub fn element_count(&self) -> usize {
        self.classes
            .iter()
            .flat_map(|class| &class.types)
            .map(|metric_type| metric_type.elements.len())
            .sum()
    }

    /// Check if the catalog holds no classes.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// A group of related metric types.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricClass {
    /// Class name, the first component of every derived key below it.
    pub name: String,
    /// The types belonging to this class.
    pub types: Vec<MetricType>,
}

/// A metric type: a publication topic and the elements published on it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricType {
    /// Type name, the second component of derived keys.
    pub name: String,
    /// The topic template this type's metrics are published under.
    pub object_topic: String,
    /// The elements published on this topic.
    pub elements: Vec<MetricElement>,
}

impl MetricType {
    /// True when the topic template publishes one stream per monitored
    /// object (contains [`OBJECT_WILDCARD`]).
    pub fn is_per_object(&self) -> bool {
        self.object_topic.contains(OBJECT_WILDCARD)
    }
}

/// One measurable quantity, plus its cache of raw publication samples.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MetricElement {
    /// Element name, the last component of the derived key.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Cached raw samples, label -> value, filled by publication draining
    /// and consumed by the refresh cycle.
    pub samples: BTreeMap<String, RawValue>,
}

impl MetricElement {
    /// Create an element with an empty sample cache.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            samples: BTreeMap::new(),
        }
    }

    /// Cache a raw publication sample for `label`, replacing any previous one.
    pub fn record_sample(&mut self, label: impl Into<String>, value: RawValue) {
        self.samples.insert(label.into(), value);
    }

    /// Drain the cached samples, leaving the cache empty.
    pub fn take_samples(&mut self) -> BTreeMap<String, RawValue> {
        core::mem::take(&mut self.samples)
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Builder for [`MetricCatalog`].
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    classes: Vec<MetricClass>,
}

impl CatalogBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a class with types built using a closure.
    pub fn class<F>(mut self, name: impl Into<String>, f: F) -> Self
    where
        F: FnOnce(ClassBuilder) -> ClassBuilder,
    {
        let builder = f(ClassBuilder::new(name));
        self.classes.push(builder.build());
        self
    }

    /// Build the catalog.
    pub fn build(self) -> MetricCatalog {
        MetricCatalog {
            classes: self.classes,
        }
    }
}

/// Builder for [`MetricClass`].
#[derive(Debug)]
pub struct ClassBuilder {
    name: String,
    types: Vec<MetricType>,
}

impl ClassBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: Vec::new(),
        }
    }

    /// Add a type publishing on `object_topic`, with elements built using a
    /// closure.
    pub fn metric_type<F>(
        mut self,
        name: impl Into<String>,
        object_topic: impl Into<String>,
        f: F,
    ) -> Self
    where
        F: FnOnce(TypeBuilder) -> TypeBuilder,
    {
        let builder = f(TypeBuilder::new(name, object_topic));
        self.types.push(builder.build());
        self
    }

    fn build(self) -> MetricClass {
        MetricClass {
            name: self.name,
            types: self.types,
        }
    }
}

/// Builder for [`MetricType`].
#[derive(Debug)]
pub struct TypeBuilder {
    name: String,
    object_topic: String,
    elements: Vec<MetricElement>,
}

impl TypeBuilder {
    fn new(name: impl Into<String>, object_topic: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            object_topic: object_topic.into(),
            elements: Vec::new(),
        }
    }

    /// Add an element.
    pub fn element(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.elements.push(MetricElement::new(name, description));
        self
    }

    fn build(self) -> MetricType {
        MetricType {
            name: self.name,
            object_topic: self.object_topic,
            elements: self.elements,
        }
    }
}
