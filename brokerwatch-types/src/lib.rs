//! # brokerwatch-types
//!
//! Core types for broker metrics synchronization. This crate defines the
//! schema shared between the brokerwatch collector and anything that feeds it:
//! the catalog of metric metadata a source discovers on connection, the
//! identity scheme that turns catalog entries into registry keys, and the
//! snapshot type handed to snapshot consumers.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: plain data types, no runtime or
//!   serialization framework needed
//! - **Optional serialization**: enable the `serde` feature when snapshots
//!   cross a process boundary
//! - **Source agnostic**: nothing here assumes a particular broker; a source
//!   maps its own discovery output onto the catalog model
//! - **Deterministic iteration**: `BTreeMap` everywhere, so rendered output
//!   and test assertions are stable
//!
//! ## Features
//!
//! - `std` (default): standard library support (snapshot timestamps)
//! - `serde`: serialization of every schema type via serde
//!
//! ## Example
//!
//! ```rust
//! use brokerwatch_types::{MetricCatalog, MetricId};
//!
//! // A catalog as a source would discover it: classes contain types,
//! // types contain elements.
//! let catalog = MetricCatalog::builder()
//!     .class("cpu", |class| {
//!         class.metric_type("user", "$SYS/broker/cpu/user", |t| {
//!             t.element("busy_percent", "CPU busy percentage")
//!         })
//!     })
//!     .build();
//!
//! assert_eq!(catalog.element_count(), 1);
//!
//! // Registry keys join the three level names.
//! let id = MetricId::new("cpu", "user", "busy_percent");
//! assert_eq!(id.key(), "cpu/user/busy_percent");
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod catalog;
mod definition;
mod id;
mod snapshot;

pub use catalog::*;
pub use definition::*;
pub use id::*;
pub use snapshot::*;
