//! Collection metadata comparison.
//!
//! Compares the schema-level surface of a namespace across two deployments:
//! the normalized collection option set (capped settings, collation,
//! change-stream pre/post images, clustered index, timeseries spec) and the
//! index definitions.
//!
//! Option differences collapse to a single `options mismatch` per namespace.
//! Indexes compare by name, not structural identity: creation order and
//! build flags are irrelevant to a migration; what matters is whether an
//! index with a given name does the same thing on both sides.

pub mod compare;
pub mod descriptor;
pub mod fetch;
pub mod index;

pub use compare::{compare_indexes, compare_namespace, compare_options};
pub use descriptor::{Collation, CollectionDescriptor, CollectionOptions, TimeseriesSpec};
pub use fetch::fetch_descriptor;
pub use index::{IndexDirection, IndexSpec};
