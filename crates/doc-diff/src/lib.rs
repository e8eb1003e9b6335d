//! Document-level comparison for full-compare mode.
//!
//! Hash comparison answers *whether* two deployments diverged; this crate
//! answers *where*. It streams every document of matching namespaces on both
//! sides, sorted by `_id`, and diffs them pairwise using a tagged-variant
//! value model, reporting the specific document keys that were lost, added
//! or changed. Intended for large-scale load-test runs where a coarse hash
//! mismatch is insufficient to triage how much data was actually lost.

pub mod differ;
pub mod value;

pub use differ::{changed_fields, diff_collection, CollectionDiff, FullCompareReport};
pub use value::DocValue;
