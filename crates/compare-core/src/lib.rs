//! Core types for the mongo-compare framework.
//!
//! This crate provides the foundational types used across the comparison
//! framework, including:
//!
//! - [`Namespace`] - A `database.collection` identifier
//! - [`Mismatch`] / [`MismatchReason`] - One reported discrepancy
//! - [`MismatchCollector`] / [`ComparisonReport`] - Aggregation of findings
//! - [`CompareError`] - Fatal error taxonomy
//! - [`CompareOptions`] - Tunables shared by every entry point
//!
//! # Architecture
//!
//! The compare-core crate sits at the foundation of the framework:
//!
//! ```text
//! compare-core (this crate)
//!    │
//!    ├─── topology         (endpoint resolution, namespace enumeration)
//!    ├─── collection-meta  (options and index comparison)
//!    ├─── content-digest   (fingerprints, counts, shard keys)
//!    └─── doc-diff         (document-level comparison)
//! ```
//!
//! # Example
//!
//! ```rust
//! use compare_core::{Mismatch, MismatchCollector, MismatchReason, Namespace};
//!
//! let ns = Namespace::new("test_db1", "test_coll7");
//! let mut collector = MismatchCollector::new();
//! collector.push(Mismatch::collection(&ns, MismatchReason::RecordCount));
//!
//! let report = collector.finish();
//! assert!(!report.passed);
//! assert_eq!(report.mismatches[0], ("test_db1.test_coll7", "record count mismatch"));
//! ```

pub mod error;
pub mod mismatch;
pub mod namespace;
pub mod options;
pub mod report;

// Re-exports for convenience
pub use error::{classify_driver_error, CompareError};
pub use mismatch::{Mismatch, MismatchReason};
pub use namespace::Namespace;
pub use options::CompareOptions;
pub use report::{ComparisonReport, MismatchCollector};
