//! Content comparison.
//!
//! Two fingerprinting strategies, selected by topology:
//!
//! - **Replica sets**: the server's `dbHash` command digests each database
//!   (restricted to the collections present on both sides), and per-collection
//!   record counts localize count-level drift cheaply. Content drift with
//!   equal counts is reported at database scope only; localizing further
//!   means streaming every document, which is what full-compare mode is for.
//! - **Sharded clusters**: `dbHash` is shard-local and chunk migrations can
//!   relocate any document to any shard at any time, so the only meaningful
//!   granularity is the whole cluster. [`aggregate::cluster_fingerprint`]
//!   streams every document through the router and folds per-document
//!   digests order-independently.
//!
//! The shard-key check reads the routing catalog (`config.collections`) on
//! both routers, surfacing shard-key drift (refine/reshard/unshard effects)
//! distinctly from generic content drift.

pub mod aggregate;
pub mod fingerprint;
pub mod shard_key;

pub use aggregate::{cluster_fingerprint, namespace_digest, NamespaceDigest};
pub use fingerprint::{compare_database_content, compare_database_counts, database_fingerprint};
pub use shard_key::{compare_shard_keys, sharding_catalog, ShardKeySpec};
