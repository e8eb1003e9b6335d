//! Cluster topology resolution and namespace enumeration.
//!
//! This crate answers two questions about a deployment before any comparison
//! starts:
//!
//! - what is reachable: [`resolve()`] probes the deployment within a bounded
//!   window and returns its endpoints (replica-set members, or the router
//!   plus shard primaries for sharded clusters)
//! - what is comparable: [`list_namespaces`] enumerates user namespaces,
//!   excluding system databases and internal collections, and
//!   [`partition`] splits the two sides into both/only-source/only-destination
//!
//! Probing failures are fatal: a comparison never runs partially against an
//! unreachable deployment.

pub mod cluster;
pub mod enumerate;
pub mod resolve;

pub use cluster::{ClusterHandle, ClusterLayout, Endpoint, EndpointRole};
pub use enumerate::{list_namespaces, partition, NamespacePartition};
pub use resolve::{connect, resolve, ResolvedCluster};
