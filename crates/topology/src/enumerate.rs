//! Namespace enumeration and partitioning.

use compare_core::{classify_driver_error, CompareError, Mismatch, MismatchReason, Namespace};
use futures::TryStreamExt;
use mongodb::results::CollectionType;
use mongodb::Client;
use std::collections::BTreeSet;

/// Databases that are never part of a comparison.
pub const SYSTEM_DATABASES: &[&str] = &["admin", "local", "config"];

/// Bookkeeping databases created by the replication tools under test on the
/// deployments they manage. Their content is tool state, not user data.
pub const TOOL_DATABASES: &[&str] = &["percona_clustersync_mongodb", "percona_mongolink"];

fn is_excluded_database(name: &str) -> bool {
    SYSTEM_DATABASES.contains(&name) || TOOL_DATABASES.contains(&name)
}

/// Internal collections are excluded. GridFS buckets (`fs.files`,
/// `fs.chunks`) carry no `system.` prefix and stay in.
fn is_internal_collection(name: &str) -> bool {
    name.starts_with("system.")
}

/// Enumerate the user namespaces of one deployment.
///
/// Views are skipped: record counts, index listings and content hashing are
/// undefined on them.
pub async fn list_namespaces(client: &Client) -> Result<BTreeSet<Namespace>, CompareError> {
    let mut namespaces = BTreeSet::new();

    let database_names = client
        .list_database_names()
        .await
        .map_err(classify_driver_error)?;

    for database_name in database_names {
        if is_excluded_database(&database_name) {
            continue;
        }
        let database = client.database(&database_name);
        let mut collections = database
            .list_collections()
            .await
            .map_err(classify_driver_error)?;
        while let Some(spec) = collections.try_next().await.map_err(classify_driver_error)? {
            if is_internal_collection(&spec.name) {
                continue;
            }
            if matches!(spec.collection_type, CollectionType::View) {
                continue;
            }
            namespaces.insert(Namespace::new(database_name.clone(), spec.name));
        }
    }

    tracing::debug!("Enumerated {} user namespace(s)", namespaces.len());
    Ok(namespaces)
}

/// The three-way split of two deployments' namespace sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacePartition {
    /// Present on both sides; everything downstream compares only these.
    pub both: BTreeSet<Namespace>,
    /// Present on source only.
    pub only_src: BTreeSet<Namespace>,
    /// Present on destination only.
    pub only_dst: BTreeSet<Namespace>,
}

impl NamespacePartition {
    /// One presence mismatch per one-sided namespace. These suppress all
    /// finer-grained findings for the same namespace.
    pub fn presence_mismatches(&self) -> Vec<Mismatch> {
        let mut mismatches = Vec::new();
        for ns in &self.only_src {
            mismatches.push(Mismatch::collection(ns, MismatchReason::MissingInDst));
        }
        for ns in &self.only_dst {
            mismatches.push(Mismatch::collection(ns, MismatchReason::MissingInSrc));
        }
        mismatches
    }

    /// Databases owning at least one both-sides namespace, with their
    /// both-sides collections, in database order.
    pub fn databases(&self) -> Vec<(String, Vec<String>)> {
        let mut databases: Vec<(String, Vec<String>)> = Vec::new();
        for ns in &self.both {
            match databases.last_mut() {
                Some((db, collections)) if *db == ns.database => {
                    collections.push(ns.collection.clone());
                }
                _ => databases.push((ns.database.clone(), vec![ns.collection.clone()])),
            }
        }
        databases
    }
}

/// Partition two namespace sets into both/only-source/only-destination.
pub fn partition(
    source: &BTreeSet<Namespace>,
    destination: &BTreeSet<Namespace>,
) -> NamespacePartition {
    NamespacePartition {
        both: source.intersection(destination).cloned().collect(),
        only_src: source.difference(destination).cloned().collect(),
        only_dst: destination.difference(source).cloned().collect(),
    }
}
