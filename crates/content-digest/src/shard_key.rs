//! Shard-key metadata comparison.
//!
//! Shard-key-altering operations (refine, reshard, unshard) are expected to
//! be rejected or only partially replicated by the tools under test, so the
//! checker surfaces shard-key drift distinctly from generic content drift.

use compare_core::{classify_driver_error, CompareError, Mismatch, MismatchReason, Namespace};
use mongodb::bson::{doc, Bson, Document};
use mongodb::Client;
use std::collections::{BTreeMap, BTreeSet};

/// The declared sharding of one namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardKeySpec {
    /// Normalized key pattern: field name to direction/type token, ordered.
    pub key: Vec<(String, String)>,
    pub unique: bool,
}

fn normalize_key_pattern(key: &Document) -> Vec<(String, String)> {
    key.iter()
        .map(|(field, value)| {
            let token = match value {
                Bson::Int32(n) => n.to_string(),
                Bson::Int64(n) => n.to_string(),
                Bson::Double(n) => (*n as i64).to_string(),
                Bson::String(s) => s.clone(),
                other => other.to_string(),
            };
            (field.clone(), token)
        })
        .collect()
}

/// Read the routing catalog (`config.collections`) through the router.
pub async fn sharding_catalog(
    client: &Client,
) -> Result<BTreeMap<String, ShardKeySpec>, CompareError> {
    let collections = client
        .database("config")
        .collection::<Document>("collections");

    let mut catalog = BTreeMap::new();
    let mut cursor = collections
        .find(doc! {})
        .await
        .map_err(classify_driver_error)?;
    while cursor.advance().await.map_err(classify_driver_error)? {
        let entry: Document = cursor
            .deserialize_current()
            .map_err(classify_driver_error)?;
        let Ok(ns) = entry.get_str("_id") else {
            continue;
        };
        // The catalog tracks internal namespaces (e.g. config.system.sessions)
        // and, on older servers, tombstones of dropped collections.
        if ns.starts_with("config.") || entry.get_bool("dropped").unwrap_or(false) {
            continue;
        }
        let Ok(key) = entry.get_document("key") else {
            continue;
        };
        catalog.insert(
            ns.to_string(),
            ShardKeySpec {
                key: normalize_key_pattern(key),
                unique: entry.get_bool("unique").unwrap_or(false),
            },
        );
    }
    Ok(catalog)
}

/// Compare declared sharding for every both-sides namespace.
pub fn compare_shard_keys(
    namespaces: &BTreeSet<Namespace>,
    source: &BTreeMap<String, ShardKeySpec>,
    destination: &BTreeMap<String, ShardKeySpec>,
) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();

    for namespace in namespaces {
        let qualified = namespace.to_string();
        match (source.get(&qualified), destination.get(&qualified)) {
            (None, None) => {}
            (Some(_), None) | (None, Some(_)) => {
                tracing::info!("Collection '{namespace}' sharding status differs");
                mismatches.push(Mismatch::collection(
                    namespace,
                    MismatchReason::ShardingStatus,
                ));
            }
            (Some(src), Some(dst)) => {
                if src.key != dst.key {
                    tracing::info!(
                        "Collection '{namespace}' shard key mismatch: {:?} != {:?}",
                        src.key,
                        dst.key
                    );
                    mismatches.push(Mismatch::collection(namespace, MismatchReason::ShardKey));
                } else if src.unique != dst.unique {
                    tracing::info!(
                        "Collection '{namespace}' shard key unique flag mismatch: {} != {}",
                        src.unique,
                        dst.unique
                    );
                    mismatches.push(Mismatch::collection(
                        namespace,
                        MismatchReason::ShardKeyUnique,
                    ));
                }
            }
        }
    }

    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn namespaces(names: &[&str]) -> BTreeSet<Namespace> {
        names.iter().map(|n| Namespace::parse(n).unwrap()).collect()
    }

    fn spec(key: Document, unique: bool) -> ShardKeySpec {
        ShardKeySpec {
            key: normalize_key_pattern(&key),
            unique,
        }
    }

    #[test]
    fn test_key_pattern_width_is_normalized() {
        assert_eq!(
            normalize_key_pattern(&doc! { "shard_key": 1_i32 }),
            normalize_key_pattern(&doc! { "shard_key": 1.0 })
        );
        assert_ne!(
            normalize_key_pattern(&doc! { "shard_key": 1 }),
            normalize_key_pattern(&doc! { "shard_key": "hashed" })
        );
    }

    #[test]
    fn test_status_mismatch_when_sharded_on_one_side() {
        let ns = namespaces(&["test_db2.sharded_coll2"]);
        let mut src = BTreeMap::new();
        src.insert(
            "test_db2.sharded_coll2".to_string(),
            spec(doc! { "shard_key": 1 }, false),
        );
        let dst = BTreeMap::new();
        let mismatches = compare_shard_keys(&ns, &src, &dst);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(
            mismatches[0],
            ("test_db2.sharded_coll2", "sharding status mismatch")
        );
    }

    #[test]
    fn test_key_mismatch_reported() {
        let ns = namespaces(&["test_db2.sharded_coll3"]);
        let mut src = BTreeMap::new();
        src.insert(
            "test_db2.sharded_coll3".to_string(),
            spec(doc! { "shard_key": 1 }, false),
        );
        let mut dst = BTreeMap::new();
        dst.insert(
            "test_db2.sharded_coll3".to_string(),
            spec(doc! { "alt_key": 1 }, false),
        );
        let mismatches = compare_shard_keys(&ns, &src, &dst);
        assert_eq!(
            mismatches[0],
            ("test_db2.sharded_coll3", "shard key mismatch")
        );
    }

    #[test]
    fn test_unique_flag_mismatch_reported() {
        let ns = namespaces(&["test_db2.sharded_coll5"]);
        let mut src = BTreeMap::new();
        src.insert(
            "test_db2.sharded_coll5".to_string(),
            spec(doc! { "shard_key": 1 }, true),
        );
        let mut dst = BTreeMap::new();
        dst.insert(
            "test_db2.sharded_coll5".to_string(),
            spec(doc! { "shard_key": 1 }, false),
        );
        let mismatches = compare_shard_keys(&ns, &src, &dst);
        assert_eq!(
            mismatches[0],
            ("test_db2.sharded_coll5", "shard key unique flag mismatch")
        );
    }

    #[test]
    fn test_matching_sharding_yields_nothing() {
        let ns = namespaces(&["test_db2.sharded_coll1", "test_db2.unsharded"]);
        let mut src = BTreeMap::new();
        src.insert(
            "test_db2.sharded_coll1".to_string(),
            spec(doc! { "shard_key": 1 }, false),
        );
        let dst = src.clone();
        assert!(compare_shard_keys(&ns, &src, &dst).is_empty());
    }
}
