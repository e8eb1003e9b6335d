//! Descriptor comparison.

use compare_core::{Mismatch, MismatchReason, Namespace};
use std::collections::{BTreeMap, BTreeSet};

use crate::descriptor::{CollectionDescriptor, CollectionOptions};
use crate::index::IndexSpec;

/// Compare two normalized option sets. Any difference collapses to a single
/// `options mismatch` for the namespace; callers that need the field-level
/// detail get it from the debug log.
pub fn compare_options(
    namespace: &Namespace,
    source: &CollectionOptions,
    destination: &CollectionOptions,
) -> Option<Mismatch> {
    if source == destination {
        return None;
    }
    tracing::debug!(
        "Collection '{namespace}' options differ: source {source:?}, destination {destination:?}"
    );
    Some(Mismatch::collection(namespace, MismatchReason::Options))
}

/// Compare two index maps by name.
///
/// An index present on one side only, or present on both with a differing
/// key pattern or significant option, yields one mismatch whose reason is
/// the index name. The implicit `_id` index is excluded.
pub fn compare_indexes(
    namespace: &Namespace,
    source: &BTreeMap<String, IndexSpec>,
    destination: &BTreeMap<String, IndexSpec>,
) -> Vec<Mismatch> {
    let mut mismatches = Vec::new();

    let names: BTreeSet<&String> = source.keys().chain(destination.keys()).collect();
    for name in names {
        match (source.get(name), destination.get(name)) {
            (Some(spec), _) | (_, Some(spec)) if spec.is_id_index() => continue,
            (Some(src), Some(dst)) => {
                if src != dst {
                    tracing::debug!(
                        "Collection '{namespace}': index '{name}' differs: source {src:?}, destination {dst:?}"
                    );
                    mismatches.push(Mismatch::index(namespace, name.clone()));
                }
            }
            (Some(_), None) => {
                tracing::debug!(
                    "Collection '{namespace}': index '{name}' exists on source only"
                );
                mismatches.push(Mismatch::index(namespace, name.clone()));
            }
            (None, Some(_)) => {
                tracing::debug!(
                    "Collection '{namespace}': index '{name}' exists on destination only"
                );
                mismatches.push(Mismatch::index(namespace, name.clone()));
            }
            (None, None) => unreachable!("name came from one of the two maps"),
        }
    }

    mismatches
}

/// Full metadata comparison of one both-sides namespace.
pub fn compare_namespace(
    source: &CollectionDescriptor,
    destination: &CollectionDescriptor,
) -> Vec<Mismatch> {
    let namespace = &source.namespace;
    let mut mismatches = Vec::new();
    if let Some(m) = compare_options(namespace, &source.options, &destination.options) {
        mismatches.push(m);
    }
    mismatches.extend(compare_indexes(
        namespace,
        &source.indexes,
        &destination.indexes,
    ));
    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::Collation;
    use mongodb::bson::doc;

    fn ns() -> Namespace {
        Namespace::new("test_db1", "test_coll1")
    }

    fn index(doc: mongodb::bson::Document) -> IndexSpec {
        IndexSpec::from_document(&doc).unwrap()
    }

    fn index_map(specs: Vec<IndexSpec>) -> BTreeMap<String, IndexSpec> {
        specs.into_iter().map(|s| (s.name.clone(), s)).collect()
    }

    #[test]
    fn test_equal_options_yield_nothing() {
        let options = CollectionOptions::from_document(&doc! { "capped": true, "size": 1024 });
        assert!(compare_options(&ns(), &options, &options.clone()).is_none());
    }

    #[test]
    fn test_multiple_option_differences_collapse_to_one_entry() {
        let source = CollectionOptions {
            capped: true,
            capped_size: Some(1024 * 1024),
            capped_max: Some(1000),
            collation: Some(Collation {
                locale: "fr".into(),
                strength: 3,
            }),
            ..Default::default()
        };
        let destination = CollectionOptions::default();
        let mismatch = compare_options(&ns(), &source, &destination).unwrap();
        assert_eq!(mismatch, ("test_db1.test_coll1", "options mismatch"));
    }

    #[test]
    fn test_id_index_is_excluded() {
        let both = index_map(vec![index(doc! { "name": "_id_", "key": { "_id": 1 } })]);
        let only_one_side = index_map(vec![]);
        assert!(compare_indexes(&ns(), &both, &only_one_side).is_empty());
    }

    #[test]
    fn test_one_sided_index_reported_by_name() {
        let source = index_map(vec![
            index(doc! { "name": "_id_", "key": { "_id": 1 } }),
            index(doc! { "name": "index_basic", "key": { "key": 1 } }),
        ]);
        let destination = index_map(vec![index(doc! { "name": "_id_", "key": { "_id": 1 } })]);
        let mismatches = compare_indexes(&ns(), &source, &destination);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0], ("test_db1.test_coll1", "index_basic"));
    }

    #[test]
    fn test_direction_flip_reported_once() {
        let source = index_map(vec![index(
            doc! { "name": "index_basic", "key": { "key": 1 } },
        )]);
        let destination = index_map(vec![index(
            doc! { "name": "index_basic", "key": { "key": -1 } },
        )]);
        let mismatches = compare_indexes(&ns(), &source, &destination);
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0], ("test_db1.test_coll1", "index_basic"));
    }

    #[test]
    fn test_unique_flag_difference_reported() {
        let source = index_map(vec![index(
            doc! { "name": "index_unique", "key": { "key": 1 }, "unique": true },
        )]);
        let destination = index_map(vec![index(
            doc! { "name": "index_unique", "key": { "key": 1 } },
        )]);
        assert_eq!(compare_indexes(&ns(), &source, &destination).len(), 1);
    }

    #[test]
    fn test_partial_filter_difference_reported() {
        let source = index_map(vec![index(doc! {
            "name": "index_partial",
            "key": { "key": 1 },
            "partialFilterExpression": { "data": { "$gt": 5 } },
        })]);
        let destination = index_map(vec![index(
            doc! { "name": "index_partial", "key": { "key": 1 } },
        )]);
        assert_eq!(compare_indexes(&ns(), &source, &destination).len(), 1);
    }

    #[test]
    fn test_index_isolation_no_other_findings() {
        // An index-only change yields exactly one (ns, index_name) entry and
        // no options finding.
        let descriptor = |unique: bool| CollectionDescriptor {
            namespace: ns(),
            options: CollectionOptions::default(),
            indexes: index_map(vec![index(
                doc! { "name": "index_unique", "key": { "key": 1 }, "unique": unique },
            )]),
        };
        let mismatches = compare_namespace(&descriptor(true), &descriptor(false));
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0], ("test_db1.test_coll1", "index_unique"));
    }
}
