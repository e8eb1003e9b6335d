//! Streaming per-document comparison.
//!
//! Both sides are read sorted by `_id` and merge-joined, so memory stays
//! bounded by one document per side no matter how large the collection is.
//! This is the expensive path reserved for explicit full-compare runs, where
//! a coarse hash mismatch is not enough to triage how much data was lost.

use compare_core::{
    classify_driver_error, CompareError, Mismatch, MismatchReason, Namespace,
};
use mongodb::bson::{doc, Document};
use mongodb::{Client, Cursor};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::value::DocValue;

/// Differences found in one namespace, keyed by rendered `_id`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionDiff {
    pub namespace: String,
    pub source_count: u64,
    pub destination_count: u64,
    /// Keys of documents present on source only.
    pub lost: Vec<String>,
    /// Keys of documents present on destination only.
    pub extra: Vec<String>,
    /// Keys of documents present on both sides with differing content.
    pub changed: Vec<String>,
}

impl CollectionDiff {
    pub fn is_clean(&self) -> bool {
        self.lost.is_empty() && self.extra.is_empty() && self.changed.is_empty()
    }

    /// Express the diff in the standard mismatch vocabulary: a count
    /// difference is a record-count finding, any surviving content
    /// difference is a hash finding at namespace scope. The specific
    /// document keys stay available on the diff itself.
    pub fn to_mismatches(&self) -> Vec<Mismatch> {
        let namespace = match Namespace::parse(&self.namespace) {
            Some(ns) => ns,
            None => return Vec::new(),
        };
        let mut mismatches = Vec::new();
        if self.source_count != self.destination_count {
            mismatches.push(Mismatch::collection(&namespace, MismatchReason::RecordCount));
        }
        if !self.is_clean() {
            mismatches.push(Mismatch::collection(&namespace, MismatchReason::Hash));
        }
        mismatches
    }
}

/// Aggregated output of one full-compare run, carrying the per-namespace
/// document keys a coarse report cannot.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FullCompareReport {
    pub collections: Vec<CollectionDiff>,
}

impl FullCompareReport {
    pub fn is_clean(&self) -> bool {
        self.collections.iter().all(CollectionDiff::is_clean)
    }

    pub fn total_lost(&self) -> usize {
        self.collections.iter().map(|d| d.lost.len()).sum()
    }

    pub fn total_extra(&self) -> usize {
        self.collections.iter().map(|d| d.extra.len()).sum()
    }

    pub fn total_changed(&self) -> usize {
        self.collections.iter().map(|d| d.changed.len()).sum()
    }
}

struct KeyedDocument {
    key: DocValue,
    fields: BTreeMap<String, DocValue>,
}

fn keyed(mut document: Document) -> KeyedDocument {
    let key = document
        .remove("_id")
        .map(DocValue::from_bson)
        .unwrap_or(DocValue::Null);
    let fields = document
        .into_iter()
        .map(|(name, value)| (name, DocValue::from_bson(value)))
        .collect();
    KeyedDocument { key, fields }
}

async fn next_document(
    cursor: &mut Cursor<Document>,
) -> Result<Option<KeyedDocument>, CompareError> {
    if !cursor.advance().await.map_err(classify_driver_error)? {
        return Ok(None);
    }
    let document: Document = cursor
        .deserialize_current()
        .map_err(classify_driver_error)?;
    Ok(Some(keyed(document)))
}

/// Top-level field names that differ between two documents, including fields
/// present on one side only.
pub fn changed_fields(
    source: &BTreeMap<String, DocValue>,
    destination: &BTreeMap<String, DocValue>,
) -> Vec<String> {
    let mut fields = Vec::new();
    for (name, value) in source {
        match destination.get(name) {
            Some(other) if other == value => {}
            _ => fields.push(name.clone()),
        }
    }
    for name in destination.keys() {
        if !source.contains_key(name) {
            fields.push(name.clone());
        }
    }
    fields
}

/// Stream both sides of one namespace sorted by `_id` and diff pairwise.
pub async fn diff_collection(
    source: &Client,
    destination: &Client,
    namespace: &Namespace,
) -> Result<CollectionDiff, CompareError> {
    let collection_of = |client: &Client| {
        client
            .database(&namespace.database)
            .collection::<Document>(&namespace.collection)
    };

    let mut src_cursor = collection_of(source)
        .find(doc! {})
        .sort(doc! { "_id": 1 })
        .await
        .map_err(classify_driver_error)?;
    let mut dst_cursor = collection_of(destination)
        .find(doc! {})
        .sort(doc! { "_id": 1 })
        .await
        .map_err(classify_driver_error)?;

    let mut diff = CollectionDiff {
        namespace: namespace.to_string(),
        ..Default::default()
    };

    let mut src_doc = next_document(&mut src_cursor).await?;
    let mut dst_doc = next_document(&mut dst_cursor).await?;
    if src_doc.is_some() {
        diff.source_count += 1;
    }
    if dst_doc.is_some() {
        diff.destination_count += 1;
    }

    loop {
        match (src_doc.take(), dst_doc.take()) {
            (None, None) => break,
            (Some(src), None) => {
                tracing::warn!("Document '{}' in '{namespace}' lost on destination", src.key);
                diff.lost.push(src.key.to_string());
                src_doc = next_document(&mut src_cursor).await?;
                if src_doc.is_some() {
                    diff.source_count += 1;
                }
            }
            (None, Some(dst)) => {
                tracing::warn!(
                    "Document '{}' in '{namespace}' present on destination only",
                    dst.key
                );
                diff.extra.push(dst.key.to_string());
                dst_doc = next_document(&mut dst_cursor).await?;
                if dst_doc.is_some() {
                    diff.destination_count += 1;
                }
            }
            (Some(src), Some(dst)) => match src.key.cmp_sort_key(&dst.key) {
                Ordering::Less => {
                    tracing::warn!(
                        "Document '{}' in '{namespace}' lost on destination",
                        src.key
                    );
                    diff.lost.push(src.key.to_string());
                    dst_doc = Some(dst);
                    src_doc = next_document(&mut src_cursor).await?;
                    if src_doc.is_some() {
                        diff.source_count += 1;
                    }
                }
                Ordering::Greater => {
                    tracing::warn!(
                        "Document '{}' in '{namespace}' present on destination only",
                        dst.key
                    );
                    diff.extra.push(dst.key.to_string());
                    src_doc = Some(src);
                    dst_doc = next_document(&mut dst_cursor).await?;
                    if dst_doc.is_some() {
                        diff.destination_count += 1;
                    }
                }
                Ordering::Equal => {
                    if src.fields != dst.fields {
                        let fields = changed_fields(&src.fields, &dst.fields);
                        tracing::warn!(
                            "Document '{}' in '{namespace}' differs in field(s) {fields:?}",
                            src.key
                        );
                        diff.changed.push(src.key.to_string());
                    }
                    src_doc = next_document(&mut src_cursor).await?;
                    if src_doc.is_some() {
                        diff.source_count += 1;
                    }
                    dst_doc = next_document(&mut dst_cursor).await?;
                    if dst_doc.is_some() {
                        diff.destination_count += 1;
                    }
                }
            },
        }
    }

    if diff.is_clean() {
        tracing::debug!(
            "Collection '{namespace}' matches document-by-document ({} documents)",
            diff.source_count
        );
    }
    Ok(diff)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(doc: Document) -> BTreeMap<String, DocValue> {
        keyed(doc).fields
    }

    #[test]
    fn test_changed_fields_reports_both_directions() {
        let src = fields(doc! { "_id": 1, "kept": "x", "edited": 1, "only_src": true });
        let dst = fields(doc! { "_id": 1, "kept": "x", "edited": 2, "only_dst": true });
        let mut changed = changed_fields(&src, &dst);
        changed.sort();
        assert_eq!(changed, vec!["edited", "only_dst", "only_src"]);
    }

    #[test]
    fn test_keyed_extracts_id() {
        let doc = keyed(doc! { "_id": 7, "data": "payload" });
        assert_eq!(doc.key, DocValue::Int64(7));
        assert!(doc.fields.contains_key("data"));
        assert!(!doc.fields.contains_key("_id"));
    }

    #[test]
    fn test_clean_diff_has_no_mismatches() {
        let diff = CollectionDiff {
            namespace: "db.coll".to_string(),
            source_count: 10,
            destination_count: 10,
            ..Default::default()
        };
        assert!(diff.is_clean());
        assert!(diff.to_mismatches().is_empty());
    }

    #[test]
    fn test_lost_document_yields_count_and_hash_findings() {
        let diff = CollectionDiff {
            namespace: "test_db1.test_coll7".to_string(),
            source_count: 10,
            destination_count: 9,
            lost: vec!["9".to_string()],
            ..Default::default()
        };
        let mismatches = diff.to_mismatches();
        assert_eq!(mismatches.len(), 2);
        assert_eq!(
            mismatches[0],
            ("test_db1.test_coll7", "record count mismatch")
        );
        assert_eq!(mismatches[1], ("test_db1.test_coll7", "hash mismatch"));
    }

    #[test]
    fn test_changed_document_with_equal_counts_yields_hash_only() {
        let diff = CollectionDiff {
            namespace: "db.coll".to_string(),
            source_count: 5,
            destination_count: 5,
            changed: vec!["3".to_string()],
            ..Default::default()
        };
        let mismatches = diff.to_mismatches();
        assert_eq!(mismatches.len(), 1);
        assert_eq!(mismatches[0], ("db.coll", "hash mismatch"));
    }
}
