//! Cluster-level aggregate fingerprint for sharded deployments.
//!
//! Documents are streamed through the router, so the digest sees the logical
//! data set regardless of chunk placement. Per-document SHA-256 digests fold
//! into a namespace digest by wrapping word-sums, which makes the fold
//! independent of cursor order; the cluster fingerprint then digests the
//! sorted `(namespace, namespace-digest)` sequence. Equal content yields an
//! equal fingerprint on any shard layout.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use compare_core::{classify_driver_error, CompareError, Namespace};
use mongodb::bson::{doc, Document};
use mongodb::Client;
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;

/// Order-independent digest of one namespace's documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NamespaceDigest {
    pub document_count: u64,
    folded: [u64; 4],
}

impl NamespaceDigest {
    /// Fold one document's raw BSON bytes into the digest.
    pub fn fold(&mut self, raw_bson: &[u8]) {
        let digest = Sha256::digest(raw_bson);
        for (i, chunk) in digest.chunks_exact(8).enumerate() {
            let word = u64::from_le_bytes(chunk.try_into().expect("8-byte chunk"));
            self.folded[i] = self.folded[i].wrapping_add(word);
        }
        self.document_count += 1;
    }

    fn write_to(&self, hasher: &mut Sha256) {
        hasher.update(self.document_count.to_le_bytes());
        for word in self.folded {
            hasher.update(word.to_le_bytes());
        }
    }
}

/// Stream every document of `namespace` and fold it into a digest.
pub async fn namespace_digest(
    client: &Client,
    namespace: &Namespace,
) -> Result<NamespaceDigest, CompareError> {
    let collection = client
        .database(&namespace.database)
        .collection::<Document>(&namespace.collection);

    let mut digest = NamespaceDigest::default();
    let mut cursor = collection
        .find(doc! {})
        .await
        .map_err(classify_driver_error)?;
    while cursor.advance().await.map_err(classify_driver_error)? {
        digest.fold(cursor.current().as_bytes());
    }
    tracing::debug!(
        "Digested {} document(s) from '{namespace}'",
        digest.document_count
    );
    Ok(digest)
}

/// Compute one side's whole-cluster fingerprint over `namespaces`.
pub async fn cluster_fingerprint(
    client: &Client,
    namespaces: &BTreeSet<Namespace>,
) -> Result<String, CompareError> {
    let mut hasher = Sha256::new();
    for namespace in namespaces {
        let digest = namespace_digest(client, namespace).await?;
        hasher.update(namespace.to_string().as_bytes());
        digest.write_to(&mut hasher);
    }
    Ok(BASE64.encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::to_vec;

    fn raw(document: &Document) -> Vec<u8> {
        to_vec(document).unwrap()
    }

    #[test]
    fn test_fold_is_order_independent() {
        let a = raw(&doc! { "_id": 1, "data": "x" });
        let b = raw(&doc! { "_id": 2, "data": "y" });

        let mut forward = NamespaceDigest::default();
        forward.fold(&a);
        forward.fold(&b);

        let mut backward = NamespaceDigest::default();
        backward.fold(&b);
        backward.fold(&a);

        assert_eq!(forward, backward);
        assert_eq!(forward.document_count, 2);
    }

    #[test]
    fn test_fold_is_content_sensitive() {
        let mut original = NamespaceDigest::default();
        original.fold(&raw(&doc! { "_id": 1, "data": 10_i32 }));

        let mut changed_value = NamespaceDigest::default();
        changed_value.fold(&raw(&doc! { "_id": 1, "data": 11_i32 }));

        // Same numeric value, different BSON type: still different content.
        let mut changed_type = NamespaceDigest::default();
        changed_type.fold(&raw(&doc! { "_id": 1, "data": 10_i64 }));

        assert_ne!(original, changed_value);
        assert_ne!(original, changed_type);
    }

    #[test]
    fn test_missing_document_changes_digest() {
        let a = raw(&doc! { "_id": 1 });
        let b = raw(&doc! { "_id": 2 });

        let mut full = NamespaceDigest::default();
        full.fold(&a);
        full.fold(&b);

        let mut partial = NamespaceDigest::default();
        partial.fold(&a);

        assert_ne!(full, partial);
    }
}
