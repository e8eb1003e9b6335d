//! Descriptor retrieval.

use compare_core::{classify_driver_error, CompareError, Namespace};
use mongodb::bson::doc;
use mongodb::Client;
use std::collections::BTreeMap;

use crate::descriptor::{CollectionDescriptor, CollectionOptions};
use crate::index::IndexSpec;

/// Fetch the descriptor of one namespace via `listCollections` and
/// `listIndexes`. Returns `Ok(None)` if the collection vanished between
/// enumeration and inspection (a concurrent DDL race the caller reports as a
/// transient read).
pub async fn fetch_descriptor(
    client: &Client,
    namespace: &Namespace,
) -> Result<Option<CollectionDescriptor>, CompareError> {
    let database = client.database(&namespace.database);

    let listing = database
        .run_command(doc! {
            "listCollections": 1,
            "filter": { "name": namespace.collection.as_str() },
        })
        .await
        .map_err(classify_driver_error)?;

    let entry = listing
        .get_document("cursor")
        .ok()
        .and_then(|cursor| cursor.get_array("firstBatch").ok())
        .and_then(|batch| batch.first())
        .and_then(|item| item.as_document());

    let Some(entry) = entry else {
        tracing::warn!("Collection '{namespace}' vanished during comparison");
        return Ok(None);
    };

    let options = entry
        .get_document("options")
        .map(CollectionOptions::from_document)
        .unwrap_or_default();

    // listIndexes fits in one batch: the server caps a collection at 64
    // indexes, well under the default cursor batch size.
    let indexes_reply = database
        .run_command(doc! { "listIndexes": namespace.collection.as_str() })
        .await
        .map_err(classify_driver_error)?;

    let mut indexes = BTreeMap::new();
    if let Ok(cursor) = indexes_reply.get_document("cursor") {
        if let Ok(batch) = cursor.get_array("firstBatch") {
            for item in batch.iter().filter_map(|i| i.as_document()) {
                if let Some(spec) = IndexSpec::from_document(item) {
                    indexes.insert(spec.name.clone(), spec);
                }
            }
        }
    }

    Ok(Some(CollectionDescriptor {
        namespace: namespace.clone(),
        options,
        indexes,
    }))
}
