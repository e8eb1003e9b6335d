//! Replica-set content fingerprints and record counts.

use compare_core::{
    classify_driver_error, CompareError, Mismatch, MismatchReason, Namespace,
};
use mongodb::bson::{doc, Document};
use mongodb::Client;

/// Compute one database's content fingerprint via the server's `dbHash`
/// command, restricted to `collections`. Returns `None` when there is
/// nothing to hash or the command failed transiently (the caller compares
/// `None` like any other value, as two empty databases are equal).
pub async fn database_fingerprint(
    client: &Client,
    database: &str,
    collections: &[String],
) -> Result<Option<String>, CompareError> {
    if collections.is_empty() {
        return Ok(None);
    }
    let reply = client
        .database(database)
        .run_command(doc! { "dbHash": 1, "collections": collections.to_vec() })
        .await;
    match reply {
        Ok(reply) => Ok(reply.get_str("md5").ok().map(str::to_string)),
        Err(err) => match classify_driver_error(err) {
            fatal @ (CompareError::Connectivity(_) | CompareError::Authorization(_)) => {
                Err(fatal)
            }
            other => {
                tracing::warn!("Could not run dbHash on '{database}': {other}");
                Ok(None)
            }
        },
    }
}

async fn collection_count(client: &Client, namespace: &Namespace) -> Result<u64, CompareError> {
    client
        .database(&namespace.database)
        .collection::<Document>(&namespace.collection)
        .count_documents(doc! {})
        .await
        .map_err(classify_driver_error)
}

/// Compare per-collection record counts for one database. Used on its own
/// by the sharded path (where `dbHash` is unavailable through the router)
/// and as the cheap first stage of the replica-set path.
pub async fn compare_database_counts(
    source: &Client,
    destination: &Client,
    database: &str,
    collections: &[String],
) -> Result<Vec<Mismatch>, CompareError> {
    let mut mismatches = Vec::new();

    for collection in collections {
        let namespace = Namespace::new(database, collection.clone());
        let src_count = match collection_count(source, &namespace).await {
            Ok(count) => count,
            Err(fatal @ (CompareError::Connectivity(_) | CompareError::Authorization(_))) => {
                return Err(fatal)
            }
            Err(err) => {
                tracing::warn!("Could not count documents in '{namespace}': {err}");
                mismatches.push(Mismatch::collection(&namespace, MismatchReason::TransientRead));
                continue;
            }
        };
        let dst_count = match collection_count(destination, &namespace).await {
            Ok(count) => count,
            Err(fatal @ (CompareError::Connectivity(_) | CompareError::Authorization(_))) => {
                return Err(fatal)
            }
            Err(err) => {
                tracing::warn!("Could not count documents in '{namespace}': {err}");
                mismatches.push(Mismatch::collection(&namespace, MismatchReason::TransientRead));
                continue;
            }
        };
        if src_count != dst_count {
            tracing::info!(
                "Collection '{namespace}' record count mismatch: {src_count} != {dst_count}"
            );
            mismatches.push(Mismatch::collection(&namespace, MismatchReason::RecordCount));
        }
    }

    Ok(mismatches)
}

/// Compare one database's content across the two sides.
///
/// Record counts run first (cheap) and localize drift to specific
/// collections; the fingerprints then decide whether the database as a whole
/// drifted. Both findings can co-occur: a lost document produces the
/// collection's count mismatch and the owning database's hash mismatch.
pub async fn compare_database_content(
    source: &Client,
    destination: &Client,
    database: &str,
    collections: &[String],
) -> Result<Vec<Mismatch>, CompareError> {
    let mut mismatches =
        compare_database_counts(source, destination, database, collections).await?;

    let src_hash = database_fingerprint(source, database, collections).await?;
    let dst_hash = database_fingerprint(destination, database, collections).await?;
    if src_hash != dst_hash {
        tracing::info!(
            "Database '{database}' hash mismatch: {src_hash:?} != {dst_hash:?}"
        );
        mismatches.push(Mismatch::database(database, MismatchReason::Hash));
    }

    Ok(mismatches)
}
