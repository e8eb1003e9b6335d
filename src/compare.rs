//! Comparison entry points and orchestration.
//!
//! Three callable entry points match the observed call sites of the test
//! suites this checker serves: [`compare_replica_set`] (plus an ad-hoc
//! host/port overload), [`compare_sharded`] (coarse boolean), and
//! [`compare_generic`] (topology-dispatching, with shard-key checks).
//!
//! Every run is read-only and stateless: resolve both topologies, enumerate
//! and partition namespaces, fan per-namespace and per-database checks out
//! on a bounded worker pool, and merge everything through the collector.
//! The whole run is cancelled as a unit when the caller's deadline expires;
//! partial results are discarded rather than returned.

use compare_core::{
    CompareError, CompareOptions, ComparisonReport, Mismatch, MismatchCollector, MismatchReason,
    Namespace,
};
use futures::{stream, Future, StreamExt};
use mongodb::Client;
use topology::{ClusterHandle, ClusterLayout, NamespacePartition};

/// Compare two replica-set deployments.
///
/// Checks namespace presence, collection options, index definitions,
/// per-collection record counts and per-database content fingerprints (or,
/// in full-compare mode, every document pairwise).
pub async fn compare_replica_set(
    source: &ClusterHandle,
    destination: &ClusterHandle,
    options: &CompareOptions,
) -> Result<ComparisonReport, CompareError> {
    with_deadline(options, run_replica_set(source, destination, options)).await
}

/// Host/port overload of [`compare_replica_set`] for ad-hoc endpoints
/// outside the managed-cluster abstraction (e.g. a node reachable on a
/// mapped localhost port during a load test).
pub async fn compare_replica_set_hosts(
    source_host: &str,
    destination_host: &str,
    port: u16,
    full_compare: bool,
) -> Result<ComparisonReport, CompareError> {
    let source = ClusterHandle::replica_set(format!(
        "mongodb://{source_host}:{port}/?directConnection=true"
    ));
    let destination = ClusterHandle::replica_set(format!(
        "mongodb://{destination_host}:{port}/?directConnection=true"
    ));
    let options = CompareOptions::default().with_full_compare(full_compare);
    compare_replica_set(&source, &destination, &options).await
}

/// Compare two sharded clusters through their routers.
///
/// Content is judged by one aggregate fingerprint per side: chunk migrations
/// can relocate any document to any shard at any time, and shard counts or
/// boundaries may legitimately differ after a migration, so per-shard
/// correspondence is meaningless. The verdict is a coarse boolean with no
/// itemized content findings; presence, count and metadata checks still run
/// and fold into it.
pub async fn compare_sharded(
    source: &ClusterHandle,
    destination: &ClusterHandle,
    options: &CompareOptions,
) -> Result<bool, CompareError> {
    with_deadline(options, run_sharded(source, destination, options)).await
}

/// Topology-dispatching entry point.
///
/// Replica sets get the full itemized replica-set comparison. If either side
/// is sharded, the itemized checks run through the routers and the shard-key
/// metadata catalog is compared as well, surfacing refine/reshard/unshard
/// drift distinctly from content drift.
pub async fn compare_generic(
    source: &ClusterHandle,
    destination: &ClusterHandle,
    options: &CompareOptions,
) -> Result<ComparisonReport, CompareError> {
    with_deadline(options, run_generic(source, destination, options)).await
}

async fn with_deadline<T>(
    options: &CompareOptions,
    run: impl Future<Output = Result<T, CompareError>>,
) -> Result<T, CompareError> {
    match options.deadline {
        Some(deadline) => match tokio::time::timeout(deadline, run).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("Comparison cancelled: deadline of {deadline:?} expired");
                Err(CompareError::DeadlineExceeded(deadline))
            }
        },
        None => run.await,
    }
}

/// Resolve both sides and partition their namespaces. Presence mismatches
/// land in the collector; everything downstream sees only both-sides
/// namespaces.
async fn resolve_and_partition(
    source: &ClusterHandle,
    destination: &ClusterHandle,
    options: &CompareOptions,
    collector: &mut MismatchCollector,
) -> Result<(Client, Client, NamespacePartition), CompareError> {
    let src = topology::resolve(source, options.probe_timeout).await?;
    let dst = topology::resolve(destination, options.probe_timeout).await?;
    tracing::info!(
        "Comparing {} deployment ({} endpoint(s)) against {} deployment ({} endpoint(s))",
        src.layout,
        src.endpoints.len(),
        dst.layout,
        dst.endpoints.len()
    );

    let src_namespaces = topology::list_namespaces(&src.client).await?;
    let dst_namespaces = topology::list_namespaces(&dst.client).await?;
    let partition = topology::partition(&src_namespaces, &dst_namespaces);

    for mismatch in partition.presence_mismatches() {
        tracing::info!("{mismatch}");
        collector.push(mismatch);
    }

    Ok((src.client, dst.client, partition))
}

/// Degrade a per-namespace failure to a transient-read finding, unless the
/// deployment itself became unreachable or unauthorized.
fn degrade_transient(
    err: CompareError,
    namespace: &Namespace,
) -> Result<Vec<Mismatch>, CompareError> {
    match err {
        fatal @ (CompareError::Connectivity(_) | CompareError::Authorization(_)) => Err(fatal),
        err => {
            tracing::warn!("Transient read failure on '{namespace}': {err}");
            Ok(vec![Mismatch::collection(
                namespace,
                MismatchReason::TransientRead,
            )])
        }
    }
}

async fn namespace_metadata(
    source: &Client,
    destination: &Client,
    namespace: &Namespace,
) -> Result<Vec<Mismatch>, CompareError> {
    let descriptors = tokio::try_join!(
        collection_meta::fetch_descriptor(source, namespace),
        collection_meta::fetch_descriptor(destination, namespace),
    );
    match descriptors {
        Ok((Some(src), Some(dst))) => Ok(collection_meta::compare_namespace(&src, &dst)),
        // The collection vanished between enumeration and inspection.
        Ok(_) => Ok(vec![Mismatch::collection(
            namespace,
            MismatchReason::TransientRead,
        )]),
        Err(err) => degrade_transient(err, namespace),
    }
}

/// Metadata comparison for every both-sides namespace, on the worker pool.
async fn compare_metadata(
    source: &Client,
    destination: &Client,
    partition: &NamespacePartition,
    options: &CompareOptions,
    collector: &mut MismatchCollector,
) -> Result<(), CompareError> {
    let results: Vec<Result<Vec<Mismatch>, CompareError>> =
        stream::iter(partition.both.iter().cloned())
            .map(|namespace| {
                let source = source.clone();
                let destination = destination.clone();
                async move { namespace_metadata(&source, &destination, &namespace).await }
            })
            .buffer_unordered(options.concurrency)
            .collect()
            .await;
    for result in results {
        collector.extend(result?);
    }
    Ok(())
}

/// Replica-set content comparison: counts plus `dbHash` fingerprints per
/// database, or the per-document differ in full-compare mode.
async fn compare_content_replica_set(
    source: &Client,
    destination: &Client,
    partition: &NamespacePartition,
    options: &CompareOptions,
    collector: &mut MismatchCollector,
) -> Result<(), CompareError> {
    if options.full_compare {
        let results: Vec<Result<(Vec<Mismatch>, Option<doc_diff::CollectionDiff>), CompareError>> =
            stream::iter(partition.both.iter().cloned())
                .map(|namespace| {
                    let source = source.clone();
                    let destination = destination.clone();
                    async move {
                        match doc_diff::diff_collection(&source, &destination, &namespace).await
                        {
                            Ok(diff) => Ok((diff.to_mismatches(), Some(diff))),
                            Err(err) => degrade_transient(err, &namespace)
                                .map(|mismatches| (mismatches, None)),
                        }
                    }
                })
                .buffer_unordered(options.concurrency)
                .collect()
                .await;

        let mut full_report = doc_diff::FullCompareReport::default();
        for result in results {
            let (mismatches, diff) = result?;
            collector.extend(mismatches);
            if let Some(diff) = diff {
                full_report.collections.push(diff);
            }
        }
        if !full_report.is_clean() {
            tracing::info!(
                "Full compare: {} document(s) lost, {} extra, {} changed",
                full_report.total_lost(),
                full_report.total_extra(),
                full_report.total_changed()
            );
        }
        return Ok(());
    }

    let results: Vec<Result<Vec<Mismatch>, CompareError>> =
        stream::iter(partition.databases())
            .map(|(database, collections)| {
                let source = source.clone();
                let destination = destination.clone();
                async move {
                    content_digest::compare_database_content(
                        &source,
                        &destination,
                        &database,
                        &collections,
                    )
                    .await
                }
            })
            .buffer_unordered(options.concurrency)
            .collect()
            .await;
    for result in results {
        collector.extend(result?);
    }
    Ok(())
}

/// Per-collection record counts through the routers. The sharded equivalent
/// of the replica-set content check; fingerprinting happens (if at all) at
/// whole-cluster granularity separately.
async fn compare_content_sharded(
    source: &Client,
    destination: &Client,
    partition: &NamespacePartition,
    options: &CompareOptions,
    collector: &mut MismatchCollector,
) -> Result<(), CompareError> {
    let results: Vec<Result<Vec<Mismatch>, CompareError>> =
        stream::iter(partition.databases())
            .map(|(database, collections)| {
                let source = source.clone();
                let destination = destination.clone();
                async move {
                    content_digest::compare_database_counts(
                        &source,
                        &destination,
                        &database,
                        &collections,
                    )
                    .await
                }
            })
            .buffer_unordered(options.concurrency)
            .collect()
            .await;
    for result in results {
        collector.extend(result?);
    }
    Ok(())
}

async fn compare_shard_keys(
    source: &Client,
    destination: &Client,
    partition: &NamespacePartition,
    collector: &mut MismatchCollector,
) -> Result<(), CompareError> {
    let (src_catalog, dst_catalog) = tokio::try_join!(
        content_digest::sharding_catalog(source),
        content_digest::sharding_catalog(destination),
    )?;
    collector.extend(content_digest::compare_shard_keys(
        &partition.both,
        &src_catalog,
        &dst_catalog,
    ));
    Ok(())
}

fn log_verdict(report: &ComparisonReport) {
    if report.passed {
        tracing::info!("Data and indexes are consistent between source and destination databases");
    } else {
        tracing::info!(
            "Mismatched databases, collections, or indexes found: {:?}",
            report
                .mismatches
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
        );
    }
}

async fn run_replica_set(
    source: &ClusterHandle,
    destination: &ClusterHandle,
    options: &CompareOptions,
) -> Result<ComparisonReport, CompareError> {
    let mut collector = MismatchCollector::new();
    let (src, dst, partition) =
        resolve_and_partition(source, destination, options, &mut collector).await?;

    compare_metadata(&src, &dst, &partition, options, &mut collector).await?;
    compare_content_replica_set(&src, &dst, &partition, options, &mut collector).await?;

    let report = collector.finish();
    log_verdict(&report);
    Ok(report)
}

async fn run_sharded(
    source: &ClusterHandle,
    destination: &ClusterHandle,
    options: &CompareOptions,
) -> Result<bool, CompareError> {
    let mut collector = MismatchCollector::new();
    let (src, dst, partition) =
        resolve_and_partition(source, destination, options, &mut collector).await?;

    compare_metadata(&src, &dst, &partition, options, &mut collector).await?;
    compare_content_sharded(&src, &dst, &partition, options, &mut collector).await?;

    let (src_fingerprint, dst_fingerprint) = tokio::try_join!(
        content_digest::cluster_fingerprint(&src, &partition.both),
        content_digest::cluster_fingerprint(&dst, &partition.both),
    )?;
    let fingerprints_match = src_fingerprint == dst_fingerprint;
    if !fingerprints_match {
        tracing::info!(
            "Cluster fingerprint mismatch: {src_fingerprint} != {dst_fingerprint}"
        );
    }

    let report = collector.finish();
    log_verdict(&report);
    Ok(report.passed && fingerprints_match)
}

async fn run_generic(
    source: &ClusterHandle,
    destination: &ClusterHandle,
    options: &CompareOptions,
) -> Result<ComparisonReport, CompareError> {
    let sharded = source.layout == ClusterLayout::Sharded
        || destination.layout == ClusterLayout::Sharded;

    let mut collector = MismatchCollector::new();
    let (src, dst, partition) =
        resolve_and_partition(source, destination, options, &mut collector).await?;

    compare_metadata(&src, &dst, &partition, options, &mut collector).await?;

    if sharded {
        // Content fingerprints are only itemizable on replica sets; through
        // a router, counts localize drift and the shard-key catalog surfaces
        // routing-metadata divergence.
        compare_content_sharded(&src, &dst, &partition, options, &mut collector).await?;
        compare_shard_keys(&src, &dst, &partition, &mut collector).await?;
    } else {
        compare_content_replica_set(&src, &dst, &partition, options, &mut collector).await?;
    }

    let report = collector.finish();
    log_verdict(&report);
    Ok(report)
}
