//! Endpoint probing and topology resolution.

use crate::cluster::{ClusterHandle, ClusterLayout, Endpoint, EndpointRole};
use compare_core::{classify_driver_error, CompareError};
use mongodb::bson::doc;
use mongodb::options::{ClientOptions, ServerAddress};
use mongodb::Client;
use std::time::Duration;

/// A probed deployment: a connected client plus the endpoints behind it.
#[derive(Debug, Clone)]
pub struct ResolvedCluster {
    pub client: Client,
    pub layout: ClusterLayout,
    /// Replica-set members, or shard primaries for sharded clusters.
    pub endpoints: Vec<Endpoint>,
    /// The mongos entry point used for namespace and metadata queries.
    /// `None` for replica sets.
    pub router: Option<Endpoint>,
}

/// Connect to a deployment and probe it within `probe_timeout`.
///
/// An endpoint that does not answer the probe is fatal for the whole
/// comparison; no partial run is attempted.
pub async fn connect(
    handle: &ClusterHandle,
    probe_timeout: Duration,
) -> Result<Client, CompareError> {
    let mut options = ClientOptions::parse(&handle.uri)
        .await
        .map_err(classify_driver_error)?;
    options.connect_timeout = Some(probe_timeout);
    options.server_selection_timeout = Some(probe_timeout);

    let client = Client::with_options(options).map_err(classify_driver_error)?;
    client
        .database("admin")
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(classify_driver_error)?;
    Ok(client)
}

/// Resolve the reachable endpoints of a deployment.
///
/// For replica sets, `hello` yields the member list and the current primary.
/// For sharded clusters, the handle's URI addresses the router; `listShards`
/// yields the shard replica sets, each of which is probed for its primary.
pub async fn resolve(
    handle: &ClusterHandle,
    probe_timeout: Duration,
) -> Result<ResolvedCluster, CompareError> {
    let client = connect(handle, probe_timeout).await?;

    match handle.layout {
        ClusterLayout::ReplicaSet => {
            let hello = client
                .database("admin")
                .run_command(doc! { "hello": 1 })
                .await
                .map_err(classify_driver_error)?;

            let primary = hello.get_str("primary").unwrap_or_default().to_string();
            let mut endpoints = Vec::new();
            if let Ok(hosts) = hello.get_array("hosts") {
                for host in hosts.iter().filter_map(|h| h.as_str()) {
                    let role = if host == primary {
                        EndpointRole::Primary
                    } else {
                        EndpointRole::Member
                    };
                    endpoints.push(Endpoint::parse(host, role));
                }
            }
            if endpoints.is_empty() {
                // Standalone node answering hello without a member list.
                if let Ok(me) = hello.get_str("me") {
                    endpoints.push(Endpoint::parse(me, EndpointRole::Primary));
                }
            }
            tracing::debug!(
                "Resolved replica set with {} member(s): {:?}",
                endpoints.len(),
                endpoints
            );
            Ok(ResolvedCluster {
                client,
                layout: ClusterLayout::ReplicaSet,
                endpoints,
                router: None,
            })
        }
        ClusterLayout::Sharded => {
            let base_options = ClientOptions::parse(&handle.uri)
                .await
                .map_err(classify_driver_error)?;
            let router = base_options
                .hosts
                .first()
                .map(|address| Endpoint::parse(&address.to_string(), EndpointRole::Router));

            let listing = client
                .database("admin")
                .run_command(doc! { "listShards": 1 })
                .await
                .map_err(classify_driver_error)?;

            let mut endpoints = Vec::new();
            if let Ok(shards) = listing.get_array("shards") {
                for shard in shards.iter().filter_map(|s| s.as_document()) {
                    let host = shard.get_str("host").unwrap_or_default();
                    let primary =
                        resolve_shard_primary(&base_options, host, probe_timeout).await?;
                    endpoints.push(primary);
                }
            }
            tracing::debug!(
                "Resolved sharded cluster: router {:?}, {} shard primarie(s)",
                router,
                endpoints.len()
            );
            Ok(ResolvedCluster {
                client,
                layout: ClusterLayout::Sharded,
                endpoints,
                router,
            })
        }
    }
}

/// Probe one shard replica set (as reported by `listShards`, in
/// `rs/host:port,host:port` form) and return its primary. Reuses the
/// router's credentials and TLS settings.
async fn resolve_shard_primary(
    base_options: &ClientOptions,
    shard_host: &str,
    probe_timeout: Duration,
) -> Result<Endpoint, CompareError> {
    let (replica_set, members) = match shard_host.split_once('/') {
        Some((rs, members)) => (Some(rs.to_string()), members),
        None => (None, shard_host),
    };

    let mut options = base_options.clone();
    options.hosts = members
        .split(',')
        .map(|address| {
            let endpoint = Endpoint::parse(address, EndpointRole::ShardPrimary);
            ServerAddress::Tcp {
                host: endpoint.host,
                port: Some(endpoint.port),
            }
        })
        .collect();
    options.repl_set_name = replica_set;
    options.connect_timeout = Some(probe_timeout);
    options.server_selection_timeout = Some(probe_timeout);

    let client = Client::with_options(options).map_err(classify_driver_error)?;
    let hello = client
        .database("admin")
        .run_command(doc! { "hello": 1 })
        .await
        .map_err(classify_driver_error)?;

    // `hello` is answered by the selected server, which defaults to the
    // primary on a replica-set connection.
    let me = hello
        .get_str("me")
        .map(str::to_string)
        .unwrap_or_else(|_| members.split(',').next().unwrap_or(members).to_string());
    Ok(Endpoint::parse(&me, EndpointRole::ShardPrimary))
}
