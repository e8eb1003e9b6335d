//! Cluster handles and endpoints.

use std::fmt;
use std::str::FromStr;

/// Layout tag of a deployment under comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClusterLayout {
    ReplicaSet,
    Sharded,
}

impl FromStr for ClusterLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replicaset" => Ok(ClusterLayout::ReplicaSet),
            "sharded" => Ok(ClusterLayout::Sharded),
            other => Err(format!(
                "unknown cluster layout '{other}' (expected 'replicaset' or 'sharded')"
            )),
        }
    }
}

impl fmt::Display for ClusterLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterLayout::ReplicaSet => f.write_str("replicaset"),
            ClusterLayout::Sharded => f.write_str("sharded"),
        }
    }
}

/// Opaque descriptor of one deployment: where to connect and how the
/// deployment is laid out. For sharded clusters the URI must address the
/// router (mongos).
#[derive(Debug, Clone)]
pub struct ClusterHandle {
    pub uri: String,
    pub layout: ClusterLayout,
}

impl ClusterHandle {
    pub fn new(uri: impl Into<String>, layout: ClusterLayout) -> Self {
        Self {
            uri: uri.into(),
            layout,
        }
    }

    pub fn replica_set(uri: impl Into<String>) -> Self {
        Self::new(uri, ClusterLayout::ReplicaSet)
    }

    pub fn sharded(uri: impl Into<String>) -> Self {
        Self::new(uri, ClusterLayout::Sharded)
    }
}

/// Role of one queryable node within the resolved topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointRole {
    Primary,
    Member,
    ShardPrimary,
    Router,
}

/// Address of one queryable node. Immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub role: EndpointRole,
}

impl Endpoint {
    /// Parse a `host:port` address as reported by `hello`/`listShards`.
    /// A missing port defaults to 27017.
    pub fn parse(address: &str, role: EndpointRole) -> Self {
        match address.rsplit_once(':') {
            Some((host, port)) => match port.parse::<u16>() {
                Ok(port) => Self {
                    host: host.to_string(),
                    port,
                    role,
                },
                Err(_) => Self {
                    host: address.to_string(),
                    port: 27017,
                    role,
                },
            },
            None => Self {
                host: address.to_string(),
                port: 27017,
                role,
            },
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}
