//! Mismatch vocabulary.
//!
//! A mismatch is a `(scope, reason)` pair. The scope is a database name, a
//! fully-qualified namespace, or (for index findings) a namespace whose
//! reason is the offending index's name. Database- and collection-scope
//! reasons come from a fixed vocabulary so callers can filter by exact tuple
//! membership; index findings instead carry the index name so operators can
//! cross-reference which index drifted.

use crate::namespace::Namespace;
use serde::ser::{Serialize, SerializeTuple, Serializer};
use std::fmt;

/// Why a scope was reported.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MismatchReason {
    /// Present on source, absent on destination.
    MissingInDst,
    /// Present on destination, absent on source.
    MissingInSrc,
    /// The normalized collection option sets differ.
    Options,
    /// The named index is absent on one side or differs in definition.
    Index(String),
    /// Document counts differ for this collection.
    RecordCount,
    /// Content fingerprints differ for this database.
    Hash,
    /// A per-namespace read failed mid-comparison (e.g. a concurrent DDL
    /// dropped the collection between listing and inspection).
    TransientRead,
    /// Sharded on one side, unsharded on the other.
    ShardingStatus,
    /// The declared shard key patterns differ.
    ShardKey,
    /// Same shard key, different unique flag.
    ShardKeyUnique,
}

impl MismatchReason {
    /// The wire string for this reason. Index findings report the index name
    /// itself.
    pub fn as_str(&self) -> &str {
        match self {
            MismatchReason::MissingInDst => "missing in dst DB",
            MismatchReason::MissingInSrc => "missing in src DB",
            MismatchReason::Options => "options mismatch",
            MismatchReason::Index(name) => name,
            MismatchReason::RecordCount => "record count mismatch",
            MismatchReason::Hash => "hash mismatch",
            MismatchReason::TransientRead => "transient read error",
            MismatchReason::ShardingStatus => "sharding status mismatch",
            MismatchReason::ShardKey => "shard key mismatch",
            MismatchReason::ShardKeyUnique => "shard key unique flag mismatch",
        }
    }

    /// True for the two presence reasons, which suppress all finer-grained
    /// findings for the same scope.
    pub fn is_presence(&self) -> bool {
        matches!(
            self,
            MismatchReason::MissingInDst | MismatchReason::MissingInSrc
        )
    }

    /// Category rank driving report order: presence first, then options,
    /// index, content (count/hash/read), shard-key metadata last.
    pub(crate) fn rank(&self) -> u8 {
        match self {
            MismatchReason::MissingInDst | MismatchReason::MissingInSrc => 0,
            MismatchReason::Options => 1,
            MismatchReason::Index(_) => 2,
            MismatchReason::RecordCount | MismatchReason::Hash | MismatchReason::TransientRead => 3,
            MismatchReason::ShardingStatus
            | MismatchReason::ShardKey
            | MismatchReason::ShardKeyUnique => 4,
        }
    }
}

impl fmt::Display for MismatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported discrepancy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Mismatch {
    pub scope: String,
    pub reason: MismatchReason,
}

impl Mismatch {
    pub fn new(scope: impl Into<String>, reason: MismatchReason) -> Self {
        Self {
            scope: scope.into(),
            reason,
        }
    }

    /// A finding scoped to a whole database.
    pub fn database(database: &str, reason: MismatchReason) -> Self {
        Self::new(database, reason)
    }

    /// A finding scoped to one namespace.
    pub fn collection(namespace: &Namespace, reason: MismatchReason) -> Self {
        Self::new(namespace.to_string(), reason)
    }

    /// An index finding: the reason carries the index name.
    pub fn index(namespace: &Namespace, index_name: impl Into<String>) -> Self {
        Self::new(
            namespace.to_string(),
            MismatchReason::Index(index_name.into()),
        )
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.scope, self.reason)
    }
}

// A mismatch serializes as the two-element tuple consumers filter on.
impl Serialize for Mismatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut tuple = serializer.serialize_tuple(2)?;
        tuple.serialize_element(&self.scope)?;
        tuple.serialize_element(self.reason.as_str())?;
        tuple.end()
    }
}

// Test-friendly equality against bare tuples, mirroring how call sites
// assert membership.
impl PartialEq<(&str, &str)> for Mismatch {
    fn eq(&self, other: &(&str, &str)) -> bool {
        self.scope == other.0 && self.reason.as_str() == other.1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_vocabulary_strings() {
        assert_eq!(MismatchReason::Hash.as_str(), "hash mismatch");
        assert_eq!(
            MismatchReason::RecordCount.as_str(),
            "record count mismatch"
        );
        assert_eq!(MismatchReason::Options.as_str(), "options mismatch");
        assert_eq!(MismatchReason::MissingInSrc.as_str(), "missing in src DB");
        assert_eq!(MismatchReason::MissingInDst.as_str(), "missing in dst DB");
        assert_eq!(MismatchReason::ShardKey.as_str(), "shard key mismatch");
    }

    #[test]
    fn test_index_reason_is_the_index_name() {
        let ns = Namespace::new("test_db1", "test_coll1");
        let m = Mismatch::index(&ns, "index_ttl");
        assert_eq!(m, ("test_db1.test_coll1", "index_ttl"));
    }

    #[test]
    fn test_serializes_as_tuple() {
        let ns = Namespace::new("test_db1", "test_coll7");
        let m = Mismatch::collection(&ns, MismatchReason::RecordCount);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"["test_db1.test_coll7","record count mismatch"]"#);
    }

    #[test]
    fn test_presence_classification() {
        assert!(MismatchReason::MissingInDst.is_presence());
        assert!(MismatchReason::MissingInSrc.is_presence());
        assert!(!MismatchReason::Options.is_presence());
        assert!(!MismatchReason::Index("i".into()).is_presence());
    }
}
