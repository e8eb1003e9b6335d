//! Namespace identification.

use serde::Serialize;
use std::fmt;

/// A `database.collection` pair identifying one collection in a deployment.
///
/// Namespaces are the unit of comparison: presence, options, indexes and
/// record counts are all keyed by namespace. Ordering is lexicographic on
/// `(database, collection)` so collections sort within their database.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// Parse a fully-qualified `db.coll` string. The collection part may
    /// itself contain dots (e.g. GridFS `fs.chunks`), so only the first dot
    /// splits.
    pub fn parse(qualified: &str) -> Option<Self> {
        let (database, collection) = qualified.split_once('.')?;
        if database.is_empty() || collection.is_empty() {
            return None;
        }
        Some(Self::new(database, collection))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_qualified_name() {
        let ns = Namespace::new("test_db1", "test_coll1");
        assert_eq!(ns.to_string(), "test_db1.test_coll1");
    }

    #[test]
    fn test_parse_splits_on_first_dot() {
        let ns = Namespace::parse("mydb.fs.chunks").unwrap();
        assert_eq!(ns.database, "mydb");
        assert_eq!(ns.collection, "fs.chunks");
    }

    #[test]
    fn test_parse_rejects_unqualified_names() {
        assert!(Namespace::parse("mydb").is_none());
        assert!(Namespace::parse(".coll").is_none());
        assert!(Namespace::parse("db.").is_none());
    }

    #[test]
    fn test_ordering_groups_by_database() {
        let mut namespaces = vec![
            Namespace::new("b_db", "a_coll"),
            Namespace::new("a_db", "z_coll"),
            Namespace::new("a_db", "a_coll"),
        ];
        namespaces.sort();
        assert_eq!(namespaces[0].to_string(), "a_db.a_coll");
        assert_eq!(namespaces[1].to_string(), "a_db.z_coll");
        assert_eq!(namespaces[2].to_string(), "b_db.a_coll");
    }
}
