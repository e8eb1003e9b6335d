//! Normalized index specifications.

use mongodb::bson::{Bson, Document};

use crate::descriptor::{bson_to_i64, Collation};

/// Direction or type token of one key-pattern entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexDirection {
    Ascending,
    Descending,
    Hashed,
    Text,
    TwoD,
    TwoDSphere,
    /// Any token this checker does not know by name; compared verbatim.
    Other(String),
}

impl IndexDirection {
    pub fn from_bson(value: &Bson) -> Self {
        if let Some(n) = bson_to_i64(value) {
            return if n < 0 {
                IndexDirection::Descending
            } else {
                IndexDirection::Ascending
            };
        }
        match value.as_str() {
            Some("hashed") => IndexDirection::Hashed,
            Some("text") => IndexDirection::Text,
            Some("2d") => IndexDirection::TwoD,
            Some("2dsphere") => IndexDirection::TwoDSphere,
            Some(other) => IndexDirection::Other(other.to_string()),
            None => IndexDirection::Other(value.to_string()),
        }
    }
}

/// The semantically significant subset of one index definition.
///
/// Build-time details (background flag, index version) are deliberately
/// absent: they never change what the index does.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSpec {
    pub name: String,
    /// Ordered key pattern; order is significant for compound indexes.
    pub keys: Vec<(String, IndexDirection)>,
    pub unique: bool,
    pub sparse: bool,
    pub hidden: bool,
    pub partial_filter_expression: Option<Document>,
    pub expire_after_seconds: Option<i64>,
    pub weights: Option<Document>,
    pub default_language: Option<String>,
    pub collation: Option<Collation>,
    pub wildcard_projection: Option<Document>,
    // Geo options
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub bits: Option<i64>,
}

impl IndexSpec {
    /// Parse one raw `listIndexes` entry. Entries without a name or key
    /// pattern are server-internal and skipped.
    pub fn from_document(index: &Document) -> Option<Self> {
        let name = index.get_str("name").ok()?.to_string();
        let key = index.get_document("key").ok()?;
        let keys = key
            .iter()
            .map(|(field, value)| (field.clone(), IndexDirection::from_bson(value)))
            .collect();

        Some(Self {
            name,
            keys,
            unique: index.get_bool("unique").unwrap_or(false),
            sparse: index.get_bool("sparse").unwrap_or(false),
            hidden: index.get_bool("hidden").unwrap_or(false),
            partial_filter_expression: index
                .get_document("partialFilterExpression")
                .ok()
                .cloned(),
            expire_after_seconds: index.get("expireAfterSeconds").and_then(bson_to_i64),
            weights: index.get_document("weights").ok().cloned(),
            default_language: index.get_str("default_language").ok().map(str::to_string),
            collation: index
                .get_document("collation")
                .ok()
                .and_then(Collation::from_document),
            wildcard_projection: index.get_document("wildcardProjection").ok().cloned(),
            min: index.get("min").and_then(bson_to_i64),
            max: index.get("max").and_then(bson_to_i64),
            bits: index.get("bits").and_then(bson_to_i64),
        })
    }

    /// The implicit `_id` index exists on every collection and is always
    /// assumed equal.
    pub fn is_id_index(&self) -> bool {
        self.name == "_id_"
    }
}
