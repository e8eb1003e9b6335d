//! Tagged-variant document value model.
//!
//! BSON's permissive typing is re-expressed as a closed sum type so the
//! differ compares values by variant-aware equality instead of stringly
//! comparisons. `Int32` widens to `Int64` (two deployments storing the same
//! logical value at different widths after a driver round-trip are not data
//! loss); everything else keeps its variant, so an `ObjectId` never equals
//! its hex string and a `Timestamp` never equals a `DateTime`.

use chrono::{DateTime, Utc};
use mongodb::bson::{Bson, Document};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum DocValue {
    Null,
    Bool(bool),
    Int64(i64),
    Float64(f64),
    Decimal128(String),
    Text(String),
    Bytes { subtype: u8, bytes: Vec<u8> },
    ObjectId(String),
    DateTime(DateTime<Utc>),
    Timestamp { time: u32, increment: u32 },
    Regex { pattern: String, options: String },
    Array(Vec<DocValue>),
    Document(BTreeMap<String, DocValue>),
}

impl DocValue {
    pub fn from_bson(value: Bson) -> DocValue {
        match value {
            Bson::Double(f) => DocValue::Float64(f),
            Bson::String(s) | Bson::Symbol(s) => DocValue::Text(s),
            Bson::Array(items) => {
                DocValue::Array(items.into_iter().map(DocValue::from_bson).collect())
            }
            Bson::Document(doc) => DocValue::from_document(doc),
            Bson::Boolean(b) => DocValue::Bool(b),
            Bson::Null | Bson::Undefined => DocValue::Null,
            Bson::RegularExpression(regex) => DocValue::Regex {
                pattern: regex.pattern,
                options: regex.options,
            },
            Bson::JavaScriptCode(code) => DocValue::Text(code),
            Bson::JavaScriptCodeWithScope(code_with_scope) => {
                let mut fields = BTreeMap::new();
                fields.insert(
                    "$code".to_string(),
                    DocValue::Text(code_with_scope.code),
                );
                fields.insert(
                    "$scope".to_string(),
                    DocValue::from_document(code_with_scope.scope),
                );
                DocValue::Document(fields)
            }
            Bson::Int32(i) => DocValue::Int64(i as i64),
            Bson::Int64(i) => DocValue::Int64(i),
            Bson::Timestamp(ts) => DocValue::Timestamp {
                time: ts.time,
                increment: ts.increment,
            },
            Bson::Binary(binary) => DocValue::Bytes {
                subtype: binary.subtype.into(),
                bytes: binary.bytes,
            },
            Bson::ObjectId(oid) => DocValue::ObjectId(oid.to_hex()),
            Bson::DateTime(dt) => DocValue::DateTime(dt.to_chrono()),
            Bson::Decimal128(d) => DocValue::Decimal128(d.to_string()),
            Bson::MaxKey => singleton("$maxKey"),
            Bson::MinKey => singleton("$minKey"),
            Bson::DbPointer(_) => DocValue::Text("$dbPointer".to_string()),
        }
    }

    pub fn from_document(doc: Document) -> DocValue {
        DocValue::Document(
            doc.into_iter()
                .map(|(key, value)| (key, DocValue::from_bson(value)))
                .collect(),
        )
    }

    /// Sort-order comparison matching the server's cross-type bracket order,
    /// so a merge-join over two `_id`-sorted cursors stays aligned. Numbers
    /// compare by value across widths; everything else compares within its
    /// bracket.
    pub fn cmp_sort_key(&self, other: &DocValue) -> Ordering {
        let ranks = (self.sort_bracket(), other.sort_bracket());
        if ranks.0 != ranks.1 {
            return ranks.0.cmp(&ranks.1);
        }
        match (self, other) {
            (DocValue::Null, DocValue::Null) => Ordering::Equal,
            (a, b) if a.as_number().is_some() && b.as_number().is_some() => a
                .as_number()
                .partial_cmp(&b.as_number())
                .unwrap_or(Ordering::Equal),
            (DocValue::Text(a), DocValue::Text(b)) => a.cmp(b),
            (DocValue::ObjectId(a), DocValue::ObjectId(b)) => a.cmp(b),
            (DocValue::Bool(a), DocValue::Bool(b)) => a.cmp(b),
            (DocValue::DateTime(a), DocValue::DateTime(b)) => a.cmp(b),
            (
                DocValue::Timestamp { time, increment },
                DocValue::Timestamp {
                    time: other_time,
                    increment: other_increment,
                },
            ) => (time, increment).cmp(&(other_time, other_increment)),
            // The server orders binary by length, then subtype, then bytes.
            (
                DocValue::Bytes { subtype, bytes },
                DocValue::Bytes {
                    subtype: other_subtype,
                    bytes: other_bytes,
                },
            ) => (bytes.len(), subtype, bytes)
                .cmp(&(other_bytes.len(), other_subtype, other_bytes)),
            (DocValue::Array(a), DocValue::Array(b)) => {
                for (x, y) in a.iter().zip(b.iter()) {
                    let ord = x.cmp_sort_key(y);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (DocValue::Document(a), DocValue::Document(b)) => {
                for ((ak, av), (bk, bv)) in a.iter().zip(b.iter()) {
                    let ord = ak.cmp(bk).then_with(|| av.cmp_sort_key(bv));
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                a.len().cmp(&b.len())
            }
            (
                DocValue::Regex { pattern, options },
                DocValue::Regex {
                    pattern: other_pattern,
                    options: other_options,
                },
            ) => (pattern, options).cmp(&(other_pattern, other_options)),
            // Same bracket but no refined order; treat as tied.
            _ => Ordering::Equal,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            DocValue::Int64(i) => Some(*i as f64),
            DocValue::Float64(f) => Some(*f),
            DocValue::Decimal128(s) => s.parse().ok(),
            _ => None,
        }
    }

    // Server comparison/sort bracket order.
    fn sort_bracket(&self) -> u8 {
        match self {
            DocValue::Null => 1,
            DocValue::Int64(_) | DocValue::Float64(_) | DocValue::Decimal128(_) => 2,
            DocValue::Text(_) => 3,
            DocValue::Document(_) => 4,
            DocValue::Array(_) => 5,
            DocValue::Bytes { .. } => 6,
            DocValue::ObjectId(_) => 7,
            DocValue::Bool(_) => 8,
            DocValue::DateTime(_) => 9,
            DocValue::Timestamp { .. } => 10,
            DocValue::Regex { .. } => 11,
        }
    }
}

fn singleton(key: &str) -> DocValue {
    let mut fields = BTreeMap::new();
    fields.insert(key.to_string(), DocValue::Int64(1));
    DocValue::Document(fields)
}

impl fmt::Display for DocValue {
    /// Compact rendering used for reporting document keys.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocValue::Null => f.write_str("null"),
            DocValue::Bool(b) => write!(f, "{b}"),
            DocValue::Int64(i) => write!(f, "{i}"),
            DocValue::Float64(v) => write!(f, "{v}"),
            DocValue::Decimal128(s) => f.write_str(s),
            DocValue::Text(s) => f.write_str(s),
            DocValue::ObjectId(hex) => f.write_str(hex),
            DocValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            other => write!(f, "{other:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;

    #[test]
    fn test_int32_widens_to_int64() {
        assert_eq!(
            DocValue::from_bson(Bson::Int32(42)),
            DocValue::from_bson(Bson::Int64(42))
        );
    }

    #[test]
    fn test_int_and_double_are_distinct_variants() {
        assert_ne!(
            DocValue::from_bson(Bson::Int64(42)),
            DocValue::from_bson(Bson::Double(42.0))
        );
    }

    #[test]
    fn test_objectid_is_not_its_hex_string() {
        let oid = ObjectId::new();
        assert_ne!(
            DocValue::from_bson(Bson::ObjectId(oid)),
            DocValue::from_bson(Bson::String(oid.to_hex()))
        );
    }

    #[test]
    fn test_numbers_sort_by_value_across_widths() {
        let int = DocValue::Int64(2);
        let double = DocValue::Float64(2.5);
        assert_eq!(int.cmp_sort_key(&double), Ordering::Less);
        assert_eq!(double.cmp_sort_key(&int), Ordering::Greater);
        assert_eq!(
            DocValue::Int64(3).cmp_sort_key(&DocValue::Float64(3.0)),
            Ordering::Equal
        );
    }

    #[test]
    fn test_cross_bracket_order_matches_server() {
        // numbers < strings < objectIds < dates
        let number = DocValue::Int64(10);
        let text = DocValue::Text("10".into());
        let oid = DocValue::ObjectId("0".repeat(24));
        let date = DocValue::DateTime(Utc::now());
        assert_eq!(number.cmp_sort_key(&text), Ordering::Less);
        assert_eq!(text.cmp_sort_key(&oid), Ordering::Less);
        assert_eq!(oid.cmp_sort_key(&date), Ordering::Less);
    }

    #[test]
    fn test_nested_document_equality() {
        let a = DocValue::from_bson(Bson::Document(
            mongodb::bson::doc! { "outer": { "inner": [1, 2, 3] } },
        ));
        let b = DocValue::from_bson(Bson::Document(
            mongodb::bson::doc! { "outer": { "inner": [1, 2, 3] } },
        ));
        let c = DocValue::from_bson(Bson::Document(
            mongodb::bson::doc! { "outer": { "inner": [1, 2, 4] } },
        ));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
