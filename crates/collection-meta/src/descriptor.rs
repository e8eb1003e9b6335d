//! Normalized collection descriptors.

use compare_core::Namespace;
use mongodb::bson::{Bson, Document};
use std::collections::BTreeMap;

use crate::index::IndexSpec;

/// Widen any BSON numeric to i64. The server reports numeric options with
/// whatever width the creating client used, so `1024`, `1024.0` and
/// `NumberLong(1024)` must compare equal.
pub(crate) fn bson_to_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(v) => Some(*v as i64),
        Bson::Int64(v) => Some(*v),
        Bson::Double(v) => Some(*v as i64),
        _ => None,
    }
}

/// Collation subset that is semantically significant for equivalence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collation {
    pub locale: String,
    pub strength: i64,
}

// Server default comparison level (tertiary).
const DEFAULT_COLLATION_STRENGTH: i64 = 3;

impl Collation {
    pub fn from_document(doc: &Document) -> Option<Self> {
        let locale = doc.get_str("locale").ok()?.to_string();
        let strength = doc
            .get("strength")
            .and_then(bson_to_i64)
            .unwrap_or(DEFAULT_COLLATION_STRENGTH);
        Some(Self { locale, strength })
    }
}

/// Timeseries settings as reported by `listCollections`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeseriesSpec {
    pub time_field: String,
    pub meta_field: Option<String>,
    pub granularity: Option<String>,
}

impl TimeseriesSpec {
    pub fn from_document(doc: &Document) -> Option<Self> {
        Some(Self {
            time_field: doc.get_str("timeField").ok()?.to_string(),
            meta_field: doc.get_str("metaField").ok().map(str::to_string),
            granularity: doc.get_str("granularity").ok().map(str::to_string),
        })
    }
}

/// The normalized option set of one collection.
///
/// Only options that change collection behavior participate; storage-engine
/// details and validation levels are deployment tuning, not data semantics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CollectionOptions {
    pub capped: bool,
    pub capped_size: Option<i64>,
    pub capped_max: Option<i64>,
    pub collation: Option<Collation>,
    pub change_stream_pre_and_post_images: bool,
    pub clustered_index: bool,
    pub timeseries: Option<TimeseriesSpec>,
}

impl CollectionOptions {
    /// Parse the raw `options` document from a `listCollections` entry.
    pub fn from_document(options: &Document) -> Self {
        let capped = options.get_bool("capped").unwrap_or(false);
        Self {
            capped,
            capped_size: if capped {
                options.get("size").and_then(bson_to_i64)
            } else {
                None
            },
            capped_max: if capped {
                options.get("max").and_then(bson_to_i64)
            } else {
                None
            },
            collation: options
                .get_document("collation")
                .ok()
                .and_then(Collation::from_document),
            change_stream_pre_and_post_images: options
                .get_document("changeStreamPreAndPostImages")
                .map(|d| d.get_bool("enabled").unwrap_or(false))
                .unwrap_or(false),
            clustered_index: options.get("clusteredIndex").is_some(),
            timeseries: options
                .get_document("timeseries")
                .ok()
                .and_then(TimeseriesSpec::from_document),
        }
    }
}

/// Everything the metadata comparator needs to know about one namespace on
/// one side.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionDescriptor {
    pub namespace: Namespace,
    pub options: CollectionOptions,
    pub indexes: BTreeMap<String, IndexSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_capped_options_parse() {
        let options = CollectionOptions::from_document(&doc! {
            "capped": true,
            "size": 1048576_i64,
            "max": 1000_i32,
        });
        assert!(options.capped);
        assert_eq!(options.capped_size, Some(1048576));
        assert_eq!(options.capped_max, Some(1000));
    }

    #[test]
    fn test_capped_size_width_is_normalized() {
        let from_double = CollectionOptions::from_document(&doc! {
            "capped": true,
            "size": 1048576.0,
        });
        let from_long = CollectionOptions::from_document(&doc! {
            "capped": true,
            "size": 1048576_i64,
        });
        assert_eq!(from_double, from_long);
    }

    #[test]
    fn test_uncapped_ignores_stray_size() {
        // A size hint on an uncapped collection carries no behavior.
        let options = CollectionOptions::from_document(&doc! { "size": 4096_i32 });
        assert!(!options.capped);
        assert_eq!(options.capped_size, None);
    }

    #[test]
    fn test_collation_defaults_to_tertiary_strength() {
        let options = CollectionOptions::from_document(&doc! {
            "collation": { "locale": "fr" },
        });
        let collation = options.collation.unwrap();
        assert_eq!(collation.locale, "fr");
        assert_eq!(collation.strength, 3);
    }

    #[test]
    fn test_collation_locale_difference_detected() {
        let fr = CollectionOptions::from_document(&doc! { "collation": { "locale": "fr" } });
        let en = CollectionOptions::from_document(&doc! { "collation": { "locale": "en" } });
        assert_ne!(fr, en);
    }

    #[test]
    fn test_change_stream_images_flag() {
        let enabled = CollectionOptions::from_document(&doc! {
            "changeStreamPreAndPostImages": { "enabled": true },
        });
        let absent = CollectionOptions::from_document(&doc! {});
        assert!(enabled.change_stream_pre_and_post_images);
        assert!(!absent.change_stream_pre_and_post_images);
        assert_ne!(enabled, absent);
    }

    #[test]
    fn test_timeseries_parse() {
        let options = CollectionOptions::from_document(&doc! {
            "timeseries": {
                "timeField": "ts",
                "metaField": "sensor",
                "granularity": "minutes",
            },
        });
        let ts = options.timeseries.unwrap();
        assert_eq!(ts.time_field, "ts");
        assert_eq!(ts.meta_field.as_deref(), Some("sensor"));
        assert_eq!(ts.granularity.as_deref(), Some("minutes"));
    }
}
