//! Test fixture infrastructure for comparison testing
//!
//! This module provides helpers for seeding two live MongoDB deployments
//! with matching or deliberately diverging collections, indexes and
//! documents, so integration tests can drive the comparator against real
//! servers.

pub mod mongodb;

pub use mongodb::{
    connect, create_capped_collection, create_collection_with_change_stream_images,
    create_collection_with_collation, create_named_index, drop_test_database, generate_test_id,
    seed_documents,
};
