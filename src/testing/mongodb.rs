//! MongoDB fixture seeding for comparison tests.

use mongodb::bson::{doc, Document};
use mongodb::options::{
    ChangeStreamPreAndPostImages, Collation, CreateCollectionOptions, IndexOptions,
};
use mongodb::{Client, Collection, Database, IndexModel};
use std::time::Duration;

/// Connect to a test deployment with default root credentials unless the
/// URI says otherwise.
pub async fn connect(uri: &str) -> Result<Client, Box<dyn std::error::Error>> {
    let client = Client::with_uri_str(uri).await?;
    Ok(client)
}

/// A unique suffix so concurrent test runs never collide on database names.
pub fn generate_test_id() -> String {
    uuid::Uuid::new_v4().to_string()[..8].to_string()
}

/// Drop a test database on both sides, ignoring errors if it never existed.
pub async fn drop_test_database(clients: &[&Client], database: &str) {
    for client in clients {
        client.database(database).drop().await.ok();
    }
}

/// Insert `count` deterministic documents into a collection. The same call
/// against two deployments produces byte-identical content.
pub async fn seed_documents(
    database: &Database,
    collection: &str,
    count: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let documents: Vec<Document> = (0..count)
        .map(|i| doc! { "_id": i as i32, "key": i as i32, "data": i as i32 })
        .collect();
    if !documents.is_empty() {
        let collection: Collection<Document> = database.collection(collection);
        collection.insert_many(documents).await?;
    }
    Ok(())
}

/// Create a capped collection with explicit size and max-document bounds.
pub async fn create_capped_collection(
    database: &Database,
    collection: &str,
    size: u64,
    max: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = CreateCollectionOptions::default();
    options.capped = Some(true);
    options.size = Some(size);
    options.max = Some(max);
    database
        .create_collection(collection)
        .with_options(options)
        .await?;
    Ok(())
}

/// Create a collection with a default collation locale.
pub async fn create_collection_with_collation(
    database: &Database,
    collection: &str,
    locale: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = CreateCollectionOptions::default();
    options.collation = Some(Collation::builder().locale(locale.to_string()).build());
    database
        .create_collection(collection)
        .with_options(options)
        .await?;
    Ok(())
}

/// Create a collection with change-stream pre/post images enabled.
pub async fn create_collection_with_change_stream_images(
    database: &Database,
    collection: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = CreateCollectionOptions::default();
    options.change_stream_pre_and_post_images =
        Some(ChangeStreamPreAndPostImages::builder().enabled(true).build());
    database
        .create_collection(collection)
        .with_options(options)
        .await?;
    Ok(())
}

/// Create a named index with the significant options tests diverge on.
#[allow(clippy::too_many_arguments)]
pub async fn create_named_index(
    database: &Database,
    collection: &str,
    keys: Document,
    name: &str,
    unique: bool,
    sparse: bool,
    expire_after_secs: Option<u64>,
    partial_filter: Option<Document>,
) -> Result<(), Box<dyn std::error::Error>> {
    let options = IndexOptions::builder()
        .name(name.to_string())
        .unique(Some(unique))
        .sparse(Some(sparse))
        .expire_after(expire_after_secs.map(Duration::from_secs))
        .partial_filter_expression(partial_filter)
        .build();
    let index = IndexModel::builder().keys(keys).options(options).build();

    let collection: Collection<Document> = database.collection(collection);
    collection.create_index(index).await?;
    Ok(())
}
