use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::{serde_helpers, StoredObject},
    },
};

/// One embedded chunk persisted in the vector collection.
///
/// `content_hash` is unique across the collection; the deduplicating
/// indexer upholds this and a UNIQUE index backs it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexEntry {
    #[serde(deserialize_with = "serde_helpers::deserialize_flexible_id")]
    pub id: String,
    #[serde(
        serialize_with = "serde_helpers::serialize_datetime",
        deserialize_with = "serde_helpers::deserialize_datetime",
        default
    )]
    pub created_at: DateTime<Utc>,
    pub content_hash: String,
    pub content: String,
    pub embedding: Vec<f32>,
}

impl StoredObject for IndexEntry {
    fn table_name() -> &'static str {
        "index_entry"
    }

    fn get_id(&self) -> &str {
        &self.id
    }
}

impl IndexEntry {
    pub fn new(content_hash: String, content: String, embedding: Vec<f32>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            content_hash,
            content,
            embedding,
        }
    }

    /// Fetches every stored content hash. Used by the deduplicating
    /// indexer to decide which incoming chunks are novel; a failure here
    /// is an `IndexStore` error, not an empty set.
    pub async fn fetch_content_hashes(db: &SurrealDbClient) -> Result<Vec<String>, AppError> {
        let mut response = db
            .query("SELECT VALUE content_hash FROM index_entry")
            .await
            .map_err(|e| AppError::IndexStore(format!("failed to read stored hashes: {e}")))?;

        let hashes: Vec<String> = response
            .take(0)
            .map_err(|e| AppError::IndexStore(format!("failed to decode stored hashes: {e}")))?;

        Ok(hashes)
    }

    pub async fn count(db: &SurrealDbClient) -> Result<usize, AppError> {
        let mut response = db
            .query("RETURN (SELECT count() FROM index_entry GROUP ALL)[0].count OR 0")
            .await
            .map_err(|e| AppError::IndexStore(format!("failed to count entries: {e}")))?;

        let count: Option<usize> = response
            .take(0)
            .map_err(|e| AppError::IndexStore(format!("failed to decode entry count: {e}")))?;

        Ok(count.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn setup_test_db() -> SurrealDbClient {
        let namespace = "test_ns";
        let database = &Uuid::new_v4().to_string();
        SurrealDbClient::memory(namespace, database)
            .await
            .expect("Failed to start in-memory surrealdb")
    }

    #[tokio::test]
    async fn test_index_entry_creation() {
        let entry = IndexEntry::new(
            "hash123".to_string(),
            "some chunk content".to_string(),
            vec![0.1, 0.2, 0.3],
        );

        assert_eq!(entry.content_hash, "hash123");
        assert_eq!(entry.content, "some chunk content");
        assert_eq!(entry.embedding, vec![0.1, 0.2, 0.3]);
        assert!(!entry.id.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_content_hashes_roundtrip() {
        let db = setup_test_db().await;

        let first = IndexEntry::new("hash-a".into(), "first".into(), vec![0.1]);
        let second = IndexEntry::new("hash-b".into(), "second".into(), vec![0.2]);
        db.store_item(first).await.expect("store first");
        db.store_item(second).await.expect("store second");

        let mut hashes = IndexEntry::fetch_content_hashes(&db)
            .await
            .expect("fetch hashes");
        hashes.sort();
        assert_eq!(hashes, vec!["hash-a".to_string(), "hash-b".to_string()]);
    }

    #[tokio::test]
    async fn test_count_on_empty_table() {
        let db = setup_test_db().await;
        let count = IndexEntry::count(&db).await.expect("count");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_count_after_inserts() {
        let db = setup_test_db().await;
        for i in 0..3 {
            let entry = IndexEntry::new(format!("hash-{i}"), format!("content {i}"), vec![0.1]);
            db.store_item(entry).await.expect("store entry");
        }

        let count = IndexEntry::count(&db).await.expect("count");
        assert_eq!(count, 3);
    }
}
