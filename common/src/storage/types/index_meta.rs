use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::{serde_helpers, StoredObject},
    },
};

/// Single marker record stating that the collection has been bootstrapped.
///
/// The store directory is created as soon as the database is opened, so
/// "has the collection been built yet" needs an explicit marker rather
/// than a path-existence check. Written exactly once, at the end of the
/// first successful indexing run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexMeta {
    #[serde(deserialize_with = "serde_helpers::deserialize_flexible_id")]
    pub id: String,
    #[serde(
        serialize_with = "serde_helpers::serialize_datetime",
        deserialize_with = "serde_helpers::deserialize_datetime",
        default
    )]
    pub bootstrapped_at: DateTime<Utc>,
    pub embedding_backend: String,
}

const CURRENT_ID: &str = "current";

impl StoredObject for IndexMeta {
    fn table_name() -> &'static str {
        "index_meta"
    }

    fn get_id(&self) -> &str {
        &self.id
    }
}

impl IndexMeta {
    pub fn new(embedding_backend: String) -> Self {
        Self {
            id: CURRENT_ID.to_string(),
            bootstrapped_at: Utc::now(),
            embedding_backend,
        }
    }

    pub async fn get_current(db: &SurrealDbClient) -> Result<Option<Self>, AppError> {
        db.get_item::<Self>(CURRENT_ID)
            .await
            .map_err(|e| AppError::IndexStore(format!("failed to read index marker: {e}")))
    }

    pub async fn mark_bootstrapped(
        db: &SurrealDbClient,
        embedding_backend: &str,
    ) -> Result<(), AppError> {
        // Upsert keeps re-bootstrap attempts idempotent.
        let meta = Self::new(embedding_backend.to_string());
        db.upsert::<Option<Self>>((Self::table_name(), CURRENT_ID))
            .content(meta)
            .await
            .map_err(|e| AppError::IndexStore(format!("failed to write index marker: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    async fn setup_test_db() -> SurrealDbClient {
        let namespace = "test_ns";
        let database = &Uuid::new_v4().to_string();
        SurrealDbClient::memory(namespace, database)
            .await
            .expect("Failed to start in-memory surrealdb")
    }

    #[tokio::test]
    async fn test_marker_absent_on_fresh_store() {
        let db = setup_test_db().await;
        let meta = IndexMeta::get_current(&db).await.expect("get marker");
        assert!(meta.is_none());
    }

    #[tokio::test]
    async fn test_mark_bootstrapped_roundtrip() {
        let db = setup_test_db().await;
        IndexMeta::mark_bootstrapped(&db, "hashed")
            .await
            .expect("mark bootstrapped");

        let meta = IndexMeta::get_current(&db)
            .await
            .expect("get marker")
            .expect("marker present");
        assert_eq!(meta.embedding_backend, "hashed");
    }

    #[tokio::test]
    async fn test_mark_bootstrapped_is_idempotent() {
        let db = setup_test_db().await;
        IndexMeta::mark_bootstrapped(&db, "hashed")
            .await
            .expect("first mark");
        IndexMeta::mark_bootstrapped(&db, "hashed")
            .await
            .expect("second mark");

        let meta = IndexMeta::get_current(&db).await.expect("get marker");
        assert!(meta.is_some());
    }
}
