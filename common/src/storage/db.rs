use crate::error::AppError;

use super::types::StoredObject;
use surrealdb::{
    engine::any::{connect, Any},
    Error, Surreal,
};

const NAMESPACE: &str = "rag";
const DATABASE: &str = "index";

/// Handle to the persistent vector collection. Opened once per process and
/// shared by the indexer (writer) and retriever (reader).
#[derive(Clone)]
pub struct SurrealDbClient {
    pub client: Surreal<Any>,
}

impl SurrealDbClient {
    /// Opens (creating if needed) the on-disk collection rooted at `path`.
    ///
    /// A failure here means the store is unreachable or corrupt; callers
    /// must not downgrade it to "no data yet".
    pub async fn open(path: &str) -> Result<Self, AppError> {
        let db = connect(format!("surrealkv://{path}"))
            .await
            .map_err(|e| AppError::IndexStore(format!("failed to open store at {path}: {e}")))?;

        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::IndexStore(format!("failed to select namespace: {e}")))?;

        Ok(SurrealDbClient { client: db })
    }

    /// Create an in-memory SurrealDB client for testing.
    #[cfg(any(test, feature = "test-utils"))]
    pub async fn memory(namespace: &str, database: &str) -> Result<Self, Error> {
        let db = connect("mem://").await?;
        db.use_ns(namespace).use_db(database).await?;

        Ok(SurrealDbClient { client: db })
    }

    /// Defines the indexes the collection relies on: a UNIQUE index backing
    /// the content-hash invariant and an HNSW index for knn retrieval.
    /// Idempotent; safe to run on every startup.
    pub async fn ensure_indexes(&self, embedding_dimension: usize) -> Result<(), Error> {
        self.client
            .query("DEFINE INDEX IF NOT EXISTS idx_unique_content_hash ON index_entry FIELDS content_hash UNIQUE")
            .await?;
        self.client
            .query(format!(
                "DEFINE INDEX IF NOT EXISTS idx_embedding_entries ON index_entry FIELDS embedding HNSW DIMENSION {embedding_dimension}"
            ))
            .await?;

        Ok(())
    }

    /// Stores an object in its table, keyed by its own id.
    pub async fn store_item<T>(&self, item: T) -> Result<Option<T>, Error>
    where
        T: StoredObject + Send + Sync + 'static,
    {
        self.client
            .create((T::table_name(), item.get_id()))
            .content(item)
            .await
    }

    /// Retrieves a single object by id.
    pub async fn get_item<T>(&self, id: &str) -> Result<Option<T>, Error>
    where
        T: StoredObject + Send + Sync + 'static,
    {
        self.client.select((T::table_name(), id)).await
    }

    /// Retrieves all objects from the type's table.
    pub async fn get_all_stored_items<T>(&self) -> Result<Vec<T>, Error>
    where
        T: StoredObject + Send + Sync + 'static,
    {
        self.client.select(T::table_name()).await
    }

}

impl std::ops::Deref for SurrealDbClient {
    type Target = Surreal<Any>;

    fn deref(&self) -> &Self::Target {
        &self.client
    }
}
