use std::collections::HashSet;
use std::sync::Arc;

use common::{
    error::AppError,
    storage::{
        db::SurrealDbClient,
        types::{index_entry::IndexEntry, index_meta::IndexMeta},
    },
    utils::embedding::EmbeddingProvider,
};
use tokio::sync::Mutex;
use tracing::info;

use crate::chunker::Chunk;

/// Result of one indexing call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOutcome {
    /// Chunks embedded and inserted by this call.
    pub inserted: usize,
    /// Chunks skipped as duplicates (stored or intra-batch).
    pub skipped: usize,
    /// Collection size after the call.
    pub total_stored: usize,
}

/// Merges chunk batches into the persistent collection without
/// re-embedding or duplicating already-present content.
///
/// The whole read-modify-write sequence (fetch stored hashes, filter,
/// embed, insert) runs under a single writer lock so that concurrent
/// indexing calls cannot break the content-hash uniqueness invariant.
pub struct DedupIndexer {
    db: Arc<SurrealDbClient>,
    embedding_provider: Arc<EmbeddingProvider>,
    write_lock: Mutex<()>,
}

impl DedupIndexer {
    pub fn new(db: Arc<SurrealDbClient>, embedding_provider: Arc<EmbeddingProvider>) -> Self {
        Self {
            db,
            embedding_provider,
            write_lock: Mutex::new(()),
        }
    }

    /// Indexes a chunk batch: only chunks whose hash is absent from the
    /// stored set are embedded and inserted. Append-only: existing entries
    /// are never rewritten.
    pub async fn index_chunks(&self, chunks: Vec<Chunk>) -> Result<IndexOutcome, AppError> {
        let _guard = self.write_lock.lock().await;

        let batch_size = chunks.len();
        // The stored set is read unconditionally, not gated on the
        // bootstrap marker: a run that failed mid-insert leaves entries
        // behind without the marker, and the retry must skip those
        // instead of re-inserting them.
        let stored_hashes: HashSet<String> = IndexEntry::fetch_content_hashes(&self.db)
            .await?
            .into_iter()
            .collect();

        let mut seen_in_batch = HashSet::new();
        let novel: Vec<Chunk> = chunks
            .into_iter()
            .filter(|chunk| {
                !stored_hashes.contains(&chunk.content_hash)
                    && seen_in_batch.insert(chunk.content_hash.clone())
            })
            .collect();

        let inserted = if novel.is_empty() {
            info!("no novel chunks; skipping embedding and insertion");
            0
        } else {
            let contents: Vec<String> = novel.iter().map(|c| c.content.clone()).collect();
            let embeddings = self.embedding_provider.embed_batch(contents).await?;

            if embeddings.len() != novel.len() {
                return Err(AppError::LLMParsing(format!(
                    "embedding count mismatch: {} chunks, {} vectors",
                    novel.len(),
                    embeddings.len()
                )));
            }

            for (chunk, embedding) in novel.iter().zip(embeddings) {
                let entry =
                    IndexEntry::new(chunk.content_hash.clone(), chunk.content.clone(), embedding);
                self.db.store_item(entry).await?;
            }
            novel.len()
        };

        IndexMeta::mark_bootstrapped(&self.db, self.embedding_provider.backend_label()).await?;

        let total_stored = IndexEntry::count(&self.db).await?;
        let outcome = IndexOutcome {
            inserted,
            skipped: batch_size - inserted,
            total_stored,
        };
        info!(
            inserted = outcome.inserted,
            skipped = outcome.skipped,
            total_stored = outcome.total_stored,
            "indexing batch merged"
        );

        Ok(outcome)
    }
}
