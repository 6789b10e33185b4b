use std::collections::HashSet;
use std::sync::Arc;

use common::{
    error::AppError,
    storage::db::SurrealDbClient,
    utils::{config::AppConfig, embedding::EmbeddingProvider, text::normalize},
};
use tracing::{info, warn};

use crate::{
    chunker::Chunker,
    eda::write_eda_report,
    indexer::{DedupIndexer, IndexOutcome},
    loader::{load_records, Record},
    quality::quality_filter,
};

/// Stage counters for one full indexing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexingReport {
    pub loaded: usize,
    pub kept: usize,
    pub chunks: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub total_stored: usize,
}

/// Full bootstrap sequence: load, report, quality-filter, normalize,
/// chunk, merge into the store. Constructed once and reused; safe to run
/// repeatedly thanks to the deduplicating indexer.
pub struct IndexingPipeline {
    config: AppConfig,
    chunker: Chunker,
    indexer: DedupIndexer,
}

impl IndexingPipeline {
    pub fn new(
        db: Arc<SurrealDbClient>,
        embedding_provider: Arc<EmbeddingProvider>,
        config: AppConfig,
    ) -> Result<Self, AppError> {
        let chunker = Chunker::new(config.chunk_size, config.chunk_overlap)?;
        let indexer = DedupIndexer::new(db, embedding_provider);

        Ok(Self {
            config,
            chunker,
            indexer,
        })
    }

    #[tracing::instrument(skip_all, fields(data_path = %self.config.data_path))]
    pub async fn run(&self) -> Result<IndexingReport, AppError> {
        let records = load_records(&self.config.data_path)?;
        let loaded = records.len();

        // Operator-facing report; never blocks indexing.
        if let Err(err) = write_eda_report(&records, &self.config.eda_report_path) {
            warn!(error = %err, "failed to write EDA report");
        }

        let records = quality_filter(records, self.config.min_text_length);
        let records = normalize_records(records);
        let kept = records.len();

        let chunks = self.chunker.split_records(&records);
        let chunk_count = chunks.len();
        info!(kept, chunks = chunk_count, "prepared chunks for indexing");

        let IndexOutcome {
            inserted,
            skipped,
            total_stored,
        } = self.indexer.index_chunks(chunks).await?;

        let report = IndexingReport {
            loaded,
            kept,
            chunks: chunk_count,
            inserted,
            skipped,
            total_stored,
        };
        info!(?report, "indexing run complete");

        Ok(report)
    }
}

/// Normalize stage: canonicalize each record's text, drop records whose
/// normalized text is empty and exact duplicates of already-seen
/// normalized texts (first occurrence wins).
fn normalize_records(records: Vec<Record>) -> Vec<Record> {
    let before = records.len();
    let mut seen = HashSet::new();

    let records: Vec<Record> = records
        .into_iter()
        .filter_map(|record| {
            let normalized = normalize(&record.text);
            if normalized.is_empty() || !seen.insert(normalized.clone()) {
                return None;
            }
            Some(Record::new(record.id, normalized))
        })
        .collect();

    info!(
        kept = records.len(),
        dropped = before - records.len(),
        "normalized records"
    );
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn record(text: &str) -> Record {
        Record::new(None, text.to_string())
    }

    fn test_config(data_path: &str, eda_path: &str) -> AppConfig {
        let mut config = base_config();
        config.data_path = data_path.to_string();
        config.eda_report_path = eda_path.to_string();
        config
    }

    fn base_config() -> AppConfig {
        serde_json::from_value(serde_json::json!({
            "data_path": "unused",
            "index_db_path": "unused",
            "embedding_model": "unused",
            "embedding_backend": "hashed",
            "embedding_dimensions": 8,
            "chunk_size": 50,
            "chunk_overlap": 10,
            "min_text_length": 10,
            "llm_model_name": "unused",
            "openai_api_key": "unused"
        }))
        .expect("valid test config")
    }

    async fn setup_db() -> Arc<SurrealDbClient> {
        let namespace = "test_ns";
        let database = &Uuid::new_v4().to_string();
        Arc::new(
            SurrealDbClient::memory(namespace, database)
                .await
                .expect("Failed to start in-memory surrealdb"),
        )
    }

    fn write_dataset(dir: &TempDir) {
        let path = dir.path().join("data.json");
        let mut file = std::fs::File::create(path).expect("create fixture");
        file.write_all(
            br#"[
                {"id": 1, "text": "The first document is about information retrieval systems."},
                {"id": 2, "text": "The second document describes embedding based vector search."},
                {"id": 2, "text": "A duplicated id that must be dropped by the quality filter."},
                {"id": 3, "text": "short"}
            ]"#,
        )
        .expect("write fixture");
    }

    #[test]
    fn test_normalize_records_drops_empty_and_duplicates() {
        let records = vec![
            record(" Hello World "),
            record("hello world"),
            record("!?"),
            record("another text"),
        ];

        let normalized = normalize_records(records);
        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].text, "hello world");
        assert_eq!(normalized[1].text, "another text");
    }

    #[test]
    fn test_normalize_records_recomputes_length() {
        let records = vec![record(" Padded Text ")];
        let normalized = normalize_records(records);
        assert_eq!(normalized[0].text_length, "padded text".chars().count());
    }

    #[tokio::test]
    async fn test_invalid_chunk_parameters_rejected_at_construction() {
        let mut config = base_config();
        config.chunk_size = 10;
        config.chunk_overlap = 10;

        let db = setup_db().await;
        let provider = Arc::new(EmbeddingProvider::new_hashed(8));
        assert!(IndexingPipeline::new(db, provider, config).is_err());
    }

    #[tokio::test]
    async fn test_full_run_reports_stage_counts() {
        let dir = TempDir::new().expect("tempdir");
        write_dataset(&dir);
        let eda_path = dir.path().join("eda_output.md");

        let config = test_config(
            dir.path().to_str().unwrap(),
            eda_path.to_str().unwrap(),
        );
        let db = setup_db().await;
        let provider = Arc::new(EmbeddingProvider::new_hashed(8));
        let pipeline = IndexingPipeline::new(db, provider, config).expect("pipeline");

        let report = pipeline.run().await.expect("run");
        assert_eq!(report.loaded, 4);
        assert_eq!(report.kept, 2);
        assert!(report.chunks >= 2);
        assert_eq!(report.inserted, report.chunks);
        assert_eq!(report.total_stored, report.inserted);
        assert!(eda_path.exists());
    }

    #[tokio::test]
    async fn test_rerun_on_same_input_is_idempotent() {
        let dir = TempDir::new().expect("tempdir");
        write_dataset(&dir);
        let eda_path = dir.path().join("eda_output.md");

        let config = test_config(
            dir.path().to_str().unwrap(),
            eda_path.to_str().unwrap(),
        );
        let db = setup_db().await;
        let provider = Arc::new(EmbeddingProvider::new_hashed(8));
        let pipeline = IndexingPipeline::new(db, provider, config).expect("pipeline");

        let first = pipeline.run().await.expect("first run");
        let second = pipeline.run().await.expect("second run");

        assert_eq!(second.inserted, 0);
        assert_eq!(second.total_stored, first.total_stored);
    }

    #[tokio::test]
    async fn test_missing_data_path_halts_bootstrap() {
        let config = test_config("/definitely/not/here", "/tmp/unused_eda.md");

        let db = setup_db().await;
        let provider = Arc::new(EmbeddingProvider::new_hashed(8));
        let pipeline = IndexingPipeline::new(db, provider, config).expect("pipeline");

        let err = pipeline.run().await.unwrap_err();
        assert!(matches!(err, AppError::DataLoad(_)));
    }
}
