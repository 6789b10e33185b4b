#![allow(clippy::missing_docs_in_private_items)]

pub mod chunker;
pub mod eda;
pub mod indexer;
pub mod loader;
pub mod pipeline;
pub mod quality;

pub use chunker::{Chunk, Chunker};
pub use indexer::{DedupIndexer, IndexOutcome};
pub use loader::{load_records, Record};
pub use pipeline::{IndexingPipeline, IndexingReport};
