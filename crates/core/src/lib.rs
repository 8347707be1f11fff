pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod extractor;
pub mod ingest;
pub mod models;
pub mod query;
pub mod store;

pub use chunking::{
    build_chunks, normalize_whitespace, split_text, ChunkingConfig, DEFAULT_CHUNK_MAX_CHARS,
    DEFAULT_CHUNK_OVERLAP_CHARS,
};
pub use config::{PipelineConfig, DATA_DIR_ENV, STORE_DIR_ENV};
pub use embeddings::{Embedder, HashedTrigramEmbedder, DEFAULT_EMBEDDING_DIMENSIONS};
pub use error::{IngestError, QueryError, StoreError};
pub use extractor::{LopdfExtractor, PageText, PdfExtractor};
pub use ingest::{run_ingestion, IngestionOutcome, SkippedDocument};
pub use models::{
    Category, DocumentChunk, QueryHit, QueryRequest, DEFAULT_TOP_K, KNOWN_DOCUMENTS,
};
pub use query::QueryService;
pub use store::{cosine_similarity, LocalVectorStore, StoreManifest, VectorIndex};
