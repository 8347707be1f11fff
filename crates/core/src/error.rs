use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("embedding dimension {actual} does not match store dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("chunk count {chunks} does not match embedding count {embeddings}")]
    CountMismatch { chunks: usize, embeddings: usize },

    #[error("store not populated yet: {0}")]
    NotReady(PathBuf),
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("invalid chunking config: {0}")]
    InvalidChunkConfig(String),

    #[error("no chunks were produced from any source document")]
    NoChunks,

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("vector store not found or empty at {0}; run ingestion first")]
    StoreNotReady(PathBuf),

    #[error("store error: {0}")]
    Store(StoreError),
}

impl From<StoreError> for QueryError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotReady(path) => QueryError::StoreNotReady(path),
            other => QueryError::Store(other),
        }
    }
}
