use crate::chunking::ChunkingConfig;
use crate::embeddings::DEFAULT_EMBEDDING_DIMENSIONS;
use std::path::PathBuf;

/// Environment variable naming the source PDF directory.
pub const DATA_DIR_ENV: &str = "DATA_PATH";
/// Environment variable naming the vector store directory.
pub const STORE_DIR_ENV: &str = "VECTOR_STORE_PATH";

/// Process-wide settings, resolved once at startup and passed by reference.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub data_dir: PathBuf,
    pub store_dir: PathBuf,
    pub chunking: ChunkingConfig,
    pub embedding_dimensions: usize,
}

impl PipelineConfig {
    pub fn new(data_dir: impl Into<PathBuf>, store_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            store_dir: store_dir.into(),
            chunking: ChunkingConfig::default(),
            embedding_dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
        }
    }
}
