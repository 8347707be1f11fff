use crate::error::StoreError;
use crate::models::{Category, DocumentChunk, QueryHit};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const RECORDS_FILE: &str = "records.json";

/// Persistent index over (chunk, embedding) pairs.
#[async_trait]
pub trait VectorIndex {
    async fn is_populated(&self) -> Result<bool, StoreError>;

    async fn index_chunks(
        &self,
        chunks: &[DocumentChunk],
        embeddings: &[Vec<f32>],
    ) -> Result<(), StoreError>;

    async fn search(
        &self,
        query_vector: &[f32],
        category: Option<Category>,
        top_k: usize,
    ) -> Result<Vec<QueryHit>, StoreError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreManifest {
    pub store_id: Uuid,
    pub dimensions: usize,
    pub chunk_count: usize,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredRecord {
    chunk: DocumentChunk,
    embedding: Vec<f32>,
}

/// Directory-backed store: a manifest plus one records file holding every
/// chunk with its embedding. Search is brute-force cosine similarity.
pub struct LocalVectorStore {
    dir: PathBuf,
    dimensions: usize,
}

impl LocalVectorStore {
    pub fn new(dir: impl Into<PathBuf>, dimensions: usize) -> Self {
        Self {
            dir: dir.into(),
            dimensions,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub async fn manifest(&self) -> Result<StoreManifest, StoreError> {
        let bytes = match fs::read(self.dir.join(MANIFEST_FILE)).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotReady(self.dir.clone()));
            }
            Err(error) => return Err(error.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn load_records(&self) -> Result<Vec<StoredRecord>, StoreError> {
        let bytes = match fs::read(self.dir.join(RECORDS_FILE)).await {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotReady(self.dir.clone()));
            }
            Err(error) => return Err(error.into()),
        };
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl VectorIndex for LocalVectorStore {
    async fn is_populated(&self) -> Result<bool, StoreError> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(error) => return Err(error.into()),
        };
        Ok(entries.next_entry().await?.is_some())
    }

    async fn index_chunks(
        &self,
        chunks: &[DocumentChunk],
        embeddings: &[Vec<f32>],
    ) -> Result<(), StoreError> {
        if chunks.len() != embeddings.len() {
            return Err(StoreError::CountMismatch {
                chunks: chunks.len(),
                embeddings: embeddings.len(),
            });
        }
        for embedding in embeddings {
            if embedding.len() != self.dimensions {
                return Err(StoreError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: embedding.len(),
                });
            }
        }

        let records: Vec<StoredRecord> = chunks
            .iter()
            .zip(embeddings.iter())
            .map(|(chunk, embedding)| StoredRecord {
                chunk: chunk.clone(),
                embedding: embedding.clone(),
            })
            .collect();

        fs::create_dir_all(&self.dir).await?;

        // Records land via a rename so a crashed write never leaves a
        // half-populated store behind.
        let staged = self.dir.join(format!("{RECORDS_FILE}.tmp"));
        fs::write(&staged, serde_json::to_vec(&records)?).await?;
        fs::rename(&staged, self.dir.join(RECORDS_FILE)).await?;

        let manifest = StoreManifest {
            store_id: Uuid::new_v4(),
            dimensions: self.dimensions,
            chunk_count: records.len(),
            created_at: Utc::now(),
        };
        fs::write(
            self.dir.join(MANIFEST_FILE),
            serde_json::to_vec_pretty(&manifest)?,
        )
        .await?;

        Ok(())
    }

    async fn search(
        &self,
        query_vector: &[f32],
        category: Option<Category>,
        top_k: usize,
    ) -> Result<Vec<QueryHit>, StoreError> {
        if query_vector.len() != self.dimensions {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimensions,
                actual: query_vector.len(),
            });
        }

        let records = self.load_records().await?;

        let mut hits: Vec<QueryHit> = records
            .into_iter()
            .filter(|record| category.map_or(true, |wanted| record.chunk.category == wanted))
            .map(|record| QueryHit {
                score: cosine_similarity(query_vector, &record.embedding),
                chunk: record.chunk,
            })
            .collect();

        hits.sort_by(|left, right| right.score.total_cmp(&left.score));
        hits.truncate(top_k);
        Ok(hits)
    }
}

pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    let dot: f32 = left.iter().zip(right.iter()).map(|(a, b)| a * b).sum();
    let left_norm: f32 = left.iter().map(|value| value * value).sum::<f32>().sqrt();
    let right_norm: f32 = right.iter().map(|value| value * value).sum::<f32>().sqrt();

    if left_norm == 0.0 || right_norm == 0.0 {
        return 0.0;
    }
    dot / (left_norm * right_norm)
}
