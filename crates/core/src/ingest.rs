use crate::chunking::build_chunks;
use crate::config::PipelineConfig;
use crate::embeddings::Embedder;
use crate::error::IngestError;
use crate::extractor::PdfExtractor;
use crate::models::KNOWN_DOCUMENTS;
use crate::store::VectorIndex;
use tokio::fs;

/// A known document that was absent from the data directory. Missing files
/// are recorded here and never fail the pipeline.
#[derive(Debug, Clone)]
pub struct SkippedDocument {
    pub file_name: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct IngestionOutcome {
    /// True when the store was already populated and nothing was touched.
    pub already_ingested: bool,
    pub chunk_count: usize,
    pub per_file_counts: Vec<(String, usize)>,
    pub skipped: Vec<SkippedDocument>,
}

/// Runs the full pipeline: load every known document, chunk, embed, persist.
///
/// A populated store short-circuits the whole run. A missing source file is
/// skipped; any extraction failure aborts the run before anything is written,
/// so the store is only ever created from a complete pass.
pub async fn run_ingestion<X, S, E>(
    config: &PipelineConfig,
    extractor: &X,
    store: &S,
    embedder: &E,
) -> Result<IngestionOutcome, IngestError>
where
    X: PdfExtractor,
    S: VectorIndex,
    E: Embedder,
{
    if store.is_populated().await? {
        return Ok(IngestionOutcome {
            already_ingested: true,
            ..Default::default()
        });
    }

    let mut outcome = IngestionOutcome::default();
    let mut all_chunks = Vec::new();

    for (file_name, category) in KNOWN_DOCUMENTS {
        let path = config.data_dir.join(file_name);
        if !fs::try_exists(&path).await? {
            outcome.skipped.push(SkippedDocument {
                file_name: (*file_name).to_string(),
                reason: format!("file not found: {}", path.display()),
            });
            continue;
        }

        let pages = extractor.extract_pages(&path)?;

        let mut cursor = 0u64;
        let mut file_chunk_count = 0usize;
        for page in pages {
            let (chunks, next_cursor) = build_chunks(
                file_name,
                *category,
                page.number,
                &page.text,
                config.chunking,
                cursor,
            );
            cursor = next_cursor;
            file_chunk_count += chunks.len();
            all_chunks.extend(chunks);
        }

        outcome
            .per_file_counts
            .push(((*file_name).to_string(), file_chunk_count));
    }

    if all_chunks.is_empty() {
        return Err(IngestError::NoChunks);
    }

    let embeddings: Vec<Vec<f32>> = all_chunks
        .iter()
        .map(|chunk| embedder.embed(&chunk.text))
        .collect();
    store.index_chunks(&all_chunks, &embeddings).await?;

    outcome.chunk_count = all_chunks.len();
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::HashedTrigramEmbedder;
    use crate::error::StoreError;
    use crate::extractor::PageText;
    use crate::models::{Category, DocumentChunk, QueryHit};
    use crate::store::cosine_similarity;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::fs::File;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct FakeExtractor {
        pages_by_file: HashMap<String, Vec<PageText>>,
        failing_files: Vec<String>,
        calls: AtomicUsize,
    }

    impl FakeExtractor {
        fn new() -> Self {
            Self {
                pages_by_file: HashMap::new(),
                failing_files: Vec::new(),
                calls: AtomicUsize::new(0),
            }
        }

        fn with_page(mut self, file_name: &str, text: &str) -> Self {
            self.pages_by_file.insert(
                file_name.to_string(),
                vec![PageText {
                    number: 1,
                    text: text.to_string(),
                }],
            );
            self
        }

        fn failing_on(mut self, file_name: &str) -> Self {
            self.failing_files.push(file_name.to_string());
            self
        }
    }

    impl PdfExtractor for FakeExtractor {
        fn extract_pages(&self, path: &Path) -> Result<Vec<PageText>, IngestError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default();
            if self.failing_files.iter().any(|failing| failing == name) {
                return Err(IngestError::PdfParse(format!("corrupt pdf: {name}")));
            }
            Ok(self.pages_by_file.get(name).cloned().unwrap_or_default())
        }
    }

    #[derive(Default)]
    struct MemoryStore {
        populated: bool,
        indexed: Mutex<Vec<(DocumentChunk, Vec<f32>)>>,
    }

    #[async_trait]
    impl VectorIndex for MemoryStore {
        async fn is_populated(&self) -> Result<bool, StoreError> {
            Ok(self.populated || !self.indexed.lock().unwrap().is_empty())
        }

        async fn index_chunks(
            &self,
            chunks: &[DocumentChunk],
            embeddings: &[Vec<f32>],
        ) -> Result<(), StoreError> {
            let mut indexed = self.indexed.lock().unwrap();
            indexed.extend(
                chunks
                    .iter()
                    .cloned()
                    .zip(embeddings.iter().cloned()),
            );
            Ok(())
        }

        async fn search(
            &self,
            query_vector: &[f32],
            category: Option<Category>,
            top_k: usize,
        ) -> Result<Vec<QueryHit>, StoreError> {
            let indexed = self.indexed.lock().unwrap();
            let mut hits: Vec<QueryHit> = indexed
                .iter()
                .filter(|(chunk, _)| category.map_or(true, |wanted| chunk.category == wanted))
                .map(|(chunk, embedding)| QueryHit {
                    score: cosine_similarity(query_vector, embedding),
                    chunk: chunk.clone(),
                })
                .collect();
            hits.sort_by(|left, right| right.score.total_cmp(&left.score));
            hits.truncate(top_k);
            Ok(hits)
        }
    }

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    fn test_config(data_dir: &Path) -> PipelineConfig {
        let mut config = PipelineConfig::new(data_dir, data_dir.join("store"));
        config.embedding_dimensions = 32;
        config
    }

    #[tokio::test]
    async fn populated_store_short_circuits() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let extractor = FakeExtractor::new();
        let store = MemoryStore {
            populated: true,
            ..Default::default()
        };
        let embedder = HashedTrigramEmbedder { dimensions: 32 };

        let outcome =
            run_ingestion(&test_config(dir.path()), &extractor, &store, &embedder).await?;
        assert!(outcome.already_ingested);
        assert_eq!(outcome.chunk_count, 0);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_is_skipped_not_fatal() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        touch(dir.path(), "acetaminophen.pdf");
        touch(dir.path(), "aspirine.pdf");
        // headache_pain_management.pdf is absent on purpose

        let extractor = FakeExtractor::new()
            .with_page("acetaminophen.pdf", &"acetaminophen label ".repeat(20))
            .with_page("aspirine.pdf", &"aspirin label text ".repeat(20));
        let store = MemoryStore::default();
        let embedder = HashedTrigramEmbedder { dimensions: 32 };

        let outcome =
            run_ingestion(&test_config(dir.path()), &extractor, &store, &embedder).await?;

        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].file_name, "headache_pain_management.pdf");
        assert_eq!(outcome.per_file_counts.len(), 2);
        let per_file_total: usize = outcome
            .per_file_counts
            .iter()
            .map(|(_, count)| count)
            .sum();
        assert_eq!(outcome.chunk_count, per_file_total);
        assert!(outcome.chunk_count > 0);
        Ok(())
    }

    #[tokio::test]
    async fn extraction_failure_aborts_whole_run() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        touch(dir.path(), "acetaminophen.pdf");
        touch(dir.path(), "aspirine.pdf");
        touch(dir.path(), "headache_pain_management.pdf");

        let extractor = FakeExtractor::new()
            .with_page("acetaminophen.pdf", "acetaminophen label")
            .failing_on("aspirine.pdf");
        let store = MemoryStore::default();
        let embedder = HashedTrigramEmbedder { dimensions: 32 };

        let result = run_ingestion(&test_config(dir.path()), &extractor, &store, &embedder).await;
        assert!(matches!(result, Err(IngestError::PdfParse(_))));
        assert!(store.indexed.lock().unwrap().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn all_files_missing_is_no_chunks() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let extractor = FakeExtractor::new();
        let store = MemoryStore::default();
        let embedder = HashedTrigramEmbedder { dimensions: 32 };

        let result = run_ingestion(&test_config(dir.path()), &extractor, &store, &embedder).await;
        assert!(matches!(result, Err(IngestError::NoChunks)));
        Ok(())
    }

    #[tokio::test]
    async fn second_run_leaves_store_untouched() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        touch(dir.path(), "acetaminophen.pdf");

        let extractor =
            FakeExtractor::new().with_page("acetaminophen.pdf", &"dose guidance ".repeat(30));
        let store = MemoryStore::default();
        let embedder = HashedTrigramEmbedder { dimensions: 32 };
        let config = test_config(dir.path());

        let first = run_ingestion(&config, &extractor, &store, &embedder).await?;
        let indexed_after_first = store.indexed.lock().unwrap().len();
        let calls_after_first = extractor.calls.load(Ordering::SeqCst);

        let second = run_ingestion(&config, &extractor, &store, &embedder).await?;
        assert!(!first.already_ingested);
        assert!(second.already_ingested);
        assert_eq!(store.indexed.lock().unwrap().len(), indexed_after_first);
        assert_eq!(extractor.calls.load(Ordering::SeqCst), calls_after_first);
        Ok(())
    }
}
