use crate::error::IngestError;
use crate::models::{Category, DocumentChunk};
use sha2::{Digest, Sha256};

pub const DEFAULT_CHUNK_MAX_CHARS: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP_CHARS: usize = 50;

/// Sliding-window split parameters. Overlap must stay below the window size
/// so every step makes forward progress.
#[derive(Debug, Clone, Copy)]
pub struct ChunkingConfig {
    max_chars: usize,
    overlap_chars: usize,
}

impl ChunkingConfig {
    pub fn new(max_chars: usize, overlap_chars: usize) -> Result<Self, IngestError> {
        if max_chars == 0 {
            return Err(IngestError::InvalidChunkConfig(
                "max_chars must be greater than zero".to_string(),
            ));
        }
        if overlap_chars >= max_chars {
            return Err(IngestError::InvalidChunkConfig(format!(
                "overlap_chars {overlap_chars} must be smaller than max_chars {max_chars}"
            )));
        }
        Ok(Self {
            max_chars,
            overlap_chars,
        })
    }

    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    pub fn overlap_chars(&self) -> usize {
        self.overlap_chars
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: DEFAULT_CHUNK_MAX_CHARS,
            overlap_chars: DEFAULT_CHUNK_OVERLAP_CHARS,
        }
    }
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('\u{a0}', " ")
}

/// Splits normalized text into windows of at most `max_chars` characters,
/// each consecutive pair sharing exactly `overlap_chars` characters. The
/// final window may be shorter.
pub fn split_text(text: &str, config: ChunkingConfig) -> Vec<String> {
    let normalized = normalize_whitespace(text);
    if normalized.is_empty() {
        return Vec::new();
    }

    let chars: Vec<char> = normalized.chars().collect();
    let step = config.max_chars - config.overlap_chars;
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let end = (start + config.max_chars).min(chars.len());
        chunks.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    chunks
}

/// Cuts one page of text into chunks tagged with the document's metadata,
/// continuing the per-document chunk index from `start_index`.
pub fn build_chunks(
    source_file: &str,
    category: Category,
    page: u32,
    page_text: &str,
    config: ChunkingConfig,
    start_index: u64,
) -> (Vec<DocumentChunk>, u64) {
    let mut chunks = Vec::new();
    let mut cursor = start_index;

    for text in split_text(page_text, config) {
        let chunk_id = make_chunk_id(source_file, page, cursor, &text);
        chunks.push(DocumentChunk {
            chunk_id,
            source_file: source_file.to_string(),
            category,
            page,
            chunk_index: cursor,
            text,
        });
        cursor = cursor.saturating_add(1);
    }

    (chunks, cursor)
}

fn make_chunk_id(source_file: &str, page: u32, index: u64, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source_file.as_bytes());
    hasher.update(page.to_le_bytes());
    hasher.update(index.to_le_bytes());
    hasher.update(text.as_bytes());
    format!("{:x}", hasher.finalize())
}
