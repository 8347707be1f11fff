use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Logical category attached to every chunk of a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    DrugLabel,
    MedicaidPolicy,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::DrugLabel => "drug_label",
            Category::MedicaidPolicy => "medicaid_policy",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "drug_label" => Ok(Category::DrugLabel),
            "medicaid_policy" => Ok(Category::MedicaidPolicy),
            other => Err(format!(
                "unknown category '{other}' (expected drug_label or medicaid_policy)"
            )),
        }
    }
}

/// Fixed corpus: filename to category, iterated in declaration order.
pub const KNOWN_DOCUMENTS: &[(&str, Category)] = &[
    ("acetaminophen.pdf", Category::DrugLabel),
    ("aspirine.pdf", Category::DrugLabel),
    ("headache_pain_management.pdf", Category::MedicaidPolicy),
];

/// One bounded span of text cut from a source document, immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub chunk_id: String,
    pub source_file: String,
    pub category: Category,
    pub page: u32,
    pub chunk_index: u64,
    pub text: String,
}

pub const DEFAULT_TOP_K: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub text: String,
    pub category: Option<Category>,
    pub top_k: usize,
}

impl QueryRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            category: None,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }
}

/// A chunk returned from similarity search, most-similar hits first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryHit {
    pub chunk: DocumentChunk,
    pub score: f32,
}
