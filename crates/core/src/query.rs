use crate::embeddings::Embedder;
use crate::error::QueryError;
use crate::models::{QueryHit, QueryRequest};
use crate::store::VectorIndex;

/// Answers free-text queries against a populated vector store. An empty
/// result set is a valid answer, not an error.
pub struct QueryService<S, E> {
    store: S,
    embedder: E,
}

impl<S, E> QueryService<S, E>
where
    S: VectorIndex,
    E: Embedder,
{
    pub fn new(store: S, embedder: E) -> Self {
        Self { store, embedder }
    }

    pub async fn search(&self, request: &QueryRequest) -> Result<Vec<QueryHit>, QueryError> {
        let query_vector = self.embedder.embed(&request.text);
        let hits = self
            .store
            .search(&query_vector, request.category, request.top_k)
            .await?;
        Ok(hits)
    }
}
