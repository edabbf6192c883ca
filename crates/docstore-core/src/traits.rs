use crate::error::Result;
use crate::types::{DocId, SearchHit};

/// Inverted keyword index over document content.
///
/// Implementations use interior mutability; the coordinator serializes
/// `index` calls under its write lock while `search` may run concurrently.
/// The counting accessors (`contains`, `len`, `term_count`) read through a
/// poisoned lock rather than reporting an empty index; mutating calls fail.
pub trait TermIndexer: Send + Sync {
    /// Index `content` under `id`. Indexing an id twice is a no-op.
    fn index(&self, id: DocId, content: &str) -> Result<()>;
    /// All documents matching `query`, best first, ties by ascending id.
    fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
    fn contains(&self, id: DocId) -> bool;
    /// Number of indexed documents.
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool { self.len() == 0 }
    /// Number of distinct terms.
    fn term_count(&self) -> usize;
    /// Every indexed id, ascending.
    fn indexed_ids(&self) -> Result<Vec<DocId>>;
    /// Drop every posting (and its persisted form) so the index can be rebuilt.
    fn clear(&self) -> Result<()>;
}

/// Nearest-neighbour index over document embeddings. Accessors read through
/// a poisoned lock the same way `TermIndexer`'s do.
pub trait VectorIndexer: Send + Sync {
    /// Fixed dimension, once known.
    fn dim(&self) -> Option<usize>;
    /// Append `embedding` under `id`. Indexing an id twice is a no-op.
    fn index(&self, id: DocId, embedding: &[f32]) -> Result<()>;
    /// Top `k` documents by cosine similarity, ties by ascending id.
    fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>>;
    fn contains(&self, id: DocId) -> bool;
    fn len(&self) -> usize;
    fn is_empty(&self) -> bool { self.len() == 0 }
}
