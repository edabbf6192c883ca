use std::collections::HashSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use docstore_core::error::{Error, Result};
use docstore_core::records::validate_embedding;
use docstore_core::traits::VectorIndexer;
use docstore_core::types::{DocId, SearchHit, SourceKind};

use crate::similarity::{cosine_with_norms, norm};

#[derive(Default)]
struct Inner {
	dim: Option<usize>,
	ids: Vec<DocId>,
	/// Row-major, `ids.len() * dim` components.
	data: Vec<f32>,
	norms: Vec<f64>,
	present: HashSet<DocId>,
}

impl Inner {
	fn row(&self, i: usize, dim: usize) -> &[f32] { &self.data[i * dim..(i + 1) * dim] }
}

/// Exact cosine search over every stored embedding.
pub struct VectorIndex {
	inner: RwLock<Inner>,
}

impl VectorIndex {
	/// `dim` pins the dimension up front; `None` takes it from the first vector.
	pub fn new(dim: Option<usize>) -> Self {
		Self { inner: RwLock::new(Inner { dim, ..Inner::default() }) }
	}

	// A row is pushed to `ids`, `data` and `norms` before `present` marks it.
	fn read_through(&self) -> RwLockReadGuard<'_, Inner> {
		self.inner.read().unwrap_or_else(PoisonError::into_inner)
	}
}

impl Default for VectorIndex {
	fn default() -> Self { Self::new(None) }
}

impl VectorIndexer for VectorIndex {
	fn dim(&self) -> Option<usize> { self.read_through().dim }

	fn index(&self, id: DocId, embedding: &[f32]) -> Result<()> {
		let mut inner = self.inner.write().map_err(|_| Error::poisoned("vector index"))?;
		if inner.present.contains(&id) { return Ok(()); }
		validate_embedding(embedding, inner.dim)?;
		inner.dim.get_or_insert(embedding.len());
		inner.ids.push(id);
		inner.data.extend_from_slice(embedding);
		inner.norms.push(norm(embedding));
		inner.present.insert(id);
		Ok(())
	}

	fn search_vec(&self, query_vec: &[f32], k: usize) -> Result<Vec<SearchHit>> {
		if k == 0 { return Err(Error::validation("k must be at least 1")); }
		let inner = self.inner.read().map_err(|_| Error::poisoned("vector index"))?;
		validate_embedding(query_vec, inner.dim)?;
		let Some(dim) = inner.dim else { return Ok(Vec::new()) };

		let query_norm = norm(query_vec);
		let mut hits: Vec<SearchHit> = inner
			.ids
			.iter()
			.enumerate()
			.map(|(i, &id)| SearchHit { id, score: cosine_with_norms(query_vec, inner.row(i, dim), query_norm, inner.norms[i]), source: SourceKind::Vector })
			.collect();
		let order = |a: &SearchHit, b: &SearchHit| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id));
		if hits.len() > k {
			hits.select_nth_unstable_by(k - 1, order);
			hits.truncate(k);
		}
		hits.sort_by(order);
		tracing::debug!(k, candidates = inner.ids.len(), returned = hits.len(), "vector search");
		Ok(hits)
	}

	fn contains(&self, id: DocId) -> bool { self.read_through().present.contains(&id) }

	fn len(&self) -> usize { self.read_through().ids.len() }
}
