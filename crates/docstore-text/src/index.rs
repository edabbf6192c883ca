use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use docstore_core::error::{Error, Result};
use docstore_core::journal::Journal;
use docstore_core::traits::TermIndexer;
use docstore_core::types::{DocId, SearchHit, SourceKind};

use crate::query::{self, Item, Query};
use crate::tokenizer::Tokenizer;

pub const TERMS_FILE: &str = "terms.log";

/// Term -> sorted positions, for one document.
type DocTerms = BTreeMap<String, Vec<u32>>;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum TermEntry {
	Policy { tokenizer: String },
	Postings { id: DocId, terms: DocTerms },
}

#[derive(Default)]
struct Inner {
	/// term -> (document -> positions). Term frequency is `positions.len()`.
	postings: HashMap<String, BTreeMap<DocId, Vec<u32>>>,
	indexed: HashSet<DocId>,
	journal: Option<Journal<TermEntry>>,
}

impl Inner {
	fn apply(&mut self, id: DocId, terms: DocTerms) {
		for (term, positions) in terms {
			self.postings.entry(term).or_default().insert(id, positions);
		}
		self.indexed.insert(id);
	}

	/// Occurrences of `item` per matching document.
	fn occurrences(&self, item: &Item) -> BTreeMap<DocId, u32> {
		match item {
			Item::Term(term) => self
				.postings
				.get(term)
				.map(|docs| docs.iter().map(|(id, positions)| (*id, positions.len() as u32)).collect())
				.unwrap_or_default(),
			Item::Phrase(terms) => {
				let mut lists = Vec::with_capacity(terms.len());
				for t in terms {
					match self.postings.get(&t.text) {
						Some(docs) => lists.push((t.offset, docs)),
						None => return BTreeMap::new(),
					}
				}
				let Some(((_, first), rest)) = lists.split_first() else { return BTreeMap::new() };
				let mut out = BTreeMap::new();
				'docs: for (id, starts) in first.iter() {
					let mut others = Vec::with_capacity(rest.len());
					for (offset, docs) in rest {
						match docs.get(id) {
							Some(positions) => others.push((*offset, positions)),
							None => continue 'docs,
						}
					}
					let count = starts
						.iter()
						.filter(|&&start| others.iter().all(|(offset, positions)| positions.binary_search(&(start + offset)).is_ok()))
						.count() as u32;
					if count > 0 { out.insert(*id, count); }
				}
				out
			}
		}
	}

	fn evaluate(&self, query: &Query) -> HashMap<DocId, u32> {
		let mut best: HashMap<DocId, u32> = HashMap::new();
		for clause in &query.clauses {
			let mut required = clause.required.iter();
			let Some(first) = required.next() else { continue };
			let mut scores = self.occurrences(first);
			for item in required {
				if scores.is_empty() { break; }
				let hits = self.occurrences(item);
				scores.retain(|id, score| match hits.get(id) {
					Some(n) => { *score += n; true }
					None => false,
				});
			}
			for item in &clause.excluded {
				if scores.is_empty() { break; }
				let hits = self.occurrences(item);
				scores.retain(|id, _| !hits.contains_key(id));
			}
			for (id, score) in scores {
				let entry = best.entry(id).or_insert(0);
				*entry = (*entry).max(score);
			}
		}
		best
	}
}

/// Inverted index over document content with positional postings.
///
/// Append-only: documents are added one at a time and never removed. When
/// opened on a directory every indexed document is journaled to
/// `terms.log` before it becomes searchable.
pub struct TermIndex {
	tokenizer: Tokenizer,
	inner: RwLock<Inner>,
}

impl TermIndex {
	pub fn in_memory(tokenizer: Tokenizer) -> Self {
		Self { tokenizer, inner: RwLock::new(Inner::default()) }
	}

	/// Open (or create) `terms.log` under `dir`. A journal written under a
	/// different tokenizer policy is discarded; the caller reindexes.
	pub fn open(dir: &Path, tokenizer: Tokenizer, sync: bool) -> Result<Self> {
		std::fs::create_dir_all(dir).map_err(|e| Error::storage(format!("create {}", dir.display()), e))?;
		let (mut journal, entries) = Journal::<TermEntry>::open(&dir.join(TERMS_FILE), sync)?;
		let policy = tokenizer.fingerprint();
		let mut inner = Inner::default();

		let mut entries = entries.into_iter();
		match entries.next() {
			None => journal.append(&TermEntry::Policy { tokenizer: policy })?,
			Some(TermEntry::Policy { tokenizer: stored }) if stored == policy => {
				for entry in entries {
					match entry {
						TermEntry::Postings { id, terms } => inner.apply(id, terms),
						TermEntry::Policy { .. } => {
							return Err(Error::storage(format!("load {}", journal.path().display()), "unexpected policy entry"));
						}
					}
				}
			}
			Some(_) => {
				tracing::warn!(path = %journal.path().display(), policy = %policy, "term index built under another tokenizer policy; discarding");
				journal.reset()?;
				journal.append(&TermEntry::Policy { tokenizer: policy })?;
			}
		}
		inner.journal = Some(journal);
		tracing::info!(path = %dir.display(), documents = inner.indexed.len(), terms = inner.postings.len(), "term index opened");
		Ok(Self { tokenizer, inner: RwLock::new(inner) })
	}

	pub fn tokenizer(&self) -> &Tokenizer { &self.tokenizer }

	// `indexed` is only marked after a document's postings are fully applied,
	// so a panicking writer never leaves a half-indexed id that reads as present.
	fn read_through(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
		self.inner.read().unwrap_or_else(PoisonError::into_inner)
	}

	fn doc_terms(&self, content: &str) -> DocTerms {
		let mut terms = DocTerms::new();
		for token in self.tokenizer.tokenize(content) {
			terms.entry(token.text).or_default().push(token.position);
		}
		terms
	}
}

impl TermIndexer for TermIndex {
	fn index(&self, id: DocId, content: &str) -> Result<()> {
		let terms = self.doc_terms(content);
		let mut inner = self.inner.write().map_err(|_| Error::poisoned("term index"))?;
		if inner.indexed.contains(&id) { return Ok(()); }
		if let Some(journal) = inner.journal.as_mut() {
			journal.append(&TermEntry::Postings { id, terms: terms.clone() })?;
		}
		inner.apply(id, terms);
		Ok(())
	}

	fn search(&self, query_text: &str) -> Result<Vec<SearchHit>> {
		let query = query::parse(query_text, &self.tokenizer);
		if query.is_empty() { return Ok(Vec::new()); }
		let scores = self.inner.read().map_err(|_| Error::poisoned("term index"))?.evaluate(&query);
		let mut hits: Vec<SearchHit> = scores
			.into_iter()
			.map(|(id, score)| SearchHit { id, score: score as f32, source: SourceKind::Text })
			.collect();
		hits.sort_by(|a, b| b.score.total_cmp(&a.score).then(a.id.cmp(&b.id)));
		Ok(hits)
	}

	fn contains(&self, id: DocId) -> bool { self.read_through().indexed.contains(&id) }

	fn len(&self) -> usize { self.read_through().indexed.len() }

	fn term_count(&self) -> usize { self.read_through().postings.len() }

	fn indexed_ids(&self) -> Result<Vec<DocId>> {
		let inner = self.inner.read().map_err(|_| Error::poisoned("term index"))?;
		let mut ids: Vec<DocId> = inner.indexed.iter().copied().collect();
		ids.sort_unstable();
		Ok(ids)
	}

	fn clear(&self) -> Result<()> {
		let mut inner = self.inner.write().map_err(|_| Error::poisoned("term index"))?;
		if let Some(journal) = inner.journal.as_mut() {
			journal.reset()?;
			journal.append(&TermEntry::Policy { tokenizer: self.tokenizer.fingerprint() })?;
		}
		inner.postings.clear();
		inner.indexed.clear();
		Ok(())
	}
}
