//! docstore-hybrid
//!
//! `HybridStore` owns the record store and both indexes and keeps them in
//! step: a document is committed to the record store first, then term
//! indexed, then vector indexed, all under one writer lock.
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use docstore_core::config::{StoreConfig, DEFAULT_K};
use docstore_core::error::{Error, Result};
use docstore_core::records::RecordStore;
use docstore_core::traits::{TermIndexer, VectorIndexer};
use docstore_core::types::{DocId, Document, IndexStage, NewDocument, ScoredDocument};
use docstore_text::{TermIndex, Tokenizer};
use docstore_vector::VectorIndex;

pub type DefaultStore = HybridStore<TermIndex, VectorIndex>;

/// Outcome of `store_batch`: stored ids in input order plus per-item rejections.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchReport {
    pub stored: Vec<DocId>,
    /// (input position, reason)
    pub rejected: Vec<(usize, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub documents: usize,
    pub dimension: Option<usize>,
    pub terms: usize,
    pub term_indexed: usize,
    pub vectors: usize,
}

pub struct HybridStore<TI, VI> where TI: TermIndexer, VI: VectorIndexer {
    records: RecordStore,
    text: TI,
    vector: VI,
    write_lock: Mutex<()>,
    default_k: usize,
}

impl HybridStore<TermIndex, VectorIndex> {
    /// Build the store described by `config`. With `data_dir` set the record
    /// and term journals live there; otherwise everything is in memory.
    pub fn open(config: &StoreConfig) -> Result<Self> {
        config.validate()?;
        let tokenizer = Tokenizer::new(&config.text);
        let (records, text) = match config.data_path() {
            Some(dir) => {
                tracing::info!(path = %dir.display(), "opening durable store");
                let records = RecordStore::open(&dir, config.dimension, config.sync_writes)?;
                let text = TermIndex::open(&dir, tokenizer, config.sync_writes)?;
                (records, text)
            }
            None => (RecordStore::in_memory(config.dimension), TermIndex::in_memory(tokenizer)),
        };
        let vector = VectorIndex::new(records.dimension().or(config.dimension));
        Self::from_parts(records, text, vector, config.default_k)
    }

    pub fn in_memory() -> Self {
        Self {
            records: RecordStore::in_memory(None),
            text: TermIndex::in_memory(Tokenizer::default()),
            vector: VectorIndex::default(),
            write_lock: Mutex::new(()),
            default_k: DEFAULT_K,
        }
    }
}

impl<TI, VI> HybridStore<TI, VI> where TI: TermIndexer, VI: VectorIndexer {
    /// Wire the parts together and index every record the indexes are
    /// missing before the store is handed out.
    pub fn from_parts(records: RecordStore, text: TI, vector: VI, default_k: usize) -> Result<Self> {
        if default_k == 0 { return Err(Error::InvalidConfig("default_k must be at least 1".into())); }
        let store = Self { records, text, vector, write_lock: Mutex::new(()), default_k };
        store.drop_orphan_postings()?;
        let repaired = store.reindex()?;
        tracing::info!(documents = store.records.len(), repaired, "store ready");
        Ok(store)
    }

    pub fn store(&self, new: NewDocument) -> Result<DocId> {
        let _guard = self.write_lock.lock().map_err(|_| Error::poisoned("store writer"))?;
        let doc = self.records.insert(new)?;
        self.index_document(&doc)?;
        tracing::debug!(id = %doc.id, source = %doc.source, "stored document");
        Ok(doc.id)
    }

    /// Stores each document in turn. Validation failures are recorded and
    /// skipped; any other error aborts the batch (earlier items stay stored).
    pub fn store_batch<I>(&self, docs: I) -> Result<BatchReport>
    where
        I: IntoIterator<Item = NewDocument>,
    {
        let mut report = BatchReport::default();
        for (position, doc) in docs.into_iter().enumerate() {
            match self.store(doc) {
                Ok(id) => report.stored.push(id),
                Err(Error::Validation(reason)) => {
                    tracing::warn!(position, %reason, "rejected document");
                    report.rejected.push((position, reason));
                }
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }

    pub fn get(&self, id: DocId) -> Result<Arc<Document>> { self.records.get(id) }

    /// Every document matching `query`, best first. No match is `NotFound`.
    pub fn keyword_search(&self, query: &str) -> Result<Vec<Arc<Document>>> {
        let hits = self.text.search(query)?;
        if hits.is_empty() { return Err(Error::not_found(format!("no documents match {query:?}"))); }
        hits.iter().map(|h| self.hydrate(h.id)).collect()
    }

    pub fn keyword_search_top(&self, query: &str, limit: usize) -> Result<Vec<Arc<Document>>> {
        if limit == 0 { return Err(Error::validation("limit must be at least 1")); }
        let mut docs = self.keyword_search(query)?;
        docs.truncate(limit);
        Ok(docs)
    }

    /// Top `default_k` documents by cosine similarity to `query_vec`.
    pub fn semantic_search(&self, query_vec: &[f32]) -> Result<Vec<ScoredDocument>> {
        self.semantic_search_top(query_vec, self.default_k)
    }

    pub fn semantic_search_top(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredDocument>> {
        let hits = self.vector.search_vec(query_vec, k)?;
        if hits.is_empty() { return Err(Error::not_found("no documents to compare against")); }
        hits.iter()
            .map(|h| Ok(ScoredDocument { document: self.hydrate(h.id)?, similarity: h.score }))
            .collect()
    }

    /// Index every record missing from either index, in id order. Safe to
    /// call repeatedly; returns how many documents needed work.
    pub fn reindex(&self) -> Result<usize> {
        let _guard = self.write_lock.lock().map_err(|_| Error::poisoned("store writer"))?;
        let mut repaired = 0;
        for doc in self.records.documents()? {
            if self.text.contains(doc.id) && self.vector.contains(doc.id) { continue; }
            self.index_document(&doc)?;
            repaired += 1;
        }
        if repaired > 0 { tracing::info!(repaired, "reindexed documents"); }
        Ok(repaired)
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            documents: self.records.len(),
            dimension: self.records.dimension(),
            terms: self.text.term_count(),
            term_indexed: self.text.len(),
            vectors: self.vector.len(),
        }
    }

    pub fn len(&self) -> usize { self.records.len() }

    pub fn is_empty(&self) -> bool { self.records.is_empty() }

    pub fn default_k(&self) -> usize { self.default_k }

    /// Load an id an index returned. A miss means the index and the record
    /// store disagree, which is a storage fault rather than "no match".
    fn hydrate(&self, id: DocId) -> Result<Arc<Document>> {
        self.records.get(id).map_err(|e| match e {
            Error::NotFound(_) => {
                tracing::error!(%id, "indexed document missing from record store");
                Error::storage(format!("hydrate document {id}"), "indexed id has no record")
            }
            other => other,
        })
    }

    /// Term postings for ids the record store does not hold (its journal lost
    /// a tail the term journal kept) make keyword results unloadable and would
    /// shadow the next document given that id. Reserve those ids and rebuild.
    fn drop_orphan_postings(&self) -> Result<()> {
        let _guard = self.write_lock.lock().map_err(|_| Error::poisoned("store writer"))?;
        let known: HashSet<DocId> = self.records.ids()?.into_iter().collect();
        let orphans: Vec<DocId> = self.text.indexed_ids()?.into_iter().filter(|id| !known.contains(id)).collect();
        let Some(&highest) = orphans.last() else { return Ok(()) };
        tracing::warn!(orphans = orphans.len(), %highest, "term index holds ids with no record; rebuilding it");
        self.records.reserve_through(highest)?;
        self.text.clear()
    }

    // Caller holds `write_lock`. Both index calls are no-ops for ids already present.
    fn index_document(&self, doc: &Document) -> Result<()> {
        self.text.index(doc.id, &doc.content).map_err(|e| inconsistency(doc.id, IndexStage::Term, e))?;
        self.vector.index(doc.id, &doc.embedding).map_err(|e| inconsistency(doc.id, IndexStage::Vector, e))
    }
}

fn inconsistency(id: DocId, stage: IndexStage, source: Error) -> Error {
    tracing::error!(%id, %stage, error = %source, "index update failed after record commit");
    Error::IndexInconsistency { id, stage, source: Box::new(source) }
}
