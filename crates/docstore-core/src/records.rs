//! Record store: the durable source of truth for documents.
//!
//! Published documents are immutable `Arc<Document>`s behind an `RwLock`
//! map, so reads never wait on the journal. Validation, id allocation, the
//! journal append and publication all happen under one writer mutex, which
//! makes id assignment atomic and keeps a failed write from leaving anything
//! behind.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock, PoisonError, RwLock};

use crate::error::{Error, Result};
use crate::journal::Journal;
use crate::types::{DocId, Document, NewDocument};

pub const RECORDS_FILE: &str = "records.log";

struct Writer {
    next_id: DocId,
    journal: Option<Journal<Document>>,
}

pub struct RecordStore {
    docs: RwLock<BTreeMap<DocId, Arc<Document>>>,
    writer: Mutex<Writer>,
    dim: OnceLock<usize>,
}

impl RecordStore {
    /// A store that lives only as long as the process.
    pub fn in_memory(dimension: Option<usize>) -> Self {
        let dim = OnceLock::new();
        if let Some(d) = dimension { let _ = dim.set(d); }
        Self {
            docs: RwLock::new(BTreeMap::new()),
            writer: Mutex::new(Writer { next_id: DocId::FIRST, journal: None }),
            dim,
        }
    }

    /// Open (or create) `records.log` under `dir` and load every document.
    pub fn open(dir: &Path, dimension: Option<usize>, sync: bool) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|e| Error::storage(format!("create {}", dir.display()), e))?;
        let (journal, persisted) = Journal::<Document>::open(&dir.join(RECORDS_FILE), sync)?;

        let store = Self::in_memory(dimension);
        let mut next_id = DocId::FIRST;
        {
            let mut docs = store.docs.write().map_err(|_| Error::poisoned("record store"))?;
            for doc in persisted {
                let len = doc.embedding.len();
                let expected = *store.dim.get_or_init(|| len);
                if len != expected {
                    return Err(match dimension {
                        Some(configured) => Error::InvalidConfig(format!(
                            "configured dimension {configured} disagrees with persisted document {} of dimension {len}",
                            doc.id
                        )),
                        None => Error::storage(
                            format!("load {}", journal.path().display()),
                            format!("document {} has dimension {len}, store dimension is {expected}", doc.id),
                        ),
                    });
                }
                if doc.id >= next_id { next_id = doc.id.next(); }
                let id = doc.id;
                if docs.insert(id, Arc::new(doc)).is_some() {
                    return Err(Error::storage(
                        format!("load {}", journal.path().display()),
                        format!("duplicate document id {id}"),
                    ));
                }
            }
        }
        {
            let mut writer = store.writer.lock().map_err(|_| Error::poisoned("record store"))?;
            writer.next_id = next_id;
            writer.journal = Some(journal);
        }
        tracing::info!(path = %dir.display(), documents = store.len(), dimension = ?store.dimension(), "record store opened");
        Ok(store)
    }

    /// Validate, assign an id, persist, then publish.
    pub fn insert(&self, new: NewDocument) -> Result<Arc<Document>> {
        let mut writer = self.writer.lock().map_err(|_| Error::poisoned("record store"))?;
        self.validate(&new)?;

        let doc = Document::from_new(writer.next_id, new);
        if let Some(journal) = writer.journal.as_mut() {
            journal.append(&doc)?;
        }
        writer.next_id = doc.id.next();
        let _ = self.dim.set(doc.embedding.len());

        let doc = Arc::new(doc);
        self.docs.write().map_err(|_| Error::poisoned("record store"))?.insert(doc.id, Arc::clone(&doc));
        Ok(doc)
    }

    /// Never hand out `id` or anything below it. Used when another journal
    /// has seen ids this store lost.
    pub fn reserve_through(&self, id: DocId) -> Result<()> {
        let mut writer = self.writer.lock().map_err(|_| Error::poisoned("record store"))?;
        if writer.next_id <= id {
            tracing::warn!(%id, "skipping ids already used before the record journal lost its tail");
            writer.next_id = id.next();
        }
        Ok(())
    }

    pub fn get(&self, id: DocId) -> Result<Arc<Document>> {
        self.docs
            .read()
            .map_err(|_| Error::poisoned("record store"))?
            .get(&id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("document {id}")))
    }

    /// Every document in ascending id order.
    pub fn documents(&self) -> Result<Vec<Arc<Document>>> {
        Ok(self.docs.read().map_err(|_| Error::poisoned("record store"))?.values().cloned().collect())
    }

    pub fn ids(&self) -> Result<Vec<DocId>> {
        Ok(self.docs.read().map_err(|_| Error::poisoned("record store"))?.keys().copied().collect())
    }

    /// Reads through a poisoned lock: published documents are never mutated,
    /// so the map is complete even if a writer panicked.
    pub fn len(&self) -> usize { self.docs.read().unwrap_or_else(PoisonError::into_inner).len() }

    pub fn is_empty(&self) -> bool { self.len() == 0 }

    pub fn dimension(&self) -> Option<usize> { self.dim.get().copied() }

    /// Checks a write request against the store invariants without touching state.
    pub fn validate(&self, new: &NewDocument) -> Result<()> {
        if new.source.as_str().trim().is_empty() {
            return Err(Error::validation("source must not be empty"));
        }
        validate_embedding(&new.embedding, self.dimension())
    }
}

/// Shared embedding checks for stored documents and queries.
pub fn validate_embedding(embedding: &[f32], dimension: Option<usize>) -> Result<()> {
    if embedding.is_empty() {
        return Err(Error::validation("embedding must not be empty"));
    }
    if let Some(pos) = embedding.iter().position(|x| !x.is_finite()) {
        return Err(Error::validation(format!("embedding component {pos} is not finite")));
    }
    match dimension {
        Some(expected) if expected != embedding.len() => Err(Error::dimension_mismatch(expected, embedding.len())),
        _ => Ok(()),
    }
}
