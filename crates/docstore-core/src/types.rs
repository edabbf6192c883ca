//! Domain types shared by the record store, the term and vector indexes and
//! the coordinator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Opaque metadata attached to a document. Passed through untouched.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Stable document identifier assigned by the record store.
///
/// Ids are allocated from a monotonically increasing counter starting at 1
/// and are never reused, so ascending id order is also insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(u64);

impl DocId {
    pub const FIRST: DocId = DocId(1);

    pub fn new(raw: u64) -> Self { Self(raw) }

    pub fn as_u64(self) -> u64 { self.0 }

    pub fn next(self) -> Self { Self(self.0 + 1) }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl FromStr for DocId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { s.trim().parse::<u64>().map(DocId) }
}

/// Where a document came from.
///
/// `pdf` and `web` are the tags produced by the extraction collaborators;
/// anything else is kept verbatim. Equality and hashing go by the tag, so
/// `Other("pdf")` and `Pdf` are the same source.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Source {
    Pdf,
    Web,
    Other(String),
}

impl Source {
    pub fn as_str(&self) -> &str {
        match self {
            Source::Pdf => "pdf",
            Source::Web => "web",
            Source::Other(tag) => tag,
        }
    }
}

impl PartialEq for Source {
    fn eq(&self, other: &Self) -> bool { self.as_str() == other.as_str() }
}

impl Eq for Source {}

impl std::hash::Hash for Source {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) { std::hash::Hash::hash(self.as_str(), state) }
}

impl From<String> for Source {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "pdf" => Source::Pdf,
            "web" => Source::Web,
            _ => Source::Other(tag),
        }
    }
}

impl From<&str> for Source {
    fn from(tag: &str) -> Self { Source::from(tag.to_string()) }
}

impl From<Source> for String {
    fn from(source: Source) -> Self {
        match source {
            Source::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// A write request: everything the caller supplies, before an id exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    pub content: String,
    pub source: Source,
    #[serde(default)]
    pub metadata: Metadata,
    pub embedding: Vec<f32>,
}

impl NewDocument {
    pub fn new(content: impl Into<String>, source: impl Into<Source>, embedding: Vec<f32>) -> Self {
        Self { content: content.into(), source: source.into(), metadata: Metadata::new(), embedding }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A stored document.
///
/// - `id`: assigned at insert, immutable
/// - `content`: the extracted text that feeds the term index
/// - `source`/`metadata`: opaque passthrough values
/// - `embedding`: pre-computed vector of the store's fixed dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub content: String,
    pub source: Source,
    #[serde(default)]
    pub metadata: Metadata,
    pub embedding: Vec<f32>,
}

impl Document {
    pub fn from_new(id: DocId, new: NewDocument) -> Self {
        Self { id, content: new.content, source: new.source, metadata: new.metadata, embedding: new.embedding }
    }
}

/// Indicates which index produced a hit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SourceKind {
    Vector,
    Text,
}

/// The minimal surface returned by both indexes.
///
/// `score` is index-specific (term frequency sum for text, cosine similarity
/// for vectors) but higher is always better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: DocId,
    pub score: f32,
    pub source: SourceKind,
}

/// A hydrated semantic search result.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredDocument {
    pub document: Arc<Document>,
    pub similarity: f32,
}

/// Which index a coordinator write stage refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexStage {
    Term,
    Vector,
}

impl fmt::Display for IndexStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexStage::Term => f.write_str("term"),
            IndexStage::Vector => f.write_str("vector"),
        }
    }
}
