use serde::Serialize;
use serde_json::Value;

use docstore_core::{Document, Metadata, ScoredDocument};

pub const RESULTS: &str = "Search results";
pub const NO_MATCH: &str = "No matching data found";

/// `{"message": ..., "data": ...}`, the shape every command prints.
#[derive(Serialize)]
pub struct Envelope<T: Serialize> {
    pub message: &'static str,
    pub data: T,
}

/// A document as shown to operators: everything but the embedding.
#[derive(Serialize)]
pub struct DocumentView<'a> {
    pub id: String,
    pub content: &'a str,
    pub source: &'a str,
    pub metadata: &'a Metadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
}

impl<'a> DocumentView<'a> {
    pub fn from_document(doc: &'a Document) -> Self {
        Self { id: doc.id.to_string(), content: &doc.content, source: doc.source.as_str(), metadata: &doc.metadata, similarity: None }
    }

    pub fn from_scored(scored: &'a ScoredDocument) -> Self {
        Self { similarity: Some(scored.similarity), ..Self::from_document(&scored.document) }
    }
}

pub fn render<T: Serialize>(message: &'static str, data: T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&Envelope { message, data })?)
}

pub fn no_match() -> anyhow::Result<String> { render(NO_MATCH, Value::Array(Vec::new())) }
