use thiserror::Error;

use crate::types::{DocId, IndexStage};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage fault: {context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The record was committed but an index update failed afterwards. The
    /// document stays in the record store; `reindex` repairs the indexes.
    #[error("Index inconsistency: document {id} persisted but {stage} index update failed: {source}")]
    IndexInconsistency {
        id: DocId,
        stage: IndexStage,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self { Self::Validation(msg.into()) }

    pub fn not_found(msg: impl Into<String>) -> Self { Self::NotFound(msg.into()) }

    pub fn storage<E>(context: impl Into<String>, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Storage { context: context.into(), source: source.into() }
    }

    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::Validation(format!("embedding dimension mismatch: expected {expected}, got {actual}"))
    }

    pub fn poisoned(what: &str) -> Self {
        Self::storage(format!("{what} lock poisoned"), "a writer panicked while holding the lock")
    }

    pub fn is_not_found(&self) -> bool { matches!(self, Self::NotFound(_)) }

    pub fn is_validation(&self) -> bool { matches!(self, Self::Validation(_)) }
}

pub type Result<T> = std::result::Result<T, Error>;
