//! docstore-core
//!
//! Shared domain types, the error taxonomy, indexer traits, configuration,
//! and the durable record store every other crate hangs off.
#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod config;
pub mod error;
pub mod ingest;
pub mod journal;
pub mod records;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use records::RecordStore;
pub use types::{DocId, Document, Metadata, NewDocument, ScoredDocument, SearchHit, Source, SourceKind};
