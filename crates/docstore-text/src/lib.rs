//! docstore-text
//!
//! Positional inverted index with a small boolean query language. See
//! `examples/search.rs` for ad-hoc querying of a directory of records.
pub mod tokenizer;
pub mod query;
pub mod index;

pub use index::TermIndex;
pub use tokenizer::Tokenizer;
