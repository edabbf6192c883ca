//! docstore-vector
//!
//! Exact (brute-force) cosine nearest-neighbour index kept in memory and
//! rebuilt from the record store at startup.
pub mod similarity;
pub mod index;

pub use index::VectorIndex;
