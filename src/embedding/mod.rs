//! Embedding generation and vector search
//!
//! - `EmbeddingProvider` trait abstracting the sentence-embedding backend
//! - `FastEmbedProvider` for local embedding (all-MiniLM-L6-v2, 384-dim)
//! - `VectorIndex` for exact nearest-neighbor search with binary persistence

mod provider;
mod vector_index;

pub use provider::{EmbeddingError, EmbeddingProvider, FastEmbedProvider};
pub use vector_index::{IndexError, Neighbor, VectorIndex};
