mod client;

pub use client::{CloudEmbedder, Embedder, MockEmbedder};

/// Dimension of the catalog embedding space (vector(384) in the schema)
pub const EMBEDDING_DIM: usize = 384;
