//! Chunk records and errors shared by the vector store backends.

use crate::embedding::EmbeddingClientError;
use crate::qdrant::QdrantError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A slice of an ingested document, immutable once indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentChunk {
    /// Stable identifier, `"{file_stem}_chunk_{index}"` for PDF ingestion.
    pub id: String,
    /// Name of the source document.
    pub document: String,
    /// Position of the chunk within its document.
    pub chunk_index: usize,
    /// Raw chunk text.
    pub text: String,
}

impl DocumentChunk {
    /// Build the chunk id used for the `index`-th chunk of `document_stem`.
    pub fn chunk_id(document_stem: &str, index: usize) -> String {
        format!("{document_stem}_chunk_{index}")
    }
}

/// A chunk returned from a similarity search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    /// The matching chunk and its metadata.
    pub chunk: DocumentChunk,
    /// Cosine distance from the query (`1 - similarity`); smaller is closer.
    pub distance: f32,
}

/// Chunk paired with its embedding, as persisted by a store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPoint {
    /// Chunk metadata and text.
    pub chunk: DocumentChunk,
    /// Embedding vector for the chunk text.
    pub vector: Vec<f32>,
}

/// Counters describing how an indexing request was applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexSummary {
    /// Chunks written to the store (inserted or overwritten).
    pub upserted: usize,
    /// Entries in the collection after the write.
    pub total: usize,
}

/// Errors raised by vector store backends.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    /// Reading or writing the persisted collection failed.
    #[error("Vector store I/O failed: {0}")]
    Io(#[from] std::io::Error),
    /// Persisted collection could not be encoded or decoded.
    #[error("Vector store serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    /// Remote Qdrant request failed.
    #[error("Qdrant request failed: {0}")]
    Qdrant(#[from] QdrantError),
    /// Operation referenced a collection that has not been created.
    #[error("Collection '{0}' does not exist")]
    MissingCollection(String),
    /// Vector length differs from the collection dimension.
    #[error("Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the collection was created with.
        expected: usize,
        /// Dimension of the offending vector.
        actual: usize,
    },
}

/// Errors raised while indexing chunks through [`super::DocumentIndex`].
#[derive(Debug, Error)]
pub enum IndexError {
    /// The backing store failed to open, so nothing can be written.
    #[error("Vector index is unavailable")]
    Unavailable,
    /// Embedding provider failed.
    #[error(transparent)]
    Embedding(#[from] EmbeddingClientError),
    /// Store rejected the write.
    #[error(transparent)]
    Store(#[from] VectorStoreError),
}
