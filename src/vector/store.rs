//! Backend-neutral storage trait.

use super::types::{ScoredChunk, StoredPoint, VectorStoreError};
use async_trait::async_trait;

/// Storage backend for chunk embeddings with nearest-neighbour search.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Short backend label used in logs and health output.
    fn backend(&self) -> &'static str;

    /// Create the collection if it is missing. Existing collections are left untouched, but
    /// must have been created with the same `dimension`.
    async fn ensure_collection(
        &self,
        collection: &str,
        dimension: usize,
    ) -> Result<(), VectorStoreError>;

    /// Drop every point in the collection and recreate it empty with `dimension`.
    async fn reset_collection(
        &self,
        collection: &str,
        dimension: usize,
    ) -> Result<(), VectorStoreError>;

    /// Number of points in the collection, or `None` when it does not exist.
    async fn collection_len(&self, collection: &str) -> Result<Option<usize>, VectorStoreError>;

    /// Insert or overwrite points keyed by chunk id. Returns the number of points written.
    async fn upsert(
        &self,
        collection: &str,
        points: Vec<StoredPoint>,
    ) -> Result<usize, VectorStoreError>;

    /// Return up to `limit` chunks ordered by ascending distance to `vector`.
    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, VectorStoreError>;
}
