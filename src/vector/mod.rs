//! Vector index adapter: embeds chunks, writes them to a store, and answers similarity queries.

pub mod local;
pub mod store;
pub mod types;

pub use local::LocalVectorStore;
pub use store::VectorStore;
pub use types::{
    DocumentChunk, IndexError, IndexSummary, ScoredChunk, StoredPoint, VectorStoreError,
};

use crate::config::{Config, VectorStoreKind};
use crate::embedding::EmbeddingClient;
use crate::qdrant::QdrantService;
use async_trait::async_trait;
use std::sync::Arc;

/// Nearest-neighbour lookup used by the query agent.
///
/// Implementations never fail: an unavailable index yields no matches.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `limit` chunks closest to `query`.
    async fn search(&self, query: &str, limit: usize) -> Vec<ScoredChunk>;
}

/// Pairs an embedding client with an optional vector store.
///
/// The store is `None` when it failed to open at startup; every read then returns no matches
/// and every write reports [`IndexError::Unavailable`].
pub struct DocumentIndex {
    embedder: Arc<dyn EmbeddingClient>,
    store: Option<Arc<dyn VectorStore>>,
    collection: String,
}

impl DocumentIndex {
    /// Wrap an opened store, creating the collection when it is missing.
    pub async fn new(
        embedder: Arc<dyn EmbeddingClient>,
        store: Arc<dyn VectorStore>,
        collection: impl Into<String>,
    ) -> Result<Self, VectorStoreError> {
        let collection = collection.into();
        store
            .ensure_collection(&collection, embedder.dimension())
            .await?;
        tracing::debug!(
            backend = store.backend(),
            collection = %collection,
            "Vector collection ready"
        );
        Ok(Self {
            embedder,
            store: Some(store),
            collection,
        })
    }

    /// An index whose backing store could not be opened.
    pub fn unavailable(embedder: Arc<dyn EmbeddingClient>, collection: impl Into<String>) -> Self {
        Self {
            embedder,
            store: None,
            collection: collection.into(),
        }
    }

    /// Open the store selected by configuration, degrading to [`DocumentIndex::unavailable`]
    /// when the backend cannot be reached.
    pub async fn from_config(config: &Config, embedder: Arc<dyn EmbeddingClient>) -> Self {
        let store: Result<Arc<dyn VectorStore>, VectorStoreError> = match config.vector_store {
            VectorStoreKind::Local => LocalVectorStore::open(&config.vector_store_path)
                .await
                .map(|store| Arc::new(store) as Arc<dyn VectorStore>),
            VectorStoreKind::Qdrant => QdrantService::new(
                config.qdrant_url.as_deref().unwrap_or_default(),
                config.qdrant_api_key.clone(),
            )
            .map(|store| Arc::new(store) as Arc<dyn VectorStore>)
            .map_err(VectorStoreError::from),
        };

        let opened = match store {
            Ok(store) => Self::new(embedder.clone(), store, &config.collection_name).await,
            Err(error) => Err(error),
        };

        opened.unwrap_or_else(|error| {
            tracing::warn!(
                backend = ?config.vector_store,
                error = %error,
                "Vector store unavailable; queries will use the model-knowledge fallback"
            );
            Self::unavailable(embedder, &config.collection_name)
        })
    }

    /// Whether a backing store is attached.
    pub fn is_ready(&self) -> bool {
        self.store.is_some()
    }

    /// Name of the collection holding the chunks.
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Number of chunks currently indexed; `0` when unavailable or on lookup failure.
    pub async fn chunk_count(&self) -> usize {
        let Some(store) = &self.store else {
            return 0;
        };
        match store.collection_len(&self.collection).await {
            Ok(len) => len.unwrap_or(0),
            Err(error) => {
                tracing::warn!(error = %error, "Failed to count indexed chunks");
                0
            }
        }
    }

    /// Remove every indexed chunk, leaving an empty collection.
    pub async fn reset(&self) -> Result<(), IndexError> {
        let store = self.store.as_ref().ok_or(IndexError::Unavailable)?;
        store
            .reset_collection(&self.collection, self.embedder.dimension())
            .await?;
        tracing::info!(collection = %self.collection, "Vector collection cleared");
        Ok(())
    }

    /// Embed and upsert `chunks`. Chunk ids are the keys, so repeated ids overwrite.
    pub async fn index(&self, chunks: Vec<DocumentChunk>) -> Result<IndexSummary, IndexError> {
        let store = self.store.as_ref().ok_or(IndexError::Unavailable)?;
        if chunks.is_empty() {
            return Ok(IndexSummary {
                upserted: 0,
                total: self.chunk_count().await,
            });
        }

        let texts = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = self.embedder.generate_embeddings(texts).await?;
        debug_assert_eq!(chunks.len(), vectors.len());

        let points = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| StoredPoint { chunk, vector })
            .collect();
        let upserted = store.upsert(&self.collection, points).await?;
        let total = store
            .collection_len(&self.collection)
            .await?
            .unwrap_or(upserted);

        tracing::debug!(collection = %self.collection, upserted, total, "Chunks indexed");
        Ok(IndexSummary { upserted, total })
    }

    /// Find the `limit` nearest chunks to `query`, returning an empty vector on any failure.
    pub async fn search(&self, query: &str, limit: usize) -> Vec<ScoredChunk> {
        let Some(store) = &self.store else {
            tracing::debug!("Vector index unavailable; returning no matches");
            return Vec::new();
        };
        if query.trim().is_empty() || limit == 0 {
            return Vec::new();
        }

        let vector = match self.embedder.generate_embeddings(vec![query.to_string()]).await {
            Ok(mut vectors) => match vectors.pop() {
                Some(vector) => vector,
                None => return Vec::new(),
            },
            Err(error) => {
                tracing::warn!(error = %error, "Failed to embed query");
                return Vec::new();
            }
        };

        match store.search(&self.collection, &vector, limit).await {
            Ok(hits) => {
                tracing::debug!(hits = hits.len(), limit, "Vector search completed");
                hits
            }
            Err(error) => {
                tracing::warn!(error = %error, "Vector search failed");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl Retriever for DocumentIndex {
    async fn search(&self, query: &str, limit: usize) -> Vec<ScoredChunk> {
        DocumentIndex::search(self, query, limit).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbeddingClient;

    fn chunk(id: &str, text: &str) -> DocumentChunk {
        DocumentChunk {
            id: id.into(),
            document: "cpc.pdf".into(),
            chunk_index: 0,
            text: text.into(),
        }
    }

    async fn index() -> DocumentIndex {
        DocumentIndex::new(
            Arc::new(HashingEmbeddingClient::new(128)),
            Arc::new(LocalVectorStore::in_memory()),
            "legal",
        )
        .await
        .expect("index")
    }

    #[tokio::test]
    async fn reindexing_same_ids_does_not_duplicate_hits() {
        let index = index().await;
        let chunks = vec![
            chunk("cpc_chunk_0", "A plaint must be filed in the civil court"),
            chunk("cpc_chunk_1", "The defendant files a written statement"),
        ];

        index.index(chunks.clone()).await.expect("first pass");
        let summary = index.index(chunks).await.expect("second pass");
        assert_eq!(summary.total, 2);

        let hits = index.search("plaint civil court", 10).await;
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.id, "cpc_chunk_0");
    }

    #[tokio::test]
    async fn unavailable_index_returns_no_matches() {
        let index = DocumentIndex::unavailable(Arc::new(HashingEmbeddingClient::new(8)), "legal");
        assert!(!index.is_ready());
        assert!(index.search("anything", 3).await.is_empty());
        assert_eq!(index.chunk_count().await, 0);
        assert!(matches!(
            index.index(vec![chunk("a", "b")]).await,
            Err(IndexError::Unavailable)
        ));
    }

    #[tokio::test]
    async fn reset_removes_previous_chunks() {
        let index = index().await;
        index
            .index(vec![
                chunk("cpc_chunk_0", "alpha beta"),
                chunk("cpc_chunk_1", "gamma delta"),
                chunk("cpc_chunk_2", "epsilon zeta"),
            ])
            .await
            .expect("first pass");

        index.reset().await.expect("reset");
        assert_eq!(index.chunk_count().await, 0);

        index
            .index(vec![chunk("cpc_chunk_0", "alpha beta")])
            .await
            .expect("second pass");
        assert_eq!(index.chunk_count().await, 1);
        let ids: Vec<String> = index
            .search("epsilon zeta", 10)
            .await
            .into_iter()
            .map(|hit| hit.chunk.id)
            .collect();
        assert_eq!(ids, vec!["cpc_chunk_0"]);
    }

    #[tokio::test]
    async fn store_with_other_dimension_is_rejected() {
        let store: Arc<dyn VectorStore> = Arc::new(LocalVectorStore::in_memory());
        store.ensure_collection("legal", 64).await.expect("collection");

        let opened =
            DocumentIndex::new(Arc::new(HashingEmbeddingClient::new(128)), store, "legal").await;
        assert!(matches!(
            opened,
            Err(VectorStoreError::DimensionMismatch { expected: 64, actual: 128 })
        ));
    }

    #[tokio::test]
    async fn empty_collection_yields_empty_search() {
        let index = index().await;
        assert!(index.search("limitation period", 3).await.is_empty());
    }
}
