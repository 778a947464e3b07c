//! In-process vector store using cosine similarity, optionally persisted to disk.
//!
//! Each collection is kept as a map of chunk id to [`StoredPoint`] behind a
//! `tokio::sync::RwLock`. When opened with a directory, every write rewrites
//! `<dir>/<collection>.json` (through a temporary file and a rename) and `open` reloads any
//! collections found there.

use super::store::VectorStore;
use super::types::{ScoredChunk, StoredPoint, VectorStoreError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;

#[derive(Debug, Default, Serialize, Deserialize)]
struct Collection {
    dimension: usize,
    points: HashMap<String, StoredPoint>,
}

/// Cosine-similarity store held in memory.
#[derive(Debug, Default)]
pub struct LocalVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
    directory: Option<PathBuf>,
}

impl LocalVectorStore {
    /// Create a store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a persistent store rooted at `directory`, loading existing collections.
    pub async fn open(directory: impl Into<PathBuf>) -> Result<Self, VectorStoreError> {
        let directory = directory.into();
        tokio::fs::create_dir_all(&directory).await?;

        let mut collections = HashMap::new();
        let mut entries = tokio::fs::read_dir(&directory).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let bytes = tokio::fs::read(&path).await?;
            match serde_json::from_slice::<Collection>(&bytes) {
                Ok(collection) => {
                    tracing::debug!(
                        collection = name,
                        points = collection.points.len(),
                        "Loaded persisted collection"
                    );
                    collections.insert(name.to_string(), collection);
                }
                Err(error) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %error,
                        "Ignoring unreadable persisted collection"
                    );
                }
            }
        }

        Ok(Self {
            collections: RwLock::new(collections),
            directory: Some(directory),
        })
    }

    async fn persist(&self, name: &str, collection: &Collection) -> Result<(), VectorStoreError> {
        let Some(directory) = &self.directory else {
            return Ok(());
        };
        let target = collection_path(directory, name);
        let staging = target.with_extension("json.tmp");
        let bytes = serde_json::to_vec(collection)?;
        tokio::fs::write(&staging, bytes).await?;
        tokio::fs::rename(&staging, &target).await?;
        tracing::trace!(path = %target.display(), "Persisted collection");
        Ok(())
    }
}

fn collection_path(directory: &Path, name: &str) -> PathBuf {
    directory.join(format!("{name}.json"))
}

/// Cosine similarity of two vectors; `0.0` when either has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for LocalVectorStore {
    fn backend(&self) -> &'static str {
        "local"
    }

    async fn ensure_collection(
        &self,
        collection: &str,
        dimension: usize,
    ) -> Result<(), VectorStoreError> {
        let mut collections = self.collections.write().await;
        let existing = collections
            .entry(collection.to_string())
            .or_insert_with(|| Collection {
                dimension,
                points: HashMap::new(),
            });
        if existing.dimension != dimension {
            return Err(VectorStoreError::DimensionMismatch {
                expected: existing.dimension,
                actual: dimension,
            });
        }
        Ok(())
    }

    async fn reset_collection(
        &self,
        collection: &str,
        dimension: usize,
    ) -> Result<(), VectorStoreError> {
        let mut collections = self.collections.write().await;
        let fresh = Collection {
            dimension,
            points: HashMap::new(),
        };
        self.persist(collection, &fresh).await?;
        let dropped = collections
            .insert(collection.to_string(), fresh)
            .map_or(0, |old| old.points.len());
        tracing::debug!(collection, dropped, "Collection reset");
        Ok(())
    }

    async fn collection_len(&self, collection: &str) -> Result<Option<usize>, VectorStoreError> {
        let collections = self.collections.read().await;
        Ok(collections.get(collection).map(|c| c.points.len()))
    }

    async fn upsert(
        &self,
        collection: &str,
        points: Vec<StoredPoint>,
    ) -> Result<usize, VectorStoreError> {
        let mut collections = self.collections.write().await;
        let store = collections
            .get_mut(collection)
            .ok_or_else(|| VectorStoreError::MissingCollection(collection.to_string()))?;

        if let Some(point) = points.iter().find(|p| p.vector.len() != store.dimension) {
            return Err(VectorStoreError::DimensionMismatch {
                expected: store.dimension,
                actual: point.vector.len(),
            });
        }

        let written = points.len();
        for point in points {
            store.points.insert(point.chunk.id.clone(), point);
        }

        self.persist(collection, store).await?;
        Ok(written)
    }

    async fn search(
        &self,
        collection: &str,
        vector: &[f32],
        limit: usize,
    ) -> Result<Vec<ScoredChunk>, VectorStoreError> {
        let collections = self.collections.read().await;
        let store = collections
            .get(collection)
            .ok_or_else(|| VectorStoreError::MissingCollection(collection.to_string()))?;
        if vector.len() != store.dimension {
            return Err(VectorStoreError::DimensionMismatch {
                expected: store.dimension,
                actual: vector.len(),
            });
        }

        let mut scored: Vec<ScoredChunk> = store
            .points
            .values()
            .map(|point| ScoredChunk {
                chunk: point.chunk.clone(),
                distance: 1.0 - cosine_similarity(&point.vector, vector),
            })
            .collect();

        scored.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk.id.cmp(&b.chunk.id))
        });
        scored.truncate(limit);
        Ok(scored)
    }
}
