//! Helpers for constructing, hashing, and reading Qdrant payloads.

use crate::vector::DocumentChunk;
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

/// Build the payload object stored alongside each indexed chunk.
pub(crate) fn build_payload(chunk: &DocumentChunk, indexed_at: &str) -> Value {
    json!({
        "chunk_id": chunk.id,
        "document": chunk.document,
        "chunk_index": chunk.chunk_index,
        "text": chunk.text,
        "chunk_hash": compute_chunk_hash(&chunk.text),
        "indexed_at": indexed_at,
    })
}

/// Rebuild a chunk from a stored payload; `None` when required fields are missing.
pub(crate) fn chunk_from_payload(payload: &Map<String, Value>) -> Option<DocumentChunk> {
    let id = payload.get("chunk_id")?.as_str()?.to_string();
    let text = payload.get("text")?.as_str()?.to_string();
    let document = payload
        .get("document")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let chunk_index = payload
        .get("chunk_index")
        .and_then(Value::as_u64)
        .unwrap_or_default() as usize;
    Some(DocumentChunk {
        id,
        document,
        chunk_index,
        text,
    })
}

/// Derive the Qdrant point id for a chunk id.
///
/// Qdrant only accepts integers and UUIDs, so chunk ids are mapped through UUIDv5. The mapping
/// is stable, which makes re-indexing the same chunk an overwrite.
pub fn point_id(chunk_id: &str) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, chunk_id.as_bytes()).to_string()
}

/// Compute a deterministic SHA-256 hash for the chunk text.
pub fn compute_chunk_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}

/// Current timestamp formatted for payload storage.
pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
