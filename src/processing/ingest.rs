//! PDF ingestion: discover documents, extract text page by page, chunk, and index.
//!
//! Files that cannot be opened or parsed are skipped with a warning. A missing documents
//! directory is not an error either; the assistant then answers from the model-knowledge
//! fallback.

use crate::metrics::IngestMetrics;
use crate::processing::chunking::split_text;
use crate::vector::{DocumentChunk, DocumentIndex, IndexError};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// Errors raised while ingesting a single document.
#[derive(Debug, Error)]
pub enum IngestError {
    /// PDF could not be opened or decoded.
    #[error("failed to read PDF '{path}': {source}")]
    Pdf {
        /// File that failed to load.
        path: PathBuf,
        /// Error reported by the PDF parser.
        #[source]
        source: lopdf::Error,
    },
    /// PDF opened but yielded no text.
    #[error("no text extracted from '{0}'")]
    EmptyDocument(PathBuf),
    /// Extraction task panicked or was cancelled.
    #[error("extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    /// Chunks could not be written to the index.
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Outcome of a directory ingestion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Documents whose chunks were indexed.
    pub documents_indexed: usize,
    /// Chunks written across all documents.
    pub chunks_indexed: usize,
    /// Documents skipped because they failed to load or index.
    pub skipped: Vec<String>,
}

/// List `*.pdf` files directly inside `dir`, sorted by path.
pub fn discover_pdfs(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                tracing::warn!(error = %error, "Skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();
    files.sort();
    files
}

/// Extract text from every page of the PDF at `path`, in page order.
///
/// Pages that fail to decode are skipped; the document only fails when nothing is extracted.
pub fn extract_pdf_text(path: &Path) -> Result<String, IngestError> {
    let document = lopdf::Document::load(path).map_err(|source| IngestError::Pdf {
        path: path.to_path_buf(),
        source,
    })?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(text) => pages.push(text),
            Err(error) => {
                tracing::debug!(
                    path = %path.display(),
                    page = page_number,
                    error = %error,
                    "Skipping page without extractable text"
                );
            }
        }
    }

    let text = pages.join("\n");
    if text.trim().is_empty() {
        return Err(IngestError::EmptyDocument(path.to_path_buf()));
    }
    Ok(text)
}

/// Chunk a document's text into indexable records keyed `"{stem}_chunk_{i}"`.
pub fn chunk_document(
    stem: &str,
    document_name: &str,
    text: &str,
    chunk_size: usize,
) -> Vec<DocumentChunk> {
    split_text(text, chunk_size)
        .into_iter()
        .enumerate()
        .map(|(chunk_index, text)| DocumentChunk {
            id: DocumentChunk::chunk_id(stem, chunk_index),
            document: document_name.to_string(),
            chunk_index,
            text,
        })
        .collect()
}

async fn ingest_file(
    path: &Path,
    chunk_size: usize,
    index: &DocumentIndex,
) -> Result<usize, IngestError> {
    let owned = path.to_path_buf();
    let text = tokio::task::spawn_blocking(move || extract_pdf_text(&owned)).await??;

    let document_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(document_name);

    let chunks = chunk_document(stem, document_name, &text, chunk_size);
    let count = chunks.len();
    index.index(chunks).await?;
    Ok(count)
}

/// Index every PDF in `dir`, skipping documents that fail.
pub async fn ingest_directory(
    dir: &Path,
    chunk_size: usize,
    index: &DocumentIndex,
    metrics: &IngestMetrics,
) -> IngestReport {
    let mut report = IngestReport::default();
    if !index.is_ready() {
        tracing::warn!("Vector index unavailable; skipping document ingestion");
        return report;
    }
    if !dir.is_dir() {
        tracing::warn!(dir = %dir.display(), "Documents directory not found; nothing to index");
        return report;
    }

    for path in discover_pdfs(dir) {
        match ingest_file(&path, chunk_size, index).await {
            Ok(chunks) => {
                tracing::info!(path = %path.display(), chunks, "Document indexed");
                metrics.record_document(chunks as u64);
                report.documents_indexed += 1;
                report.chunks_indexed += chunks;
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), error = %error, "Skipping document");
                metrics.record_skipped();
                report.skipped.push(path.display().to_string());
            }
        }
    }

    report
}

/// Build the index from `dir` unless a populated collection already exists.
///
/// With `force`, the collection is cleared first so chunks of removed or shortened documents
/// do not survive the rebuild.
pub async fn prepare_index(
    dir: &Path,
    chunk_size: usize,
    force: bool,
    index: &DocumentIndex,
    metrics: &IngestMetrics,
) -> IngestReport {
    let existing = index.chunk_count().await;
    if existing > 0 && !force {
        tracing::info!(
            collection = index.collection(),
            chunks = existing,
            "Using persisted collection"
        );
        return IngestReport::default();
    }
    if force
        && index.is_ready()
        && let Err(error) = index.reset().await
    {
        tracing::warn!(error = %error, "Failed to clear collection before rebuild");
    }

    let report = ingest_directory(dir, chunk_size, index, metrics).await;
    tracing::info!(
        documents = report.documents_indexed,
        chunks = report.chunks_indexed,
        skipped = report.skipped.len(),
        "Document ingestion finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbeddingClient;
    use crate::vector::LocalVectorStore;
    use lopdf::content::{Content, Operation};
    use lopdf::{Document, Object, Stream, dictionary};
    use std::sync::Arc;

    /// Write a PDF with one text line per entry of `pages`.
    fn write_pdf(path: &Path, pages: &[&str]) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
            "Encoding" => "WinAnsiEncoding",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 12.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id = doc.add_object(Stream::new(
                dictionary! {},
                content.encode().expect("encode content"),
            ));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(Object::from(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).expect("save pdf");
    }

    async fn local_index(dimension: usize) -> DocumentIndex {
        DocumentIndex::new(
            Arc::new(HashingEmbeddingClient::new(dimension)),
            Arc::new(LocalVectorStore::in_memory()),
            "legal",
        )
        .await
        .expect("index")
    }

    #[test]
    fn chunk_document_assigns_stable_ids() {
        let chunks = chunk_document("cpc", "cpc.pdf", "one two three four five", 10);
        let ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["cpc_chunk_0", "cpc_chunk_1", "cpc_chunk_2"]);
        assert!(chunks.iter().all(|c| c.document == "cpc.pdf"));
        assert_eq!(chunks[2].chunk_index, 2);
    }

    #[test]
    fn discover_pdfs_filters_by_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("b.PDF"), b"x").unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"x").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();

        let names: Vec<String> = discover_pdfs(dir.path())
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.PDF"]);
    }

    #[test]
    fn corrupt_pdf_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"not really a pdf").unwrap();
        assert!(matches!(
            extract_pdf_text(&path),
            Err(IngestError::Pdf { .. })
        ));
    }

    #[tokio::test]
    async fn unreadable_documents_are_skipped() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("broken.pdf"), b"garbage").unwrap();

        let index = DocumentIndex::new(
            Arc::new(HashingEmbeddingClient::new(16)),
            Arc::new(LocalVectorStore::in_memory()),
            "legal",
        )
        .await
        .unwrap();
        let metrics = IngestMetrics::new();

        let report = ingest_directory(dir.path(), 100, &index, &metrics).await;
        assert_eq!(report.documents_indexed, 0);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(metrics.snapshot().documents_skipped, 1);
    }

    #[test]
    fn extracts_text_from_every_page_in_order() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("cpc.pdf");
        write_pdf(
            &path,
            &["Suits of civil nature", "Plaint shall contain facts"],
        );

        let text = extract_pdf_text(&path).expect("text");
        let first = text.find("Suits of civil nature").expect("first page");
        let second = text.find("Plaint shall contain facts").expect("second page");
        assert!(first < second);
    }

    #[tokio::test]
    async fn valid_pdfs_are_chunked_and_indexed() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_pdf(
            &dir.path().join("cpc.pdf"),
            &["Suits of civil nature", "Plaint shall contain facts"],
        );
        std::fs::write(dir.path().join("broken.pdf"), b"garbage").unwrap();

        let index = local_index(32).await;
        let metrics = IngestMetrics::new();
        let report = ingest_directory(dir.path(), 12, &index, &metrics).await;

        let expected = chunk_document(
            "cpc",
            "cpc.pdf",
            &extract_pdf_text(&dir.path().join("cpc.pdf")).expect("text"),
            12,
        );
        assert!(expected.len() > 1);
        assert_eq!(report.documents_indexed, 1);
        assert_eq!(report.chunks_indexed, expected.len());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(index.chunk_count().await, expected.len());

        let hits = index.search("Plaint shall contain facts", 50).await;
        let mut ids: Vec<String> = hits.into_iter().map(|hit| hit.chunk.id).collect();
        ids.sort();
        let mut expected_ids: Vec<String> = (0..expected.len())
            .map(|i| format!("cpc_chunk_{i}"))
            .collect();
        expected_ids.sort();
        assert_eq!(ids, expected_ids);
    }

    #[tokio::test]
    async fn forced_rebuild_drops_stale_chunks() {
        let dir = tempfile::tempdir().expect("tempdir");
        let index = local_index(32).await;
        index
            .index(chunk_document(
                "old",
                "old.pdf",
                "alpha beta gamma delta epsilon zeta",
                12,
            ))
            .await
            .expect("stale chunks");
        write_pdf(&dir.path().join("cpc.pdf"), &["alpha beta"]);

        let kept = prepare_index(dir.path(), 100, false, &index, &IngestMetrics::new()).await;
        assert_eq!(kept, IngestReport::default());

        let rebuilt = prepare_index(dir.path(), 100, true, &index, &IngestMetrics::new()).await;
        assert_eq!(rebuilt.documents_indexed, 1);
        assert_eq!(index.chunk_count().await, rebuilt.chunks_indexed);
        assert!(
            index
                .search("epsilon zeta", 10)
                .await
                .iter()
                .all(|hit| hit.chunk.id.starts_with("cpc_chunk_"))
        );
    }

    #[tokio::test]
    async fn missing_directory_yields_empty_report() {
        let index = DocumentIndex::new(
            Arc::new(HashingEmbeddingClient::new(16)),
            Arc::new(LocalVectorStore::in_memory()),
            "legal",
        )
        .await
        .unwrap();
        let report = ingest_directory(
            Path::new("/definitely/not/here"),
            100,
            &index,
            &IngestMetrics::new(),
        )
        .await;
        assert_eq!(report, IngestReport::default());
    }
}
