//! Document processing pipeline: PDF extraction, chunking, and index preparation.

pub mod chunking;
pub mod ingest;

pub use chunking::split_text;
pub use ingest::{
    IngestError, IngestReport, chunk_document, discover_pdfs, extract_pdf_text, ingest_directory,
    prepare_index,
};
