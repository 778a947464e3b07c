#![deny(missing_docs)]

//! Retrieval-augmented assistant that explains Indian legal documents in plain language.

/// Query and summary agents, prompt templates, and the model-output parser.
pub mod agents;
/// HTTP routing and REST handlers.
pub mod api;
/// Pipeline orchestration and service bootstrap.
pub mod assistant;
/// Environment-driven configuration management.
pub mod config;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Hosted language-model clients.
pub mod llm;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// PDF extraction, chunking, and startup indexing.
pub mod processing;
/// Qdrant vector store integration.
pub mod qdrant;
/// Vector index and local store.
pub mod vector;
/// Server-rendered question form.
pub mod web;
