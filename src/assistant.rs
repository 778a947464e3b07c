//! Request orchestration and service bootstrap.
//!
//! [`LegalAssistant`] chains the query agent into the summary agent. [`LegalAssistant::start`]
//! wires the production collaborators from [`Config`]: embedding client, vector index, startup
//! ingestion, and the Gemini client.

use crate::agents::{AgentError, QueryAgent, StructuredAnswer, SummaryAgent};
use crate::config::Config;
use crate::embedding::{EmbeddingClient, EmbeddingClientError, get_embedding_client};
use crate::llm::{GeminiClient, LanguageModel, LlmError};
use crate::metrics::{IngestMetrics, MetricsSnapshot};
use crate::processing::prepare_index;
use crate::vector::DocumentIndex;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Failures that prevent the service from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    /// The embedding client could not be built.
    #[error(transparent)]
    Embedding(#[from] EmbeddingClientError),
    /// The language model client could not be built.
    #[error(transparent)]
    Llm(#[from] LlmError),
}

/// Index status reported by the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexHealth {
    /// Whether the vector store opened successfully.
    pub ready: bool,
    /// Chunks currently stored in the collection.
    pub chunks: usize,
}

/// Health information for the HTTP surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Vector index state.
    pub index: IndexHealth,
    /// Language model identifier.
    pub model: String,
    /// Ingestion counters since startup.
    pub ingestion: MetricsSnapshot,
}

/// Operations the HTTP layer needs from the assistant.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Answer a question end to end.
    async fn answer(&self, query: &str) -> Result<StructuredAnswer, AgentError>;

    /// Report index and model status.
    async fn health(&self) -> HealthReport;
}

/// Two-stage pipeline: query agent, then summary agent.
pub struct LegalAssistant {
    query_agent: QueryAgent,
    summary_agent: SummaryAgent,
    model: String,
    index: Option<Arc<DocumentIndex>>,
    metrics: Arc<IngestMetrics>,
}

impl LegalAssistant {
    /// Assemble an assistant from already-built agents.
    pub fn new(query_agent: QueryAgent, summary_agent: SummaryAgent) -> Self {
        Self {
            query_agent,
            summary_agent,
            model: String::from("unknown"),
            index: None,
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    /// Attach the model name and index used for health reporting.
    pub fn with_status(
        mut self,
        model: impl Into<String>,
        index: Arc<DocumentIndex>,
        metrics: Arc<IngestMetrics>,
    ) -> Self {
        self.model = model.into();
        self.index = Some(index);
        self.metrics = metrics;
        self
    }

    /// Build every collaborator from `config` and index the document directory if needed.
    pub async fn start(config: &Config) -> Result<Self, StartupError> {
        tracing::info!(provider = ?config.embedding_provider, "Initializing embedding client");
        let embedder: Arc<dyn EmbeddingClient> = Arc::from(get_embedding_client(config)?);

        let index = Arc::new(DocumentIndex::from_config(config, embedder).await);
        let metrics = Arc::new(IngestMetrics::new());
        prepare_index(
            &config.docs_dir,
            config.chunk_size,
            config.reindex_on_startup,
            &index,
            &metrics,
        )
        .await;

        let llm: Arc<dyn LanguageModel> = Arc::new(GeminiClient::from_config(config)?);
        tracing::info!(model = llm.model_name(), "Language model client ready");

        let query_agent = QueryAgent::new(llm.clone(), index.clone(), config.retrieval_top_k);
        let summary_agent = SummaryAgent::new(llm.clone());
        Ok(Self::new(query_agent, summary_agent).with_status(
            llm.model_name(),
            index,
            metrics,
        ))
    }

    /// Log final counters before the process exits.
    pub fn shutdown(&self) {
        let snapshot = self.metrics.snapshot();
        tracing::info!(
            documents_indexed = snapshot.documents_indexed,
            documents_skipped = snapshot.documents_skipped,
            chunks_indexed = snapshot.chunks_indexed,
            "Legal assistant shutting down"
        );
    }
}

#[async_trait]
impl AssistantApi for LegalAssistant {
    async fn answer(&self, query: &str) -> Result<StructuredAnswer, AgentError> {
        let result = self.query_agent.search_legal_documents(query).await?;
        self.summary_agent.summarize(&result).await
    }

    async fn health(&self) -> HealthReport {
        let index = match &self.index {
            Some(index) => IndexHealth {
                ready: index.is_ready(),
                chunks: index.chunk_count().await,
            },
            None => IndexHealth {
                ready: false,
                chunks: 0,
            },
        };
        HealthReport {
            index,
            model: self.model.clone(),
            ingestion: self.metrics.snapshot(),
        }
    }
}
