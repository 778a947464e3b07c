//! Query agent: classification, retrieval, and grounding.

use super::AgentError;
use super::parser::{self, LlmReply};
use super::prompts;
use super::types::{
    Classification, DEFAULT_GREETING, LegalFindings, QueryResult, RelevantSection, RetrievalMode,
    Source,
};
use crate::llm::LanguageModel;
use crate::vector::{Retriever, ScoredChunk};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Decides what a question needs and gathers the legal material to answer it.
pub struct QueryAgent {
    llm: Arc<dyn LanguageModel>,
    retriever: Arc<dyn Retriever>,
    top_k: usize,
}

impl QueryAgent {
    /// Create an agent that retrieves `top_k` chunks per question.
    pub fn new(llm: Arc<dyn LanguageModel>, retriever: Arc<dyn Retriever>, top_k: usize) -> Self {
        Self {
            llm,
            retriever,
            top_k: top_k.max(1),
        }
    }

    /// Run the full query stage for `query`.
    ///
    /// Non-legal messages return [`QueryResult::Conversational`] without touching the index.
    pub async fn search_legal_documents(&self, query: &str) -> Result<QueryResult, AgentError> {
        if let Classification::Conversational { response } = self.classify(query).await {
            tracing::info!("Conversational message; skipping retrieval");
            return Ok(QueryResult::Conversational { response });
        }

        let chunks = self.retriever.search(query, self.top_k).await;
        let mut findings = if chunks.is_empty() {
            tracing::info!("No indexed passages matched; answering from model knowledge");
            self.answer_from_model_knowledge(query).await?
        } else {
            tracing::info!(chunks = chunks.len(), "Retrieved passages");
            self.contextualize(query, &chunks).await?
        };
        findings.is_procedural = self.is_procedural_query(query).await;
        tracing::debug!(
            is_procedural = findings.is_procedural,
            sections = findings.relevant_sections.len(),
            "Legal findings assembled"
        );
        Ok(QueryResult::Legal(findings))
    }

    /// Classify `query` as legal or conversational.
    ///
    /// Anything other than an explicit "not legal" verdict counts as legal, including
    /// transport failures.
    pub async fn classify(&self, query: &str) -> Classification {
        let raw = match self.llm.generate(&prompts::classify(query)).await {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(error = %error, "Classification failed; treating query as legal");
                return Classification::Legal;
            }
        };

        let LlmReply::Object(map) = parser::parse_reply(&raw) else {
            tracing::warn!("Classification reply was not an object; treating query as legal");
            return Classification::Legal;
        };

        match parser::field(&map, &["is_legal_query", "is_legal"]).and_then(parser::as_bool) {
            Some(false) => Classification::Conversational {
                response: parser::string_field(&map, &["response", "reply"])
                    .unwrap_or_else(|| DEFAULT_GREETING.to_string()),
            },
            Some(true) => Classification::Legal,
            None => {
                tracing::warn!("Classification reply lacked a verdict; treating query as legal");
                Classification::Legal
            }
        }
    }

    /// Whether `query` asks about a multi-step procedure. Failures count as `false`.
    pub async fn is_procedural_query(&self, query: &str) -> bool {
        let raw = match self.llm.generate(&prompts::procedural_check(query)).await {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(error = %error, "Procedural check failed; assuming not procedural");
                return false;
            }
        };

        let verdict = match parser::parse_reply(&raw) {
            LlmReply::Scalar(value) => parser::as_bool(&value),
            LlmReply::Object(map) => {
                parser::field(&map, &["is_procedural", "result", "answer"]).and_then(parser::as_bool)
            }
            LlmReply::Unparsed(text) => parser::parse_bool_text(&text),
        };
        verdict.unwrap_or_else(|| {
            tracing::warn!(reply = %raw, "Procedural check reply unreadable; assuming not procedural");
            false
        })
    }

    /// Ground `query` in retrieved `chunks`.
    pub async fn contextualize(
        &self,
        query: &str,
        chunks: &[ScoredChunk],
    ) -> Result<LegalFindings, AgentError> {
        let raw = self
            .llm
            .generate(&prompts::contextualize(query, chunks))
            .await?;
        let mut findings = findings_from_reply(
            query,
            RetrievalMode::Index {
                chunks: chunks.len(),
            },
            parser::parse_reply(&raw),
        );

        if findings.relevant_sections.is_empty() {
            findings.relevant_sections = chunks.iter().map(section_from_chunk).collect();
        }
        if findings.sources.is_empty() {
            findings.sources = sources_from_chunks(chunks);
        }
        Ok(findings)
    }

    /// Answer `query` from the model's knowledge of the reference sources.
    pub async fn answer_from_model_knowledge(
        &self,
        query: &str,
    ) -> Result<LegalFindings, AgentError> {
        let raw = self.llm.generate(&prompts::model_knowledge(query)).await?;
        let mut findings =
            findings_from_reply(query, RetrievalMode::ModelKnowledge, parser::parse_reply(&raw));
        if findings.sources.is_empty() {
            findings.sources = prompts::REFERENCE_SOURCES
                .iter()
                .map(|title| Source {
                    title: (*title).to_string(),
                    description: "General legal knowledge; no indexed passage matched.".into(),
                    relevance: String::new(),
                })
                .collect();
        }
        Ok(findings)
    }
}

fn findings_from_reply(query: &str, retrieval: RetrievalMode, reply: LlmReply) -> LegalFindings {
    let map = match reply {
        LlmReply::Object(map) => map,
        LlmReply::Scalar(Value::String(text)) | LlmReply::Unparsed(text) => {
            let mut map = Map::new();
            map.insert("legal_context".to_string(), Value::String(text));
            map
        }
        LlmReply::Scalar(_) => Map::new(),
    };

    LegalFindings {
        query: query.to_string(),
        retrieval,
        relevant_sections: parser::sections(parser::field(
            &map,
            &["relevant_sections", "sections"],
        )),
        legal_context: parser::string_field(&map, &["legal_context", "context", "explanation"])
            .unwrap_or_default(),
        applicable_laws: parser::string_list(parser::field(
            &map,
            &["applicable_laws", "laws"],
        )),
        sources: parser::sources(parser::field(&map, &["sources"])),
        is_procedural: false,
    }
}

fn section_from_chunk(scored: &ScoredChunk) -> RelevantSection {
    RelevantSection {
        title: format!(
            "{} (part {})",
            scored.chunk.document,
            scored.chunk.chunk_index + 1
        ),
        content: scored.chunk.text.clone(),
        document: Some(scored.chunk.document.clone()),
        distance: Some(scored.distance),
    }
}

fn sources_from_chunks(chunks: &[ScoredChunk]) -> Vec<Source> {
    let mut sources: Vec<Source> = Vec::new();
    for scored in chunks {
        if sources.iter().any(|s| s.title == scored.chunk.document) {
            continue;
        }
        sources.push(Source {
            title: scored.chunk.document.clone(),
            description: format!("Indexed document, part {}", scored.chunk.chunk_index + 1),
            relevance: format!("Closest match at distance {:.3}", scored.distance),
        });
    }
    sources
}
