//! Scripted collaborators for agent unit tests.

use crate::llm::{LanguageModel, LlmError};
use crate::vector::{DocumentChunk, Retriever, ScoredChunk};
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

enum Reply {
    Text(String),
    Fail,
}

/// Answers prompts by matching their first line against scripted headers.
#[derive(Default)]
pub struct ScriptedModel {
    rules: Vec<(&'static str, Reply)>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, header: &'static str, text: impl Into<String>) -> Self {
        self.rules.push((header, Reply::Text(text.into())));
        self
    }

    pub fn fail(mut self, header: &'static str) -> Self {
        self.rules.push((header, Reply::Fail));
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn calls_to(&self, header: &str) -> usize {
        self.prompts()
            .iter()
            .filter(|prompt| prompt.starts_with(header))
            .count()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        match self
            .rules
            .iter()
            .find(|(header, _)| prompt.starts_with(header))
        {
            Some((_, Reply::Text(text))) => Ok(text.clone()),
            Some((_, Reply::Fail)) => Err(LlmError::GenerationFailed("scripted failure".into())),
            None => Err(LlmError::GenerationFailed("unscripted prompt".into())),
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Returns a fixed set of chunks and counts lookups.
#[derive(Default)]
pub struct FixedRetriever {
    chunks: Vec<ScoredChunk>,
    calls: AtomicUsize,
}

impl FixedRetriever {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_texts(texts: &[(&str, &str)]) -> Self {
        let chunks = texts
            .iter()
            .enumerate()
            .map(|(index, (document, text))| ScoredChunk {
                chunk: DocumentChunk {
                    id: format!("{document}_chunk_{index}"),
                    document: (*document).to_string(),
                    chunk_index: index,
                    text: (*text).to_string(),
                },
                distance: 0.1 * (index as f32 + 1.0),
            })
            .collect();
        Self {
            chunks,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Retriever for FixedRetriever {
    async fn search(&self, _query: &str, limit: usize) -> Vec<ScoredChunk> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.chunks.iter().take(limit).cloned().collect()
    }
}
