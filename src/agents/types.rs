//! Structured answer contract and the intermediate results passed between agents.

use serde::{Deserialize, Serialize};

/// Returned to the user when the pipeline fails outright.
pub const APOLOGY_MESSAGE: &str =
    "I apologize, but I encountered an error. Please try again or rephrase your question.";

/// Used when the classifier marks a message as conversational without supplying a reply.
pub const DEFAULT_GREETING: &str = "Hello! I can help you understand legal procedures and \
requirements in India. Ask me a legal question to get started.";

/// A legal term and its plain-language definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// The term as it appears in the source text.
    pub term: String,
    /// Short definition in plain language.
    #[serde(default)]
    pub definition: String,
}

/// A warning, optionally tied to a deadline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    /// What the reader must watch out for.
    pub warning: String,
    /// Associated time limit, when one applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
}

/// One step of a procedural guide.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Short step heading.
    pub title: String,
    /// What to do in this step.
    #[serde(default)]
    pub description: String,
    /// Documents or conditions needed for the step.
    #[serde(default)]
    pub requirements: Vec<String>,
}

/// A reference backing the answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Document or statute name.
    #[serde(alias = "document")]
    pub title: String,
    /// One-line description of what the source contributes.
    #[serde(default, alias = "text")]
    pub description: String,
    /// Why the source is relevant to the question.
    #[serde(default)]
    pub relevance: String,
}

/// The user-facing answer. Every field defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredAnswer {
    /// Plain-language explanation.
    #[serde(default)]
    pub simple_explanation: String,
    /// Main takeaways.
    #[serde(default)]
    pub key_points: Vec<String>,
    /// Terms worth defining.
    #[serde(default)]
    pub important_terms: Vec<Term>,
    /// Warnings and deadlines.
    #[serde(default)]
    pub warnings_and_deadlines: Vec<Warning>,
    /// Present only for procedural questions.
    #[serde(default)]
    pub step_by_step_guide: Option<Vec<Step>>,
    /// References behind the answer.
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl StructuredAnswer {
    /// Answer carrying only an explanation, as used for conversational replies.
    pub fn explanation_only(text: impl Into<String>) -> Self {
        Self {
            simple_explanation: text.into(),
            ..Self::default()
        }
    }

    /// Answer rendered when the pipeline fails.
    pub fn apology() -> Self {
        Self {
            step_by_step_guide: Some(Vec::new()),
            ..Self::explanation_only(APOLOGY_MESSAGE)
        }
    }
}

/// Outcome of query classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A legal question; continue with retrieval.
    Legal,
    /// Greeting, courtesy, or off-topic remark with a canned reply.
    Conversational {
        /// Reply shown to the user.
        response: String,
    },
}

/// Where the legal findings came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RetrievalMode {
    /// Chunks retrieved from the vector index.
    Index {
        /// Number of chunks retrieved.
        chunks: usize,
    },
    /// The index was unavailable or empty; the model answered from its own knowledge.
    ModelKnowledge,
}

/// A passage judged relevant to the question.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RelevantSection {
    /// Heading or section reference.
    pub title: String,
    /// Passage text.
    pub content: String,
    /// Source document, when the passage came from the index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<String>,
    /// Distance from the query, when the passage came from the index.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
}

/// Everything the query agent learned about a legal question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegalFindings {
    /// The original question.
    pub query: String,
    /// How the passages were obtained.
    pub retrieval: RetrievalMode,
    /// Passages the answer should rest on.
    pub relevant_sections: Vec<RelevantSection>,
    /// Explanation of the legal context.
    pub legal_context: String,
    /// Laws that apply to the question.
    pub applicable_laws: Vec<String>,
    /// Sources with one-line descriptions.
    pub sources: Vec<Source>,
    /// Whether the question asks about a multi-step procedure.
    pub is_procedural: bool,
}

impl LegalFindings {
    /// Text the summary agent shapes: section contents, else the legal context.
    pub fn basis_text(&self) -> String {
        let sections: Vec<&str> = self
            .relevant_sections
            .iter()
            .map(|section| section.content.trim())
            .filter(|content| !content.is_empty())
            .collect();
        if sections.is_empty() {
            self.legal_context.trim().to_string()
        } else {
            sections.join("\n\n")
        }
    }
}

/// Intermediate result handed from the query agent to the summary agent.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueryResult {
    /// Non-legal message answered directly; no retrieval happened.
    Conversational {
        /// Reply to pass through unchanged.
        response: String,
    },
    /// Legal question with findings to summarize.
    Legal(LegalFindings),
}

impl QueryResult {
    /// Findings for legal questions.
    pub fn findings(&self) -> Option<&LegalFindings> {
        match self {
            Self::Legal(findings) => Some(findings),
            Self::Conversational { .. } => None,
        }
    }
}

/// Output of the simplification call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Simplified {
    /// Plain-language rewrite.
    pub simplified_text: String,
    /// Terms extracted alongside the rewrite.
    pub terms: Vec<Term>,
    /// Warnings extracted alongside the rewrite.
    pub warnings: Vec<Warning>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sources_accept_document_and_text_aliases() {
        let source: Source = serde_json::from_str(
            r#"{"document": "CPC", "text": "Order VII", "relevance": "plaint"}"#,
        )
        .expect("source");
        assert_eq!(source.title, "CPC");
        assert_eq!(source.description, "Order VII");
    }

    #[test]
    fn missing_answer_fields_default_to_empty() {
        let answer: StructuredAnswer =
            serde_json::from_str(r#"{"simple_explanation": "x"}"#).expect("answer");
        assert!(answer.key_points.is_empty());
        assert!(answer.step_by_step_guide.is_none());
        assert!(answer.sources.is_empty());
    }

    #[test]
    fn basis_text_prefers_sections() {
        let mut findings = LegalFindings {
            query: "q".into(),
            retrieval: RetrievalMode::ModelKnowledge,
            relevant_sections: vec![],
            legal_context: " context ".into(),
            applicable_laws: vec![],
            sources: vec![],
            is_procedural: false,
        };
        assert_eq!(findings.basis_text(), "context");

        findings.relevant_sections = vec![
            RelevantSection {
                title: "s1".into(),
                content: "first".into(),
                ..Default::default()
            },
            RelevantSection {
                title: "s2".into(),
                content: "second".into(),
                ..Default::default()
            },
        ];
        assert_eq!(findings.basis_text(), "first\n\nsecond");
    }
}
