//! Prompt templates.
//!
//! Each template opens with a fixed first line so logs (and test doubles) can tell the calls
//! apart. Every template asks for JSON only; the parser copes when the model ignores that.

use super::types::LegalFindings;
use crate::vector::ScoredChunk;
use std::fmt::Write as _;

/// First line of the classification prompt.
pub const CLASSIFY_HEADER: &str = "You are the intake desk of a legal information assistant.";
/// First line of the procedural-check prompt.
pub const PROCEDURAL_HEADER: &str =
    "Decide whether the question below asks how to carry out a legal procedure.";
/// First line of the contextualization prompt.
pub const CONTEXTUALIZE_HEADER: &str =
    "You are a legal research assistant working from retrieved document passages.";
/// First line of the model-knowledge prompt used when nothing was retrieved.
pub const MODEL_KNOWLEDGE_HEADER: &str =
    "No indexed documents matched this question, so answer from your own legal knowledge.";
/// First line of the simplification prompt.
pub const SIMPLIFY_HEADER: &str = "Rewrite the following legal text in plain language.";
/// First line of the key-points prompt.
pub const KEY_POINTS_HEADER: &str = "List the most important points in the following legal text.";
/// First line of the step-guide prompt.
pub const STEP_GUIDE_HEADER: &str =
    "Turn the following legal procedure into a step-by-step guide.";
/// First line of the consolidated summary prompt.
pub const SUMMARY_HEADER: &str = "Prepare the final answer for a member of the public.";

/// Reference sources the model-knowledge prompt is anchored to.
pub const REFERENCE_SOURCES: [&str; 2] = [
    "Constitution of India",
    "Code of Civil Procedure, 1908",
];

/// Decide whether a message is a legal question or small talk.
pub fn classify(query: &str) -> String {
    format!(
        "{CLASSIFY_HEADER}
Decide whether the user's message is a question about law, legal rights, legal procedures, or
courts in India. Greetings, thanks, small talk, and unrelated topics are not legal questions.

Respond with JSON only:
{{\"is_legal_query\": true or false, \"response\": \"a short friendly reply when the message is not a legal question, otherwise an empty string\"}}

User message: {query}"
    )
}

/// Ask whether the question is about a multi-step procedure.
pub fn procedural_check(query: &str) -> String {
    format!(
        "{PROCEDURAL_HEADER}
A procedural question asks how to do something: filing a case, applying for a document,
registering, appealing, or any other process with steps to follow.

Respond with exactly one word, true or false.

Question: {query}"
    )
}

/// Ground the question in retrieved passages.
pub fn contextualize(query: &str, chunks: &[ScoredChunk]) -> String {
    let mut passages = String::new();
    for (position, scored) in chunks.iter().enumerate() {
        let _ = write!(
            passages,
            "[{}] {} (part {})\n{}\n\n",
            position + 1,
            scored.chunk.document,
            scored.chunk.chunk_index + 1,
            scored.chunk.text.trim()
        );
    }
    format!(
        "{CONTEXTUALIZE_HEADER}
Using only the passages below, explain the legal context of the question, name the laws that
apply, and pick out the sections that answer it.

Respond with JSON only:
{{
  \"legal_context\": \"explanation of the legal position\",
  \"applicable_laws\": [\"law or section\"],
  \"sources\": [{{\"title\": \"document name\", \"description\": \"one line on what it covers\"}}],
  \"relevant_sections\": [{{\"title\": \"section heading\", \"content\": \"relevant text\"}}]
}}

Question: {query}

Passages:
{passages}"
    )
}

/// Answer without retrieved passages, anchored to the reference sources.
pub fn model_knowledge(query: &str) -> String {
    let [constitution, civil_procedure] = REFERENCE_SOURCES;
    format!(
        "{MODEL_KNOWLEDGE_HEADER}
Base the answer on the {constitution} and the {civil_procedure}. Cite articles, sections, or
orders where you can.

Respond with JSON only:
{{
  \"relevant_sections\": [{{\"title\": \"article or section\", \"content\": \"what it says\"}}],
  \"legal_context\": \"explanation of the legal position\",
  \"applicable_laws\": [\"law or section\"],
  \"sources\": [{{\"title\": \"source name\", \"description\": \"one line on what it covers\"}}]
}}

Question: {query}"
    )
}

/// Plain-language rewrite with terms and warnings.
pub fn simplify(text: &str) -> String {
    format!(
        "{SIMPLIFY_HEADER}
Keep every requirement and time limit, drop the jargon, and explain any legal term you keep.

Respond with JSON only:
{{
  \"simplified_text\": \"plain-language version\",
  \"terms\": [{{\"term\": \"legal term\", \"definition\": \"plain meaning\"}}],
  \"warnings\": [{{\"warning\": \"what to watch out for\", \"deadline\": \"time limit, if any\"}}]
}}

Text:
{text}"
    )
}

/// Bullet-point takeaways.
pub fn key_points(text: &str) -> String {
    format!(
        "{KEY_POINTS_HEADER}
Use short sentences a non-lawyer can follow. Three to seven points.

Respond with JSON only:
{{\"key_points\": [\"point\"]}}

Text:
{text}"
    )
}

/// Ordered procedure steps.
pub fn step_guide(text: &str) -> String {
    format!(
        "{STEP_GUIDE_HEADER}
List the steps in the order they must be done, with the documents or conditions each needs.

Respond with JSON only:
{{\"steps\": [{{\"title\": \"short heading\", \"description\": \"what to do\", \"requirements\": [\"document or condition\"]}}]}}

Text:
{text}"
    )
}

/// Full answer in one call.
pub fn summary(findings: &LegalFindings) -> String {
    let mut sections = String::new();
    for section in &findings.relevant_sections {
        let _ = write!(sections, "## {}\n{}\n\n", section.title, section.content.trim());
    }
    if sections.is_empty() {
        sections.push_str("(none)\n");
    }
    let laws = if findings.applicable_laws.is_empty() {
        "(none listed)".to_string()
    } else {
        findings.applicable_laws.join("; ")
    };
    let guide_instruction = if findings.is_procedural {
        "The question is about a procedure: fill step_by_step_guide with the steps in order."
    } else {
        "The question is not about a procedure: return an empty step_by_step_guide."
    };

    format!(
        "{SUMMARY_HEADER}
Explain the legal position simply, list the key points, define the legal terms used, and flag
warnings and deadlines. {guide_instruction}

Respond with JSON only:
{{
  \"simple_explanation\": \"plain-language answer\",
  \"key_points\": [\"point\"],
  \"important_terms\": [{{\"term\": \"legal term\", \"definition\": \"plain meaning\"}}],
  \"warnings_and_deadlines\": [{{\"warning\": \"what to watch out for\", \"deadline\": \"time limit, if any\"}}],
  \"step_by_step_guide\": [{{\"title\": \"short heading\", \"description\": \"what to do\", \"requirements\": [\"document or condition\"]}}],
  \"sources\": [{{\"title\": \"source name\", \"description\": \"one line\", \"relevance\": \"why it matters here\"}}]
}}

Question: {query}

Legal context:
{context}

Applicable laws: {laws}

Relevant sections:
{sections}",
        query = findings.query,
        context = findings.legal_context.trim(),
    )
}
