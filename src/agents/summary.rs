//! Summary agent: turns legal findings into the structured answer.

use super::AgentError;
use super::parser::{self, LlmReply};
use super::prompts;
use super::types::{LegalFindings, QueryResult, Simplified, Step, StructuredAnswer};
use crate::llm::LanguageModel;
use std::sync::Arc;

/// Owns every text-shaping call: summary, simplification, key points, and step guides.
pub struct SummaryAgent {
    llm: Arc<dyn LanguageModel>,
}

impl SummaryAgent {
    /// Create an agent backed by `llm`.
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    /// Produce the final answer for `result`.
    ///
    /// Conversational results pass through untouched. Legal results take one consolidated call;
    /// fields it leaves empty are filled by the finer-grained operations, whose own failures are
    /// logged and skipped.
    pub async fn summarize(&self, result: &QueryResult) -> Result<StructuredAnswer, AgentError> {
        let findings = match result {
            QueryResult::Conversational { response } => {
                return Ok(StructuredAnswer::explanation_only(response.clone()));
            }
            QueryResult::Legal(findings) => findings,
        };

        let raw = self.llm.generate(&prompts::summary(findings)).await?;
        let mut answer = answer_from_reply(findings, parser::parse_reply(&raw));
        self.fill_gaps(findings, &mut answer).await;

        if answer.simple_explanation.is_empty() {
            answer.simple_explanation = findings.legal_context.trim().to_string();
        }
        if answer.sources.is_empty() {
            answer.sources = findings.sources.clone();
        }
        tracing::debug!(
            key_points = answer.key_points.len(),
            terms = answer.important_terms.len(),
            warnings = answer.warnings_and_deadlines.len(),
            steps = answer.step_by_step_guide.as_ref().map_or(0, Vec::len),
            "Structured answer assembled"
        );
        Ok(answer)
    }

    async fn fill_gaps(&self, findings: &LegalFindings, answer: &mut StructuredAnswer) {
        let basis = findings.basis_text();
        if basis.is_empty() {
            return;
        }

        if answer.simple_explanation.is_empty() {
            match self.simplify(&basis).await {
                Ok(simplified) => {
                    answer.simple_explanation = simplified.simplified_text;
                    if answer.important_terms.is_empty() {
                        answer.important_terms = simplified.terms;
                    }
                    if answer.warnings_and_deadlines.is_empty() {
                        answer.warnings_and_deadlines = simplified.warnings;
                    }
                }
                Err(error) => tracing::warn!(error = %error, "Simplification fill-in failed"),
            }
        }

        if answer.key_points.is_empty() {
            match self.extract_key_points(&basis).await {
                Ok(points) => answer.key_points = points,
                Err(error) => tracing::warn!(error = %error, "Key point fill-in failed"),
            }
        }

        let guide_missing = answer
            .step_by_step_guide
            .as_ref()
            .is_none_or(Vec::is_empty);
        if findings.is_procedural && guide_missing {
            match self.generate_step_guide(&basis).await {
                Ok(steps) => answer.step_by_step_guide = Some(steps),
                Err(error) => tracing::warn!(error = %error, "Step guide fill-in failed"),
            }
        }
    }

    /// Rewrite `text` in plain language. Unreadable replies echo the reply text.
    pub async fn simplify(&self, text: &str) -> Result<Simplified, AgentError> {
        let raw = self.llm.generate(&prompts::simplify(text)).await?;
        let map = parser::parse_reply(&raw).into_object();
        Ok(Simplified {
            simplified_text: parser::string_field(
                &map,
                &["simplified_text", "simple_explanation", "text"],
            )
            .unwrap_or_else(|| text.trim().to_string()),
            terms: parser::terms(parser::field(&map, &["terms", "important_terms"])),
            warnings: parser::warnings(parser::field(
                &map,
                &["warnings", "warnings_and_deadlines"],
            )),
        })
    }

    /// Extract the main takeaways from `text`. Unreadable replies yield no points.
    pub async fn extract_key_points(&self, text: &str) -> Result<Vec<String>, AgentError> {
        let raw = self.llm.generate(&prompts::key_points(text)).await?;
        Ok(match parser::parse_reply(&raw) {
            LlmReply::Object(map) => parser::string_list(parser::field(&map, &["key_points", "points"])),
            LlmReply::Scalar(_) | LlmReply::Unparsed(_) => Vec::new(),
        })
    }

    /// Turn procedural `text` into ordered steps. Unreadable replies yield no steps.
    pub async fn generate_step_guide(&self, text: &str) -> Result<Vec<Step>, AgentError> {
        let raw = self.llm.generate(&prompts::step_guide(text)).await?;
        Ok(match parser::parse_reply(&raw) {
            LlmReply::Object(map) => parser::steps(parser::field(
                &map,
                &["steps", "step_by_step_guide", "guide", "key_points"],
            )),
            LlmReply::Scalar(_) | LlmReply::Unparsed(_) => Vec::new(),
        })
    }
}

fn answer_from_reply(findings: &LegalFindings, reply: LlmReply) -> StructuredAnswer {
    let map = reply.into_object();
    let guide = parser::steps(parser::field(&map, &["step_by_step_guide", "steps"]));
    StructuredAnswer {
        simple_explanation: parser::string_field(
            &map,
            &["simple_explanation", "simplified_text", "explanation"],
        )
        .unwrap_or_default(),
        key_points: parser::string_list(parser::field(&map, &["key_points"])),
        important_terms: parser::terms(parser::field(&map, &["important_terms", "terms"])),
        warnings_and_deadlines: parser::warnings(parser::field(
            &map,
            &["warnings_and_deadlines", "warnings"],
        )),
        step_by_step_guide: findings.is_procedural.then_some(guide),
        sources: parser::sources(parser::field(&map, &["sources"])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::prompts::{KEY_POINTS_HEADER, SIMPLIFY_HEADER, STEP_GUIDE_HEADER, SUMMARY_HEADER};
    use crate::agents::testing::ScriptedModel;
    use crate::agents::types::{RelevantSection, RetrievalMode, Source, Term};

    fn findings(is_procedural: bool) -> QueryResult {
        QueryResult::Legal(LegalFindings {
            query: "How do I file a lawsuit?".into(),
            retrieval: RetrievalMode::Index { chunks: 1 },
            relevant_sections: vec![RelevantSection {
                title: "Order VII".into(),
                content: "Every suit shall be instituted by a plaint.".into(),
                ..Default::default()
            }],
            legal_context: "Civil suits start with a plaint.".into(),
            applicable_laws: vec!["CPC Order VII".into()],
            sources: vec![Source {
                title: "cpc.pdf".into(),
                ..Default::default()
            }],
            is_procedural,
        })
    }

    fn summarizer(model: ScriptedModel) -> (SummaryAgent, Arc<ScriptedModel>) {
        let model = Arc::new(model);
        (SummaryAgent::new(model.clone()), model)
    }

    #[tokio::test]
    async fn conversational_results_pass_through() {
        let (agent, model) = summarizer(ScriptedModel::new());
        let answer = agent
            .summarize(&QueryResult::Conversational {
                response: "Hello!".into(),
            })
            .await
            .expect("answer");
        assert_eq!(answer, StructuredAnswer::explanation_only("Hello!"));
        assert!(model.prompts().is_empty());
    }

    #[tokio::test]
    async fn complete_summary_needs_no_fill_ins() {
        let reply = r#"```json
{
  "simple_explanation": "File a plaint in civil court.",
  "key_points": ["Draft a plaint", "Pay the court fee"],
  "important_terms": ["Plaint: the written complaint"],
  "warnings_and_deadlines": [{"warning": "Mind the limitation period", "deadline": "3 years"}],
  "step_by_step_guide": [{"title": "Draft", "description": "Write the plaint"}],
  "sources": [{"title": "CPC", "description": "Order VII", "relevance": "Plaint rules"}]
}
```"#;
        let (agent, model) = summarizer(ScriptedModel::new().reply(SUMMARY_HEADER, reply));

        let answer = agent.summarize(&findings(true)).await.expect("answer");

        assert_eq!(model.prompts().len(), 1);
        assert_eq!(answer.simple_explanation, "File a plaint in civil court.");
        assert_eq!(answer.key_points.len(), 2);
        assert_eq!(
            answer.important_terms,
            vec![Term {
                term: "Plaint".into(),
                definition: "the written complaint".into()
            }]
        );
        assert_eq!(answer.warnings_and_deadlines[0].deadline.as_deref(), Some("3 years"));
        assert_eq!(answer.step_by_step_guide.as_ref().map(Vec::len), Some(1));
        assert_eq!(answer.sources[0].title, "CPC");
    }

    #[tokio::test]
    async fn non_procedural_answers_have_no_guide() {
        let reply = r#"{"simple_explanation": "x", "key_points": ["a"], "step_by_step_guide": [{"title": "ignored"}]}"#;
        let (agent, _) = summarizer(ScriptedModel::new().reply(SUMMARY_HEADER, reply));
        let answer = agent.summarize(&findings(false)).await.expect("answer");
        assert!(answer.step_by_step_guide.is_none());
    }

    #[tokio::test]
    async fn missing_fields_are_filled_in() {
        let model = ScriptedModel::new()
            .reply(SUMMARY_HEADER, r#"{"simple_explanation": ""}"#)
            .reply(
                SIMPLIFY_HEADER,
                r#"{"simplified_text": "You start a case by filing a plaint.", "terms": ["Plaint: complaint"], "warnings": ["Limitation applies"]}"#,
            )
            .reply(KEY_POINTS_HEADER, r#"["Plaint first", "Court fee next"]"#)
            .reply(
                STEP_GUIDE_HEADER,
                r#"{"steps": [{"title": "Draft the plaint"}, {"title": "File it"}]}"#,
            );
        let (agent, model) = summarizer(model);

        let answer = agent.summarize(&findings(true)).await.expect("answer");

        assert_eq!(answer.simple_explanation, "You start a case by filing a plaint.");
        assert_eq!(answer.important_terms[0].term, "Plaint");
        assert_eq!(answer.warnings_and_deadlines[0].warning, "Limitation applies");
        assert_eq!(answer.key_points, vec!["Plaint first", "Court fee next"]);
        assert_eq!(answer.step_by_step_guide.as_ref().map(Vec::len), Some(2));
        assert_eq!(answer.sources[0].title, "cpc.pdf");
        assert_eq!(model.calls_to(SIMPLIFY_HEADER), 1);
        assert!(model.prompts()[1].contains("Every suit shall be instituted by a plaint."));
    }

    #[tokio::test]
    async fn prose_summary_becomes_the_explanation() {
        let model = ScriptedModel::new()
            .reply(SUMMARY_HEADER, "You need to file a plaint in the civil court.")
            .reply(KEY_POINTS_HEADER, "not json");
        let (agent, model) = summarizer(model);

        let answer = agent.summarize(&findings(false)).await.expect("answer");

        assert_eq!(answer.simple_explanation, "You need to file a plaint in the civil court.");
        assert!(answer.key_points.is_empty());
        assert_eq!(model.calls_to(SIMPLIFY_HEADER), 0);
    }

    #[tokio::test]
    async fn failed_fill_ins_are_skipped() {
        let model = ScriptedModel::new()
            .reply(SUMMARY_HEADER, "{}")
            .fail(SIMPLIFY_HEADER)
            .fail(KEY_POINTS_HEADER)
            .fail(STEP_GUIDE_HEADER);
        let (agent, _) = summarizer(model);

        let answer = agent.summarize(&findings(true)).await.expect("answer");

        assert_eq!(answer.simple_explanation, "Civil suits start with a plaint.");
        assert_eq!(answer.step_by_step_guide, Some(Vec::new()));
    }

    #[tokio::test]
    async fn summary_transport_failure_is_an_error() {
        let (agent, _) = summarizer(ScriptedModel::new().fail(SUMMARY_HEADER));
        assert!(agent.summarize(&findings(false)).await.is_err());
    }

    #[tokio::test]
    async fn simplify_echoes_input_when_reply_is_empty_object() {
        let (agent, _) = summarizer(ScriptedModel::new().reply(SIMPLIFY_HEADER, "{}"));
        let simplified = agent.simplify("  Original text ").await.expect("simplified");
        assert_eq!(simplified.simplified_text, "Original text");
        assert!(simplified.terms.is_empty());
    }

    #[tokio::test]
    async fn key_points_string_is_split() {
        let (agent, _) = summarizer(
            ScriptedModel::new().reply(KEY_POINTS_HEADER, r#"{"key_points": "- one\n- two"}"#),
        );
        let points = agent.extract_key_points("text").await.expect("points");
        assert_eq!(points, vec!["one", "two"]);
    }
}
