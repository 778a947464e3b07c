//! The two-agent pipeline.
//!
//! The [`QueryAgent`] classifies a question, retrieves passages, and grounds them into
//! [`LegalFindings`]; the [`SummaryAgent`] turns those findings into a [`StructuredAnswer`].

pub mod parser;
pub mod prompts;
pub mod query;
pub mod summary;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use parser::{LlmReply, parse_reply};
pub use query::QueryAgent;
pub use summary::SummaryAgent;
pub use types::{
    Classification, LegalFindings, QueryResult, RelevantSection, RetrievalMode, Simplified,
    Source, Step, StructuredAnswer, Term, Warning,
};

use crate::llm::LlmError;
use thiserror::Error;

/// Failures that abort a request.
///
/// Malformed model output never lands here; the parser absorbs it.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The language model could not be reached or returned nothing.
    #[error(transparent)]
    Llm(#[from] LlmError),
}
