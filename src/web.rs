//! Server-rendered question form.
//!
//! A single page: the form on top, and after a submission the structured answer rendered as
//! sections (explanation, key points, terms, warnings, guide, sources).

use crate::agents::StructuredAnswer;
use crate::assistant::AssistantApi;
use axum::{
    Form,
    extract::State,
    response::Html,
};
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;

const STYLE: &str = "body{font-family:system-ui,sans-serif;max-width:48rem;margin:2rem auto;\
padding:0 1rem;line-height:1.5}textarea{width:100%;min-height:6rem}\
section{margin-top:1.5rem}.warning{color:#8a3b00}.error{color:#a00}";

/// Form body for `POST /`.
#[derive(Deserialize)]
pub struct AskForm {
    #[serde(default)]
    query: String,
}

/// Render the empty form.
pub async fn index_page() -> Html<String> {
    Html(render_page("", None))
}

/// Answer the submitted question and render the result below the form.
pub async fn answer_page<S>(
    State(service): State<Arc<S>>,
    Form(form): Form<AskForm>,
) -> Html<String>
where
    S: AssistantApi,
{
    let query = form.query.trim();
    if query.is_empty() {
        return Html(render_page("", Some(Err("Please enter a question."))));
    }
    let answer = match service.answer(query).await {
        Ok(answer) => answer,
        Err(error) => {
            tracing::error!(error = %error, "Query processing failed");
            StructuredAnswer::apology()
        }
    };
    Html(render_page(query, Some(Ok(&answer))))
}

fn render_page(query: &str, outcome: Option<Result<&StructuredAnswer, &str>>) -> String {
    let mut page = String::new();
    let _ = write!(
        page,
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">\
<title>Legal Assistant</title><style>{STYLE}</style></head><body>\
<h1>Legal Assistant</h1>\
<p>Ask about Indian legal procedures and requirements. Answers are general information, not legal advice.</p>\
<form method=\"post\" action=\"/\"><textarea name=\"query\" placeholder=\"How do I file a civil lawsuit?\">{}</textarea>\
<p><button type=\"submit\">Ask</button></p></form>",
        escape_html(query)
    );
    match outcome {
        Some(Ok(answer)) => render_answer(&mut page, answer),
        Some(Err(message)) => {
            let _ = write!(page, "<p class=\"error\">{}</p>", escape_html(message));
        }
        None => {}
    }
    page.push_str("</body></html>");
    page
}

fn render_answer(page: &mut String, answer: &StructuredAnswer) {
    let _ = write!(
        page,
        "<section><h2>Explanation</h2><p>{}</p></section>",
        escape_html(&answer.simple_explanation)
    );

    if !answer.key_points.is_empty() {
        page.push_str("<section><h2>Key points</h2><ul>");
        for point in &answer.key_points {
            let _ = write!(page, "<li>{}</li>", escape_html(point));
        }
        page.push_str("</ul></section>");
    }

    if !answer.important_terms.is_empty() {
        page.push_str("<section><h2>Important terms</h2><dl>");
        for term in &answer.important_terms {
            let _ = write!(
                page,
                "<dt>{}</dt><dd>{}</dd>",
                escape_html(&term.term),
                escape_html(&term.definition)
            );
        }
        page.push_str("</dl></section>");
    }

    if !answer.warnings_and_deadlines.is_empty() {
        page.push_str("<section><h2>Warnings and deadlines</h2><ul>");
        for warning in &answer.warnings_and_deadlines {
            let _ = write!(page, "<li class=\"warning\">{}", escape_html(&warning.warning));
            if let Some(deadline) = &warning.deadline {
                let _ = write!(page, " <strong>Deadline: {}</strong>", escape_html(deadline));
            }
            page.push_str("</li>");
        }
        page.push_str("</ul></section>");
    }

    if let Some(steps) = answer.step_by_step_guide.as_ref().filter(|s| !s.is_empty()) {
        page.push_str("<section><h2>Step-by-step guide</h2><ol>");
        for step in steps {
            let _ = write!(
                page,
                "<li><strong>{}</strong><p>{}</p>",
                escape_html(&step.title),
                escape_html(&step.description)
            );
            if !step.requirements.is_empty() {
                page.push_str("<ul>");
                for requirement in &step.requirements {
                    let _ = write!(page, "<li>{}</li>", escape_html(requirement));
                }
                page.push_str("</ul>");
            }
            page.push_str("</li>");
        }
        page.push_str("</ol></section>");
    }

    if !answer.sources.is_empty() {
        page.push_str("<section><h2>Sources</h2><ul>");
        for source in &answer.sources {
            let _ = write!(page, "<li><strong>{}</strong>", escape_html(&source.title));
            if !source.description.is_empty() {
                let _ = write!(page, ": {}", escape_html(&source.description));
            }
            if !source.relevance.is_empty() {
                let _ = write!(page, " <em>({})</em>", escape_html(&source.relevance));
            }
            page.push_str("</li>");
        }
        page.push_str("</ul></section>");
    }
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
