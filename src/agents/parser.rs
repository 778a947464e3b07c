//! Lenient conversion of model output into structured values.
//!
//! Model replies are only approximately JSON: they arrive wrapped in Markdown fences, as bare
//! arrays, or as prose. Everything here is total; malformed input degrades to an
//! empty or pass-through shape instead of an error.

use super::types::{RelevantSection, Source, Step, Term, Warning};
use serde_json::{Map, Value, json};

/// A model reply after fence stripping and JSON decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum LlmReply {
    /// A JSON object, or an array wrapped as `{"key_points": [...]}`.
    Object(Map<String, Value>),
    /// A bare JSON scalar such as `true` or `"text"`.
    Scalar(Value),
    /// Text that did not decode as JSON, kept verbatim.
    Unparsed(String),
}

impl LlmReply {
    /// The reply as an object; unparsed text becomes [`fallback_object`].
    pub fn into_object(self) -> Map<String, Value> {
        match self {
            Self::Object(map) => map,
            Self::Scalar(Value::String(text)) => fallback_object(&text),
            Self::Scalar(value) => {
                let mut map = Map::new();
                map.insert("result".to_string(), value);
                map
            }
            Self::Unparsed(raw) => fallback_object(&raw),
        }
    }
}

/// Decode a raw model reply.
pub fn parse_reply(raw: &str) -> LlmReply {
    let cleaned = strip_code_fence(raw);
    match serde_json::from_str::<Value>(cleaned) {
        Ok(Value::Object(map)) => LlmReply::Object(map),
        Ok(Value::Array(items)) => {
            let mut map = Map::new();
            map.insert("key_points".to_string(), Value::Array(items));
            LlmReply::Object(map)
        }
        Ok(scalar) => LlmReply::Scalar(scalar),
        Err(error) => {
            tracing::debug!(%error, "Model reply is not JSON; keeping raw text");
            LlmReply::Unparsed(raw.trim().to_string())
        }
    }
}

/// Default shape for a reply that could not be decoded: the raw text as the explanation.
pub fn fallback_object(raw: &str) -> Map<String, Value> {
    let value = json!({
        "simplified_text": raw.trim(),
        "terms": [],
        "warnings": [],
        "key_points": [],
    });
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Remove a surrounding Markdown code fence (with optional language tag).
pub fn strip_code_fence(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        let tag_len = rest
            .find(|c: char| !is_tag_char(c))
            .unwrap_or(rest.len());
        let (tag, after) = rest.split_at(tag_len);
        let ends_line = after
            .trim_start_matches([' ', '\t', '\r'])
            .starts_with('\n');
        // A tag on a one-line fence is only recognised when it is `json`.
        body = if ends_line || tag.eq_ignore_ascii_case("json") {
            after
        } else {
            rest
        };
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

fn is_tag_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// First non-empty string stored under any of `keys`.
pub fn string_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key) {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text.trim().to_string()),
        _ => None,
    })
}

/// First value stored under any of `keys` that is not null.
pub fn field<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .find_map(|key| map.get(*key).filter(|value| !value.is_null()))
}

/// Interpret a value as a boolean, accepting `"true"`/`"false"` strings.
pub fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => parse_bool_text(text),
        _ => None,
    }
}

/// Interpret loose text such as `True.` or `"false"` as a boolean.
pub fn parse_bool_text(text: &str) -> Option<bool> {
    let cleaned = text
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c.is_whitespace());
    if cleaned.eq_ignore_ascii_case("true") || cleaned.eq_ignore_ascii_case("yes") {
        Some(true)
    } else if cleaned.eq_ignore_ascii_case("false") || cleaned.eq_ignore_ascii_case("no") {
        Some(false)
    } else {
        None
    }
}

/// A list of strings; a single string is split into bullet lines.
pub fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items.iter().filter_map(item_text).collect(),
        Some(Value::String(text)) => split_bullets(text),
        _ => Vec::new(),
    }
}

fn item_text(item: &Value) -> Option<String> {
    let text = match item {
        Value::String(text) => text.trim().to_string(),
        Value::Object(map) => string_field(
            map,
            &["point", "text", "name", "title", "law", "description"],
        )?,
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn split_bullets(text: &str) -> Vec<String> {
    text.lines()
        .map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn strip_list_marker(line: &str) -> &str {
    let line = line.trim().trim_start_matches(['-', '*', '•']).trim_start();
    let digits = line.len() - line.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    if digits > 0 {
        if let Some(rest) = line[digits..].strip_prefix(['.', ')']) {
            return rest.trim();
        }
    }
    line.trim()
}

fn objects_or_strings<T>(
    value: Option<&Value>,
    from_object: impl Fn(&Map<String, Value>) -> Option<T>,
    from_string: impl Fn(&str) -> Option<T>,
) -> Vec<T> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::Object(map) => from_object(map),
                Value::String(text) if !text.trim().is_empty() => from_string(text.trim()),
                _ => None,
            })
            .collect(),
        Some(Value::Object(map)) => from_object(map).into_iter().collect(),
        Some(Value::String(text)) => split_bullets(text)
            .iter()
            .filter_map(|line| from_string(line))
            .collect(),
        _ => Vec::new(),
    }
}

/// Terms given as `{term, definition}` objects or `"term: definition"` strings.
pub fn terms(value: Option<&Value>) -> Vec<Term> {
    objects_or_strings(
        value,
        |map| {
            Some(Term {
                term: string_field(map, &["term", "name", "word"])?,
                definition: string_field(map, &["definition", "meaning", "description"])
                    .unwrap_or_default(),
            })
        },
        |text| {
            let (term, definition) = text.split_once(':').unwrap_or((text, ""));
            Some(Term {
                term: term.trim().to_string(),
                definition: definition.trim().to_string(),
            })
        },
    )
}

/// Warnings given as objects or bare strings.
pub fn warnings(value: Option<&Value>) -> Vec<Warning> {
    objects_or_strings(
        value,
        |map| {
            Some(Warning {
                warning: string_field(map, &["warning", "text", "description", "message"])?,
                deadline: string_field(map, &["deadline", "time_limit", "limitation"]),
            })
        },
        |text| {
            Some(Warning {
                warning: text.to_string(),
                deadline: None,
            })
        },
    )
}

/// Guide steps given as objects or bare strings; untitled steps are numbered.
pub fn steps(value: Option<&Value>) -> Vec<Step> {
    let parsed: Vec<Step> = objects_or_strings(
        value,
        |map| {
            let title = string_field(map, &["title", "step", "name"]).unwrap_or_default();
            let description =
                string_field(map, &["description", "details", "text"]).unwrap_or_default();
            if title.is_empty() && description.is_empty() {
                return None;
            }
            Some(Step {
                title,
                description,
                requirements: string_list(field(
                    map,
                    &["requirements", "documents", "documents_required"],
                )),
            })
        },
        |text| {
            Some(Step {
                title: String::new(),
                description: text.to_string(),
                requirements: Vec::new(),
            })
        },
    );
    parsed
        .into_iter()
        .enumerate()
        .map(|(index, mut step)| {
            if step.title.is_empty() {
                step.title = format!("Step {}", index + 1);
            }
            step
        })
        .collect()
}

/// Sources given as objects (`title`/`document`, `description`/`text`) or bare names.
pub fn sources(value: Option<&Value>) -> Vec<Source> {
    objects_or_strings(
        value,
        |map| {
            Some(Source {
                title: string_field(map, &["title", "document", "name", "source"])?,
                description: string_field(map, &["description", "text", "summary"])
                    .unwrap_or_default(),
                relevance: string_field(map, &["relevance", "why"]).unwrap_or_default(),
            })
        },
        |text| {
            Some(Source {
                title: text.to_string(),
                ..Source::default()
            })
        },
    )
}

/// Relevant sections given as `{title, content}` objects or bare passages.
pub fn sections(value: Option<&Value>) -> Vec<RelevantSection> {
    let parsed: Vec<RelevantSection> = objects_or_strings(
        value,
        |map| {
            let content = string_field(map, &["content", "text", "excerpt", "summary"])?;
            Some(RelevantSection {
                title: string_field(map, &["title", "section", "heading"]).unwrap_or_default(),
                content,
                document: string_field(map, &["document", "source"]),
                distance: None,
            })
        },
        |text| {
            Some(RelevantSection {
                content: text.to_string(),
                ..RelevantSection::default()
            })
        },
    );
    parsed
        .into_iter()
        .enumerate()
        .map(|(index, mut section)| {
            if section.title.is_empty() {
                section.title = format!("Section {}", index + 1);
            }
            section
        })
        .collect()
}
