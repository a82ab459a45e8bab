// SPDX-FileCopyrightText: 2026 Salonbook Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Lenient extraction of a structured action from provider replies.
//!
//! Providers are asked for a JSON object but routinely wrap it in prose or
//! code fences. The parser takes the first balanced `{...}` span (skipping
//! braces inside string literals) and degrades to a plain chat turn when
//! nothing usable is found. It never fails.

use salonbook_core::types::ExtractionReply;
use serde_json::Value;
use tracing::debug;

use crate::action::{ActionKind, Entities, clean_entities, normalize_entities};

/// Keys accepted for the natural-language reply, in priority order.
const REPLY_KEYS: &[&str] = &["response", "reply", "message"];

/// A provider reply normalized into an action proposal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedResponse {
    pub kind: ActionKind,
    pub entities: Entities,
    /// Empty when the provider did not supply one.
    pub reply: String,
    pub follow_up_questions: Vec<String>,
    pub requires_follow_up: bool,
}

impl ParsedResponse {
    /// A chat turn carrying `text` verbatim.
    pub fn chat(text: &str) -> Self {
        Self {
            reply: text.trim().to_string(),
            ..Self::default()
        }
    }

    /// Converts an entity-extraction result. The reply is left empty for the
    /// turn driver to template.
    pub fn from_extraction(reply: &ExtractionReply) -> Self {
        Self {
            kind: reply
                .intent
                .as_deref()
                .map(ActionKind::from_wire)
                .unwrap_or_default(),
            entities: clean_entities(&reply.entities),
            ..Self::default()
        }
    }
}

/// Returns the first balanced `{...}` substring of `text`.
///
/// Braces inside JSON string literals (including escaped quotes) do not
/// count towards nesting. Returns `None` if no opening brace is ever closed.
pub fn find_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut search_from = 0;

    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;

        for (i, &b) in bytes.iter().enumerate().skip(start) {
            if in_string {
                match b {
                    _ if escaped => escaped = false,
                    b'\\' => escaped = true,
                    b'"' => in_string = false,
                    _ => {}
                }
                continue;
            }
            match b {
                b'"' => in_string = true,
                b'{' => depth += 1,
                b'}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(&text[start..=i]);
                    }
                }
                _ => {}
            }
        }

        // Unterminated from this brace; retry from the next one.
        search_from = start + 1;
        if !text[search_from..].contains('}') {
            break;
        }
    }
    None
}

/// Parses a raw provider reply. Never fails: anything unusable becomes a
/// chat turn with the raw text as its reply.
pub fn parse_response(raw: &str) -> ParsedResponse {
    let Some(candidate) = find_json_object(raw) else {
        return ParsedResponse::chat(raw);
    };
    let value: Value = match serde_json::from_str(candidate) {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "reply contained malformed JSON, treating as chat");
            return ParsedResponse::chat(raw);
        }
    };
    let Some(obj) = value.as_object() else {
        return ParsedResponse::chat(raw);
    };

    let kind = obj
        .get("intent")
        .and_then(Value::as_str)
        .map(ActionKind::from_wire)
        .unwrap_or_default();

    let entities = obj.get("entities").map(normalize_entities).unwrap_or_default();

    let reply = REPLY_KEYS
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let follow_up_questions = obj
        .get("followUpQuestions")
        .and_then(Value::as_array)
        .map(|qs| {
            qs.iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|q| !q.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let requires_follow_up = obj
        .get("requiresFollowUp")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    ParsedResponse {
        kind,
        entities,
        reply,
        follow_up_questions,
        requires_follow_up,
    }
}
