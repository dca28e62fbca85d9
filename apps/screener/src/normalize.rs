//! Response Normalizer — parses possibly-malformed model output into a
//! canonical `Assessment`.
//!
//! Parse ladder: strict parse → substring between the first `{` and the last
//! `}` → the same substring with trailing commas stripped. If all three fail
//! the caller gets `None`, never a panic. On success every missing field is
//! filled with its type-appropriate default and `score` is coerced to the
//! nearest integer.

use serde_json::Value;

use crate::assessment::{Assessment, Verdict};

/// Attempts to recover a normalized `Assessment` from raw model output.
/// Returns `None` when no valid JSON object can be found.
pub fn parse_assessment(raw: &str) -> Option<Assessment> {
    let value = parse_lenient(raw)?;
    let obj = value.as_object()?;

    Some(Assessment {
        name: string_field(obj, "name"),
        email: string_field(obj, "email"),
        phone: string_field(obj, "phone"),
        score: coerce_score(obj.get("score")),
        strengths: list_field(obj, "strengths"),
        gaps: list_field(obj, "gaps"),
        verdict: obj
            .get("verdict")
            .and_then(Value::as_str)
            .and_then(Verdict::from_label)
            .unwrap_or(Verdict::Error),
        reasoning: string_field(obj, "reasoning"),
    })
}

fn parse_lenient(raw: &str) -> Option<Value> {
    let s = strip_json_fences(raw.trim());
    if s.is_empty() {
        return None;
    }
    if let Ok(v) = serde_json::from_str::<Value>(s) {
        return Some(v);
    }

    // `{` and `}` are ASCII, so byte slicing stays on char boundaries.
    let start = s.find('{')?;
    let end = s.rfind('}')?;
    if end < start {
        return None;
    }
    let inner = &s[start..=end];
    if let Ok(v) = serde_json::from_str::<Value>(inner) {
        return Some(v);
    }
    serde_json::from_str(&strip_trailing_commas(inner)).ok()
}

/// Strips ```json ... ``` or ``` ... ``` code fences around model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let stripped = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match stripped {
        Some(inner) => inner
            .trim_start()
            .strip_suffix("```")
            .map(str::trim)
            .unwrap_or_else(|| inner.trim_start()),
        None => text,
    }
}

/// Removes commas immediately preceding a closing brace or bracket, the most
/// common malformation in model-emitted JSON. String literals are left alone.
fn strip_trailing_commas(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_string = false;
    let mut escaped = false;

    for c in s.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '}' | ']' => {
                let kept = out.trim_end().len();
                if out[..kept].ends_with(',') {
                    let trailing_ws = out[kept..].to_string();
                    out.truncate(kept - 1);
                    out.push_str(&trailing_ws);
                }
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

fn string_field(obj: &serde_json::Map<String, Value>, key: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn list_field(obj: &serde_json::Map<String, Value>, key: &str) -> Vec<String> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Nearest-integer coercion: integers pass through, floats round, numeric
/// strings parse then round, everything else falls back to 0.
fn coerce_score(value: Option<&Value>) -> i64 {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.round() as i64))
            .unwrap_or(0),
        Some(Value::String(s)) => s
            .trim()
            .parse::<f64>()
            .map(|f| f.round() as i64)
            .unwrap_or(0),
        _ => 0,
    }
}
