//! Fail-soft decoding of structured model output.
//!
//! Models asked for JSON frequently wrap it in Markdown code fences. The
//! decoder strips the fences and never fails: callers always receive a
//! well-typed value and must treat it as possibly empty.

use serde::de::DeserializeOwned;

const FENCE: &str = "```";

/// Returns the body of the first Markdown code fence in `raw`: everything
/// after the opening fence and its optional language tag (```` ```json ````,
/// on its own line or followed by content) up to the next closing fence.
/// Text without a fence is only trimmed.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    fenced_candidates(trimmed)
        .into_iter()
        .next()
        .unwrap_or(trimmed)
}

/// Possible bodies of the first fenced block, shortest first: one per
/// closing fence after the opening one, then the unterminated remainder.
fn fenced_candidates(text: &str) -> Vec<&str> {
    let Some(start) = text.find(FENCE) else {
        return Vec::new();
    };
    let body = skip_language_tag(&text[start + FENCE.len()..]);

    body.match_indices(FENCE)
        .map(|(end, _)| body[..end].trim())
        .chain(std::iter::once(body.trim()))
        .collect()
}

fn skip_language_tag(after_open: &str) -> &str {
    let tag_len = after_open
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .unwrap_or(after_open.len());
    let rest = &after_open[tag_len..];

    if tag_len > 0 && rest.starts_with(char::is_whitespace) {
        rest
    } else {
        after_open
    }
}

/// Strict variant. Text that already parses is returned as-is; otherwise
/// the first fenced block is decoded. The first parse error is returned.
pub fn try_extract_structured<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    let trimmed = raw.trim();
    let unfenced_error = match serde_json::from_str(trimmed) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    let mut first_error = None;
    for candidate in fenced_candidates(trimmed) {
        match serde_json::from_str(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => {
                first_error.get_or_insert(e);
            }
        }
    }
    Err(first_error.unwrap_or(unfenced_error))
}

/// Fence-strips and parses `raw`. On failure the error and the offending
/// text are logged and `T::default()` is returned.
pub fn extract_structured<T: DeserializeOwned + Default>(raw: &str) -> T {
    match try_extract_structured(raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, raw = raw, "JSON parse error in model output");
            T::default()
        }
    }
}

/// Untyped decode; falls back to an empty JSON object rather than `null`.
pub fn extract_json_value(raw: &str) -> serde_json::Value {
    try_extract_structured(raw).unwrap_or_else(|e| {
        tracing::error!(error = %e, raw = raw, "JSON parse error in model output");
        serde_json::Value::Object(serde_json::Map::new())
    })
}
