//! JSON extraction from model replies
//!
//! Models asked for JSON still wrap it in code fences or prose now and then.

use serde_json::Value;
use tracing::debug;

/// Pull the first JSON object out of a model reply
///
/// Tries the whole reply, then the content of a ```json fence, then the
/// span from the first `{` to the last `}`. Returns `None` when no object parses.
pub fn extract_json_object(text: &str) -> Option<Value> {
    debug!(len = text.len(), "extract_json_object: called");
    let trimmed = text.trim();

    if let Some(value) = parse_object(trimmed) {
        return Some(value);
    }

    if let Some(fenced) = fenced_block(trimmed)
        && let Some(value) = parse_object(fenced)
    {
        debug!("extract_json_object: found in code fence");
        return Some(value);
    }

    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    debug!(start, end, "extract_json_object: trying brace span");
    parse_object(&trimmed[start..=end])
}

fn parse_object(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text).ok().filter(Value::is_object)
}

fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after = &text[open + 3..];
    // Skip the language tag line, if any
    let body_start = after.find('\n')? + 1;
    let body = &after[body_start..];
    let close = body.find("```")?;
    Some(body[..close].trim())
}
