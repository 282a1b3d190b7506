//! Cleaning model output before JSON parsing.

/// Remove a surrounding markdown code fence (```` ```json ```` or ```` ``` ````).
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string ("json", "JSON", ...) on the opening line
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
    };
    body.trim_end().trim_end_matches("```").trim()
}

/// The outermost span delimited by `open` and `close`, if any.
pub fn outermost(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    (end > start).then(|| &raw[start..=end])
}

/// Strip fences, then cut surrounding prose down to the JSON value.
pub fn json_payload(raw: &str) -> &str {
    let unfenced = strip_code_fences(raw);
    if unfenced.starts_with('[') || unfenced.starts_with('{') {
        return unfenced;
    }
    outermost(unfenced, '[', ']')
        .or_else(|| outermost(unfenced, '{', '}'))
        .unwrap_or(unfenced)
}
