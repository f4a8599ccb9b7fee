//! Cleanup of raw generator output.

fn is_language_tag(line: &str) -> bool {
    line.chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+' | '.'))
}

/// Remove a surrounding markdown code fence, with or without a language tag.
pub fn strip_markdown_fences(text: &str) -> String {
    let mut code = text.trim();
    if let Some(rest) = code.strip_prefix("```") {
        code = match rest.split_once('\n') {
            Some((tag, body)) if is_language_tag(tag.trim()) => body,
            _ => rest,
        };
    }
    if let Some(rest) = code.trim_end().strip_suffix("```") {
        code = rest;
    }
    code.trim().to_string()
}
