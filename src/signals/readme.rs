//! README truncation

/// Default README character limit
pub const DEFAULT_README_LIMIT: usize = 5000;

/// Truncate `text` to at most `max_chars` characters without splitting a word.
///
/// Text that already fits is returned unchanged. Otherwise the cut falls on
/// the last whitespace inside the limit and trailing whitespace is dropped.
/// A single word longer than the limit yields an empty string.
pub fn truncate_at_word(text: &str, max_chars: usize) -> &str {
    let cut = match text.char_indices().nth(max_chars) {
        Some((idx, _)) => idx,
        None => return text,
    };

    let head = &text[..cut];
    let next_is_space = text[cut..].chars().next().is_some_and(char::is_whitespace);
    if next_is_space {
        return head.trim_end();
    }

    match head.rfind(char::is_whitespace) {
        Some(idx) => head[..idx].trim_end(),
        None => "",
    }
}
