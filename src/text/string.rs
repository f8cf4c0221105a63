use crate::constants::{is_keyword, TRIPLE_QUOTE};
use crate::num::number::{is_integer_text, looks_numeric};

/// Narrows `start..end` past leading and trailing ASCII whitespace (newlines included).
pub fn trim_bounds(bytes: &[u8], mut start: usize, mut end: usize) -> (usize, usize) {
    while start < end && bytes[start].is_ascii_whitespace() {
        start += 1;
    }
    while end > start && bytes[end - 1].is_ascii_whitespace() {
        end -= 1;
    }
    (start, end)
}

pub fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(|byte| byte.is_ascii_whitespace())
}

pub fn is_comment(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .find(|byte| !byte.is_ascii_whitespace())
        .is_some_and(|&byte| byte == b'#')
}

/// Inner bounds of a `"..."` token, or `None` when it is not wrapped in quotes.
pub fn unquote_bounds(bytes: &[u8], start: usize, end: usize) -> Option<(usize, usize)> {
    if end >= start + 2 && bytes[start] == b'"' && bytes[end - 1] == b'"' {
        Some((start + 1, end - 1))
    } else {
        None
    }
}

pub fn contains_triple_quote(bytes: &[u8]) -> bool {
    memchr::memmem::find(bytes, TRIPLE_QUOTE).is_some()
}

/// Leading spaces shared by every non-blank line; 0 when there are none.
pub fn common_indent(text: &str) -> usize {
    text.split('\n')
        .filter(|line| !is_blank(line.as_bytes()))
        .map(leading_spaces)
        .min()
        .unwrap_or(0)
}

pub fn leading_spaces(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// True when the text reads back as the same string without quotes.
pub fn is_bare_safe(value: &str) -> bool {
    let bytes = value.as_bytes();
    let (Some(&first), Some(&last)) = (bytes.first(), bytes.last()) else {
        return false;
    };
    if first.is_ascii_whitespace() || last.is_ascii_whitespace() {
        return false;
    }
    if matches!(first, b'"' | b'#' | b'-') {
        return false;
    }
    if is_keyword(value) || is_integer_text(bytes) || looks_numeric(bytes) {
        return false;
    }
    !bytes.iter().any(|byte| matches!(byte, b',' | b'\n' | b'\r'))
}

/// True when `"value"` reads back as `value` on a single line.
pub fn is_quote_safe(value: &str) -> bool {
    !value
        .as_bytes()
        .iter()
        .any(|byte| matches!(byte, b'"' | b',' | b'\n' | b'\r'))
}
