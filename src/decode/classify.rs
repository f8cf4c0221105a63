use memchr::memchr2;

use crate::arena::Span;
use crate::text::string::trim_bounds;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    /// `-` marker; `rest` is the trimmed remainder, possibly empty.
    ListItem { rest: (usize, usize) },
    /// `name:` with nothing after the colon.
    Section { name: Span },
    /// `key: value` / `key = value`; `value` is the offset just past the separator.
    Entry { key: Span, value: usize },
    /// No separator, or an empty name.
    Other,
}

/// Classifies the content of a structural line, `start..end` already past indentation.
pub fn classify(bytes: &[u8], start: usize, end: usize) -> LineKind {
    let (start, end) = trim_bounds(bytes, start, end);
    if start < end && bytes[start] == b'-' {
        return LineKind::ListItem {
            rest: trim_bounds(bytes, start + 1, end),
        };
    }
    classify_entry(bytes, start, end)
}

/// Classifies text that cannot be a list item: the body of a line or the inline part of one.
pub fn classify_entry(bytes: &[u8], start: usize, end: usize) -> LineKind {
    let Some(idx) = memchr2(b':', b'=', &bytes[start..end]) else {
        return LineKind::Other;
    };
    let sep = start + idx;
    let (key_start, key_end) = trim_bounds(bytes, start, sep);
    if key_start == key_end {
        return LineKind::Other;
    }
    let key = Span::from_bounds(key_start, key_end);
    let (value_start, value_end) = trim_bounds(bytes, sep + 1, end);
    if bytes[sep] == b':' && value_start == value_end {
        return LineKind::Section { name: key };
    }
    LineKind::Entry {
        key,
        value: sep + 1,
    }
}

pub fn starts_with_digit(bytes: &[u8], name: Span) -> bool {
    bytes
        .get(name.offset as usize)
        .is_some_and(|byte| byte.is_ascii_digit())
}
