pub const KEYWORDS: &[&str] = &["true", "false"];

pub const DEFAULT_INDENT: usize = 2;

/// Indentation widths a document may establish on its first indented line.
pub const INDENT_UNITS: &[usize] = &[2, 4];

pub const MAX_DEPTH: usize = 64;

/// Added to every estimated capacity.
pub const CAPACITY_SLACK: usize = 4;

pub const TRIPLE_QUOTE: &[u8] = b"\"\"\"";

#[inline]
pub fn is_keyword(s: &str) -> bool {
    KEYWORDS.contains(&s)
}

#[inline]
pub fn is_indent_unit(width: usize) -> bool {
    INDENT_UNITS.contains(&width)
}
