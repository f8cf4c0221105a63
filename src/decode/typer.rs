//! Turns the right-hand side of an entry into a typed value.

use memchr::{memchr, memchr2_iter, memmem};
use smallvec::SmallVec;

use crate::arena::{Arena, ArrayKind, Run, Span, Value};
use crate::constants::TRIPLE_QUOTE;
use crate::num::number::{has_float_marker, parse_float, parse_int};
use crate::text::string::{common_indent, leading_spaces, trim_bounds, unquote_bounds};

use super::scan::line_at;

/// A typed value plus the offset where structural parsing resumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Typed {
    pub value: Value,
    pub next: usize,
    /// Set when the value ran to end of input (unterminated block).
    pub exhausted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Scalar {
    Int(i64),
    Float(f64),
    Text,
}

/// A classified array element. `text` is the token with surrounding quotes removed; it is
/// what the element becomes if the array ends up string-typed.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Token {
    text: Span,
    scalar: Scalar,
}

type TokenBuf = SmallVec<[Token; 16]>;

/// Types the value starting at `value_start` on the line ending at `line_end` (whose
/// successor starts at `line_next`).
pub fn type_value(
    arena: &mut Arena,
    input: &str,
    value_start: usize,
    line_end: usize,
    line_next: usize,
) -> Typed {
    let bytes = input.as_bytes();
    let (start, end) = trim_bounds(bytes, value_start, line_end);
    if start == end {
        return Typed {
            value: Value::None,
            next: line_next,
            exhausted: false,
        };
    }
    if bytes[start..end].starts_with(TRIPLE_QUOTE) {
        return read_block(arena, input, start + TRIPLE_QUOTE.len());
    }

    let (end, next) = if bytes[end - 1] == b',' {
        absorb_continuation(bytes, end, line_next)
    } else {
        (end, line_next)
    };

    let value = if memchr(b',', &bytes[start..end]).is_some() {
        type_array(arena, input, start, end)
    } else {
        type_scalar(input, start, end)
    };
    Typed {
        value,
        next,
        exhausted: false,
    }
}

/// Content between `"""` delimiters. One line break just inside each delimiter is dropped,
/// along with the spaces indenting the closing delimiter, and the indentation shared by the
/// content lines is removed.
fn read_block(arena: &mut Arena, input: &str, open_end: usize) -> Typed {
    let bytes = input.as_bytes();
    let mut content_start = open_end;
    if bytes[content_start..].starts_with(b"\r\n") {
        content_start += 2;
    } else if bytes[content_start..].starts_with(b"\n") {
        content_start += 1;
    }
    let opens_line = content_start > open_end;

    let Some(idx) = memmem::find(&bytes[content_start..], TRIPLE_QUOTE) else {
        return Typed {
            value: Value::String(Span::from_bounds(content_start, bytes.len())),
            next: bytes.len(),
            exhausted: true,
        };
    };
    let close = content_start + idx;
    let content_end = block_end(bytes, content_start, close, opens_line);
    Typed {
        value: Value::String(dedent(arena, input, content_start, content_end, opens_line)),
        next: line_at(bytes, close + TRIPLE_QUOTE.len()).next,
        exhausted: false,
    }
}

/// End of block content whose closing `"""` sits at `close`. A closing delimiter on its own
/// line takes its indentation and the preceding line break with it.
fn block_end(bytes: &[u8], start: usize, close: usize, opens_line: bool) -> usize {
    let mut end = close;
    while end > start && matches!(bytes[end - 1], b' ' | b'\t') {
        end -= 1;
    }
    if end == start && opens_line {
        return start;
    }
    if end > start && bytes[end - 1] == b'\n' {
        end -= 1;
        if end > start && bytes[end - 1] == b'\r' {
            end -= 1;
        }
        return end;
    }
    close
}

/// Strips the shared indentation of the lines that start inside the block. The first line
/// only counts when the opening delimiter ended its own line.
fn dedent(arena: &mut Arena, input: &str, start: usize, end: usize, opens_line: bool) -> Span {
    let content = &input[start..end];
    let first = if opens_line {
        0
    } else {
        memchr(b'\n', content.as_bytes()).map_or(content.len(), |idx| idx + 1)
    };
    let indent = common_indent(&content[first..]);
    if indent == 0 {
        return Span::from_bounds(start, end);
    }

    let mut text = String::with_capacity(content.len());
    text.push_str(&content[..first]);
    for (i, line) in content[first..].split('\n').enumerate() {
        if i > 0 {
            text.push('\n');
        }
        text.push_str(&line[leading_spaces(line).min(indent)..]);
    }
    arena
        .append_text(input.len(), &text)
        .unwrap_or_else(|| Span::from_bounds(start, end))
}

/// Extends a value ending in `,` over following lines. Returns the new value end and the
/// offset of the first unconsumed line.
fn absorb_continuation(bytes: &[u8], mut end: usize, mut cursor: usize) -> (usize, usize) {
    while cursor < bytes.len() {
        let line = line_at(bytes, cursor);
        let (start, trimmed_end) = trim_bounds(bytes, line.start, line.end);
        if start == trimmed_end {
            break;
        }
        end = trimmed_end;
        cursor = line.next;
        if bytes[trimmed_end - 1] != b',' {
            break;
        }
    }
    (end, cursor)
}

fn type_scalar(input: &str, start: usize, end: usize) -> Value {
    let token = &input[start..end];
    match token {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Some(value) = parse_int(token) {
        return Value::Int(value);
    }
    if let Some(value) = parse_float(token) {
        return Value::Float(value);
    }
    let (start, end) = unquote_bounds(input.as_bytes(), start, end).unwrap_or((start, end));
    Value::String(Span::from_bounds(start, end))
}

fn type_array(arena: &mut Arena, input: &str, start: usize, end: usize) -> Value {
    let tokens = split_tokens(input, start, end);

    let kind = if tokens.iter().any(|token| token.scalar == Scalar::Text) {
        ArrayKind::String
    } else if tokens
        .iter()
        .any(|token| matches!(token.scalar, Scalar::Float(_)))
    {
        ArrayKind::Float
    } else {
        ArrayKind::Int
    };

    let first = match kind {
        ArrayKind::Float => arena.floats.len(),
        ArrayKind::Int => arena.ints.len(),
        ArrayKind::String => arena.strings.len(),
    };
    for token in &tokens {
        match (kind, token.scalar) {
            (ArrayKind::String, _) => {
                arena.push_string(token.text);
            }
            (ArrayKind::Float, Scalar::Float(value)) => {
                arena.push_float(value);
            }
            (ArrayKind::Float, Scalar::Int(value)) => {
                arena.push_float(value as f64);
            }
            (ArrayKind::Int, Scalar::Int(value)) => {
                arena.push_int(value);
            }
            (ArrayKind::Int, _) | (ArrayKind::Float, Scalar::Text) => {
                unreachable!("array kind is chosen from its tokens")
            }
        }
    }
    Value::Array(kind, Run::new(first, tokens.len()))
}

/// Splits on commas outside quotes. Any `"` toggles the quoted state; there are no escapes.
fn split_tokens(input: &str, start: usize, end: usize) -> TokenBuf {
    let bytes = input.as_bytes();
    let mut tokens = TokenBuf::new();
    let mut token_start = start;
    let mut in_quotes = false;
    for idx in memchr2_iter(b',', b'"', &bytes[start..end]) {
        let idx = start + idx;
        if bytes[idx] == b'"' {
            in_quotes = !in_quotes;
        } else if !in_quotes {
            tokens.extend(classify_token(input, token_start, idx));
            token_start = idx + 1;
        }
    }
    tokens.extend(classify_token(input, token_start, end));
    tokens
}

fn classify_token(input: &str, start: usize, end: usize) -> Option<Token> {
    let bytes = input.as_bytes();
    let (start, end) = trim_bounds(bytes, start, end);
    if start == end {
        return None;
    }
    if let Some((inner_start, inner_end)) = unquote_bounds(bytes, start, end) {
        return Some(Token {
            text: Span::from_bounds(inner_start, inner_end),
            scalar: Scalar::Text,
        });
    }
    let text = &input[start..end];
    let int = if has_float_marker(text.as_bytes()) {
        None
    } else {
        parse_int(text)
    };
    let scalar = match (int, parse_float(text)) {
        (Some(value), _) => Scalar::Int(value),
        (None, Some(value)) => Scalar::Float(value),
        (None, None) => Scalar::Text,
    };
    Some(Token {
        text: Span::from_bounds(start, end),
        scalar,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(input: &str) -> (Arena, Typed) {
        let mut arena = Arena::new();
        let line = line_at(input.as_bytes(), 0);
        let typed = type_value(&mut arena, input, 0, line.end, line.next);
        (arena, typed)
    }

    fn string_of<'a>(input: &'a str, value: Value) -> &'a str {
        match value {
            Value::String(span) => &input[span.range()],
            other => panic!("expected string, got {other:?}"),
        }
    }

    fn block_text(input: &str) -> (String, Typed) {
        let (arena, typed) = typed(input);
        let Value::String(span) = typed.value else {
            panic!("expected string, got {:?}", typed.value);
        };
        let text = if span.range().end <= input.len() {
            input[span.range()].to_owned()
        } else {
            let start = span.offset as usize - input.len();
            arena.appended[start..start + span.len as usize].to_owned()
        };
        (text, typed)
    }

    #[rstest::rstest]
    #[case("true", Value::Bool(true))]
    #[case(" false ", Value::Bool(false))]
    #[case("934784", Value::Int(934784))]
    #[case("-12", Value::Int(-12))]
    #[case("2.5", Value::Float(2.5))]
    #[case("1e3", Value::Float(1000.0))]
    #[case("99999999999999999999", Value::Float(1e20))]
    #[case("   ", Value::None)]
    fn test_scalars(#[case] input: &str, #[case] expected: Value) {
        assert_eq!(typed(input).1.value, expected);
    }

    #[rstest::rstest]
    #[case("\"quoted text\"", "quoted text")]
    #[case("bare words", "bare words")]
    #[case("True", "True")]
    #[case("inf", "inf")]
    #[case("\"", "\"")]
    fn test_string_scalars(#[case] input: &str, #[case] expected: &str) {
        let (_, typed) = typed(input);
        assert_eq!(string_of(input, typed.value), expected);
    }

    #[rstest::rstest]
    fn test_int_array() {
        let (arena, typed) = typed("10, 20, -1");
        assert_eq!(typed.value, Value::Array(ArrayKind::Int, Run::new(0, 3)));
        assert_eq!(arena.ints, vec![10, 20, -1]);
        assert!(arena.floats.is_empty());
    }

    #[rstest::rstest]
    fn test_mixed_numbers_promote_to_float() {
        let (arena, typed) = typed("1, 2.5, 3");
        assert_eq!(typed.value, Value::Array(ArrayKind::Float, Run::new(0, 3)));
        assert_eq!(arena.floats, vec![1.0, 2.5, 3.0]);
        assert!(arena.ints.is_empty());
    }

    #[rstest::rstest]
    fn test_any_text_makes_string_array() {
        let input = "1, two, 3.5, \"four\"";
        let (arena, typed) = typed(input);
        assert_eq!(typed.value, Value::Array(ArrayKind::String, Run::new(0, 4)));
        let items: Vec<&str> = arena.strings.iter().map(|span| &input[span.range()]).collect();
        assert_eq!(items, vec!["1", "two", "3.5", "four"]);
        assert!(arena.ints.is_empty());
        assert!(arena.floats.is_empty());
    }

    #[rstest::rstest]
    fn test_quoted_commas_stay_in_token() {
        let input = "\"a,b\", c";
        let (arena, typed) = typed(input);
        assert_eq!(typed.value, Value::Array(ArrayKind::String, Run::new(0, 2)));
        assert_eq!(&input[arena.strings[0].range()], "a,b");
        assert_eq!(&input[arena.strings[1].range()], "c");
    }

    #[rstest::rstest]
    fn test_quote_toggle_quirk_swallows_commas() {
        // An unbalanced quote hides every later comma.
        let input = "a\"b, c, d";
        let (arena, typed) = typed(input);
        assert_eq!(typed.value, Value::Array(ArrayKind::String, Run::new(0, 1)));
        assert_eq!(&input[arena.strings[0].range()], "a\"b, c, d");
    }

    #[rstest::rstest]
    fn test_continuation_until_line_without_comma() {
        let input = "1, 2,\n  3, 4,\n  5\nnext: 1";
        let (arena, typed) = typed(input);
        assert_eq!(typed.value, Value::Array(ArrayKind::Int, Run::new(0, 5)));
        assert_eq!(arena.ints, vec![1, 2, 3, 4, 5]);
        assert_eq!(&input[typed.next..], "next: 1");
    }

    #[rstest::rstest]
    fn test_continuation_stops_at_blank_line() {
        let input = "1,\n2,\n\nx: 1";
        let (arena, typed) = typed(input);
        assert_eq!(arena.ints, vec![1, 2]);
        assert_eq!(&input[typed.next..], "\nx: 1");
    }

    #[rstest::rstest]
    fn test_continuation_runs_to_end_of_input() {
        let (arena, typed) = typed("1,\n2,");
        assert_eq!(typed.value, Value::Array(ArrayKind::Int, Run::new(0, 2)));
        assert_eq!(arena.ints, vec![1, 2]);
        assert_eq!(typed.next, 5);
    }

    #[rstest::rstest]
    fn test_block_string_strips_adjacent_newlines() {
        let input = "\"\"\"\nline one\n  line two\n\"\"\"\nafter: 1";
        let (_, typed) = typed(input);
        assert_eq!(string_of(input, typed.value), "line one\n  line two");
        assert_eq!(&input[typed.next..], "after: 1");
        assert!(!typed.exhausted);
    }

    #[rstest::rstest]
    fn test_block_string_on_one_line() {
        let input = "\"\"\"inline, text\"\"\" ignored\nnext: 2";
        let (_, typed) = typed(input);
        assert_eq!(string_of(input, typed.value), "inline, text");
        assert_eq!(&input[typed.next..], "next: 2");
    }

    #[rstest::rstest]
    fn test_unterminated_block_takes_rest_of_input() {
        let input = "\"\"\"\nnever\nclosed: 1\n";
        let (_, typed) = typed(input);
        assert_eq!(string_of(input, typed.value), "never\nclosed: 1\n");
        assert!(typed.exhausted);
        assert_eq!(typed.next, input.len());
    }

    #[rstest::rstest]
    #[case("\"\"\"\n    line one\n      line two\n    \"\"\"\nafter: 1", "line one\n  line two")]
    #[case("\"\"\"\n    line one\n\n    line three\n    \"\"\"", "line one\n\nline three")]
    #[case("\"\"\"\n  kept\n\"\"\"", "kept")]
    #[case("\"\"\"\n    \"\"\"", "")]
    #[case("\"\"\"first\n    second\n    \"\"\"", "first\nsecond")]
    #[case("\"\"\"  padded  \"\"\"", "  padded  ")]
    fn test_block_string_is_dedented(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(block_text(input).0, expected);
    }

    #[rstest::rstest]
    fn test_dedented_block_lives_after_source() {
        let input = "\"\"\"\n  a\n  b\n  \"\"\"\nnext: 1";
        let (text, typed) = block_text(input);
        assert_eq!(text, "a\nb");
        assert_eq!(typed.value, Value::String(Span::new(input.len(), 3)));
        assert_eq!(&input[typed.next..], "next: 1");
    }

    #[rstest::rstest]
    fn test_crlf_block() {
        let input = "\"\"\"\r\nwindows\r\n\"\"\"\r\n";
        let (_, typed) = typed(input);
        assert_eq!(string_of(input, typed.value), "windows");
    }
}
