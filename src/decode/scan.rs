use memchr::memchr;

use crate::constants::is_indent_unit;
use crate::{Error, ErrorKind};

/// One physical line. `end` excludes the newline and a preceding `\r`; `next` is the offset
/// of the following line (or the input length).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RawLine {
    pub start: usize,
    pub end: usize,
    pub next: usize,
}

pub fn line_at(bytes: &[u8], start: usize) -> RawLine {
    let (mut end, next) = match memchr(b'\n', &bytes[start..]) {
        Some(idx) => (start + idx, start + idx + 1),
        None => (bytes.len(), bytes.len()),
    };
    if end > start && bytes[end - 1] == b'\r' {
        end -= 1;
    }
    RawLine { start, end, next }
}

pub fn lines(bytes: &[u8]) -> Lines<'_> {
    Lines { bytes, pos: 0 }
}

pub struct Lines<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Iterator for Lines<'_> {
    type Item = RawLine;

    fn next(&mut self) -> Option<RawLine> {
        if self.pos >= self.bytes.len() {
            return None;
        }
        let line = line_at(self.bytes, self.pos);
        self.pos = line.next;
        Some(line)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Indented {
    pub depth: usize,
    /// Offset of the first byte after the leading spaces.
    pub content: usize,
}

/// Tracks the indentation unit, fixed by the first indented line.
#[derive(Debug, Default)]
pub struct Indentation {
    unit: Option<usize>,
}

impl Indentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn unit(&self) -> Option<usize> {
        self.unit
    }

    /// Measures a structural line. Errors carry the offending offset.
    pub fn measure(
        &mut self,
        bytes: &[u8],
        line: RawLine,
    ) -> std::result::Result<Indented, (Error, usize)> {
        let mut spaces = 0;
        let mut idx = line.start;
        while idx < line.end {
            match bytes[idx] {
                b' ' => spaces += 1,
                b'\t' => {
                    return Err((
                        Error::parse(ErrorKind::Indentation, "tabs not allowed in indentation"),
                        idx,
                    ))
                }
                _ => break,
            }
            idx += 1;
        }
        if spaces == 0 {
            return Ok(Indented {
                depth: 0,
                content: idx,
            });
        }
        let unit = match self.unit {
            Some(unit) => unit,
            None => {
                if !is_indent_unit(spaces) {
                    return Err((
                        Error::parse(
                            ErrorKind::Indentation,
                            format!("indentation unit must be 2 or 4 spaces, found {spaces}"),
                        ),
                        line.start,
                    ));
                }
                self.unit = Some(spaces);
                spaces
            }
        };
        if spaces % unit != 0 {
            return Err((
                Error::parse(
                    ErrorKind::Indentation,
                    format!("indentation of {spaces} is not a multiple of {unit}"),
                ),
                line.start,
            ));
        }
        Ok(Indented {
            depth: spaces / unit,
            content: idx,
        })
    }
}
