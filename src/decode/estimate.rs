//! One pass over the raw text that bounds every arena region before parsing.

use memchr::{memchr2, memchr_iter, memmem};

use crate::arena::Capacity;
use crate::constants::{CAPACITY_SLACK, TRIPLE_QUOTE};
use crate::text::string::trim_bounds;

use super::scan::lines;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Estimate {
    /// Lines that may open a node: `-` items and lines ending in `:`.
    pub openers: usize,
    /// Lines carrying a `:` or `=` separator.
    pub entries: usize,
    pub commas: usize,
    /// `"""` blocks; their content is skipped by the other counters.
    pub blocks: usize,
}

impl Estimate {
    pub fn capacity(&self) -> Capacity {
        let tokens = self.commas + self.entries + CAPACITY_SLACK;
        Capacity {
            nodes: self.openers + CAPACITY_SLACK,
            entries: self.entries + self.openers + CAPACITY_SLACK,
            floats: tokens,
            ints: tokens,
            strings: tokens + self.blocks,
        }
    }
}

pub fn estimate(input: &str) -> Estimate {
    let bytes = input.as_bytes();
    let mut counts = Estimate::default();
    let mut in_block = false;
    // Set after a value ending in `,`: the next non-blank line is array text, whatever it holds.
    let mut continuing = false;

    for line in lines(bytes) {
        let raw = &bytes[line.start..line.end];
        if in_block {
            if memmem::find(raw, TRIPLE_QUOTE).is_some() {
                in_block = false;
            }
            continue;
        }
        let (start, end) = trim_bounds(bytes, line.start, line.end);
        if start == end {
            continuing = false;
            continue;
        }
        if continuing {
            counts.commas += memchr_iter(b',', raw).count();
            continuing = bytes[end - 1] == b',';
            continue;
        }
        if bytes[start] == b'#' {
            continue;
        }

        let mut body = start;
        if bytes[start] == b'-' {
            counts.openers += 1;
            body = trim_bounds(bytes, start + 1, end).0;
        }
        if bytes[end - 1] == b':' {
            counts.openers += 1;
        }

        if let Some(sep) = memchr2(b':', b'=', &bytes[body..end]) {
            counts.entries += 1;
            continuing = bytes[end - 1] == b',';
            let (rhs, _) = trim_bounds(bytes, body + sep + 1, end);
            if bytes[rhs..end].starts_with(TRIPLE_QUOTE) {
                counts.blocks += 1;
                if memmem::find(&bytes[rhs + TRIPLE_QUOTE.len()..end], TRIPLE_QUOTE).is_none() {
                    in_block = true;
                }
                continue;
            }
        }

        counts.commas += memchr_iter(b',', raw).count();
    }

    tracing::trace!(
        openers = counts.openers,
        entries = counts.entries,
        commas = counts.commas,
        blocks = counts.blocks,
        "estimated document size"
    );
    counts
}
