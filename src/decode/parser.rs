use smallvec::SmallVec;

use crate::arena::{name_hash, Arena, KeyValue, Node, NodeId, Run, Span};
use crate::text::string::{is_blank, is_comment};
use crate::{Error, ErrorKind, Location, ParseOptions, Result};

use super::classify::{classify, classify_entry, starts_with_digit, LineKind};
use super::estimate::estimate;
use super::scan::{line_at, Indentation, RawLine};
use super::typer::type_value;

/// Everything a text document keeps besides the borrowed input.
#[derive(Debug)]
pub struct Parsed {
    pub arena: Arena,
    pub root_entries: Run,
    pub indent_unit: Option<usize>,
}

pub fn parse_into(input: &str, options: &ParseOptions) -> Result<Parsed> {
    check_len(input.len())?;
    TreeBuilder::new(input, options).run()
}

/// Spans and runs are 32-bit, so longer inputs cannot be addressed.
fn check_len(len: usize) -> Result<()> {
    if len > u32::MAX as usize {
        return Err(Error::parse(
            ErrorKind::Format,
            format!("input of {len} bytes exceeds the 4 GiB limit"),
        ));
    }
    Ok(())
}

/// An open ancestor. Entries are buffered here and committed as one run on close.
struct Frame {
    depth: usize,
    node: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    pending: SmallVec<[KeyValue; 8]>,
}

impl Frame {
    fn new(depth: usize, node: Option<NodeId>) -> Self {
        Self {
            depth,
            node,
            first_child: None,
            last_child: None,
            pending: SmallVec::new(),
        }
    }
}

struct TreeBuilder<'a> {
    input: &'a str,
    arena: Arena,
    /// Top-level entries and children; committed after every node.
    root: Frame,
    stack: SmallVec<[Frame; 16]>,
    indentation: Indentation,
    max_depth: usize,
}

impl<'a> TreeBuilder<'a> {
    fn new(input: &'a str, options: &ParseOptions) -> Self {
        let capacity = estimate(input).capacity();
        Self {
            input,
            arena: Arena::with_capacity(capacity),
            root: Frame::new(0, None),
            stack: SmallVec::new(),
            indentation: Indentation::new(),
            max_depth: options.max_depth,
        }
    }

    fn run(mut self) -> Result<Parsed> {
        let bytes = self.input.as_bytes();
        let mut pos = 0;
        while pos < bytes.len() {
            let line = line_at(bytes, pos);
            pos = line.next;
            let raw = &bytes[line.start..line.end];
            if is_blank(raw) || is_comment(raw) {
                continue;
            }
            let indented = self
                .indentation
                .measure(bytes, line)
                .map_err(|(err, offset)| self.locate(err, offset))?;
            let depth = indented.depth;
            self.close_to(depth);

            match classify(bytes, indented.content, line.end) {
                LineKind::ListItem { rest: (start, end) } => {
                    self.open_node(depth, Span::default(), line.start)?;
                    if start < end {
                        pos = self.inline(depth, start, end, line, pos)?;
                    }
                }
                LineKind::Section { name } => self.open_section(depth, name)?,
                LineKind::Entry { key, value } => pos = self.entry(key, value, line),
                LineKind::Other => {}
            }
        }
        self.close_to(0);
        let root = std::mem::replace(&mut self.root, Frame::new(0, None));
        let root_entries = self.commit(root.pending);

        tracing::debug!(
            nodes = self.arena.nodes.len(),
            entries = self.arena.entries.len(),
            floats = self.arena.floats.len(),
            ints = self.arena.ints.len(),
            strings = self.arena.strings.len(),
            "parsed document"
        );
        Ok(Parsed {
            arena: self.arena,
            root_entries,
            indent_unit: self.indentation.unit(),
        })
    }

    /// The text after a `-` marker: an inline entry or an inline section header.
    fn inline(
        &mut self,
        depth: usize,
        start: usize,
        end: usize,
        line: RawLine,
        next: usize,
    ) -> Result<usize> {
        match classify_entry(self.input.as_bytes(), start, end) {
            LineKind::Entry { key, value } => Ok(self.entry(key, value, line)),
            LineKind::Section { name } => {
                self.open_section(depth + 1, name)?;
                Ok(next)
            }
            LineKind::ListItem { .. } | LineKind::Other => Ok(next),
        }
    }

    fn entry(&mut self, key: Span, value_start: usize, line: RawLine) -> usize {
        let typed = type_value(&mut self.arena, self.input, value_start, line.end, line.next);
        if typed.exhausted {
            tracing::debug!(offset = value_start, "unterminated block string runs to end of input");
        }
        self.top().pending.push(KeyValue {
            key,
            value: typed.value,
        });
        typed.next
    }

    fn open_section(&mut self, depth: usize, name: Span) -> Result<()> {
        let bytes = self.input.as_bytes();
        if starts_with_digit(bytes, name) {
            return Err(self.locate(
                Error::parse(
                    ErrorKind::InvalidName,
                    format!("section name `{}` starts with a digit", &self.input[name.range()]),
                ),
                name.offset as usize,
            ));
        }
        let hash = name_hash(&bytes[name.range()]);
        let mut sibling = self.stack.last().unwrap_or(&self.root).first_child;
        while let Some(id) = sibling {
            let node = &self.arena.nodes[id.index()];
            if node.hash == hash && bytes[node.name.range()] == bytes[name.range()] {
                return Err(self.locate(
                    Error::parse(
                        ErrorKind::DuplicateSection,
                        format!("duplicate section `{}`", &self.input[name.range()]),
                    ),
                    name.offset as usize,
                ));
            }
            sibling = node.next_sibling;
        }
        self.open_node(depth, name, name.offset as usize)
    }

    fn open_node(&mut self, depth: usize, name: Span, offset: usize) -> Result<()> {
        if self.stack.len() >= self.max_depth {
            return Err(self.locate(
                Error::parse(
                    ErrorKind::DepthLimit,
                    format!("nesting deeper than {} levels", self.max_depth),
                ),
                offset,
            ));
        }
        let hash = if name.is_empty() {
            0
        } else {
            name_hash(&self.input.as_bytes()[name.range()])
        };
        let frame = self.stack.last_mut().unwrap_or(&mut self.root);
        let id = self.arena.push_node(Node {
            name,
            hash,
            parent: frame.node,
            first_child: None,
            next_sibling: None,
            entries: Run::default(),
        });
        match frame.last_child {
            Some(last) => self.arena.node_mut(last).next_sibling = Some(id),
            None => {
                frame.first_child = Some(id);
                if let Some(parent) = frame.node {
                    self.arena.node_mut(parent).first_child = Some(id);
                }
            }
        }
        frame.last_child = Some(id);
        self.stack.push(Frame::new(depth, Some(id)));
        Ok(())
    }

    /// Closes every open node at `depth` or deeper.
    fn close_to(&mut self, depth: usize) {
        while self.stack.last().is_some_and(|frame| frame.depth >= depth) {
            let Some(frame) = self.stack.pop() else {
                break;
            };
            let run = self.commit(frame.pending);
            if let Some(id) = frame.node {
                self.arena.node_mut(id).entries = run;
            }
        }
    }

    fn commit(&mut self, pending: SmallVec<[KeyValue; 8]>) -> Run {
        let start = self.arena.entries.len();
        for entry in pending {
            self.arena.push_entry(entry);
        }
        Run::new(start, self.arena.entries.len() - start)
    }

    fn top(&mut self) -> &mut Frame {
        self.stack.last_mut().unwrap_or(&mut self.root)
    }

    fn locate(&self, err: Error, offset: usize) -> Error {
        err.at(Location::from_offset(self.input, offset))
    }
}
