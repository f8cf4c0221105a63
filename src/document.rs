use crate::arena::{Arena, KeyValue, Node, NodeId, Run, Span};
use crate::decode::parser::Parsed;
use crate::tree::Tree;

/// A parsed text document. Names and most strings borrow from the source text; de-indented
/// block strings live in the arena.
#[derive(Debug)]
pub struct Document<'src> {
    text: &'src str,
    arena: Arena,
    root_entries: Run,
    indent_unit: Option<usize>,
}

impl<'src> Document<'src> {
    pub(crate) fn from_parsed(text: &'src str, parsed: Parsed) -> Self {
        Self {
            text,
            arena: parsed.arena,
            root_entries: parsed.root_entries,
            indent_unit: parsed.indent_unit,
        }
    }

    pub fn text(&self) -> &'src str {
        self.text
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }
}

impl Tree for Document<'_> {
    fn node_count(&self) -> usize {
        self.arena.nodes.len()
    }

    fn node(&self, id: NodeId) -> Node {
        self.arena.nodes[id.index()]
    }

    fn entry_count(&self) -> usize {
        self.arena.entries.len()
    }

    fn entry(&self, index: usize) -> KeyValue {
        self.arena.entries[index]
    }

    fn root_entries(&self) -> Run {
        self.root_entries
    }

    fn floats(&self) -> &[f64] {
        &self.arena.floats
    }

    fn ints(&self) -> &[i64] {
        &self.arena.ints
    }

    fn string_count(&self) -> usize {
        self.arena.strings.len()
    }

    fn string_span(&self, index: usize) -> Span {
        self.arena.strings[index]
    }

    fn source(&self) -> &[u8] {
        self.text.as_bytes()
    }

    fn appended(&self) -> &[u8] {
        self.arena.appended.as_bytes()
    }

    fn str_at(&self, span: Span) -> &str {
        let range = span.range();
        let len = self.text.len();
        if range.end <= len {
            &self.text[range]
        } else {
            &self.arena.appended[range.start - len..range.end - len]
        }
    }

    fn indent_unit(&self) -> Option<usize> {
        self.indent_unit
    }
}
