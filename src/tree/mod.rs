//! Read-only navigation shared by text-backed and binary-backed documents.
//!
//! A [`Tree`] implementor supplies raw storage access; every query below is a provided
//! method, so both document kinds answer identically.

mod iter;

pub use iter::{Children, Entries, StrArray};

use crate::arena::{name_hash, ArrayKind, KeyValue, Node, NodeId, Run, Span, Value};
use crate::LookupError;

/// A position in a tree: either a node or the virtual root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cursor(u32);

impl Cursor {
    pub const ROOT: Cursor = Cursor(u32::MAX);

    pub fn node(id: NodeId) -> Self {
        Cursor(id.index() as u32)
    }

    pub fn is_root(self) -> bool {
        self == Self::ROOT
    }

    pub fn id(self) -> Option<NodeId> {
        (!self.is_root()).then(|| NodeId::new(self.0 as usize))
    }
}

pub type Lookup<T> = std::result::Result<T, LookupError>;

pub trait Tree {
    fn node_count(&self) -> usize;

    fn node(&self, id: NodeId) -> Node;

    fn entry_count(&self) -> usize;

    fn entry(&self, index: usize) -> KeyValue;

    /// Entries of the virtual root; always the last run of the entry array.
    fn root_entries(&self) -> Run;

    fn floats(&self) -> &[f64];

    fn ints(&self) -> &[i64];

    fn string_count(&self) -> usize;

    fn string_span(&self, index: usize) -> Span;

    /// The document text spans point into.
    fn source(&self) -> &[u8];

    /// Text stored after [`source`](Tree::source), such as de-indented block strings. Spans
    /// that end past the source address it at `offset - source().len()`.
    fn appended(&self) -> &[u8] {
        &[]
    }

    fn str_at(&self, span: Span) -> &str;

    fn indent_unit(&self) -> Option<usize>;

    fn bytes_at(&self, span: Span) -> &[u8] {
        let source = self.source();
        let range = span.range();
        if range.end <= source.len() {
            &source[range]
        } else {
            &self.appended()[range.start - source.len()..range.end - source.len()]
        }
    }

    fn first_child(&self, cursor: Cursor) -> Option<NodeId> {
        match cursor.id() {
            Some(id) => self.node(id).first_child,
            None => (self.node_count() > 0).then(|| NodeId::new(0)),
        }
    }

    fn entry_run(&self, cursor: Cursor) -> Run {
        match cursor.id() {
            Some(id) => self.node(id).entries,
            None => self.root_entries(),
        }
    }

    fn children(&self, cursor: Cursor) -> Children<'_, Self> {
        Children::new(self, self.first_child(cursor))
    }

    fn child_count(&self, cursor: Cursor) -> usize {
        self.children(cursor).count()
    }

    /// The `n`th child in document order.
    fn child(&self, cursor: Cursor, n: usize) -> Option<Cursor> {
        self.children(cursor).nth(n)
    }

    fn find_child(&self, cursor: Cursor, name: &str) -> Option<Cursor> {
        let hash = name_hash(name.as_bytes());
        let mut next = self.first_child(cursor);
        while let Some(id) = next {
            let node = self.node(id);
            if node.hash == hash && self.bytes_at(node.name) == name.as_bytes() {
                return Some(Cursor::node(id));
            }
            next = node.next_sibling;
        }
        None
    }

    /// Follows a dot path from the root. All-digit segments are positional, anything else
    /// is a child name; the empty path is the root itself.
    fn resolve(&self, path: &str) -> Option<Cursor> {
        if path.is_empty() {
            return Some(Cursor::ROOT);
        }
        path.split('.').try_fold(Cursor::ROOT, |cursor, segment| {
            match segment.parse::<usize>() {
                Ok(n) if segment.bytes().all(|b| b.is_ascii_digit()) => self.child(cursor, n),
                _ => self.find_child(cursor, segment),
            }
        })
    }

    /// `None` for the root and for anonymous list items.
    fn name(&self, cursor: Cursor) -> Option<&str> {
        let node = self.node(cursor.id()?);
        (!node.is_anonymous()).then(|| self.str_at(node.name))
    }

    fn parent(&self, cursor: Cursor) -> Option<Cursor> {
        let node = self.node(cursor.id()?);
        Some(node.parent.map_or(Cursor::ROOT, Cursor::node))
    }

    fn entries(&self, cursor: Cursor) -> Entries<'_, Self> {
        Entries::new(self, self.entry_run(cursor))
    }

    fn has_key(&self, cursor: Cursor, key: &str) -> bool {
        self.value(cursor, key).is_ok()
    }

    /// First entry named `key`; later duplicates are shadowed.
    fn value(&self, cursor: Cursor, key: &str) -> Lookup<Value> {
        self.entry_run(cursor)
            .range()
            .map(|index| self.entry(index))
            .find(|entry| self.bytes_at(entry.key) == key.as_bytes())
            .map(|entry| entry.value)
            .ok_or(LookupError::Missing)
    }

    fn get_bool(&self, cursor: Cursor, key: &str) -> Lookup<bool> {
        match self.value(cursor, key)? {
            Value::Bool(value) => Ok(value),
            _ => Err(LookupError::Mismatch),
        }
    }

    /// Floats are truncated toward zero.
    fn get_int(&self, cursor: Cursor, key: &str) -> Lookup<i64> {
        match self.value(cursor, key)? {
            Value::Int(value) => Ok(value),
            Value::Float(value) => Ok(value as i64),
            _ => Err(LookupError::Mismatch),
        }
    }

    fn get_float(&self, cursor: Cursor, key: &str) -> Lookup<f64> {
        match self.value(cursor, key)? {
            Value::Float(value) => Ok(value),
            Value::Int(value) => Ok(value as f64),
            _ => Err(LookupError::Mismatch),
        }
    }

    fn get_str(&self, cursor: Cursor, key: &str) -> Lookup<&str> {
        match self.value(cursor, key)? {
            Value::String(span) => Ok(self.str_at(span)),
            _ => Err(LookupError::Mismatch),
        }
    }

    fn get_int_array(&self, cursor: Cursor, key: &str) -> Lookup<&[i64]> {
        match self.value(cursor, key)? {
            Value::Array(ArrayKind::Int, run) => Ok(&self.ints()[run.range()]),
            _ => Err(LookupError::Mismatch),
        }
    }

    fn get_float_array(&self, cursor: Cursor, key: &str) -> Lookup<&[f64]> {
        match self.value(cursor, key)? {
            Value::Array(ArrayKind::Float, run) => Ok(&self.floats()[run.range()]),
            _ => Err(LookupError::Mismatch),
        }
    }

    fn get_str_array(&self, cursor: Cursor, key: &str) -> Lookup<StrArray<'_, Self>> {
        match self.value(cursor, key)? {
            Value::Array(ArrayKind::String, run) => Ok(StrArray::new(self, run)),
            _ => Err(LookupError::Mismatch),
        }
    }

    fn array_len(&self, cursor: Cursor, key: &str) -> Lookup<usize> {
        match self.value(cursor, key)? {
            Value::Array(_, run) => Ok(run.count as usize),
            _ => Err(LookupError::Mismatch),
        }
    }
}
