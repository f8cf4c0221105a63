//! Flat, index-linked storage for a parsed document.

mod hash;

pub use hash::name_hash;

/// Byte range into the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub offset: u32,
    pub len: u32,
}

impl Span {
    pub fn new(offset: usize, len: usize) -> Self {
        Self {
            offset: offset as u32,
            len: len as u32,
        }
    }

    pub fn from_bounds(start: usize, end: usize) -> Self {
        Self::new(start, end.saturating_sub(start))
    }

    pub fn range(self) -> std::ops::Range<usize> {
        let start = self.offset as usize;
        start..start + self.len as usize
    }

    pub fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// Contiguous run of records in one of the flat arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Run {
    pub start: u32,
    pub count: u32,
}

impl Run {
    pub fn new(start: usize, count: usize) -> Self {
        Self {
            start: start as u32,
            count: count as u32,
        }
    }

    pub fn range(self) -> std::ops::Range<usize> {
        let start = self.start as usize;
        start..start + self.count as usize
    }

    pub fn end(self) -> usize {
        self.start as usize + self.count as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn new(index: usize) -> Self {
        NodeId(index as u32)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    Float,
    Int,
    String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(Span),
    Array(ArrayKind, Run),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    /// Empty for anonymous list items.
    pub name: Span,
    pub hash: u32,
    pub parent: Option<NodeId>,
    pub first_child: Option<NodeId>,
    pub next_sibling: Option<NodeId>,
    pub entries: Run,
}

impl Node {
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyValue {
    pub key: Span,
    pub value: Value,
}

/// Upper bounds for every flat array of one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capacity {
    pub nodes: usize,
    pub entries: usize,
    pub floats: usize,
    pub ints: usize,
    pub strings: usize,
}

#[derive(Debug, Default)]
pub struct Arena {
    pub nodes: Vec<Node>,
    pub entries: Vec<KeyValue>,
    pub floats: Vec<f64>,
    pub ints: Vec<i64>,
    pub strings: Vec<Span>,
    /// Text that exists only after parsing, such as de-indented block strings. Spans into it
    /// are offset by the length of the source text.
    pub appended: String,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: Capacity) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity.nodes),
            entries: Vec::with_capacity(capacity.entries),
            floats: Vec::with_capacity(capacity.floats),
            ints: Vec::with_capacity(capacity.ints),
            strings: Vec::with_capacity(capacity.strings),
            appended: String::new(),
        }
    }

    pub fn push_node(&mut self, node: Node) -> NodeId {
        NodeId::new(push_bounded(&mut self.nodes, node, "nodes"))
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn push_entry(&mut self, entry: KeyValue) -> usize {
        push_bounded(&mut self.entries, entry, "entries")
    }

    pub fn push_float(&mut self, value: f64) -> usize {
        push_bounded(&mut self.floats, value, "floats")
    }

    pub fn push_int(&mut self, value: i64) -> usize {
        push_bounded(&mut self.ints, value, "ints")
    }

    pub fn push_string(&mut self, span: Span) -> usize {
        push_bounded(&mut self.strings, span, "strings")
    }

    /// Stores `text` after a source of `source_len` bytes. `None` when the combined text
    /// would no longer be addressable by a span.
    pub fn append_text(&mut self, source_len: usize, text: &str) -> Option<Span> {
        let offset = source_len + self.appended.len();
        if offset + text.len() > u32::MAX as usize {
            return None;
        }
        self.appended.push_str(text);
        Some(Span::new(offset, text.len()))
    }
}

fn push_bounded<T>(items: &mut Vec<T>, item: T, region: &'static str) -> usize {
    if items.len() == items.capacity() {
        tracing::warn!(region, len = items.len(), "arena estimate exceeded");
    }
    items.push(item);
    items.len() - 1
}
