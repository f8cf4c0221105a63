use crate::constants::{DEFAULT_INDENT, MAX_DEPTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indent {
    Spaces(usize),
}

impl Indent {
    pub fn spaces(count: usize) -> Self {
        Indent::Spaces(count)
    }

    pub fn get_spaces(self) -> usize {
        let Indent::Spaces(count) = self;
        count
    }
}

impl Default for Indent {
    fn default() -> Self {
        Indent::Spaces(DEFAULT_INDENT)
    }
}

#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Deepest section/list nesting accepted before the load fails.
    pub max_depth: usize,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EncodeOptions {
    /// When false the checksum field is left at zero, which readers accept unverified.
    pub checksum: bool,
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_checksum(mut self, checksum: bool) -> Self {
        self.checksum = checksum;
        self
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self { checksum: true }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WriteOptions {
    pub indent: Indent,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_indent(mut self, indent: Indent) -> Self {
        self.indent = indent;
        self
    }
}
