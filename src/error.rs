use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Tab in leading whitespace, unsupported unit, or a width that is not a multiple of it.
    Indentation,
    /// Section header whose name starts with a digit.
    InvalidName,
    DuplicateSection,
    DepthLimit,
    /// Bad magic, version, endian marker, or out-of-bounds section/record in a binary blob.
    Format,
    Checksum,
    Encode,
    Io,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStage {
    Parse,
    Encode,
    Decode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Location {
    /// Resolves a byte offset into a 1-based line and column.
    pub fn from_offset(input: &str, offset: usize) -> Self {
        let offset = offset.min(input.len());
        let head = &input.as_bytes()[..offset];
        let line = memchr::memchr_iter(b'\n', head).count() + 1;
        let line_start = memchr::memrchr(b'\n', head).map_or(0, |idx| idx + 1);
        Self {
            offset,
            line,
            column: offset - line_start + 1,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {} col {}", self.line, self.column)
    }
}

#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub stage: ErrorStage,
    pub message: String,
    pub location: Option<Location>,
}

impl Error {
    pub fn parse(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            stage: ErrorStage::Parse,
            message: message.into(),
            location: None,
        }
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Encode,
            stage: ErrorStage::Encode,
            message: message.into(),
            location: None,
        }
    }

    pub fn format(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Format,
            stage: ErrorStage::Decode,
            message: message.into(),
            location: None,
        }
    }

    pub fn checksum(stored: u32, computed: u32) -> Self {
        Self {
            kind: ErrorKind::Checksum,
            stage: ErrorStage::Decode,
            message: format!("checksum mismatch: stored {stored:#010x}, computed {computed:#010x}"),
            location: None,
        }
    }

    pub fn io(stage: ErrorStage, err: &std::io::Error) -> Self {
        Self {
            kind: ErrorKind::Io,
            stage,
            message: format!("io failed: {err}"),
            location: None,
        }
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(location) => write!(f, "{location}: {}", self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for Error {}

/// Why a typed getter did not produce a value. Never fatal to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("key not found")]
    Missing,
    #[error("value has a different type")]
    Mismatch,
}
