//! BTML: a flat little-endian image of a parsed document.
//!
//! ```text
//! header   64 bytes   magic, version, unit, endian marker, 6 counts, 6 offsets, crc32
//! nodes    32 bytes   name off/len, hash, parent, first child, next sibling, entry start/count
//! entries  32 bytes   key off/len, tag, pool flags, reserved, payload u64 x2
//! floats    8 bytes
//! ints      8 bytes
//! strings   8 bytes   text off/len
//! text      1 byte    the document text, then any appended block text
//! ```

mod decode;
mod encode;

pub use decode::BinaryDocument;
pub use encode::encode;

use std::ops::Range;
use std::path::Path;

use crate::tree::Tree;
use crate::{EncodeOptions, Error, ErrorStage, Result};

pub const MAGIC: &[u8; 4] = b"BTML";
pub const VERSION: u16 = 1;
pub const ENDIAN_MARKER: u32 = 0x0102_0304;
pub const HEADER_LEN: usize = 64;
pub const CHECKSUM_OFFSET: usize = 60;

const COUNTS_OFFSET: usize = 12;
const OFFSETS_OFFSET: usize = 36;

/// Link value for an absent parent, child or sibling.
const ABSENT: i32 = -1;

const TAG_NONE: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_INT: u8 = 2;
const TAG_FLOAT: u8 = 3;
const TAG_STRING: u8 = 4;
const TAG_ARRAY: u8 = 5;

const POOL_FLOAT: u8 = 1 << 0;
const POOL_INT: u8 = 1 << 1;
const POOL_STRING: u8 = 1 << 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Nodes,
    Entries,
    Floats,
    Ints,
    Strings,
    Text,
}

impl Section {
    pub const ALL: [Section; 6] = [
        Section::Nodes,
        Section::Entries,
        Section::Floats,
        Section::Ints,
        Section::Strings,
        Section::Text,
    ];

    pub fn record_len(self) -> usize {
        match self {
            Section::Nodes | Section::Entries => 32,
            Section::Floats | Section::Ints | Section::Strings => 8,
            Section::Text => 1,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub version: u16,
    /// Indentation unit of the source text, 0 when it had no indented line.
    pub indent_unit: u8,
    pub counts: [u32; 6],
    pub offsets: [u32; 6],
    pub checksum: u32,
}

impl Header {
    pub fn count(&self, section: Section) -> usize {
        self.counts[section.index()] as usize
    }

    pub fn offset(&self, section: Section) -> usize {
        self.offsets[section.index()] as usize
    }

    /// Byte range of a section, `None` on arithmetic overflow.
    pub fn section(&self, section: Section) -> Option<Range<usize>> {
        let start = self.offset(section);
        let len = self.count(section).checked_mul(section.record_len())?;
        Some(start..start.checked_add(len)?)
    }

    fn write(&self, out: &mut [u8]) {
        out[0..4].copy_from_slice(MAGIC);
        put_u16(out, 4, self.version);
        put_u16(out, 6, u16::from(self.indent_unit));
        put_u32(out, 8, ENDIAN_MARKER);
        for (i, (count, offset)) in self.counts.iter().zip(&self.offsets).enumerate() {
            put_u32(out, COUNTS_OFFSET + 4 * i, *count);
            put_u32(out, OFFSETS_OFFSET + 4 * i, *offset);
        }
        put_u32(out, CHECKSUM_OFFSET, self.checksum);
    }

    /// Reads and checks the fixed fields; section bounds are checked by the caller.
    pub fn read(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_LEN {
            return Err(Error::format(format!(
                "truncated header: {} bytes, need {HEADER_LEN}",
                buf.len()
            )));
        }
        if &buf[0..4] != MAGIC {
            return Err(Error::format("bad magic, not a BTML blob"));
        }
        let version = get_u16(buf, 4);
        if version != VERSION {
            return Err(Error::format(format!("unsupported version {version}")));
        }
        let marker = get_u32(buf, 8);
        if marker != ENDIAN_MARKER {
            return Err(Error::format(format!("bad endian marker {marker:#010x}")));
        }
        let mut counts = [0; 6];
        let mut offsets = [0; 6];
        for i in 0..6 {
            counts[i] = get_u32(buf, COUNTS_OFFSET + 4 * i);
            offsets[i] = get_u32(buf, OFFSETS_OFFSET + 4 * i);
        }
        Ok(Self {
            version,
            indent_unit: (get_u16(buf, 6) & 0xff) as u8,
            counts,
            offsets,
            checksum: get_u32(buf, CHECKSUM_OFFSET),
        })
    }
}

/// CRC-32 of the whole blob as if its checksum field were zero.
pub fn checksum(buf: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(&buf[..CHECKSUM_OFFSET]);
    hasher.update(&[0; 4]);
    hasher.update(&buf[CHECKSUM_OFFSET + 4..]);
    hasher.finalize()
}

pub fn write_binary_file<T: Tree + ?Sized>(
    path: impl AsRef<Path>,
    tree: &T,
    options: &EncodeOptions,
) -> Result<()> {
    let bytes = encode(tree, options)?;
    std::fs::write(path, bytes).map_err(|err| Error::io(ErrorStage::Encode, &err))
}

pub fn load_binary_file(path: impl AsRef<Path>) -> Result<BinaryDocument> {
    let bytes = std::fs::read(path).map_err(|err| Error::io(ErrorStage::Decode, &err))?;
    BinaryDocument::from_vec(bytes)
}

fn put_u16(out: &mut [u8], at: usize, value: u16) {
    out[at..at + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(out: &mut [u8], at: usize, value: u32) {
    out[at..at + 4].copy_from_slice(&value.to_le_bytes());
}

fn put_u64(out: &mut [u8], at: usize, value: u64) {
    out[at..at + 8].copy_from_slice(&value.to_le_bytes());
}

fn get_u16(buf: &[u8], at: usize) -> u16 {
    let mut bytes = [0; 2];
    bytes.copy_from_slice(&buf[at..at + 2]);
    u16::from_le_bytes(bytes)
}

fn get_u32(buf: &[u8], at: usize) -> u32 {
    let mut bytes = [0; 4];
    bytes.copy_from_slice(&buf[at..at + 4]);
    u32::from_le_bytes(bytes)
}

fn get_u64(buf: &[u8], at: usize) -> u64 {
    let mut bytes = [0; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(bytes)
}

fn get_i32(buf: &[u8], at: usize) -> i32 {
    get_u32(buf, at) as i32
}
