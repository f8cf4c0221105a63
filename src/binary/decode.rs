use crate::arena::{ArrayKind, KeyValue, Node, NodeId, Run, Span, Value};
use crate::tree::Tree;
use crate::{Error, Result};

use super::{
    checksum, get_i32, get_u32, get_u64, Header, Section, ABSENT, HEADER_LEN, POOL_FLOAT,
    POOL_INT, TAG_ARRAY, TAG_BOOL, TAG_FLOAT, TAG_INT, TAG_STRING,
};

/// A document loaded from a BTML blob. Owns its bytes; every record was bounds-checked on load.
/// Text is checked for UTF-8 only when read, so unreadable text comes back empty.
#[derive(Debug, Clone)]
pub struct BinaryDocument {
    buf: Vec<u8>,
    header: Header,
    floats: Vec<f64>,
    ints: Vec<i64>,
    root_entries: Run,
}

impl BinaryDocument {
    /// Copies `bytes` and validates the copy.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_vec(bytes.to_vec())
    }

    pub fn from_vec(buf: Vec<u8>) -> Result<Self> {
        let header = Header::read(&buf)?;
        if header.checksum != 0 {
            let computed = checksum(&buf);
            if computed != header.checksum {
                return Err(Error::checksum(header.checksum, computed));
            }
        } else {
            tracing::debug!("checksum field is zero, skipping verification");
        }
        for section in Section::ALL {
            let range = header
                .section(section)
                .filter(|range| range.start >= HEADER_LEN && range.end <= buf.len())
                .ok_or_else(|| {
                    Error::format(format!("{section:?} section out of bounds"))
                })?;
            tracing::trace!(?section, start = range.start, end = range.end, "section");
        }

        let mut doc = Self {
            floats: read_pool(&buf, &header, Section::Floats, f64::from_bits),
            ints: read_pool(&buf, &header, Section::Ints, |bits| bits as i64),
            buf,
            header,
            root_entries: Run::default(),
        };
        doc.root_entries = doc.validate()?;

        tracing::debug!(
            nodes = doc.node_count(),
            entries = doc.entry_count(),
            bytes = doc.buf.len(),
            "decoded binary document"
        );
        Ok(doc)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    fn record(&self, section: Section, index: usize) -> usize {
        self.header.offset(section) + index * section.record_len()
    }

    /// Checks every record so accessors never go out of bounds; returns the root run.
    fn validate(&self) -> Result<Run> {
        let nodes = self.node_count();
        let entries = self.entry_count();

        let mut owned = 0usize;
        for index in 0..nodes {
            let at = self.record(Section::Nodes, index);
            self.check_span(Span {
                offset: get_u32(&self.buf, at),
                len: get_u32(&self.buf, at + 4),
            })
            .map_err(|err| at_record(err, "node", index))?;
            // Links only point backwards (parent) or forwards (child, sibling), so no walk can cycle.
            let parent = get_i32(&self.buf, at + 12);
            if parent != ABSENT && !(0..index as i64).contains(&i64::from(parent)) {
                return Err(at_record(Error::format("bad parent link"), "node", index));
            }
            for link in [get_i32(&self.buf, at + 16), get_i32(&self.buf, at + 20)] {
                if link != ABSENT && !(index as i64 + 1..nodes as i64).contains(&i64::from(link)) {
                    return Err(at_record(Error::format("bad child link"), "node", index));
                }
            }
            let run = Run {
                start: get_u32(&self.buf, at + 24),
                count: get_u32(&self.buf, at + 28),
            };
            if run.end() > entries {
                return Err(at_record(
                    Error::format("entry run out of bounds"),
                    "node",
                    index,
                ));
            }
            owned += run.count as usize;
        }
        if owned > entries {
            return Err(Error::format(format!(
                "nodes own {owned} entries but only {entries} exist"
            )));
        }

        for index in 0..entries {
            self.check_entry(index)
                .map_err(|err| at_record(err, "entry", index))?;
        }
        for index in 0..self.string_count() {
            self.check_span(self.string_span(index))
                .map_err(|err| at_record(err, "string", index))?;
        }
        Ok(Run::new(owned, entries - owned))
    }

    /// Only payloads that address other sections are checked. Unknown tags read as `None`
    /// and unknown pool flags as a string array, matching [`Tree::entry`].
    fn check_entry(&self, index: usize) -> Result<()> {
        let at = self.record(Section::Entries, index);
        self.check_span(Span {
            offset: get_u32(&self.buf, at),
            len: get_u32(&self.buf, at + 4),
        })?;
        let (first, second) = (get_u64(&self.buf, at + 16), get_u64(&self.buf, at + 24));
        match self.buf[at + 8] {
            TAG_STRING => self.check_span(wide_span(first, second)?),
            TAG_ARRAY => {
                let pool = match self.buf[at + 9] {
                    POOL_FLOAT => self.floats.len(),
                    POOL_INT => self.ints.len(),
                    _ => self.string_count(),
                };
                if first.saturating_add(second) > pool as u64 {
                    return Err(Error::format("array run out of bounds"));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn check_span(&self, span: Span) -> Result<()> {
        if u64::from(span.offset) + u64::from(span.len) > self.source().len() as u64 {
            return Err(Error::format("text span out of bounds"));
        }
        Ok(())
    }
}

fn at_record(err: Error, kind: &str, index: usize) -> Error {
    Error::format(format!("{kind} {index}: {}", err.message))
}

fn wide_span(offset: u64, len: u64) -> Result<Span> {
    match (u32::try_from(offset), u32::try_from(len)) {
        (Ok(offset), Ok(len)) => Ok(Span { offset, len }),
        _ => Err(Error::format("string span exceeds u32")),
    }
}

fn read_pool<T>(buf: &[u8], header: &Header, section: Section, from: impl Fn(u64) -> T) -> Vec<T> {
    let start = header.offset(section);
    (0..header.count(section))
        .map(|index| start + 8 * index)
        .map(|at| from(get_u64(buf, at)))
        .collect()
}

fn unlink(raw: i32) -> Option<NodeId> {
    (raw != ABSENT).then(|| NodeId::new(raw as usize))
}

impl Tree for BinaryDocument {
    fn node_count(&self) -> usize {
        self.header.count(Section::Nodes)
    }

    fn node(&self, id: NodeId) -> Node {
        let at = self.record(Section::Nodes, id.index());
        let buf = &self.buf;
        Node {
            name: Span {
                offset: get_u32(buf, at),
                len: get_u32(buf, at + 4),
            },
            hash: get_u32(buf, at + 8),
            parent: unlink(get_i32(buf, at + 12)),
            first_child: unlink(get_i32(buf, at + 16)),
            next_sibling: unlink(get_i32(buf, at + 20)),
            entries: Run {
                start: get_u32(buf, at + 24),
                count: get_u32(buf, at + 28),
            },
        }
    }

    fn entry_count(&self) -> usize {
        self.header.count(Section::Entries)
    }

    fn entry(&self, index: usize) -> KeyValue {
        let at = self.record(Section::Entries, index);
        let buf = &self.buf;
        let (first, second) = (get_u64(buf, at + 16), get_u64(buf, at + 24));
        let run = Run {
            start: first as u32,
            count: second as u32,
        };
        let value = match buf[at + 8] {
            TAG_BOOL => Value::Bool(first != 0),
            TAG_INT => Value::Int(first as i64),
            TAG_FLOAT => Value::Float(f64::from_bits(first)),
            TAG_STRING => Value::String(Span {
                offset: first as u32,
                len: second as u32,
            }),
            TAG_ARRAY => match buf[at + 9] {
                POOL_FLOAT => Value::Array(ArrayKind::Float, run),
                POOL_INT => Value::Array(ArrayKind::Int, run),
                _ => Value::Array(ArrayKind::String, run),
            },
            _ => Value::None,
        };
        KeyValue {
            key: Span {
                offset: get_u32(buf, at),
                len: get_u32(buf, at + 4),
            },
            value,
        }
    }

    fn root_entries(&self) -> Run {
        self.root_entries
    }

    fn floats(&self) -> &[f64] {
        &self.floats
    }

    fn ints(&self) -> &[i64] {
        &self.ints
    }

    fn string_count(&self) -> usize {
        self.header.count(Section::Strings)
    }

    fn string_span(&self, index: usize) -> Span {
        let at = self.record(Section::Strings, index);
        Span {
            offset: get_u32(&self.buf, at),
            len: get_u32(&self.buf, at + 4),
        }
    }

    fn source(&self) -> &[u8] {
        let start = self.header.offset(Section::Text);
        &self.buf[start..start + self.header.count(Section::Text)]
    }

    fn str_at(&self, span: Span) -> &str {
        std::str::from_utf8(self.bytes_at(span)).unwrap_or_default()
    }

    fn indent_unit(&self) -> Option<usize> {
        (self.header.indent_unit != 0).then_some(self.header.indent_unit as usize)
    }
}
