use crate::arena::{ArrayKind, KeyValue, Node, NodeId, Value};
use crate::tree::Tree;
use crate::{EncodeOptions, Error, Result};

use super::{
    checksum, put_u32, put_u64, Header, Section, ABSENT, CHECKSUM_OFFSET, HEADER_LEN, POOL_FLOAT,
    POOL_INT, POOL_STRING, TAG_ARRAY, TAG_BOOL, TAG_FLOAT, TAG_INT, TAG_NONE, TAG_STRING, VERSION,
};

/// Serializes any tree into a single BTML blob.
pub fn encode<T: Tree + ?Sized>(tree: &T, options: &EncodeOptions) -> Result<Vec<u8>> {
    let root = tree.root_entries();
    if root.end() != tree.entry_count() {
        return Err(Error::encode(
            "root entries must form the final run of the entry array",
        ));
    }

    let counts = [
        tree.node_count(),
        tree.entry_count(),
        tree.floats().len(),
        tree.ints().len(),
        tree.string_count(),
        tree.source().len() + tree.appended().len(),
    ];
    let mut header = Header {
        version: VERSION,
        indent_unit: tree.indent_unit().map_or(0, |unit| unit as u8),
        counts: [0; 6],
        offsets: [0; 6],
        checksum: 0,
    };
    let mut cursor = HEADER_LEN;
    for (i, section) in Section::ALL.into_iter().enumerate() {
        header.counts[i] = to_u32(counts[i], "record count")?;
        header.offsets[i] = to_u32(cursor, "section offset")?;
        cursor += counts[i] * section.record_len();
    }
    to_u32(cursor, "blob length")?;

    let mut out = vec![0u8; cursor];
    header.write(&mut out);

    let mut at = header.offset(Section::Nodes);
    for index in 0..tree.node_count() {
        write_node(&mut out[at..at + 32], tree.node(NodeId::new(index)));
        at += 32;
    }
    let mut at = header.offset(Section::Entries);
    for index in 0..tree.entry_count() {
        write_entry(&mut out[at..at + 32], tree.entry(index));
        at += 32;
    }
    let mut at = header.offset(Section::Floats);
    for value in tree.floats() {
        put_u64(&mut out, at, value.to_bits());
        at += 8;
    }
    let mut at = header.offset(Section::Ints);
    for value in tree.ints() {
        put_u64(&mut out, at, *value as u64);
        at += 8;
    }
    let mut at = header.offset(Section::Strings);
    for index in 0..tree.string_count() {
        let span = tree.string_span(index);
        put_u32(&mut out, at, span.offset);
        put_u32(&mut out, at + 4, span.len);
        at += 8;
    }
    let text = header.offset(Section::Text);
    let appended = text + tree.source().len();
    out[text..appended].copy_from_slice(tree.source());
    out[appended..].copy_from_slice(tree.appended());

    if options.checksum {
        let crc = checksum(&out);
        put_u32(&mut out, CHECKSUM_OFFSET, crc);
    }

    tracing::debug!(
        nodes = counts[0],
        entries = counts[1],
        bytes = out.len(),
        checksum = options.checksum,
        "encoded binary document"
    );
    Ok(out)
}

fn to_u32(value: usize, what: &str) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::encode(format!("{what} {value} exceeds u32")))
}

fn link(id: Option<NodeId>) -> u32 {
    id.map_or(ABSENT, |id| id.index() as i32) as u32
}

fn write_node(out: &mut [u8], node: Node) {
    put_u32(out, 0, node.name.offset);
    put_u32(out, 4, node.name.len);
    put_u32(out, 8, node.hash);
    put_u32(out, 12, link(node.parent));
    put_u32(out, 16, link(node.first_child));
    put_u32(out, 20, link(node.next_sibling));
    put_u32(out, 24, node.entries.start);
    put_u32(out, 28, node.entries.count);
}

fn write_entry(out: &mut [u8], entry: KeyValue) {
    put_u32(out, 0, entry.key.offset);
    put_u32(out, 4, entry.key.len);
    let (tag, flags, first, second) = match entry.value {
        Value::None => (TAG_NONE, 0, 0, 0),
        Value::Bool(value) => (TAG_BOOL, 0, u64::from(value), 0),
        Value::Int(value) => (TAG_INT, 0, value as u64, 0),
        Value::Float(value) => (TAG_FLOAT, 0, value.to_bits(), 0),
        Value::String(span) => (TAG_STRING, 0, u64::from(span.offset), u64::from(span.len)),
        Value::Array(kind, run) => {
            let flags = match kind {
                ArrayKind::Float => POOL_FLOAT,
                ArrayKind::Int => POOL_INT,
                ArrayKind::String => POOL_STRING,
            };
            (TAG_ARRAY, flags, u64::from(run.start), u64::from(run.count))
        }
    };
    out[8] = tag;
    out[9] = flags;
    put_u64(out, 16, first);
    put_u64(out, 24, second);
}
