//! Renders any [`Tree`] back to TML text.

mod writer;

use crate::arena::{ArrayKind, Value};
use crate::constants::is_indent_unit;
use crate::tree::{Cursor, Tree};
use crate::{Error, Result, WriteOptions};

use writer::Writer;

/// Writes root entries first, then every node depth-first. Entries always precede a node's
/// children so they cannot be captured by a deeper section on reparse.
pub fn to_string<T: Tree + ?Sized>(tree: &T, options: &WriteOptions) -> Result<String> {
    let unit = options.indent.get_spaces();
    if !is_indent_unit(unit) {
        return Err(Error::encode(format!(
            "indentation unit must be 2 or 4 spaces, got {unit}"
        )));
    }
    let mut writer = Writer::new(options);
    write_body(&mut writer, tree, Cursor::ROOT, 0)?;
    let out = writer.finish()?;
    tracing::debug!(bytes = out.len(), "wrote text document");
    Ok(out)
}

fn write_body<T: Tree + ?Sized>(
    writer: &mut Writer,
    tree: &T,
    cursor: Cursor,
    depth: usize,
) -> Result<()> {
    for (key, value) in tree.entries(cursor) {
        writer.write_indent(depth);
        writer.write_name(key)?;
        write_value(writer, tree, value)?;
        writer.write_newline();
    }
    for child in tree.children(cursor) {
        writer.write_indent(depth);
        match tree.name(child) {
            Some(name) => {
                writer.write_name(name)?;
                writer.write_str(":");
            }
            None => writer.write_str("-"),
        }
        writer.write_newline();
        write_body(writer, tree, child, depth + 1)?;
    }
    Ok(())
}

/// Everything after the key, separator included.
fn write_value<T: Tree + ?Sized>(writer: &mut Writer, tree: &T, value: Value) -> Result<()> {
    match value {
        Value::None => writer.write_str(" ="),
        Value::Bool(flag) => writer.write_str(if flag { ": true" } else { ": false" }),
        Value::Int(number) => {
            writer.write_str(": ");
            writer.write_int(number);
        }
        Value::Float(number) => {
            writer.write_str(": ");
            writer.write_float(number)?;
        }
        Value::String(span) => {
            writer.write_str(": ");
            writer.write_string(tree.str_at(span))?;
        }
        Value::Array(kind, run) => {
            writer.write_str(":");
            match run.count {
                0 => {
                    // A lone comma opens an array; the blank line ends its continuation.
                    writer.write_str(" ,");
                    writer.write_newline();
                }
                1 => writer.write_str(" ,"),
                _ => {}
            }
            for (i, index) in run.range().enumerate() {
                writer.write_str(if i == 0 { " " } else { ", " });
                match kind {
                    ArrayKind::Int => writer.write_int(tree.ints()[index]),
                    ArrayKind::Float => writer.write_float(tree.floats()[index])?,
                    ArrayKind::String => {
                        writer.write_array_string(tree.str_at(tree.string_span(index)))?
                    }
                }
            }
        }
    }
    Ok(())
}
