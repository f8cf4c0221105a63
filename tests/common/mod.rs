#![allow(dead_code)]

use proptest::prelude::*;
use tml::arena::{ArrayKind, Value};
use tml::{Cursor, Tree};

/// A value detached from the tree it came from. Floats compare by bits.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    None,
    Bool(bool),
    Int(i64),
    Float(u64),
    Str(String),
    Ints(Vec<i64>),
    Floats(Vec<u64>),
    Strs(Vec<String>),
}

pub fn shape<T: Tree + ?Sized>(tree: &T, value: Value) -> Shape {
    match value {
        Value::None => Shape::None,
        Value::Bool(flag) => Shape::Bool(flag),
        Value::Int(number) => Shape::Int(number),
        Value::Float(number) => Shape::Float(number.to_bits()),
        Value::String(span) => Shape::Str(tree.str_at(span).to_owned()),
        Value::Array(ArrayKind::Int, run) => Shape::Ints(tree.ints()[run.range()].to_vec()),
        Value::Array(ArrayKind::Float, run) => Shape::Floats(
            tree.floats()[run.range()]
                .iter()
                .map(|f| f.to_bits())
                .collect(),
        ),
        Value::Array(ArrayKind::String, run) => Shape::Strs(
            run.range()
                .map(|index| tree.str_at(tree.string_span(index)).to_owned())
                .collect(),
        ),
    }
}

/// Walks both trees in lockstep comparing names, entries and child counts.
pub fn assert_same_tree<A: Tree + ?Sized, B: Tree + ?Sized>(a: &A, b: &B) {
    same_node(a, Cursor::ROOT, b, Cursor::ROOT, "<root>");
}

fn same_node<A: Tree + ?Sized, B: Tree + ?Sized>(a: &A, ca: Cursor, b: &B, cb: Cursor, path: &str) {
    assert_eq!(a.name(ca), b.name(cb), "name at {path}");
    let left: Vec<_> = a.entries(ca).map(|(k, v)| (k.to_owned(), shape(a, v))).collect();
    let right: Vec<_> = b.entries(cb).map(|(k, v)| (k.to_owned(), shape(b, v))).collect();
    assert_eq!(left, right, "entries at {path}");
    for (key, _) in &left {
        assert_eq!(a.get_int(ca, key), b.get_int(cb, key), "get_int {key} at {path}");
        assert_eq!(a.get_str(ca, key), b.get_str(cb, key), "get_str {key} at {path}");
    }
    assert_eq!(a.child_count(ca), b.child_count(cb), "child count at {path}");
    for (i, (x, y)) in a.children(ca).zip(b.children(cb)).enumerate() {
        same_node(a, x, b, y, &format!("{path}.{i}"));
    }
}

/// Generated document body: rendered values plus children (`true` = named section).
#[derive(Debug, Clone)]
pub struct Body {
    pub entries: Vec<String>,
    pub children: Vec<(bool, Body)>,
}

fn join<T: ToString>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Right-hand sides; the empty string renders as a `key =` assignment.
pub fn value() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<i64>().prop_map(|n| n.to_string()),
        (-1.0e9f64..1.0e9).prop_map(|f| format!("{f:?}")),
        any::<bool>().prop_map(|b| b.to_string()),
        "[a-z][a-z ]{0,10}[a-z]",
        Just(String::new()),
        prop::collection::vec(any::<i32>(), 2..6).prop_map(|v| join(&v)),
        prop::collection::vec(-1.0e6f64..1.0e6, 2..6)
            .prop_map(|v| join(&v.iter().map(|f| format!("{f:?}")).collect::<Vec<_>>())),
        prop::collection::vec("[a-z]{1,5}", 2..6).prop_map(|v| join(&v)),
        "[a-z ,]{0,20}".prop_map(|s| format!("\"\"\"\n{s}\n\"\"\"")),
    ]
}

pub fn body() -> impl Strategy<Value = Body> {
    let leaf = prop::collection::vec(value(), 0..4).prop_map(|entries| Body {
        entries,
        children: Vec::new(),
    });
    leaf.prop_recursive(3, 24, 4, |inner| {
        (
            prop::collection::vec(value(), 0..4),
            prop::collection::vec((any::<bool>(), inner), 0..4),
        )
            .prop_map(|(entries, children)| Body { entries, children })
    })
}

pub fn render(body: &Body) -> String {
    let mut out = String::new();
    render_into(&mut out, body, 0);
    out
}

fn render_into(out: &mut String, body: &Body, depth: usize) {
    let pad = "  ".repeat(depth);
    for (i, value) in body.entries.iter().enumerate() {
        if value.is_empty() {
            out.push_str(&format!("{pad}k{i} =\n"));
        } else {
            out.push_str(&format!("{pad}k{i}: {value}\n"));
        }
    }
    for (i, (named, child)) in body.children.iter().enumerate() {
        if *named {
            out.push_str(&format!("{pad}s{i}:\n"));
        } else {
            out.push_str(&format!("{pad}-\n"));
        }
        render_into(out, child, depth + 1);
    }
}
