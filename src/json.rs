//! A `serde` view of a tree, for dumping documents as JSON.
//!
//! A node is an object of its entries followed by its children. Named children are keyed
//! by name, list items by their position among all children (the same position a dot path
//! uses). A node holding nothing but list items is an array instead. When two members
//! share a key the first one wins, as it does for lookups.

use std::borrow::Cow;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::arena::{ArrayKind, Value};
use crate::tree::{Cursor, Tree};

pub fn to_value<T: Tree + ?Sized>(tree: &T) -> serde_json::Result<serde_json::Value> {
    serde_json::to_value(NodeView::root(tree))
}

pub struct NodeView<'a, T: Tree + ?Sized> {
    tree: &'a T,
    cursor: Cursor,
}

impl<'a, T: Tree + ?Sized> NodeView<'a, T> {
    pub fn new(tree: &'a T, cursor: Cursor) -> Self {
        Self { tree, cursor }
    }

    pub fn root(tree: &'a T) -> Self {
        Self::new(tree, Cursor::ROOT)
    }

    fn is_list(&self) -> bool {
        let tree = self.tree;
        tree.entry_run(self.cursor).count == 0
            && tree.first_child(self.cursor).is_some()
            && tree.children(self.cursor).all(|child| tree.name(child).is_none())
    }

    fn members(&self) -> Vec<(Cow<'a, str>, Member)> {
        let tree = self.tree;
        let mut members: Vec<(Cow<'a, str>, Member)> = Vec::new();
        let mut push = |key: Cow<'a, str>, member| {
            if !members.iter().any(|(seen, _)| *seen == key) {
                members.push((key, member));
            }
        };
        for (key, value) in tree.entries(self.cursor) {
            push(Cow::Borrowed(key), Member::Entry(value));
        }
        for (position, child) in tree.children(self.cursor).enumerate() {
            let key = match tree.name(child) {
                Some(name) => Cow::Borrowed(name),
                None => Cow::Owned(position.to_string()),
            };
            push(key, Member::Child(child));
        }
        members
    }
}

enum Member {
    Entry(Value),
    Child(Cursor),
}

impl<T: Tree + ?Sized> Serialize for NodeView<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_list() {
            let mut seq = serializer.serialize_seq(Some(self.tree.child_count(self.cursor)))?;
            for child in self.tree.children(self.cursor) {
                seq.serialize_element(&NodeView::new(self.tree, child))?;
            }
            return seq.end();
        }
        let members = self.members();
        let mut map = serializer.serialize_map(Some(members.len()))?;
        for (key, member) in &members {
            match *member {
                Member::Entry(value) => map.serialize_entry(key, &ValueView::new(self.tree, value))?,
                Member::Child(child) => map.serialize_entry(key, &NodeView::new(self.tree, child))?,
            }
        }
        map.end()
    }
}

struct ValueView<'a, T: Tree + ?Sized> {
    tree: &'a T,
    value: Value,
}

impl<'a, T: Tree + ?Sized> ValueView<'a, T> {
    fn new(tree: &'a T, value: Value) -> Self {
        Self { tree, value }
    }
}

impl<T: Tree + ?Sized> Serialize for ValueView<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let tree = self.tree;
        match self.value {
            Value::None => serializer.serialize_unit(),
            Value::Bool(flag) => serializer.serialize_bool(flag),
            Value::Int(number) => serializer.serialize_i64(number),
            Value::Float(number) => serializer.serialize_f64(number),
            Value::String(span) => serializer.serialize_str(tree.str_at(span)),
            Value::Array(kind, run) => {
                let mut seq = serializer.serialize_seq(Some(run.count as usize))?;
                for index in run.range() {
                    match kind {
                        ArrayKind::Int => seq.serialize_element(&tree.ints()[index])?,
                        ArrayKind::Float => seq.serialize_element(&tree.floats()[index])?,
                        ArrayKind::String => {
                            seq.serialize_element(tree.str_at(tree.string_span(index)))?
                        }
                    }
                }
                seq.end()
            }
        }
    }
}
