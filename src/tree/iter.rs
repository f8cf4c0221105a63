use crate::arena::{NodeId, Run, Value};

use super::{Cursor, Tree};

/// Children of one node, in document order.
pub struct Children<'a, T: Tree + ?Sized> {
    tree: &'a T,
    next: Option<NodeId>,
}

impl<'a, T: Tree + ?Sized> Children<'a, T> {
    pub(crate) fn new(tree: &'a T, first: Option<NodeId>) -> Self {
        Self { tree, next: first }
    }
}

impl<T: Tree + ?Sized> Iterator for Children<'_, T> {
    type Item = Cursor;

    fn next(&mut self) -> Option<Cursor> {
        let id = self.next?;
        self.next = self.tree.node(id).next_sibling;
        Some(Cursor::node(id))
    }
}

/// Key/value pairs of one node, in document order.
pub struct Entries<'a, T: Tree + ?Sized> {
    tree: &'a T,
    range: std::ops::Range<usize>,
}

impl<'a, T: Tree + ?Sized> Entries<'a, T> {
    pub(crate) fn new(tree: &'a T, run: Run) -> Self {
        Self {
            tree,
            range: run.range(),
        }
    }
}

impl<'a, T: Tree + ?Sized> Iterator for Entries<'a, T> {
    type Item = (&'a str, Value);

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.tree.entry(self.range.next()?);
        Some((self.tree.str_at(entry.key), entry.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

impl<T: Tree + ?Sized> ExactSizeIterator for Entries<'_, T> {}

/// Elements of a string-typed array.
pub struct StrArray<'a, T: Tree + ?Sized> {
    tree: &'a T,
    range: std::ops::Range<usize>,
}

impl<'a, T: Tree + ?Sized> StrArray<'a, T> {
    pub(crate) fn new(tree: &'a T, run: Run) -> Self {
        Self {
            tree,
            range: run.range(),
        }
    }
}

impl<'a, T: Tree + ?Sized> Iterator for StrArray<'a, T> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let index = self.range.next()?;
        Some(self.tree.str_at(self.tree.string_span(index)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.range.size_hint()
    }
}

impl<T: Tree + ?Sized> ExactSizeIterator for StrArray<'_, T> {}
