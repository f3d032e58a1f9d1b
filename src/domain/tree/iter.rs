use std::{cmp::Ordering, iter::FusedIterator};

use super::node::{Link, Node};
use crate::domain::{key, DomainKey};

/// In-order iterator over the entries of a [`Tree`](super::Tree).
///
/// Created by [`Tree::iter`](super::Tree::iter). Holds one stack frame per
/// level of the tree.
pub struct Iter<'a, V> {
    stack: Vec<&'a Node<V>>,
    remaining: Option<usize>,
}

impl<'a, V> Iter<'a, V> {
    pub(super) fn new(root: &'a Link<V>, len: usize) -> Self {
        let mut iter = Self {
            stack: Vec::new(),
            remaining: Some(len),
        };
        iter.descend_left(root.as_deref());
        iter
    }

    /// Starts at the first entry whose key is not less than `lower`.
    fn seek(root: &'a Link<V>, lower: &[u8]) -> Self {
        let mut stack = Vec::new();
        let mut link = root.as_deref();
        while let Some(node) = link {
            if key::compare(node.key.as_bytes(), lower) == Ordering::Less {
                link = node.right.as_deref();
            } else {
                stack.push(node);
                link = node.left.as_deref();
            }
        }
        Self {
            stack,
            remaining: None,
        }
    }

    fn descend_left(&mut self, mut link: Option<&'a Node<V>>) {
        while let Some(node) = link {
            self.stack.push(node);
            link = node.left.as_deref();
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a DomainKey, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.descend_left(node.right.as_deref());
        if let Some(remaining) = &mut self.remaining {
            *remaining -= 1;
        }
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.remaining {
            Some(remaining) => (remaining, Some(remaining)),
            None => (self.stack.len(), None),
        }
    }
}

impl<V> FusedIterator for Iter<'_, V> {}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Self {
            stack: self.stack.clone(),
            remaining: self.remaining,
        }
    }
}

/// Iterator over a domain and its subdomains.
///
/// Created by [`Tree::subdomains`](super::Tree::subdomains).
pub struct Subdomains<'a, V> {
    inner: Iter<'a, V>,
    ancestor: DomainKey,
    done: bool,
}

impl<'a, V> Subdomains<'a, V> {
    pub(super) fn new(root: &'a Link<V>, ancestor: DomainKey) -> Self {
        Self {
            inner: Iter::seek(root, ancestor.as_bytes()),
            ancestor,
            done: false,
        }
    }
}

impl<'a, V> Iterator for Subdomains<'a, V> {
    type Item = (&'a DomainKey, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.inner.next() {
            Some((key, value)) if key.is_within(&self.ancestor) => Some((key, value)),
            _ => {
                // Subdomains are contiguous; the first key outside ends the run.
                self.done = true;
                None
            }
        }
    }
}

impl<V> FusedIterator for Subdomains<'_, V> {}
