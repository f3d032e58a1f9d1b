//! Persistent ordered map from domain names to values.
//!
//! A [`Tree`] is an immutable snapshot. The pure operations (`insert`,
//! `delete` and their `_key` and `_raw` forms) return a new tree and leave
//! `self` untouched; both versions share every subtree the operation did not
//! rewrite. Cloning a tree copies one reference.
//!
//! The `_in_place` operations take `&mut self` for bulk construction. They
//! mutate nodes that only this tree owns and copy the ones still shared with
//! other snapshots, so taking a snapshot with [`Clone`] before an in-place edit
//! is always safe.

use std::{fmt, sync::Arc};

use tracing::{debug, instrument};

use crate::domain::{DomainKey, MalformedDomainError};

mod dot;
mod iter;
mod node;

pub use iter::{Iter, Subdomains};
use node::{Color, Link};

/// A persistent red-black tree keyed by canonical domain names.
///
/// Text-keyed operations canonicalize their input with [`DomainKey::parse`]
/// and return [`MalformedDomainError`] instead of falling back to a degraded
/// key. Absence is not an error: lookups return `Option` and deletions report
/// whether the key was found.
///
/// Mutating operations clone the values of the nodes they rewrite, hence the
/// `V: Clone` bound. Wrap heavy payloads in an [`Arc`].
///
/// ```
/// use dltree::Tree;
///
/// let v1 = Tree::new().insert("example.com", 1)?;
/// let v2 = v1.insert("www.example.com", 2)?;
///
/// assert_eq!(v1.len(), 1);
/// assert_eq!(v2.get("WWW.Example.com")?, Some(&2));
/// assert_eq!(v1.get("www.example.com")?, None);
/// # Ok::<(), dltree::MalformedDomainError>(())
/// ```
pub struct Tree<V> {
    root: Link<V>,
    len: usize,
}

impl<V> Tree<V> {
    /// Creates an empty tree.
    #[must_use]
    pub const fn new() -> Self {
        Self { root: None, len: 0 }
    }

    /// Whether the tree has no entries.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// The number of entries in the tree.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether both trees are the same snapshot (share their root node).
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Looks up a domain.
    ///
    /// # Errors
    ///
    /// Returns an error if `domain` is not a valid domain name.
    pub fn get(&self, domain: &str) -> Result<Option<&V>, MalformedDomainError> {
        let key = DomainKey::parse(domain)?;
        Ok(self.get_key(&key))
    }

    /// Looks up a canonical key.
    #[must_use]
    pub fn get_key(&self, key: &DomainKey) -> Option<&V> {
        self.get_raw(key.as_bytes())
    }

    /// Looks up an encoded key (see [`DomainKey::as_bytes`]) without
    /// allocating.
    #[must_use]
    pub fn get_raw(&self, raw: &[u8]) -> Option<&V> {
        node::get(&self.root, raw)
    }

    /// Iterates over all entries in ascending key order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_, V> {
        Iter::new(&self.root, self.len)
    }

    /// Iterates over `ancestor` (if present) and every entry within it, in
    /// ascending key order.
    ///
    /// ```
    /// use dltree::{DomainKey, Tree};
    ///
    /// let mut tree = Tree::new();
    /// for domain in ["a.com", "com", "a.org", "b.a.com"] {
    ///     tree.insert_in_place(domain, ())?;
    /// }
    ///
    /// let ancestor: DomainKey = "a.com".parse()?;
    /// let under: Vec<_> = tree
    ///     .subdomains(&ancestor)
    ///     .map(|(key, _)| key.to_string())
    ///     .collect();
    /// assert_eq!(under, ["a.com", "b.a.com"]);
    /// # Ok::<(), dltree::MalformedDomainError>(())
    /// ```
    #[must_use]
    pub fn subdomains(&self, ancestor: &DomainKey) -> Subdomains<'_, V> {
        Subdomains::new(&self.root, ancestor.clone())
    }

    /// Renders the tree structure in Graphviz DOT format.
    ///
    /// Each node is labelled with its domain and coloured red or black; edges
    /// are labelled `L` and `R`. The output is meant for debugging and its
    /// exact layout is not stable.
    #[must_use]
    pub fn to_dot(&self) -> String {
        dot::render(&self.root)
    }
}

impl<V: Clone> Tree<V> {
    /// Returns a new tree with `domain` mapped to `value`, replacing any
    /// previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if `domain` is not a valid domain name.
    pub fn insert(&self, domain: &str, value: V) -> Result<Self, MalformedDomainError> {
        let key = DomainKey::parse(domain)?;
        Ok(self.insert_key(key, value))
    }

    /// Returns a new tree with `key` mapped to `value`.
    #[must_use]
    pub fn insert_key(&self, key: DomainKey, value: V) -> Self {
        let (root, added) = node::insert(self.root.clone(), key, value);
        Self {
            root: Some(node::paint(root, Color::Black)),
            len: self.len + usize::from(added),
        }
    }

    /// Returns a new tree with the encoded key mapped to `value`.
    ///
    /// `raw` must be a well-formed encoded key, as produced by
    /// [`DomainKey::as_bytes`].
    #[must_use]
    pub fn insert_raw(&self, raw: &[u8], value: V) -> Self {
        self.insert_key(DomainKey::from_raw(raw), value)
    }

    /// Returns a tree without `domain`, and whether it was present.
    ///
    /// If it was absent the returned tree is the same snapshot as `self`.
    ///
    /// # Errors
    ///
    /// Returns an error if `domain` is not a valid domain name.
    pub fn delete(&self, domain: &str) -> Result<(Self, bool), MalformedDomainError> {
        let key = DomainKey::parse(domain)?;
        Ok(self.delete_key(&key))
    }

    /// Returns a tree without `key`, and whether it was present.
    #[must_use]
    pub fn delete_key(&self, key: &DomainKey) -> (Self, bool) {
        match &self.root {
            Some(root) if node::get(&self.root, key.as_bytes()).is_some() => {
                let root = node::remove(Arc::clone(root), key);
                let tree = Self {
                    root: root.map(|root| node::paint(root, Color::Black)),
                    len: self.len - 1,
                };
                (tree, true)
            }
            _ => (self.clone(), false),
        }
    }

    /// Returns a tree without the encoded key, and whether it was present.
    #[must_use]
    pub fn delete_raw(&self, raw: &[u8]) -> (Self, bool) {
        if self.get_raw(raw).is_none() {
            return (self.clone(), false);
        }
        self.delete_key(&DomainKey::from_raw(raw))
    }

    /// Maps `domain` to `value` in this tree. Returns `true` if the domain was
    /// not present before.
    ///
    /// # Errors
    ///
    /// Returns an error if `domain` is not a valid domain name. The tree is
    /// left unchanged.
    pub fn insert_in_place(&mut self, domain: &str, value: V) -> Result<bool, MalformedDomainError> {
        let key = DomainKey::parse(domain)?;
        Ok(self.insert_key_in_place(key, value))
    }

    /// Maps `key` to `value` in this tree. Returns `true` if the key was not
    /// present before.
    pub fn insert_key_in_place(&mut self, key: DomainKey, value: V) -> bool {
        let added = node::insert_in_place(&mut self.root, key, value);
        self.root = self.root.take().map(|root| node::paint(root, Color::Black));
        self.len += usize::from(added);
        added
    }

    /// Maps the encoded key to `value` in this tree.
    pub fn insert_raw_in_place(&mut self, raw: &[u8], value: V) -> bool {
        self.insert_key_in_place(DomainKey::from_raw(raw), value)
    }

    /// Removes `domain` from this tree. Returns whether it was present.
    ///
    /// # Errors
    ///
    /// Returns an error if `domain` is not a valid domain name.
    pub fn delete_in_place(&mut self, domain: &str) -> Result<bool, MalformedDomainError> {
        let key = DomainKey::parse(domain)?;
        Ok(self.delete_key_in_place(&key))
    }

    /// Removes `key` from this tree. Returns whether it was present.
    pub fn delete_key_in_place(&mut self, key: &DomainKey) -> bool {
        if node::get(&self.root, key.as_bytes()).is_none() {
            return false;
        }
        self.root = self
            .root
            .take()
            .and_then(|root| node::remove(root, key))
            .map(|root| node::paint(root, Color::Black));
        self.len -= 1;
        true
    }

    /// Removes the encoded key from this tree. Returns whether it was present.
    pub fn delete_raw_in_place(&mut self, raw: &[u8]) -> bool {
        if self.get_raw(raw).is_none() {
            return false;
        }
        self.delete_key_in_place(&DomainKey::from_raw(raw))
    }
}

impl<V> Default for Tree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Clone for Tree<V> {
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            len: self.len,
        }
    }
}

impl<V: fmt::Debug> fmt::Debug for Tree<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<V: PartialEq> PartialEq for Tree<V> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len && (self.ptr_eq(other) || self.iter().eq(other.iter()))
    }
}

impl<V: Eq> Eq for Tree<V> {}

impl<'a, V> IntoIterator for &'a Tree<V> {
    type Item = (&'a DomainKey, &'a V);
    type IntoIter = Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V: Clone> Extend<(DomainKey, V)> for Tree<V> {
    #[instrument(level = "debug", skip_all, fields(before = self.len))]
    fn extend<I: IntoIterator<Item = (DomainKey, V)>>(&mut self, iter: I) {
        let mut replaced = 0_usize;
        for (key, value) in iter {
            if !self.insert_key_in_place(key, value) {
                replaced += 1;
            }
        }
        debug!(after = self.len, replaced, "extended tree");
    }
}

impl<V: Clone> FromIterator<(DomainKey, V)> for Tree<V> {
    fn from_iter<I: IntoIterator<Item = (DomainKey, V)>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}
