//! Red-black nodes and the algorithms that keep them balanced.
//!
//! Nodes are immutable once shared. Every rewrite takes the nodes it touches
//! by value and unpacks them with [`Arc::unwrap_or_clone`]: a node that only
//! the caller references is moved, a node still reachable from another tree
//! version is copied. A copy holds new references to the same children, so
//! subtrees off the rewritten path stay shared between versions.
//!
//! Insertion is Okasaki's scheme. Deletion is Kahrs' scheme: the removed
//! node's children are fused, and `balance_left`/`balance_right` repair the
//! black height on the way up. Both maintain:
//!
//! 1. The root is black.
//! 2. A red node has no red child.
//! 3. Every path from a node to an absent child crosses the same number of
//!    black nodes.

use std::{cmp::Ordering, sync::Arc};

use crate::domain::{key, DomainKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

pub type Link<V> = Option<Arc<Node<V>>>;

#[derive(Debug, Clone)]
pub struct Node<V> {
    pub color: Color,
    pub key: DomainKey,
    pub value: V,
    pub left: Link<V>,
    pub right: Link<V>,
}

impl<V> Node<V> {
    const fn is_red(&self) -> bool {
        matches!(self.color, Color::Red)
    }
}

fn is_red<V>(link: &Link<V>) -> bool {
    link.as_ref().is_some_and(|node| node.is_red())
}

fn is_black_node<V>(link: &Link<V>) -> bool {
    link.as_ref().is_some_and(|node| !node.is_red())
}

fn red<V>(left: Link<V>, key: DomainKey, value: V, right: Link<V>) -> Arc<Node<V>> {
    Arc::new(Node {
        color: Color::Red,
        key,
        value,
        left,
        right,
    })
}

fn black<V>(left: Link<V>, key: DomainKey, value: V, right: Link<V>) -> Arc<Node<V>> {
    Arc::new(Node {
        color: Color::Black,
        key,
        value,
        left,
        right,
    })
}

/// Returns `node` with the given color, copying it only if it is shared.
pub fn paint<V: Clone>(mut node: Arc<Node<V>>, color: Color) -> Arc<Node<V>> {
    if node.color != color {
        Arc::make_mut(&mut node).color = color;
    }
    node
}

/// Looks up an encoded key. Plain binary search, no allocation.
pub fn get<'a, V>(mut link: &'a Link<V>, key: &[u8]) -> Option<&'a V> {
    while let Some(node) = link {
        match key::compare(key, node.key.as_bytes()) {
            Ordering::Less => link = &node.left,
            Ordering::Greater => link = &node.right,
            Ordering::Equal => return Some(&node.value),
        }
    }
    None
}

/// Inserts or replaces `key`, returning the new subtree root (possibly red,
/// possibly with a red child; the caller paints the tree root black) and
/// whether the key was absent before.
pub fn insert<V: Clone>(link: Link<V>, key: DomainKey, value: V) -> (Arc<Node<V>>, bool) {
    let Some(node) = link else {
        return (red(None, key, value, None), true);
    };
    let Node {
        color,
        key: node_key,
        value: node_value,
        left,
        right,
    } = Arc::unwrap_or_clone(node);

    match key.cmp(&node_key) {
        Ordering::Less => {
            let (left, added) = insert(left, key, value);
            (balance(color, Some(left), node_key, node_value, right), added)
        }
        Ordering::Greater => {
            let (right, added) = insert(right, key, value);
            (balance(color, left, node_key, node_value, Some(right)), added)
        }
        Ordering::Equal => (
            Arc::new(Node {
                color,
                key: node_key,
                value,
                left,
                right,
            }),
            false,
        ),
    }
}

/// Inserts or replaces `key` by mutating nodes owned only by this link.
///
/// Shared nodes on the search path are copied first ([`Arc::make_mut`]), so
/// other versions never observe the change. Only rotations allocate.
pub fn insert_in_place<V: Clone>(link: &mut Link<V>, key: DomainKey, value: V) -> bool {
    let (added, is_black) = match link {
        None => {
            *link = Some(red(None, key, value, None));
            return true;
        }
        Some(node) => {
            let node = Arc::make_mut(node);
            let added = match key.cmp(&node.key) {
                Ordering::Less => insert_in_place(&mut node.left, key, value),
                Ordering::Greater => insert_in_place(&mut node.right, key, value),
                Ordering::Equal => {
                    node.value = value;
                    return false;
                }
            };
            (added, !node.is_red())
        }
    };

    if is_black && link.as_deref().is_some_and(has_red_violation) {
        if let Some(node) = link.take() {
            let Node {
                color,
                key,
                value,
                left,
                right,
            } = Arc::unwrap_or_clone(node);
            *link = Some(balance(color, left, key, value, right));
        }
    }
    added
}

/// Whether a red child of `node` has a red child of its own.
fn has_red_violation<V>(node: &Node<V>) -> bool {
    [&node.left, &node.right].into_iter().any(|child| {
        child
            .as_ref()
            .is_some_and(|c| c.is_red() && (is_red(&c.left) || is_red(&c.right)))
    })
}

/// Okasaki's balance: rewrites a black node with a red child that has a red
/// child into a red node with two black children. Anything else is rebuilt
/// as given.
fn balance<V: Clone>(
    color: Color,
    left: Link<V>,
    key: DomainKey,
    value: V,
    right: Link<V>,
) -> Arc<Node<V>> {
    if color == Color::Red {
        return red(left, key, value, right);
    }

    let left = match left {
        Some(l) if l.is_red() && (is_red(&l.left) || is_red(&l.right)) => {
            return rotate_from_left(Arc::unwrap_or_clone(l), key, value, right);
        }
        other => other,
    };

    match right {
        Some(r) if r.is_red() && (is_red(&r.left) || is_red(&r.right)) => {
            rotate_from_right(left, key, value, Arc::unwrap_or_clone(r))
        }
        other => black(left, key, value, other),
    }
}

/// Resolves a red-red violation inside the red left child `l` of a black node.
fn rotate_from_left<V: Clone>(
    l: Node<V>,
    key: DomainKey,
    value: V,
    right: Link<V>,
) -> Arc<Node<V>> {
    match l.left {
        Some(ll) if ll.is_red() => {
            let ll = Arc::unwrap_or_clone(ll);
            red(
                Some(black(ll.left, ll.key, ll.value, ll.right)),
                l.key,
                l.value,
                Some(black(l.right, key, value, right)),
            )
        }
        l_left => match l.right {
            Some(lr) if lr.is_red() => {
                let lr = Arc::unwrap_or_clone(lr);
                red(
                    Some(black(l_left, l.key, l.value, lr.left)),
                    lr.key,
                    lr.value,
                    Some(black(lr.right, key, value, right)),
                )
            }
            l_right => black(
                Some(red(l_left, l.key, l.value, l_right)),
                key,
                value,
                right,
            ),
        },
    }
}

/// Resolves a red-red violation inside the red right child `r` of a black node.
fn rotate_from_right<V: Clone>(
    left: Link<V>,
    key: DomainKey,
    value: V,
    r: Node<V>,
) -> Arc<Node<V>> {
    match r.left {
        Some(rl) if rl.is_red() => {
            let rl = Arc::unwrap_or_clone(rl);
            red(
                Some(black(left, key, value, rl.left)),
                rl.key,
                rl.value,
                Some(black(rl.right, r.key, r.value, r.right)),
            )
        }
        r_left => match r.right {
            Some(rr) if rr.is_red() => {
                let rr = Arc::unwrap_or_clone(rr);
                red(
                    Some(black(left, key, value, r_left)),
                    r.key,
                    r.value,
                    Some(black(rr.left, rr.key, rr.value, rr.right)),
                )
            }
            r_right => black(
                left,
                key,
                value,
                Some(red(r_left, r.key, r.value, r_right)),
            ),
        },
    }
}

/// Balance used on the deletion path: a black node whose children are both
/// red becomes a red node with black children, otherwise Okasaki's balance.
fn balance_black<V: Clone>(
    left: Link<V>,
    key: DomainKey,
    value: V,
    right: Link<V>,
) -> Arc<Node<V>> {
    if is_red(&left) && is_red(&right) {
        return red(
            left.map(|l| paint(l, Color::Black)),
            key,
            value,
            right.map(|r| paint(r, Color::Black)),
        );
    }
    balance(Color::Black, left, key, value, right)
}

/// Removes `key`, which must be present in the subtree rooted at `node`.
///
/// The result may be red at the root; the caller paints the tree root black.
pub fn remove<V: Clone>(node: Arc<Node<V>>, key: &DomainKey) -> Link<V> {
    let Node {
        color: _,
        key: node_key,
        value,
        left,
        right,
    } = Arc::unwrap_or_clone(node);

    match key.cmp(&node_key) {
        Ordering::Less => {
            // Removing from a black subtree shortens its black height.
            let shrinks = is_black_node(&left);
            let left = left.and_then(|l| remove(l, key));
            Some(if shrinks {
                balance_left(left, node_key, value, right)
            } else {
                red(left, node_key, value, right)
            })
        }
        Ordering::Greater => {
            let shrinks = is_black_node(&right);
            let right = right.and_then(|r| remove(r, key));
            Some(if shrinks {
                balance_right(left, node_key, value, right)
            } else {
                red(left, node_key, value, right)
            })
        }
        Ordering::Equal => fuse(left, right),
    }
}

/// Restores balance after the left subtree lost one unit of black height.
fn balance_left<V: Clone>(
    left: Link<V>,
    key: DomainKey,
    value: V,
    right: Link<V>,
) -> Arc<Node<V>> {
    if is_red(&left) {
        return red(left.map(|l| paint(l, Color::Black)), key, value, right);
    }
    match right {
        Some(r) if !r.is_red() => balance_black(left, key, value, Some(paint(r, Color::Red))),
        Some(r) if is_black_node(&r.left) => {
            let r = Arc::unwrap_or_clone(r);
            let Some(rl) = r.left else {
                unreachable!("red-black invariant violated: missing black child");
            };
            let rl = Arc::unwrap_or_clone(rl);
            red(
                Some(black(left, key, value, rl.left)),
                rl.key,
                rl.value,
                Some(balance_black(
                    rl.right,
                    r.key,
                    r.value,
                    r.right.map(|c| paint(c, Color::Red)),
                )),
            )
        }
        _ => unreachable!("red-black invariant violated: unbalanced right sibling"),
    }
}

/// Restores balance after the right subtree lost one unit of black height.
fn balance_right<V: Clone>(
    left: Link<V>,
    key: DomainKey,
    value: V,
    right: Link<V>,
) -> Arc<Node<V>> {
    if is_red(&right) {
        return red(left, key, value, right.map(|r| paint(r, Color::Black)));
    }
    match left {
        Some(l) if !l.is_red() => balance_black(Some(paint(l, Color::Red)), key, value, right),
        Some(l) if is_black_node(&l.right) => {
            let l = Arc::unwrap_or_clone(l);
            let Some(lr) = l.right else {
                unreachable!("red-black invariant violated: missing black child");
            };
            let lr = Arc::unwrap_or_clone(lr);
            red(
                Some(balance_black(
                    l.left.map(|c| paint(c, Color::Red)),
                    l.key,
                    l.value,
                    lr.left,
                )),
                lr.key,
                lr.value,
                Some(black(lr.right, key, value, right)),
            )
        }
        _ => unreachable!("red-black invariant violated: unbalanced left sibling"),
    }
}

/// Joins two subtrees of equal black height where every key in `left` is
/// smaller than every key in `right`.
fn fuse<V: Clone>(left: Link<V>, right: Link<V>) -> Link<V> {
    let (l, r) = match (left, right) {
        (None, right) => return right,
        (left, None) => return left,
        (Some(l), Some(r)) => (l, r),
    };

    match (l.is_red(), r.is_red()) {
        (true, true) => {
            let l = Arc::unwrap_or_clone(l);
            let r = Arc::unwrap_or_clone(r);
            match fuse(l.right, r.left) {
                Some(m) if m.is_red() => {
                    let m = Arc::unwrap_or_clone(m);
                    Some(red(
                        Some(red(l.left, l.key, l.value, m.left)),
                        m.key,
                        m.value,
                        Some(red(m.right, r.key, r.value, r.right)),
                    ))
                }
                middle => Some(red(
                    l.left,
                    l.key,
                    l.value,
                    Some(red(middle, r.key, r.value, r.right)),
                )),
            }
        }
        (false, false) => {
            let l = Arc::unwrap_or_clone(l);
            let r = Arc::unwrap_or_clone(r);
            match fuse(l.right, r.left) {
                Some(m) if m.is_red() => {
                    let m = Arc::unwrap_or_clone(m);
                    Some(red(
                        Some(black(l.left, l.key, l.value, m.left)),
                        m.key,
                        m.value,
                        Some(black(m.right, r.key, r.value, r.right)),
                    ))
                }
                middle => Some(balance_left(
                    l.left,
                    l.key,
                    l.value,
                    Some(black(middle, r.key, r.value, r.right)),
                )),
            }
        }
        (false, true) => {
            let r = Arc::unwrap_or_clone(r);
            Some(red(fuse(Some(l), r.left), r.key, r.value, r.right))
        }
        (true, false) => {
            let l = Arc::unwrap_or_clone(l);
            Some(red(l.left, l.key, l.value, fuse(l.right, Some(r))))
        }
    }
}

/// Checks invariants 1-4 and returns the black height of the subtree.
#[cfg(test)]
pub fn check<V>(link: &Link<V>) -> Result<usize, String> {
    fn walk<V>(link: &Link<V>, parent_red: bool) -> Result<usize, String> {
        let Some(node) = link else {
            return Ok(1);
        };
        if parent_red && node.is_red() {
            return Err(format!("red node {} has a red parent", node.key));
        }
        for (child, expected) in [(&node.left, Ordering::Less), (&node.right, Ordering::Greater)] {
            if let Some(child) = child {
                if child.key.cmp(&node.key) != expected {
                    return Err(format!("{} is misplaced under {}", child.key, node.key));
                }
            }
        }
        let left = walk(&node.left, node.is_red())?;
        let right = walk(&node.right, node.is_red())?;
        if left != right {
            return Err(format!(
                "black heights differ under {}: {left} vs {right}",
                node.key
            ));
        }
        Ok(left + usize::from(!node.is_red()))
    }

    if is_red(link) {
        return Err("root is red".to_string());
    }
    walk(link, false)
}
