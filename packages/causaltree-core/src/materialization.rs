//! Deterministic linearization of the causal tree.
//!
//! The value is a depth-first pre-order walk from ROOT where siblings are visited newest first:
//! timestamp descending, entity descending on ties. A higher timestamp means the writer had seen
//! more of the document, so that branch reads before the one written with less context. The
//! order only depends on the node set, never on how or when it was assembled.

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::ids::NodeId;
use crate::traits::NodeStore;

/// Sibling order: timestamp descending, then entity descending.
pub fn cmp_siblings(a: &NodeId, b: &NodeId) -> Ordering {
    (b.timestamp, b.entity).cmp(&(a.timestamp, a.entity))
}

/// Children of `id` in traversal order.
pub fn ordered_children<S: NodeStore>(store: &S, id: NodeId) -> Result<Vec<NodeId>> {
    let mut children = store.children_of(id)?;
    children.sort_unstable_by(cmp_siblings);
    Ok(children)
}

/// Every node (tombstones included) in pre-order, ROOT excluded.
pub fn traversal_order<S: NodeStore>(store: &S) -> Result<Vec<NodeId>> {
    let mut out = Vec::with_capacity(store.len());
    let mut stack = ordered_children(store, NodeId::ROOT)?;
    // Stack pops from the back, so push siblings in reverse traversal order.
    stack.reverse();
    while let Some(id) = stack.pop() {
        if out.len() >= store.len() {
            return Err(Error::InconsistentState(format!(
                "traversal revisited nodes at {id}"
            )));
        }
        out.push(id);
        let mut children = ordered_children(store, id)?;
        children.reverse();
        stack.extend(children);
    }
    Ok(out)
}

/// Ids of live nodes in materialized order.
pub fn visible_ids<S: NodeStore>(store: &S) -> Result<Vec<NodeId>> {
    let mut out = Vec::new();
    for id in traversal_order(store)? {
        if !store.get(id)?.is_tombstoned() {
            out.push(id);
        }
    }
    Ok(out)
}

/// The visible sequence of characters.
pub fn materialize<S: NodeStore>(store: &S) -> Result<Vec<char>> {
    let mut out = Vec::with_capacity(store.len());
    for id in traversal_order(store)? {
        if let Some(c) = store.get(id)?.visible_char() {
            out.push(c);
        }
    }
    Ok(out)
}
