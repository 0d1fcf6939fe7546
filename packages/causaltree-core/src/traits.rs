use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::ids::{Lamport, NodeId, MAX_TIMESTAMP};
use crate::node::Node;

/// Pluggable clock to allow Lamport or custom time strategies.
pub trait Clock {
    /// Issue a timestamp strictly greater than anything issued or observed so far, or
    /// `ClockExhausted` once `MAX_TIMESTAMP` has been reached.
    fn tick(&mut self) -> Result<Lamport>;
    fn observe(&mut self, external: Lamport);
    fn now(&self) -> Lamport;
}

/// Basic Lamport clock implementation useful for tests and default flows.
#[derive(Clone, Debug, Default)]
pub struct LamportClock {
    counter: Lamport,
}

impl Clock for LamportClock {
    fn tick(&mut self) -> Result<Lamport> {
        if self.counter >= MAX_TIMESTAMP {
            return Err(Error::ClockExhausted(self.counter));
        }
        self.counter += 1;
        Ok(self.counter)
    }

    fn observe(&mut self, external: Lamport) {
        self.counter = self.counter.max(external);
    }

    fn now(&self) -> Lamport {
        self.counter
    }
}

/// Owns every node of one replica, keyed by id, plus the parent → children adjacency.
///
/// ROOT is synthetic: it is never stored as a node, but `children_of(NodeId::ROOT)` always
/// resolves and `insert` accepts it as a parent.
///
/// Merge relies on `insert` (parent present) and `tombstone` (id present) not failing once
/// their preconditions hold. A store backed by fallible I/O must make a whole merge atomic
/// on its own side, e.g. by wrapping it in a transaction.
pub trait NodeStore {
    /// Returns `Ok(true)` when the node was added, `Ok(false)` when the id was already present.
    fn insert(&mut self, node: Node) -> Result<bool>;
    fn get(&self, id: NodeId) -> Result<Node>;
    fn contains(&self, id: NodeId) -> bool;
    /// Returns `Ok(true)` on a live → tombstoned transition, `Ok(false)` if already tombstoned.
    fn tombstone(&mut self, id: NodeId) -> Result<bool>;
    /// Children in no particular order.
    fn children_of(&self, id: NodeId) -> Result<Vec<NodeId>>;
    fn node_ids(&self) -> Vec<NodeId>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn max_timestamp(&self) -> Lamport {
        self.node_ids()
            .iter()
            .map(|id| id.timestamp)
            .max()
            .unwrap_or_default()
    }
}

/// Arena + index store backed by hash maps.
#[derive(Clone, Debug, Default)]
pub struct MemoryNodeStore {
    nodes: HashMap<NodeId, Node>,
    children: HashMap<NodeId, HashSet<NodeId>>,
}

impl MemoryNodeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NodeStore for MemoryNodeStore {
    fn insert(&mut self, node: Node) -> Result<bool> {
        if node.id.is_root() {
            return Err(Error::InconsistentState(
                "the root id cannot be stored as a node".into(),
            ));
        }
        if !node.parent.is_root() && !self.nodes.contains_key(&node.parent) {
            return Err(Error::UnknownParent {
                parent: node.parent,
                node: Some(node.id),
            });
        }
        if self.nodes.contains_key(&node.id) {
            return Ok(false);
        }
        self.children.entry(node.parent).or_default().insert(node.id);
        self.nodes.insert(node.id, node);
        Ok(true)
    }

    fn get(&self, id: NodeId) -> Result<Node> {
        self.nodes.get(&id).copied().ok_or(Error::NotFound(id))
    }

    fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    fn tombstone(&mut self, id: NodeId) -> Result<bool> {
        let node = self.nodes.get_mut(&id).ok_or(Error::NotFound(id))?;
        if node.is_tombstoned() {
            return Ok(false);
        }
        node.payload = node.payload.tombstoned();
        Ok(true)
    }

    fn children_of(&self, id: NodeId) -> Result<Vec<NodeId>> {
        if !id.is_root() && !self.nodes.contains_key(&id) {
            return Err(Error::NotFound(id));
        }
        Ok(self
            .children
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default())
    }

    fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn max_timestamp(&self) -> Lamport {
        self.nodes
            .keys()
            .map(|id| id.timestamp)
            .max()
            .unwrap_or_default()
    }
}
