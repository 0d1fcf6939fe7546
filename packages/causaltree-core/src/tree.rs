use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::ids::{EntityId, Lamport, NodeId};
use crate::materialization;
use crate::merge::{self, MergeReport};
use crate::node::Node;
use crate::snapshot::{NodeRecord, Snapshot};
use crate::traits::{Clock, LamportClock, MemoryNodeStore, NodeStore};

/// Causal tree facade that wires one replica's entity id, node store and clock together.
///
/// A tree is owned by a single replica and expects sequential access; share it across threads
/// only behind an external lock covering the whole value.
#[derive(Clone, Debug)]
pub struct CausalTree<S, C>
where
    S: NodeStore,
    C: Clock,
{
    entity: EntityId,
    store: S,
    clock: C,
}

pub type MemoryCausalTree = CausalTree<MemoryNodeStore, LamportClock>;

impl MemoryCausalTree {
    pub fn in_memory(entity: EntityId) -> Self {
        Self::new(entity, MemoryNodeStore::default(), LamportClock::default())
    }
}

impl<S, C> CausalTree<S, C>
where
    S: NodeStore + Default,
    C: Clock + Default,
{
    /// Build a tree from a received snapshot by merging it into an empty one.
    pub fn load(entity: EntityId, snapshot: &Snapshot) -> Result<Self> {
        let mut tree = Self::new(entity, S::default(), C::default());
        tree.merge(snapshot)?;
        Ok(tree)
    }
}

impl<S, C> CausalTree<S, C>
where
    S: NodeStore,
    C: Clock,
{
    pub fn new(entity: EntityId, store: S, clock: C) -> Self {
        Self {
            entity,
            store,
            clock,
        }
    }

    /// Insert `value` as a new child of `parent` and return the minted id.
    pub fn insert_after(&mut self, parent: NodeId, value: char) -> Result<NodeId> {
        if !parent.is_root() && !self.store.contains(parent) {
            return Err(Error::UnknownParent { parent, node: None });
        }
        let id = NodeId::new(self.clock.tick()?, self.entity);
        self.store.insert(Node::new(id, parent, value))?;
        tracing::trace!(%id, %parent, "local insert");
        Ok(id)
    }

    /// Insert a run of characters, each one the child of the previous, as sequential typing
    /// produces. Returns the ids in order; the last one is the new cursor anchor.
    pub fn insert_str_after(&mut self, parent: NodeId, text: &str) -> Result<Vec<NodeId>> {
        let mut ids = Vec::with_capacity(text.len());
        let mut anchor = parent;
        for c in text.chars() {
            anchor = self.insert_after(anchor, c)?;
            ids.push(anchor);
        }
        Ok(ids)
    }

    /// Tombstone a node. Deleting an already-deleted node is a no-op.
    pub fn delete(&mut self, id: NodeId) -> Result<()> {
        if self.store.tombstone(id)? {
            tracing::trace!(%id, "local delete");
        }
        Ok(())
    }

    /// Merge a foreign snapshot. On error the tree is left unchanged.
    pub fn merge(&mut self, remote: &Snapshot) -> Result<MergeReport> {
        merge::merge_into(&mut self.store, &mut self.clock, remote)
    }

    /// Merge another in-process replica.
    pub fn merge_tree<S2, C2>(&mut self, other: &CausalTree<S2, C2>) -> Result<MergeReport>
    where
        S2: NodeStore,
        C2: Clock,
    {
        let snapshot = other.snapshot()?;
        self.merge(&snapshot)
    }

    /// Whole-state wire representation, records sorted ascending by id.
    pub fn snapshot(&self) -> Result<Snapshot> {
        let mut nodes = Vec::with_capacity(self.store.len());
        for id in self.node_ids() {
            nodes.push(NodeRecord::from(&self.store.get(id)?));
        }
        Ok(Snapshot {
            clock: self.clock.now(),
            nodes,
        })
    }

    /// Materialized sequence of visible characters.
    pub fn value(&self) -> Result<Vec<char>> {
        materialization::materialize(&self.store)
    }

    pub fn text(&self) -> Result<String> {
        Ok(self.value()?.into_iter().collect())
    }

    pub fn visible_ids(&self) -> Result<Vec<NodeId>> {
        materialization::visible_ids(&self.store)
    }

    pub fn traversal_order(&self) -> Result<Vec<NodeId>> {
        materialization::traversal_order(&self.store)
    }

    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Highest timestamp issued or observed by this replica.
    pub fn clock(&self) -> Lamport {
        self.clock.now()
    }

    pub fn get(&self, id: NodeId) -> Result<Node> {
        self.store.get(id)
    }

    pub fn children_of(&self, id: NodeId) -> Result<Vec<NodeId>> {
        self.store.children_of(id)
    }

    pub fn is_tombstoned(&self, id: NodeId) -> Result<bool> {
        Ok(self.store.get(id)?.is_tombstoned())
    }

    /// All node ids, ascending.
    pub fn node_ids(&self) -> Vec<NodeId> {
        let mut ids = self.store.node_ids();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Validate invariants: every parent is present, the children index agrees with parent
    /// pointers, there are no cycles, and the clock covers every stored timestamp. Intended for
    /// tests and debugging.
    pub fn validate_invariants(&self) -> Result<()> {
        let ids = self.store.node_ids();
        let mut indexed = 0usize;
        for parent in std::iter::once(NodeId::ROOT).chain(ids.iter().copied()) {
            let mut seen = HashSet::new();
            for child in self.store.children_of(parent)? {
                if !seen.insert(child) {
                    return Err(Error::InconsistentState(format!(
                        "duplicate child {child} under {parent}"
                    )));
                }
                let node = self.store.get(child).map_err(|_| {
                    Error::InconsistentState(format!("child {child} not present in nodes"))
                })?;
                if node.parent != parent {
                    return Err(Error::InconsistentState(format!(
                        "child {child} indexed under {parent} but points at {}",
                        node.parent
                    )));
                }
                indexed += 1;
            }
        }
        if indexed != ids.len() {
            return Err(Error::InconsistentState(format!(
                "{} nodes stored but {indexed} reachable through the children index",
                ids.len()
            )));
        }

        for id in &ids {
            if self.has_cycle_from(*id)? {
                return Err(Error::InconsistentState(format!("cycle detected at {id}")));
            }
        }

        let max = self.store.max_timestamp();
        if self.clock.now() < max {
            return Err(Error::InconsistentState(format!(
                "clock {} behind stored timestamp {max}",
                self.clock.now()
            )));
        }
        Ok(())
    }

    fn has_cycle_from(&self, start: NodeId) -> Result<bool> {
        let mut visited = HashSet::new();
        let mut current = start;
        while !current.is_root() {
            if !visited.insert(current) {
                return Ok(true);
            }
            current = self
                .store
                .get(current)
                .map_err(|_| {
                    Error::InconsistentState(format!("dangling parent reference {current}"))
                })?
                .parent;
        }
        Ok(false)
    }
}
