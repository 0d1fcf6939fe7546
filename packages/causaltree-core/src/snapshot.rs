//! Wire/persisted form of a causal tree: a flat node list plus the sender's clock.

use crate::ids::{EntityId, Lamport, NodeId};
use crate::node::{Node, Payload};

#[cfg(feature = "serde")]
use crate::error::{Error, Result};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One node as it crosses the replica boundary. The root parent is encoded as `NodeId::ROOT`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeRecord {
    pub timestamp: Lamport,
    pub entity: EntityId,
    pub parent: NodeId,
    pub value: char,
    #[cfg_attr(feature = "serde", serde(default))]
    pub tombstoned: bool,
}

impl NodeRecord {
    pub fn id(&self) -> NodeId {
        NodeId::new(self.timestamp, self.entity)
    }

    pub fn to_node(&self) -> Node {
        let payload = if self.tombstoned {
            Payload::Tombstone(self.value)
        } else {
            Payload::Char(self.value)
        };
        Node {
            id: self.id(),
            parent: self.parent,
            payload,
        }
    }
}

impl From<&Node> for NodeRecord {
    fn from(node: &Node) -> Self {
        Self {
            timestamp: node.id.timestamp,
            entity: node.id.entity,
            parent: node.parent,
            value: node.char_value(),
            tombstoned: node.is_tombstoned(),
        }
    }
}

/// Whole-state snapshot exchanged between replicas.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Snapshot {
    pub clock: Lamport,
    pub nodes: Vec<NodeRecord>,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn max_timestamp(&self) -> Lamport {
        self.nodes
            .iter()
            .map(|r| r.timestamp)
            .max()
            .unwrap_or_default()
    }
}

#[cfg(feature = "serde")]
impl Snapshot {
    pub fn to_json_vec(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| Error::MalformedSnapshot(format!("encode failed: {e}")))
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::MalformedSnapshot(format!("decode failed: {e}")))
    }
}
