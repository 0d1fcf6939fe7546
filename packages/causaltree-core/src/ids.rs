use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Lamport timestamp used for ordering nodes.
pub type Lamport = u64;

/// Highest timestamp a clock may issue or a snapshot may carry. `u64::MAX` stays unused so
/// ticking past any accepted value never overflows.
pub const MAX_TIMESTAMP: Lamport = u64::MAX - 1;

/// Fixed-width identifier for a replica.
///
/// Must be unique per replica; two replicas sharing an entity id can mint colliding node ids.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EntityId(pub [u8; 16]);

impl EntityId {
    /// Reserved for the synthetic root.
    pub const ZERO: EntityId = EntityId([0u8; 16]);

    pub fn new(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Big-endian in the low 8 bytes, so byte order matches numeric order.
    pub fn from_u64(n: u64) -> Self {
        let mut bytes = [0u8; 16];
        bytes[8..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

/// Unique identifier for a node in the causal tree.
///
/// Field order matters: the derived `Ord` compares `timestamp` first, then `entity`, which is
/// the total order sibling traversal is built on.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId {
    pub timestamp: Lamport,
    pub entity: EntityId,
}

impl NodeId {
    pub const ROOT: NodeId = NodeId {
        timestamp: 0,
        entity: EntityId::ZERO,
    };

    pub fn new(timestamp: Lamport, entity: EntityId) -> Self {
        Self { timestamp, entity }
    }

    pub fn is_root(&self) -> bool {
        *self == NodeId::ROOT
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "root");
        }
        write!(f, "{}@{}", self.timestamp, self.entity)
    }
}
