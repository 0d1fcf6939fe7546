#![forbid(unsafe_code)]
//! Core primitives for a Causal Tree: a state-based sequence CRDT where every character is a
//! node attached to the character it was typed after.
//! This crate stays independent of concrete storage engines and transports; replicas exchange
//! whole-tree [`Snapshot`]s and fold them in with [`CausalTree::merge`].

pub mod error;
pub mod ids;
pub mod materialization;
pub mod merge;
pub mod node;
pub mod snapshot;
pub mod traits;
pub mod tree;

pub use error::{Error, Result};
pub use ids::{EntityId, Lamport, NodeId, MAX_TIMESTAMP};
pub use materialization::{cmp_siblings, materialize, traversal_order, visible_ids};
pub use merge::{merge_into, MergeReport};
pub use node::{Node, Payload};
pub use snapshot::{NodeRecord, Snapshot};
pub use traits::{Clock, LamportClock, MemoryNodeStore, NodeStore};
pub use tree::{CausalTree, MemoryCausalTree};
