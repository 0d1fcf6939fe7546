use thiserror::Error;

use crate::ids::{Lamport, NodeId};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("node not found: {0}")]
    NotFound(NodeId),
    /// `node` is `None` for local inserts, which are rejected before an id is minted.
    #[error("unknown parent {parent}")]
    UnknownParent {
        parent: NodeId,
        node: Option<NodeId>,
    },
    #[error("clock exhausted at timestamp {0}")]
    ClockExhausted(Lamport),
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),
    #[error("inconsistent state: {0}")]
    InconsistentState(String),
}
