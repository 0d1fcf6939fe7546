//! State-based merge of a foreign snapshot into a local store.
//!
//! Merge is a set union over immutable node ids plus a boolean OR over tombstones, so it is
//! idempotent, commutative and associative. It runs as a read-only plan followed by an apply
//! step; every rejection happens while planning, which leaves the local store untouched.

use std::collections::{HashMap, HashSet};

use crate::error::{Error, Result};
use crate::ids::{Lamport, NodeId, MAX_TIMESTAMP};
use crate::node::Node;
use crate::snapshot::Snapshot;
use crate::traits::{Clock, NodeStore};

/// Summary of what a merge changed locally.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Nodes that were absent locally and have been added.
    pub inserted: usize,
    /// Nodes that were live locally and are now tombstoned.
    pub tombstoned: usize,
    /// Local clock after the merge.
    pub clock: Lamport,
}

impl MergeReport {
    pub fn is_noop(&self) -> bool {
        self.inserted == 0 && self.tombstoned == 0
    }
}

#[derive(Debug, Default)]
struct MergePlan {
    /// New nodes in an order where every parent precedes its children.
    inserts: Vec<Node>,
    /// Already-shared nodes that the remote has deleted.
    tombstones: Vec<NodeId>,
    observed: Lamport,
}

fn malformed(msg: String) -> Error {
    tracing::warn!(reason = %msg, "rejecting snapshot");
    Error::MalformedSnapshot(msg)
}

fn plan<S: NodeStore>(store: &S, remote: &Snapshot) -> Result<MergePlan> {
    if remote.clock > MAX_TIMESTAMP {
        return Err(malformed(format!(
            "clock {} exceeds the highest usable timestamp",
            remote.clock
        )));
    }
    let mut incoming: HashMap<NodeId, Node> = HashMap::with_capacity(remote.len());
    for record in &remote.nodes {
        let node = record.to_node();
        if node.id.timestamp == 0 || node.id.timestamp > MAX_TIMESTAMP {
            return Err(malformed(format!(
                "node {} uses a reserved timestamp",
                node.id
            )));
        }
        if let Some(prev) = incoming.get(&node.id) {
            if prev.parent != node.parent || prev.char_value() != node.char_value() {
                return Err(malformed(format!("conflicting records for node {}", node.id)));
            }
            // Same node listed twice; keep the tombstone if either copy carries one.
            if node.is_tombstoned() {
                incoming.insert(node.id, node);
            }
            continue;
        }
        incoming.insert(node.id, node);
    }

    let mut plan = MergePlan {
        observed: remote.clock.max(remote.max_timestamp()),
        ..MergePlan::default()
    };

    let mut pending: Vec<Node> = Vec::new();
    for node in incoming.values() {
        match store.get(node.id) {
            Ok(local) => {
                if local.parent != node.parent || local.char_value() != node.char_value() {
                    return Err(malformed(format!(
                        "node {} disagrees with the local copy",
                        node.id
                    )));
                }
                if node.is_tombstoned() && !local.is_tombstoned() {
                    plan.tombstones.push(node.id);
                }
            }
            Err(Error::NotFound(_)) => pending.push(*node),
            Err(e) => return Err(e),
        }
    }

    // Parents are normally older than their children, so ascending order places most nodes
    // in the first pass; the loop covers anything that arrived with odd timestamps.
    pending.sort_unstable_by_key(|n| n.id);
    let mut placed: HashSet<NodeId> = HashSet::with_capacity(pending.len());
    while !pending.is_empty() {
        let before = pending.len();
        let mut blocked = Vec::new();
        for node in pending {
            let parent_known = node.parent.is_root()
                || store.contains(node.parent)
                || placed.contains(&node.parent);
            if parent_known {
                placed.insert(node.id);
                plan.inserts.push(node);
            } else {
                blocked.push(node);
            }
        }
        if blocked.len() == before {
            let node = blocked[0];
            let msg = if incoming.contains_key(&node.parent) {
                format!("node {} is part of a parent cycle", node.id)
            } else {
                format!(
                    "node {} references parent {} that is not in the snapshot",
                    node.id, node.parent
                )
            };
            return Err(malformed(msg));
        }
        pending = blocked;
    }

    plan.tombstones.sort_unstable();
    Ok(plan)
}

/// Fold `remote` into `store`, advancing `clock` to the highest timestamp observed.
///
/// Fails with [`Error::MalformedSnapshot`] when the snapshot is internally inconsistent; in
/// that case neither the store nor the clock is modified. The apply step only performs
/// inserts and tombstones the plan has already validated, so atomicity holds as long as the
/// store honours the [`NodeStore`] contract for those calls; an I/O error from a persistent
/// store surfaces as-is and may leave part of the merge applied.
pub fn merge_into<S: NodeStore, C: Clock>(
    store: &mut S,
    clock: &mut C,
    remote: &Snapshot,
) -> Result<MergeReport> {
    let plan = plan(store, remote)?;

    let mut report = MergeReport::default();
    for node in plan.inserts {
        if store.insert(node)? {
            report.inserted += 1;
        }
    }
    for id in plan.tombstones {
        if store.tombstone(id)? {
            report.tombstoned += 1;
        }
    }
    clock.observe(plan.observed);
    report.clock = clock.now();

    tracing::debug!(
        inserted = report.inserted,
        tombstoned = report.tombstoned,
        clock = report.clock,
        remote_nodes = remote.len(),
        "merged snapshot"
    );
    Ok(report)
}
