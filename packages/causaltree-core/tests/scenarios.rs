use causaltree_core::{CausalTree, EntityId, MemoryCausalTree, NodeId};

fn replica(n: u64) -> MemoryCausalTree {
    CausalTree::in_memory(EntityId::from_u64(n))
}

#[test]
fn sequential_typing_reads_back_in_order() {
    let mut t = replica(1);
    let mut anchor = NodeId::ROOT;
    for c in ['h', 'e', 'l', 'l', 'o'] {
        anchor = t.insert_after(anchor, c).unwrap();
    }
    assert_eq!(t.text().unwrap(), "hello");
    assert_eq!(t.value().unwrap(), vec!['h', 'e', 'l', 'l', 'o']);
    t.validate_invariants().unwrap();
}

#[test]
fn empty_replica_catches_up_from_snapshot() {
    let mut r1 = replica(1);
    r1.insert_str_after(NodeId::ROOT, "hello").unwrap();

    let mut r2 = replica(2);
    let report = r2.merge(&r1.snapshot().unwrap()).unwrap();
    assert_eq!(report.inserted, 5);
    assert_eq!(r2.text().unwrap(), "hello");
    assert_eq!(r2.clock(), 5);

    let before = r2.snapshot().unwrap();
    let again = r2.merge(&r1.snapshot().unwrap()).unwrap();
    assert!(again.is_noop());
    assert_eq!(r2.snapshot().unwrap(), before);
    r2.validate_invariants().unwrap();
}

#[test]
fn concurrent_suffixes_do_not_interleave() {
    let mut r1 = replica(1);
    let heart = *r1.insert_str_after(NodeId::ROOT, "I <3").unwrap().last().unwrap();

    let mut r2 = replica(2);
    let mut r3 = replica(3);
    r2.merge_tree(&r1).unwrap();
    r3.merge_tree(&r1).unwrap();

    let pears = r2.insert_str_after(heart, " Pears").unwrap();
    let apples = r3.insert_str_after(heart, " Apples").unwrap();
    // Both forks were written with the same context.
    assert_eq!(pears[0].timestamp, apples[0].timestamp);

    r1.merge_tree(&r2).unwrap();
    r1.merge_tree(&r3).unwrap();
    r2.merge_tree(&r3).unwrap();
    r3.merge_tree(&r2).unwrap();

    // Equal timestamps: the higher entity id reads first.
    let expected = "I <3 Apples Pears";
    assert_eq!(r1.text().unwrap(), expected);
    assert_eq!(r2.text().unwrap(), expected);
    assert_eq!(r3.text().unwrap(), expected);
    assert_eq!(r1.snapshot().unwrap(), r2.snapshot().unwrap());
    assert_eq!(r2.snapshot().unwrap(), r3.snapshot().unwrap());
}

#[test]
fn delete_hides_char_but_keeps_node_in_snapshot() {
    let mut t = replica(1);
    let ids = t.insert_str_after(NodeId::ROOT, "cart").unwrap();
    t.delete(ids[2]).unwrap();

    assert_eq!(t.text().unwrap(), "cat");
    let snap = t.snapshot().unwrap();
    assert_eq!(snap.len(), 4);
    let record = snap.nodes.iter().find(|r| r.id() == ids[2]).unwrap();
    assert!(record.tombstoned);
    assert_eq!(record.value, 'r');
}

#[test]
fn later_edit_with_more_context_reads_first() {
    let mut t = replica(1);
    let ids = t.insert_str_after(NodeId::ROOT, "Causatrees").unwrap();
    // Fix the typo by typing "l " after "Causa".
    t.insert_str_after(ids[4], "l ").unwrap();
    assert_eq!(t.text().unwrap(), "Causal trees");
}

#[test]
fn remote_delete_propagates_and_never_reverts() {
    let mut r1 = replica(1);
    let ids = r1.insert_str_after(NodeId::ROOT, "abc").unwrap();
    let mut r2 = MemoryCausalTree::load(EntityId::from_u64(2), &r1.snapshot().unwrap()).unwrap();
    let stale = r2.snapshot().unwrap();

    r1.delete(ids[1]).unwrap();
    let report = r2.merge(&r1.snapshot().unwrap()).unwrap();
    assert_eq!(report.tombstoned, 1);
    assert_eq!(r2.text().unwrap(), "ac");

    // An older snapshot where the node is still live cannot resurrect it.
    r2.merge(&stale).unwrap();
    assert_eq!(r2.text().unwrap(), "ac");
    assert!(r2.is_tombstoned(ids[1]).unwrap());
}

#[test]
fn clock_advances_past_merged_timestamps() {
    let mut r1 = replica(1);
    r1.insert_str_after(NodeId::ROOT, "abcdef").unwrap();

    let mut r2 = replica(2);
    r2.insert_after(NodeId::ROOT, 'z').unwrap();
    r2.merge_tree(&r1).unwrap();
    assert_eq!(r2.clock(), 6);

    let next = r2.insert_after(NodeId::ROOT, 'y').unwrap();
    assert_eq!(next.timestamp, 7);
    // Root children: y(7), then z(1, entity 2) ahead of a(1, entity 1).
    assert_eq!(r2.text().unwrap(), "yzabcdef");
    r2.validate_invariants().unwrap();
}

#[test]
fn load_matches_source_replica() {
    let mut r1 = replica(1);
    let ids = r1.insert_str_after(NodeId::ROOT, "snapshot").unwrap();
    r1.delete(ids[0]).unwrap();

    let loaded = MemoryCausalTree::load(EntityId::from_u64(9), &r1.snapshot().unwrap()).unwrap();
    assert_eq!(loaded.entity(), EntityId::from_u64(9));
    assert_eq!(loaded.text().unwrap(), "napshot");
    assert_eq!(loaded.clock(), r1.clock());
    assert_eq!(loaded.node_ids(), r1.node_ids());
}
