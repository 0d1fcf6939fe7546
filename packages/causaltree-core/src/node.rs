use crate::ids::NodeId;

/// Content carried by a node.
///
/// A tombstone keeps the character it replaced so diagnostics can still show what was deleted;
/// it never contributes to the materialized value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Payload {
    Char(char),
    Tombstone(char),
}

impl Payload {
    /// Live → tombstoned. Already-tombstoned payloads are returned unchanged.
    pub fn tombstoned(self) -> Self {
        match self {
            Payload::Char(c) | Payload::Tombstone(c) => Payload::Tombstone(c),
        }
    }

    pub fn is_tombstone(&self) -> bool {
        matches!(self, Payload::Tombstone(_))
    }

    pub fn char_value(&self) -> char {
        match self {
            Payload::Char(c) | Payload::Tombstone(c) => *c,
        }
    }
}

/// A single entry in the causal tree. `id` and `parent` never change after creation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Node {
    pub id: NodeId,
    pub parent: NodeId,
    pub payload: Payload,
}

impl Node {
    pub fn new(id: NodeId, parent: NodeId, value: char) -> Self {
        Self {
            id,
            parent,
            payload: Payload::Char(value),
        }
    }

    pub fn is_tombstoned(&self) -> bool {
        self.payload.is_tombstone()
    }

    /// The character to emit when materializing, `None` for tombstones.
    pub fn visible_char(&self) -> Option<char> {
        match self.payload {
            Payload::Char(c) => Some(c),
            Payload::Tombstone(_) => None,
        }
    }

    pub fn char_value(&self) -> char {
        self.payload.char_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::EntityId;

    #[test]
    fn tombstoning_is_one_way() {
        let p = Payload::Char('x');
        let t = p.tombstoned();
        assert_eq!(t, Payload::Tombstone('x'));
        assert_eq!(t.tombstoned(), t);
        assert_eq!(t.char_value(), 'x');
    }

    #[test]
    fn tombstoned_node_hides_its_char() {
        let id = NodeId::new(1, EntityId::from_u64(1));
        let mut node = Node::new(id, NodeId::ROOT, 'q');
        assert_eq!(node.visible_char(), Some('q'));
        node.payload = node.payload.tombstoned();
        assert!(node.is_tombstoned());
        assert_eq!(node.visible_char(), None);
        assert_eq!(node.char_value(), 'q');
    }
}
