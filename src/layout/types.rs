use crate::ir::NodeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

/// Final centre of every node, indexed by [`NodeRef`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub(super) positions: Vec<Position>,
}

impl Placement {
    pub fn get(&self, node: NodeRef) -> Position {
        self.positions[node.index()]
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(super) enum GroupKind {
    Sections,
    Specials,
}

/// Ordered siblings laid out together under one anchor.
#[derive(Debug, Clone)]
pub(super) struct SiblingGroup {
    pub anchor: NodeRef,
    pub kind: GroupKind,
    pub members: Vec<NodeRef>,
}
