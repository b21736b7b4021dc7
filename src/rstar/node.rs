//! Arena-backed node storage for the R*-tree.
//!
//! Nodes live in a slab owned by the tree and refer to each other by index.
//! Ownership flows strictly root to children; the `parent` link is a
//! non-owning back-reference used for envelope adjustment.

use cloudtree_types::Envelope;
use smallvec::SmallVec;

pub(crate) type NodeId = usize;

/// A payload together with the bounding envelope under which it is keyed.
#[derive(Debug, Clone)]
pub(crate) struct Entry<T> {
    pub item: T,
    pub envelope: Envelope,
}

#[derive(Debug)]
pub(crate) enum NodeKind<T> {
    /// Directory node: children are other nodes, one level down.
    Internal { children: SmallVec<[NodeId; 8]> },
    /// Leaf container: holds the indexed entries directly.
    Leaf { entries: Vec<Entry<T>> },
}

#[derive(Debug)]
pub(crate) struct Node<T> {
    /// Minimum bounding box of everything below this node.
    pub envelope: Envelope,
    pub parent: Option<NodeId>,
    /// Distance from the leaf level: leaves are level 0.
    pub level: usize,
    pub kind: NodeKind<T>,
}

impl<T> Node<T> {
    pub fn new_leaf(parent: Option<NodeId>) -> Self {
        Self {
            envelope: Envelope::empty(),
            parent,
            level: 0,
            kind: NodeKind::Leaf {
                entries: Vec::new(),
            },
        }
    }

    pub fn new_internal(parent: Option<NodeId>, level: usize) -> Self {
        Self {
            envelope: Envelope::empty(),
            parent,
            level,
            kind: NodeKind::Internal {
                children: SmallVec::new(),
            },
        }
    }

    /// Number of direct children (entries for a leaf container).
    pub fn child_count(&self) -> usize {
        match &self.kind {
            NodeKind::Internal { children } => children.len(),
            NodeKind::Leaf { entries } => entries.len(),
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf { .. })
    }
}
