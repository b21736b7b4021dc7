//! R*-tree spatial index for bounding-box-keyed geometries.
//!
//! The R*-tree improves on the classic R-tree insertion path with three
//! heuristics:
//!
//! - **Overlap-minimizing subtree choice** near the leaves, where duplicate
//!   visits during search are most expensive
//! - **Forced reinsertion** on overflow, at most once per level per
//!   top-level insert, which gives entries a second chance to land in a
//!   better subtree before any structural split
//! - **Margin-driven split axis choice** with an overlap-then-area split
//!   index, producing siblings that cover less dead space
//!
//! Entries are `(payload, envelope)` pairs; the tree is keyed purely by the
//! envelope. Nodes are stored in an index-based arena so parent links are
//! plain non-owning indices.
//!
//! The tree is not internally thread-safe; callers serialize mutation.
//!
//! # Example
//!
//! ```rust
//! use cloudtree::{Envelope, RStarTree};
//!
//! let mut tree = RStarTree::new();
//! tree.insert("building", Envelope::new(0.0, 0.0, 0.0, 10.0, 10.0, 0.0))?;
//! tree.insert("road", Envelope::new(5.0, -2.0, 0.0, 80.0, 2.0, 0.0))?;
//!
//! let hits = tree.search(&Envelope::new(4.0, -1.0, 0.0, 12.0, 11.0, 0.0));
//! assert_eq!(hits.len(), 2);
//! # Ok::<(), cloudtree::CloudtreeError>(())
//! ```

mod geometry;
mod node;

use crate::error::Result;
use crate::validation::validate_envelope;
use cloudtree_types::Envelope;
use geometry::{compute_enlargement, compute_margin, compute_overlap};
use node::{Entry, Node, NodeId, NodeKind};
use smallvec::SmallVec;
use std::cmp::Ordering;

/// Fraction of `max_children` evicted by a forced reinsertion.
///
/// Empirically chosen in the R*-tree literature; kept as-is.
const REINSERT_FRACTION: f64 = 0.3;

const DEFAULT_MIN_CHILDREN: usize = 4;
const DEFAULT_MAX_CHILDREN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    X,
    Y,
    Z,
}

/// R*-tree over `(payload, envelope)` entries.
#[derive(Debug)]
pub struct RStarTree<T> {
    nodes: Vec<Option<Node<T>>>,
    free: Vec<NodeId>,
    root: NodeId,
    /// Number of levels; a lone leaf root is height 1.
    height: usize,
    min_children: usize,
    max_children: usize,
    len: usize,
    /// Levels that already performed a forced reinsertion during the current
    /// top-level insertion; at most one reinsertion per level per insert.
    visited_levels: Vec<bool>,
}

impl<T> RStarTree<T> {
    /// Create an empty tree with the default fanout (4..=10 children).
    pub fn new() -> Self {
        Self::with_fanout(DEFAULT_MIN_CHILDREN, DEFAULT_MAX_CHILDREN)
    }

    /// Create an empty tree with a custom fanout.
    ///
    /// # Panics
    ///
    /// Panics unless `1 <= min_children` and `2 * min_children <= max_children`.
    pub fn with_fanout(min_children: usize, max_children: usize) -> Self {
        assert!(min_children >= 1, "min_children must be at least 1");
        assert!(
            2 * min_children <= max_children,
            "max_children must be at least twice min_children"
        );
        let mut tree = Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: 0,
            height: 1,
            min_children,
            max_children,
            len: 0,
            visited_levels: Vec::new(),
        };
        tree.root = tree.alloc(Node::new_leaf(None));
        tree
    }

    /// Number of entries in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of levels; a lone leaf root is height 1.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Insert a payload keyed under `envelope`.
    ///
    /// Rejects non-finite or inverted envelopes without mutating the tree.
    pub fn insert(&mut self, item: T, envelope: Envelope) -> Result<()> {
        validate_envelope(&envelope)?;
        self.reset_visited_levels();
        self.insert_entry(Entry { item, envelope });
        self.len += 1;
        Ok(())
    }

    /// All payloads whose envelope intersects `envelope`.
    ///
    /// Non-finite query envelopes yield an empty result.
    pub fn search(&self, envelope: &Envelope) -> Vec<&T> {
        if !envelope.is_finite() {
            log::warn!("Rejecting R*-tree search with non-finite envelope");
            return Vec::new();
        }
        let mut out = Vec::new();
        self.collect_intersecting(self.root, envelope, &mut out);
        out
    }

    /// Iterate over every payload in the tree, in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let mut out = Vec::with_capacity(self.len);
        self.collect_all(self.root, &mut out);
        out.into_iter()
    }

    /// Remove every entry, keeping the configured fanout.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.root = self.alloc(Node::new_leaf(None));
        self.height = 1;
        self.len = 0;
    }

    // ---- arena ----

    fn alloc(&mut self, node: Node<T>) -> NodeId {
        if let Some(id) = self.free.pop() {
            self.nodes[id] = Some(node);
            id
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    fn free_node(&mut self, id: NodeId) {
        self.nodes[id] = None;
        self.free.push(id);
    }

    fn node(&self, id: NodeId) -> &Node<T> {
        self.nodes[id].as_ref().expect("stale node id")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        self.nodes[id].as_mut().expect("stale node id")
    }

    // ---- insertion ----

    fn reset_visited_levels(&mut self) {
        self.visited_levels.clear();
        self.visited_levels.resize(self.height, false);
    }

    fn level_visited(&self, level: usize) -> bool {
        self.visited_levels.get(level).copied().unwrap_or(false)
    }

    fn mark_level_visited(&mut self, level: usize) {
        if level >= self.visited_levels.len() {
            self.visited_levels.resize(level + 1, false);
        }
        self.visited_levels[level] = true;
    }

    fn insert_entry(&mut self, entry: Entry<T>) {
        let envelope = entry.envelope;
        let leaf = self.choose_node(&envelope, 0);
        match &mut self.node_mut(leaf).kind {
            NodeKind::Leaf { entries } => entries.push(entry),
            NodeKind::Internal { .. } => {
                unreachable!("choose_node at level 0 must land on a leaf container")
            }
        }
        self.extend_upward(leaf, &envelope);
        if self.is_overflown(leaf) {
            self.overflow_treatment(leaf);
        }
    }

    /// Descend from the root to the node at `target_level` best suited to
    /// absorb `envelope`.
    ///
    /// Near the leaves the child minimizing overlap enlargement against its
    /// siblings wins (ties broken by area enlargement); higher up, plain
    /// area enlargement decides (ties broken by smaller absolute size).
    fn choose_node(&self, envelope: &Envelope, target_level: usize) -> NodeId {
        let mut cur = self.root;
        while self.node(cur).level > target_level {
            let node = self.node(cur);
            let NodeKind::Internal { children } = &node.kind else {
                break;
            };
            cur = if node.level == 1 {
                self.choose_child_min_overlap(children, envelope)
            } else {
                self.choose_child_min_enlargement(children, envelope)
            };
        }
        cur
    }

    fn choose_child_min_overlap(&self, children: &[NodeId], envelope: &Envelope) -> NodeId {
        let mut best_key = (f64::INFINITY, f64::INFINITY);
        let mut best = children[0];
        for &candidate in children {
            let cand_env = self.node(candidate).envelope;
            let enlarged = cand_env.union(envelope);
            let mut overlap_sum = 0.0;
            for &other in children {
                if other != candidate {
                    overlap_sum += compute_overlap(&enlarged, &self.node(other).envelope);
                }
            }
            let key = (overlap_sum, compute_enlargement(&cand_env, envelope));
            if key < best_key {
                best_key = key;
                best = candidate;
            }
        }
        best
    }

    fn choose_child_min_enlargement(&self, children: &[NodeId], envelope: &Envelope) -> NodeId {
        let mut best_key = (f64::INFINITY, f64::INFINITY);
        let mut best = children[0];
        for &candidate in children {
            let cand_env = self.node(candidate).envelope;
            let key = (compute_enlargement(&cand_env, envelope), cand_env.surface());
            if key < best_key {
                best_key = key;
                best = candidate;
            }
        }
        best
    }

    fn is_overflown(&self, id: NodeId) -> bool {
        self.node(id).child_count() > self.max_children
    }

    /// Widen envelopes from `id` up to the root to absorb `envelope`.
    fn extend_upward(&mut self, id: NodeId, envelope: &Envelope) {
        let mut cur = Some(id);
        while let Some(c) = cur {
            let node = self.node_mut(c);
            node.envelope = node.envelope.union(envelope);
            cur = node.parent;
        }
    }

    /// Recompute envelopes from `id` up to the root from actual contents.
    /// Needed whenever contents shrink.
    fn recompute_upward(&mut self, id: NodeId) {
        let mut cur = Some(id);
        while let Some(c) = cur {
            self.recompute_envelope(c);
            cur = self.node(c).parent;
        }
    }

    fn recompute_envelope(&mut self, id: NodeId) {
        let envelope = match &self.node(id).kind {
            NodeKind::Leaf { entries } => entries
                .iter()
                .fold(Envelope::empty(), |acc, e| acc.union(&e.envelope)),
            NodeKind::Internal { children } => children
                .iter()
                .fold(Envelope::empty(), |acc, &c| acc.union(&self.node(c).envelope)),
        };
        self.node_mut(id).envelope = envelope;
    }

    /// Resolve an overflown node: forced reinsertion the first time a level
    /// overflows during this insert (never at the root), a split otherwise.
    /// Splits cascade upward only while the parent overflows in turn.
    fn overflow_treatment(&mut self, mut id: NodeId) {
        loop {
            let level = self.node(id).level;
            let is_root = self.node(id).parent.is_none();
            if !is_root && !self.level_visited(level) {
                self.mark_level_visited(level);
                self.reinsert(id);
                return;
            }
            match self.split(id) {
                Some(parent) if self.is_overflown(parent) => id = parent,
                _ => return,
            }
        }
    }

    /// Evict the `round(0.3 * max_children)` children farthest from the
    /// node's envelope center and insert them again from scratch at their
    /// original level.
    fn reinsert(&mut self, id: NodeId) {
        let evict = ((REINSERT_FRACTION * self.max_children as f64).round() as usize).max(1);
        let center = self.node(id).envelope.center();

        if self.node(id).is_leaf() {
            let evicted: Vec<Entry<T>> = {
                let NodeKind::Leaf { entries } = &mut self.node_mut(id).kind else {
                    unreachable!()
                };
                entries.sort_by(|a, b| {
                    let da = a.envelope.center().distance_sq(&center);
                    let db = b.envelope.center().distance_sq(&center);
                    db.partial_cmp(&da).unwrap_or(Ordering::Equal)
                });
                entries.drain(..evict).collect()
            };
            self.recompute_upward(id);
            for entry in evicted {
                self.insert_entry(entry);
            }
        } else {
            let ids: Vec<NodeId> = match &self.node(id).kind {
                NodeKind::Internal { children } => children.to_vec(),
                NodeKind::Leaf { .. } => unreachable!(),
            };
            let mut ranked: Vec<(f64, NodeId)> = ids
                .iter()
                .map(|&c| (self.node(c).envelope.center().distance_sq(&center), c))
                .collect();
            ranked.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
            let evicted: Vec<NodeId> = ranked[..evict].iter().map(|&(_, c)| c).collect();
            let remaining: SmallVec<[NodeId; 8]> =
                ranked[evict..].iter().map(|&(_, c)| c).collect();
            match &mut self.node_mut(id).kind {
                NodeKind::Internal { children } => *children = remaining,
                NodeKind::Leaf { .. } => unreachable!(),
            }
            for &c in &evicted {
                self.node_mut(c).parent = None;
            }
            self.recompute_upward(id);
            for child in evicted {
                self.reinsert_subtree(child);
            }
        }
    }

    /// Attach a detached subtree at its original level. Levels are counted
    /// from the leaves, so root growth during the adjustment does not shift
    /// the target.
    fn reinsert_subtree(&mut self, child: NodeId) {
        let envelope = self.node(child).envelope;
        let child_level = self.node(child).level;
        let parent = self.choose_node(&envelope, child_level + 1);
        self.attach_child(parent, child);
        self.extend_upward(parent, &envelope);
        if self.is_overflown(parent) {
            self.overflow_treatment(parent);
        }
    }

    fn attach_child(&mut self, parent: NodeId, child: NodeId) {
        self.node_mut(child).parent = Some(parent);
        match &mut self.node_mut(parent).kind {
            NodeKind::Internal { children } => children.push(child),
            NodeKind::Leaf { .. } => unreachable!("cannot attach a node to a leaf container"),
        }
    }

    fn detach_child(&mut self, parent: NodeId, child: NodeId) {
        match &mut self.node_mut(parent).kind {
            NodeKind::Internal { children } => children.retain(|c| *c != child),
            NodeKind::Leaf { .. } => unreachable!(),
        }
        self.node_mut(child).parent = None;
    }

    // ---- splitting ----

    /// Partition an overflown node into itself plus a new sibling, attach
    /// the sibling, and return the parent when one absorbed it. A root
    /// split creates a fresh root and grows the height instead.
    fn split(&mut self, id: NodeId) -> Option<NodeId> {
        let level = self.node(id).level;
        let parent = self.node(id).parent;
        let min = self.min_children;

        let sibling = if self.node(id).is_leaf() {
            let entries = match &mut self.node_mut(id).kind {
                NodeKind::Leaf { entries } => entries,
                NodeKind::Internal { .. } => unreachable!(),
            };
            let mut items = std::mem::take(entries);
            let split_at = choose_split_index(&mut items, |e: &Entry<T>| e.envelope, min);
            let right = items.split_off(split_at);
            *entries = items;
            Node {
                envelope: Envelope::empty(),
                parent,
                level,
                kind: NodeKind::Leaf { entries: right },
            }
        } else {
            let ids: Vec<NodeId> = match &self.node(id).kind {
                NodeKind::Internal { children } => children.to_vec(),
                NodeKind::Leaf { .. } => unreachable!(),
            };
            let mut items: Vec<(NodeId, Envelope)> = ids
                .iter()
                .map(|&c| (c, self.node(c).envelope))
                .collect();
            let split_at = choose_split_index(&mut items, |e: &(NodeId, Envelope)| e.1, min);
            let right: SmallVec<[NodeId; 8]> =
                items.split_off(split_at).into_iter().map(|(c, _)| c).collect();
            let left: SmallVec<[NodeId; 8]> = items.into_iter().map(|(c, _)| c).collect();
            match &mut self.node_mut(id).kind {
                NodeKind::Internal { children } => *children = left,
                NodeKind::Leaf { .. } => unreachable!(),
            }
            Node {
                envelope: Envelope::empty(),
                parent,
                level,
                kind: NodeKind::Internal { children: right },
            }
        };

        let sibling_id = self.alloc(sibling);
        let moved: Vec<NodeId> = match &self.node(sibling_id).kind {
            NodeKind::Internal { children } => children.to_vec(),
            NodeKind::Leaf { .. } => Vec::new(),
        };
        for c in moved {
            self.node_mut(c).parent = Some(sibling_id);
        }
        self.recompute_envelope(id);
        self.recompute_envelope(sibling_id);

        match parent {
            Some(p) => {
                match &mut self.node_mut(p).kind {
                    NodeKind::Internal { children } => children.push(sibling_id),
                    NodeKind::Leaf { .. } => unreachable!(),
                }
                Some(p)
            }
            None => {
                let new_root = self.alloc(Node::new_internal(None, level + 1));
                self.node_mut(id).parent = Some(new_root);
                self.node_mut(sibling_id).parent = Some(new_root);
                match &mut self.node_mut(new_root).kind {
                    NodeKind::Internal { children } => {
                        children.push(id);
                        children.push(sibling_id);
                    }
                    NodeKind::Leaf { .. } => unreachable!(),
                }
                self.recompute_envelope(new_root);
                self.root = new_root;
                self.height += 1;
                log::debug!("R*-tree root split, height is now {}", self.height);
                None
            }
        }
    }

    // ---- queries ----

    fn collect_intersecting<'a>(
        &'a self,
        id: NodeId,
        envelope: &Envelope,
        out: &mut Vec<&'a T>,
    ) {
        let node = self.node(id);
        if !node.envelope.intersects(envelope) {
            return;
        }
        match &node.kind {
            NodeKind::Leaf { entries } => out.extend(
                entries
                    .iter()
                    .filter(|e| e.envelope.intersects(envelope))
                    .map(|e| &e.item),
            ),
            NodeKind::Internal { children } => {
                for &c in children {
                    self.collect_intersecting(c, envelope, out);
                }
            }
        }
    }

    fn collect_all<'a>(&'a self, id: NodeId, out: &mut Vec<&'a T>) {
        match &self.node(id).kind {
            NodeKind::Leaf { entries } => out.extend(entries.iter().map(|e| &e.item)),
            NodeKind::Internal { children } => {
                for &c in children {
                    self.collect_all(c, out);
                }
            }
        }
    }
}

impl<T: PartialEq> RStarTree<T> {
    /// Remove the entry matching `item` under exactly `envelope`.
    ///
    /// Returns whether an entry was removed. Underfull nodes along the
    /// removal path are dissolved and their entries reinserted.
    pub fn remove(&mut self, item: &T, envelope: &Envelope) -> bool {
        if !envelope.is_finite() {
            log::warn!("Rejecting R*-tree removal with non-finite envelope");
            return false;
        }
        let Some(leaf) = self.find_leaf_with(self.root, item, envelope) else {
            return false;
        };
        match &mut self.node_mut(leaf).kind {
            NodeKind::Leaf { entries } => {
                let pos = entries
                    .iter()
                    .position(|e| e.envelope == *envelope && e.item == *item)
                    .expect("entry vanished between lookup and removal");
                let _ = entries.remove(pos);
            }
            NodeKind::Internal { .. } => unreachable!(),
        }
        self.len -= 1;
        self.condense(leaf);
        true
    }

    fn find_leaf_with(&self, id: NodeId, item: &T, envelope: &Envelope) -> Option<NodeId> {
        let node = self.node(id);
        if !node.envelope.intersects(envelope) {
            return None;
        }
        match &node.kind {
            NodeKind::Leaf { entries } => entries
                .iter()
                .any(|e| e.envelope == *envelope && e.item == *item)
                .then_some(id),
            NodeKind::Internal { children } => children
                .iter()
                .find_map(|&c| self.find_leaf_with(c, item, envelope)),
        }
    }

    /// Walk from a shrunk leaf to the root, dissolving underfull nodes and
    /// reinserting their entries, then shrink the root while it has a
    /// single child.
    fn condense(&mut self, start: NodeId) {
        let mut orphans: Vec<Entry<T>> = Vec::new();
        let mut cur = start;
        loop {
            match self.node(cur).parent {
                Some(parent) => {
                    if self.node(cur).child_count() < self.min_children {
                        self.detach_child(parent, cur);
                        self.take_entries(cur, &mut orphans);
                    } else {
                        self.recompute_envelope(cur);
                    }
                    cur = parent;
                }
                None => {
                    self.recompute_envelope(cur);
                    break;
                }
            }
        }

        loop {
            let only_child = match &self.node(self.root).kind {
                NodeKind::Internal { children } if children.len() == 1 => Some(children[0]),
                _ => None,
            };
            match only_child {
                Some(child) => {
                    let old = self.root;
                    self.node_mut(child).parent = None;
                    self.root = child;
                    self.height -= 1;
                    self.free_node(old);
                }
                None => break,
            }
        }
        let root_emptied = matches!(
            &self.node(self.root).kind,
            NodeKind::Internal { children } if children.is_empty()
        );
        if root_emptied {
            let old = self.root;
            self.free_node(old);
            self.root = self.alloc(Node::new_leaf(None));
            self.height = 1;
        }

        for entry in orphans {
            self.reset_visited_levels();
            self.insert_entry(entry);
        }
    }

    /// Move every entry below `id` into `out`, freeing the subtree.
    fn take_entries(&mut self, id: NodeId, out: &mut Vec<Entry<T>>) {
        let node = self.nodes[id].take().expect("stale node id");
        self.free.push(id);
        match node.kind {
            NodeKind::Leaf { entries } => out.extend(entries),
            NodeKind::Internal { children } => {
                for c in children {
                    self.take_entries(c, out);
                }
            }
        }
    }
}

impl<T> Default for RStarTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn axis_lower(envelope: &Envelope, axis: Axis) -> f64 {
    match axis {
        Axis::X => envelope.min_x,
        Axis::Y => envelope.min_y,
        Axis::Z => envelope.min_z,
    }
}

fn axis_upper(envelope: &Envelope, axis: Axis) -> f64 {
    match axis {
        Axis::X => envelope.max_x,
        Axis::Y => envelope.max_y,
        Axis::Z => envelope.max_z,
    }
}

fn sort_along_axis<E>(items: &mut [E], env_of: &impl Fn(&E) -> Envelope, axis: Axis) {
    items.sort_by(|a, b| {
        let ea = env_of(a);
        let eb = env_of(b);
        axis_lower(&ea, axis)
            .partial_cmp(&axis_lower(&eb, axis))
            .unwrap_or(Ordering::Equal)
            .then(
                axis_upper(&ea, axis)
                    .partial_cmp(&axis_upper(&eb, axis))
                    .unwrap_or(Ordering::Equal),
            )
    });
}

fn margin_sum<E>(
    items: &mut [E],
    env_of: &impl Fn(&E) -> Envelope,
    axis: Axis,
    min_children: usize,
) -> f64 {
    sort_along_axis(items, env_of, axis);
    let count = items.len();
    let mut sum = 0.0;
    for k in min_children..=(count - min_children) {
        let (left, right) = items.split_at(k);
        let left_env = left
            .iter()
            .fold(Envelope::empty(), |acc, e| acc.union(&env_of(e)));
        let right_env = right
            .iter()
            .fold(Envelope::empty(), |acc, e| acc.union(&env_of(e)));
        sum += compute_margin(&left_env) + compute_margin(&right_env);
    }
    sum
}

/// Pick the split axis by minimum total margin, leave `items` sorted along
/// it, and return the split index minimizing overlap between the two
/// resulting groups (ties broken by their combined size).
///
/// Z only competes when the envelope set is non-planar, and wins only when
/// strictly smaller than both X and Y; X is preferred on ties with Y.
fn choose_split_index<E>(
    items: &mut Vec<E>,
    env_of: impl Fn(&E) -> Envelope,
    min_children: usize,
) -> usize {
    let count = items.len();
    let overall = items
        .iter()
        .fold(Envelope::empty(), |acc, e| acc.union(&env_of(e)));
    let non_planar = overall.min_z < overall.max_z;

    let x_sum = margin_sum(items, &env_of, Axis::X, min_children);
    let y_sum = margin_sum(items, &env_of, Axis::Y, min_children);
    let z_sum = if non_planar {
        Some(margin_sum(items, &env_of, Axis::Z, min_children))
    } else {
        None
    };

    let axis = match z_sum {
        Some(z) if z < x_sum && z < y_sum => Axis::Z,
        _ if y_sum < x_sum => Axis::Y,
        _ => Axis::X,
    };
    sort_along_axis(items, &env_of, axis);

    let mut best_key = (f64::INFINITY, f64::INFINITY);
    let mut best_k = min_children;
    for k in min_children..=(count - min_children) {
        let (left, right) = items.split_at(k);
        let left_env = left
            .iter()
            .fold(Envelope::empty(), |acc, e| acc.union(&env_of(e)));
        let right_env = right
            .iter()
            .fold(Envelope::empty(), |acc, e| acc.union(&env_of(e)));
        let key = (
            compute_overlap(&left_env, &right_env),
            left_env.surface() + right_env.surface(),
        );
        if key < best_key {
            best_key = key;
            best_k = k;
        }
    }
    best_k
}

#[cfg(test)]
mod tests {
    use super::*;
    use cloudtree_types::Coord;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn point_env(x: f64, y: f64, z: f64) -> Envelope {
        Envelope::new(x, y, z, x, y, z)
    }

    fn random_envelopes(count: usize, seed: u64) -> Vec<Envelope> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                let x = rng.random_range(-500.0..500.0);
                let y = rng.random_range(-500.0..500.0);
                let z = rng.random_range(-50.0..50.0);
                let w = rng.random_range(0.0..5.0);
                Envelope::new(x, y, z, x + w, y + w, z + w)
            })
            .collect()
    }

    /// Walks the arena checking fanout bounds, envelope tightness, parent
    /// links, and level bookkeeping.
    fn check_structure<T>(tree: &RStarTree<T>) {
        fn visit<T>(tree: &RStarTree<T>, id: NodeId, expected_parent: Option<NodeId>) {
            let node = tree.node(id);
            assert_eq!(node.parent, expected_parent, "broken parent link");
            if expected_parent.is_some() && tree.len > 0 {
                assert!(
                    node.child_count() >= tree.min_children,
                    "non-root node underfull: {} children",
                    node.child_count()
                );
            }
            assert!(
                node.child_count() <= tree.max_children,
                "node overfull: {} children",
                node.child_count()
            );
            match &node.kind {
                NodeKind::Leaf { entries } => {
                    assert_eq!(node.level, 0);
                    let tight = entries
                        .iter()
                        .fold(Envelope::empty(), |acc, e| acc.union(&e.envelope));
                    if !entries.is_empty() {
                        assert_eq!(node.envelope, tight, "leaf envelope not tight");
                    }
                }
                NodeKind::Internal { children } => {
                    let tight = children
                        .iter()
                        .fold(Envelope::empty(), |acc, &c| acc.union(&tree.node(c).envelope));
                    assert_eq!(node.envelope, tight, "internal envelope not tight");
                    for &c in children {
                        assert_eq!(tree.node(c).level + 1, node.level);
                        visit(tree, c, Some(id));
                    }
                }
            }
        }
        visit(tree, tree.root, None);
        assert_eq!(tree.node(tree.root).level + 1, tree.height);
    }

    #[test]
    fn test_insert_and_search_single() {
        let mut tree = RStarTree::new();
        tree.insert(1u32, point_env(1.0, 2.0, 0.0)).unwrap();
        assert_eq!(tree.len(), 1);
        let hits = tree.search(&Envelope::new(0.0, 0.0, 0.0, 5.0, 5.0, 0.0));
        assert_eq!(hits, vec![&1u32]);
        let misses = tree.search(&Envelope::new(10.0, 10.0, 0.0, 20.0, 20.0, 0.0));
        assert!(misses.is_empty());
    }

    #[test]
    fn test_insert_rejects_bad_envelope() {
        let mut tree: RStarTree<u32> = RStarTree::new();
        assert!(tree
            .insert(1, Envelope::new(0.0, 0.0, 0.0, f64::NAN, 1.0, 1.0))
            .is_err());
        assert!(tree.insert(1, Envelope::empty()).is_err());
        assert!(tree.is_empty());
    }

    #[test]
    fn test_structure_after_many_inserts() {
        let mut tree = RStarTree::new();
        let envs = random_envelopes(500, 7);
        for (i, env) in envs.iter().enumerate() {
            tree.insert(i, *env).unwrap();
        }
        assert_eq!(tree.len(), 500);
        assert!(tree.height() > 1);
        check_structure(&tree);
    }

    #[test]
    fn test_search_matches_linear_filter() {
        let mut tree = RStarTree::new();
        let envs = random_envelopes(400, 11);
        for (i, env) in envs.iter().enumerate() {
            tree.insert(i, *env).unwrap();
        }
        let query = Envelope::new(-100.0, -100.0, -10.0, 100.0, 100.0, 10.0);
        let mut hits: Vec<usize> = tree.search(&query).into_iter().copied().collect();
        hits.sort_unstable();
        let mut expected: Vec<usize> = envs
            .iter()
            .enumerate()
            .filter(|(_, e)| e.intersects(&query))
            .map(|(i, _)| i)
            .collect();
        expected.sort_unstable();
        assert_eq!(hits, expected);
    }

    #[test]
    fn test_remove_roundtrip() {
        let mut tree = RStarTree::new();
        let envs = random_envelopes(100, 3);
        for (i, env) in envs.iter().enumerate() {
            tree.insert(i, *env).unwrap();
        }
        let extra = point_env(999.0, 999.0, 0.0);
        tree.insert(100usize, extra).unwrap();
        assert_eq!(tree.len(), 101);

        assert!(tree.remove(&100, &extra));
        assert_eq!(tree.len(), 100);
        assert!(!tree.remove(&100, &extra));
        assert!(tree.search(&extra).is_empty());
        check_structure(&tree);
    }

    #[test]
    fn test_remove_everything() {
        let mut tree = RStarTree::new();
        let envs = random_envelopes(80, 21);
        for (i, env) in envs.iter().enumerate() {
            tree.insert(i, *env).unwrap();
        }
        for (i, env) in envs.iter().enumerate() {
            assert!(tree.remove(&i, env), "entry {} not removed", i);
        }
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 1);
    }

    #[test]
    fn test_iter_counts_all_entries() {
        let mut tree = RStarTree::new();
        for (i, env) in random_envelopes(64, 5).iter().enumerate() {
            tree.insert(i, *env).unwrap();
        }
        assert_eq!(tree.iter().count(), 64);
    }

    #[test]
    fn test_clear() {
        let mut tree = RStarTree::new();
        for (i, env) in random_envelopes(50, 9).iter().enumerate() {
            tree.insert(i, *env).unwrap();
        }
        tree.clear();
        assert!(tree.is_empty());
        assert_eq!(tree.height(), 1);
        assert!(tree
            .search(&Envelope::new(-1000.0, -1000.0, -100.0, 1000.0, 1000.0, 100.0))
            .is_empty());
    }

    #[test]
    fn test_custom_fanout() {
        let mut tree = RStarTree::with_fanout(2, 4);
        for (i, env) in random_envelopes(100, 13).iter().enumerate() {
            tree.insert(i, *env).unwrap();
        }
        check_structure(&tree);
        assert!(tree.height() >= 3);
    }

    #[test]
    #[should_panic(expected = "max_children")]
    fn test_invalid_fanout_panics() {
        let _ = RStarTree::<u32>::with_fanout(4, 6);
    }

    #[test]
    fn test_split_index_balance() {
        // A freshly overflown set must split with both groups holding
        // between min and max children.
        let mut items: Vec<Envelope> = random_envelopes(11, 17);
        let k = choose_split_index(&mut items, |e| *e, 4);
        assert!(k >= 4);
        assert!(items.len() - k >= 4);
    }

    #[test]
    fn test_choose_node_prefers_containing_child() {
        let mut tree = RStarTree::new();
        // Two well-separated clusters force a split into distinct regions.
        for i in 0..12 {
            tree.insert(i, point_env(i as f64 * 0.1, 0.0, 0.0)).unwrap();
        }
        for i in 12..24 {
            tree.insert(i, point_env(1000.0 + i as f64 * 0.1, 0.0, 0.0))
                .unwrap();
        }
        check_structure(&tree);
        // A point near the first cluster must not stretch a far-away node.
        tree.insert(24, point_env(0.5, 0.1, 0.0)).unwrap();
        check_structure(&tree);
        let near = tree.search(&Envelope::new(-1.0, -1.0, 0.0, 3.0, 1.0, 0.0));
        assert!(near.contains(&&24));
    }

    #[test]
    fn test_distance_ordering_in_reinsert() {
        // Dense cluster plus outliers exercises the forced-reinsertion path
        // without tripping structural checks.
        let mut tree = RStarTree::with_fanout(2, 5);
        let mut rng = StdRng::seed_from_u64(31);
        for i in 0..200 {
            let x: f64 = rng.random_range(-1.0..1.0);
            let y: f64 = rng.random_range(-1.0..1.0);
            tree.insert(i, point_env(x, y, 0.0)).unwrap();
        }
        check_structure(&tree);
        assert_eq!(tree.len(), 200);
        let all = tree.search(&Envelope::new(-2.0, -2.0, 0.0, 2.0, 2.0, 0.0));
        assert_eq!(all.len(), 200);
    }

    #[test]
    fn test_coord_payload() {
        // Payloads can be arbitrary types, including coordinates themselves.
        let mut tree = RStarTree::new();
        let c = Coord::new(1.0, 2.0, 3.0);
        tree.insert(c, point_env(c.x, c.y, c.z)).unwrap();
        let hits = tree.search(&Envelope::new(0.0, 0.0, 0.0, 5.0, 5.0, 5.0));
        assert_eq!(hits, vec![&c]);
    }
}
