//! Shared node machinery for the point trees.
//!
//! A node is either a leaf holding up to [`NUM_OBJECTS_ALLOWED`] objects or
//! an interior node whose envelope has been partitioned by a [`Fanout`]
//! strategy. Leaves whose next subdivision would fall below the tree's
//! minimum node size stay leaves and grow without bound.

use crate::error::{CloudtreeError, Result};
use cloudtree_types::{Coord, Envelope};
use smallvec::SmallVec;
use std::marker::PhantomData;

/// Objects a leaf holds before it subdivides.
pub const NUM_OBJECTS_ALLOWED: usize = 8;

/// Spatial subdivision strategy.
///
/// Decides how a node envelope partitions into child envelopes, which edge
/// length is compared against the minimum node size, and which containment
/// test applies (full 3D for octants, XY-only for quadrants).
pub trait Fanout {
    /// Children produced by one subdivision.
    const CHILDREN: usize;

    /// Split `envelope` into [`Self::CHILDREN`] child envelopes at its
    /// midpoints.
    fn partition(envelope: &Envelope) -> SmallVec<[Envelope; 8]>;

    /// Edge length compared against the minimum node size.
    fn world_size(envelope: &Envelope) -> f64;

    /// Whether `coord` falls inside `envelope` under this strategy.
    fn contains(envelope: &Envelope, coord: &Coord) -> bool;

    /// Whether a node envelope and a query region overlap under this
    /// strategy.
    fn region_intersects(envelope: &Envelope, region: &Envelope) -> bool;
}

/// A payload pinned to the coordinate it is indexed under.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeObject<T> {
    pub obj: T,
    pub point: Coord,
}

impl<T> TreeObject<T> {
    pub fn new(obj: T, point: Coord) -> Self {
        Self { obj, point }
    }
}

#[derive(Debug)]
pub(crate) struct PointNode<T, F: Fanout> {
    pub envelope: Envelope,
    pub depth: usize,
    /// Cached `F::world_size` of the envelope; halves with each subdivision.
    pub world_size: f64,
    /// Empty for leaves; interior nodes hold exactly `F::CHILDREN` children.
    pub children: Vec<PointNode<T, F>>,
    /// Objects stored directly in this node; empty once subdivided.
    pub contents: Vec<TreeObject<T>>,
    /// Thinned representatives of the subtree, populated only by the
    /// adaptive octree's subsample pass.
    pub subsample: Vec<T>,
    _fanout: PhantomData<F>,
}

impl<T, F: Fanout> PointNode<T, F> {
    pub fn new(envelope: Envelope, depth: usize, world_size: f64) -> Self {
        Self {
            envelope,
            depth,
            world_size,
            children: Vec::new(),
            contents: Vec::new(),
            subsample: Vec::new(),
            _fanout: PhantomData,
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Add an object known to lie inside this node's envelope.
    ///
    /// A full leaf subdivides unless its children would fall below
    /// `min_node_size`; a leaf past that threshold saturates and keeps
    /// growing in place.
    pub fn add(&mut self, object: TreeObject<T>, min_node_size: f64) -> Result<()> {
        if self.is_leaf() {
            if self.contents.len() < NUM_OBJECTS_ALLOWED || self.world_size / 2.0 < min_node_size {
                self.contents.push(object);
                return Ok(());
            }
            self.subdivide()?;
        }
        match self
            .children
            .iter_mut()
            .find(|c| F::contains(&c.envelope, &object.point))
        {
            Some(child) => child.add(object, min_node_size),
            None => Err(child_rejection(&object.point)),
        }
    }

    /// Replace this leaf's contents with freshly partitioned children.
    fn subdivide(&mut self) -> Result<()> {
        self.children = F::partition(&self.envelope)
            .into_iter()
            .map(|env| PointNode::new(env, self.depth + 1, self.world_size / 2.0))
            .collect();
        debug_assert_eq!(self.children.len(), F::CHILDREN);
        for object in std::mem::take(&mut self.contents) {
            let Some(child) = self
                .children
                .iter_mut()
                .find(|c| F::contains(&c.envelope, &object.point))
            else {
                return Err(child_rejection(&object.point));
            };
            child.contents.push(object);
        }
        Ok(())
    }

    /// Remove one object matching both payload and coordinate.
    pub fn remove(&mut self, object: &T, point: &Coord) -> bool
    where
        T: PartialEq,
    {
        if !F::contains(&self.envelope, point) {
            return false;
        }
        if self.is_leaf() {
            if let Some(pos) = self
                .contents
                .iter()
                .position(|o| o.point == *point && o.obj == *object)
            {
                let _ = self.contents.remove(pos);
                return true;
            }
            false
        } else {
            self.children.iter_mut().any(|c| c.remove(object, point))
        }
    }

    /// Move every object whose coordinate falls inside `region` into `out`.
    /// Emptied interior nodes are not compacted.
    pub fn remove_in(&mut self, region: &Envelope, out: &mut Vec<TreeObject<T>>) {
        if !F::region_intersects(&self.envelope, region) {
            return;
        }
        if self.is_leaf() {
            let mut kept = Vec::with_capacity(self.contents.len());
            for object in self.contents.drain(..) {
                if F::contains(region, &object.point) {
                    out.push(object);
                } else {
                    kept.push(object);
                }
            }
            self.contents = kept;
        } else {
            for child in &mut self.children {
                child.remove_in(region, out);
            }
        }
    }

    pub fn search<'a>(&'a self, region: &Envelope, out: &mut Vec<&'a T>) {
        if !F::region_intersects(&self.envelope, region) {
            return;
        }
        out.extend(
            self.contents
                .iter()
                .filter(|o| F::contains(region, &o.point))
                .map(|o| &o.obj),
        );
        for child in &self.children {
            child.search(region, out);
        }
    }

    pub fn search_with_coords<'a>(&'a self, region: &Envelope, out: &mut Vec<&'a TreeObject<T>>) {
        if !F::region_intersects(&self.envelope, region) {
            return;
        }
        out.extend(self.contents.iter().filter(|o| F::contains(region, &o.point)));
        for child in &self.children {
            child.search_with_coords(region, out);
        }
    }

    /// Move every object out of the subtree, collapsing it back to an empty
    /// leaf.
    pub fn drain_into(&mut self, out: &mut Vec<TreeObject<T>>) {
        out.append(&mut self.contents);
        for mut child in std::mem::take(&mut self.children) {
            child.drain_into(out);
        }
        self.subsample.clear();
    }

    /// References to every payload below this node.
    pub fn collect<'a>(&'a self, out: &mut Vec<&'a T>) {
        out.extend(self.contents.iter().map(|o| &o.obj));
        for child in &self.children {
            child.collect(out);
        }
    }

    /// References to every object below this node.
    pub fn collect_objects<'a>(&'a self, out: &mut Vec<&'a TreeObject<T>>) {
        out.extend(self.contents.iter());
        for child in &self.children {
            child.collect_objects(out);
        }
    }

    /// Owned copies of every `(coordinate, payload)` pair below this node.
    pub fn collect_points(&self, out: &mut Vec<(Coord, T)>)
    where
        T: Clone,
    {
        out.extend(self.contents.iter().map(|o| (o.point, o.obj.clone())));
        for child in &self.children {
            child.collect_points(out);
        }
    }

    pub fn len(&self) -> usize {
        self.contents.len() + self.children.iter().map(|c| c.len()).sum::<usize>()
    }

    pub fn is_empty_subtree(&self) -> bool {
        self.contents.is_empty() && self.children.iter().all(|c| c.is_empty_subtree())
    }

    /// Nodes in the subtree, this one included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }

    /// Deepest level below this node, relative to the root.
    pub fn max_depth(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.max_depth())
            .max()
            .unwrap_or(self.depth)
    }
}

fn child_rejection(point: &Coord) -> CloudtreeError {
    CloudtreeError::InvariantViolation(format!(
        "point ({}, {}, {}) accepted by a node but rejected by every child envelope",
        point.x, point.y, point.z
    ))
}
