//! Point trees: capacity-bounded spatial indexes over exact coordinates.
//!
//! All variants share one generic tree parameterized by a [`Fanout`]
//! strategy. [`PointQuadTree`] partitions the XY plane into quadrants and
//! ignores z entirely; [`PointOctree`] partitions 3D space into octants.
//! [`AdaptiveOctree`] layers level-of-detail subsampling on top of the
//! octree.
//!
//! Leaves hold up to eight objects before subdividing. Subdivision stops
//! once child nodes would shrink below the tree's minimum node size; such
//! leaves saturate and grow without bound. Adding a point outside the
//! current bounds regrows the tree around a widened envelope instead of
//! failing.
//!
//! # Example
//!
//! ```rust
//! use cloudtree::{Coord, Envelope, PointOctree};
//!
//! let bounds = Envelope::new(0.0, 0.0, 0.0, 100.0, 100.0, 100.0);
//! let mut tree = PointOctree::new(bounds, 1.0)?;
//! tree.add("sensor-a", Coord::new(10.0, 20.0, 30.0))?;
//! tree.add("sensor-b", Coord::new(90.0, 80.0, 70.0))?;
//!
//! let hits = tree.search(&Envelope::new(0.0, 0.0, 0.0, 50.0, 50.0, 50.0));
//! assert_eq!(hits, vec![&"sensor-a"]);
//! # Ok::<(), cloudtree::CloudtreeError>(())
//! ```

mod adaptive;
mod node;
mod octree;
mod quadtree;
mod subsample;

pub use adaptive::AdaptiveOctree;
pub use node::{Fanout, TreeObject, NUM_OBJECTS_ALLOWED};
pub use octree::{Octants, PointOctree};
pub use quadtree::{PointQuadTree, Quadrants};

use crate::error::{CloudtreeError, Result};
use crate::validation::{validate_coord, validate_envelope};
use cloudtree_types::{Coord, Envelope};
use node::PointNode;

/// A point tree over payloads of type `T`, subdivided by strategy `F`.
#[derive(Debug)]
pub struct PointTree<T, F: Fanout> {
    pub(crate) root: PointNode<T, F>,
    min_node_size: f64,
    len: usize,
}

impl<T, F: Fanout> PointTree<T, F> {
    /// Create an empty tree over `bounds`.
    ///
    /// `min_node_size` is the smallest edge length a subdivision may
    /// produce; it must be positive and finite.
    pub fn new(bounds: Envelope, min_node_size: f64) -> Result<Self> {
        validate_envelope(&bounds)?;
        if !(min_node_size.is_finite() && min_node_size > 0.0) {
            return Err(CloudtreeError::InvalidInput(format!(
                "Minimum node size must be positive and finite, got: {}",
                min_node_size
            )));
        }
        Ok(Self {
            root: PointNode::new(bounds, 0, F::world_size(&bounds)),
            min_node_size,
            len: 0,
        })
    }

    /// Add a payload at `point`.
    ///
    /// Points outside the current bounds trigger a regrow: the tree is
    /// rebuilt over the union of its envelope and the new point.
    pub fn add(&mut self, obj: T, point: Coord) -> Result<()> {
        validate_coord(&point)?;
        let object = TreeObject::new(obj, point);
        if F::contains(&self.root.envelope, &point) {
            self.root.add(object, self.min_node_size)?;
        } else {
            self.regrow(object)?;
        }
        self.len += 1;
        Ok(())
    }

    /// Rebuild around a widened envelope, inserting the out-of-bounds point
    /// first and the previous contents after it.
    fn regrow(&mut self, object: TreeObject<T>) -> Result<()> {
        log::debug!(
            "Regrowing point tree to absorb out-of-bounds point ({}, {}, {})",
            object.point.x,
            object.point.y,
            object.point.z
        );
        let mut snapshot = Vec::with_capacity(self.len);
        self.root.drain_into(&mut snapshot);
        let bounds = self.root.envelope.union_coord(&object.point);
        self.root = PointNode::new(bounds, 0, F::world_size(&bounds));
        self.root.add(object, self.min_node_size)?;
        for prev in snapshot {
            self.root.add(prev, self.min_node_size)?;
        }
        Ok(())
    }

    /// All payloads whose coordinate falls inside `region`.
    ///
    /// Non-finite regions yield an empty result.
    pub fn search(&self, region: &Envelope) -> Vec<&T> {
        if !region.is_finite() {
            log::warn!("Rejecting point tree search with non-finite region");
            return Vec::new();
        }
        let mut out = Vec::new();
        self.root.search(region, &mut out);
        out
    }

    /// Like [`PointTree::search`], returning payloads with their
    /// coordinates.
    pub fn search_with_coords(&self, region: &Envelope) -> Vec<&TreeObject<T>> {
        if !region.is_finite() {
            log::warn!("Rejecting point tree search with non-finite region");
            return Vec::new();
        }
        let mut out = Vec::new();
        self.root.search_with_coords(region, &mut out);
        out
    }

    /// References to every stored object, in arbitrary order.
    pub fn get_all(&self) -> Vec<&TreeObject<T>> {
        let mut out = Vec::with_capacity(self.len);
        self.root.collect_objects(&mut out);
        out
    }

    /// Remove every object, keeping the current bounds.
    pub fn clear(&mut self) {
        let bounds = self.root.envelope;
        self.root = PointNode::new(bounds, 0, F::world_size(&bounds));
        self.len = 0;
    }

    /// Rebuild over the tightest envelope containing the current points.
    ///
    /// Removals leave empty interior nodes behind; this is the explicit way
    /// to compact them. An empty tree keeps its bounds.
    pub fn rebuild(&mut self) -> Result<()> {
        let mut objects = Vec::with_capacity(self.len);
        self.root.drain_into(&mut objects);
        let bounds = Envelope::from_coords(objects.iter().map(|o| &o.point))
            .unwrap_or(self.root.envelope);
        self.root = PointNode::new(bounds, 0, F::world_size(&bounds));
        for object in objects {
            self.root.add(object, self.min_node_size)?;
        }
        Ok(())
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Current bounds; grows on regrow, shrinks only via
    /// [`PointTree::rebuild`].
    pub fn envelope(&self) -> Envelope {
        self.root.envelope
    }

    pub fn min_node_size(&self) -> f64 {
        self.min_node_size
    }

    /// Number of nodes, the root included.
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// Deepest subdivision level; an unsplit root is depth 0.
    pub fn max_depth(&self) -> usize {
        self.root.max_depth()
    }

    /// Remove every object inside `region`, returning the removed payloads.
    ///
    /// Emptied nodes are not compacted; call [`PointTree::rebuild`] to
    /// reclaim them.
    pub fn remove_in(&mut self, region: &Envelope) -> Vec<T> {
        if !region.is_finite() {
            log::warn!("Rejecting point tree removal with non-finite region");
            return Vec::new();
        }
        let mut removed = Vec::new();
        self.root.remove_in(region, &mut removed);
        self.len -= removed.len();
        removed.into_iter().map(|o| o.obj).collect()
    }
}

impl<T: PartialEq, F: Fanout> PointTree<T, F> {
    /// Remove one object matching both payload and coordinate.
    ///
    /// Emptied nodes are not compacted; call [`PointTree::rebuild`] to
    /// reclaim them.
    pub fn remove(&mut self, obj: &T, point: &Coord) -> bool {
        if self.root.remove(obj, point) {
            self.len -= 1;
            true
        } else {
            false
        }
    }
}
