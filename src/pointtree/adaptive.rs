//! Octree with level-of-detail subsampling for viewer-style retrieval.
//!
//! An [`AdaptiveOctree`] is a point octree whose nodes can carry a thinned
//! subsample of their subtree. A query anchored at a viewpoint then returns
//! full detail along the nodes whose XY footprint contains the viewpoint
//! and only the sparse representatives everywhere else, so detail falls off
//! with lateral distance.

use super::node::PointNode;
use super::octree::Octants;
use super::subsample::grid_subsample;
use super::{PointTree, TreeObject};
use crate::error::Result;
use cloudtree_types::{Coord, Envelope};

/// Grid cells per node edge when thinning a subtree.
const SUBSAMPLE_GRID_DIVISIONS: f64 = 100.0;

/// Point octree with per-node level-of-detail subsamples.
///
/// Subsamples are built explicitly by [`AdaptiveOctree::generate_subsamples`]
/// and become stale after mutation; regenerate after a batch of changes.
/// Nodes without a subsample fall back to their full contents during
/// retrieval, so an octree that never generated subsamples behaves like a
/// plain full-detail query.
#[derive(Debug)]
pub struct AdaptiveOctree<T: Clone + Sync> {
    tree: PointTree<T, Octants>,
    /// Nodes deeper than this keep full detail and are returned whole.
    subsample_max_depth: Option<usize>,
}

impl<T: Clone + Sync> AdaptiveOctree<T> {
    /// Create an empty adaptive octree over `bounds`.
    pub fn new(bounds: Envelope, min_node_size: f64) -> Result<Self> {
        Ok(Self {
            tree: PointTree::new(bounds, min_node_size)?,
            subsample_max_depth: None,
        })
    }

    /// Limit subsampling to nodes at or above `depth`; deeper subtrees are
    /// always returned in full.
    pub fn with_subsample_max_depth(mut self, depth: usize) -> Self {
        self.subsample_max_depth = Some(depth);
        self
    }

    pub fn subsample_max_depth(&self) -> Option<usize> {
        self.subsample_max_depth
    }

    /// Add a payload at `point`. Out-of-bounds points regrow the tree and
    /// drop any generated subsamples.
    pub fn add(&mut self, obj: T, point: Coord) -> Result<()> {
        self.tree.add(obj, point)
    }

    /// All payloads whose coordinate falls inside `region`, at full detail.
    pub fn search(&self, region: &Envelope) -> Vec<&T> {
        self.tree.search(region)
    }

    /// Objects inside `region` together with their coordinates.
    pub fn search_with_coords(&self, region: &Envelope) -> Vec<&TreeObject<T>> {
        self.tree.search_with_coords(region)
    }

    /// References to every stored object.
    pub fn get_all(&self) -> Vec<&TreeObject<T>> {
        self.tree.get_all()
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn envelope(&self) -> Envelope {
        self.tree.envelope()
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Remove every object inside `region`, returning the removed payloads.
    pub fn remove_in(&mut self, region: &Envelope) -> Vec<T> {
        self.tree.remove_in(region)
    }

    /// Rebuild over the tightest envelope containing the current points.
    /// Generated subsamples are dropped.
    pub fn rebuild(&mut self) -> Result<()> {
        self.tree.rebuild()
    }

    /// Recompute the subsample of every node, children before parents.
    ///
    /// Each node is thinned on a grid of cell size `world_size / 100`, so
    /// coarser nodes keep proportionally fewer representatives.
    pub fn generate_subsamples(&mut self) {
        let max_depth = self.subsample_max_depth.unwrap_or(usize::MAX);
        Self::generate_node(&mut self.tree.root, max_depth);
    }

    fn generate_node(node: &mut PointNode<T, Octants>, max_depth: usize) {
        if node.depth > max_depth {
            return;
        }
        for child in node.children.iter_mut() {
            Self::generate_node(child, max_depth);
        }
        let mut points = Vec::new();
        node.collect_points(&mut points);
        if points.is_empty() {
            node.subsample.clear();
            return;
        }
        node.subsample = grid_subsample(&points, node.world_size / SUBSAMPLE_GRID_DIVISIONS);
    }

    /// Level-of-detail retrieval anchored at `viewpoint`.
    ///
    /// Nodes whose XY footprint contains the viewpoint (z is ignored)
    /// contribute full detail and are drilled into; every other node
    /// contributes its subsample, or its full subtree when no subsample
    /// exists. Subtrees deeper than the configured maximum depth are
    /// returned whole.
    pub fn get_subsamples(&self, viewpoint: &Coord) -> Vec<&T> {
        if !viewpoint.is_finite() {
            log::warn!("Rejecting level-of-detail query with non-finite viewpoint");
            return Vec::new();
        }
        let max_depth = self.subsample_max_depth.unwrap_or(usize::MAX);
        let mut out = Vec::new();
        Self::collect_lod(&self.tree.root, viewpoint, max_depth, &mut out);
        out
    }

    fn collect_lod<'a>(
        node: &'a PointNode<T, Octants>,
        viewpoint: &Coord,
        max_depth: usize,
        out: &mut Vec<&'a T>,
    ) {
        if node.depth > max_depth {
            node.collect(out);
            return;
        }
        if node.envelope.contains_coord_xy(viewpoint) {
            out.extend(node.contents.iter().map(|o| &o.obj));
            for child in &node.children {
                if !child.is_empty_subtree() {
                    Self::collect_lod(child, viewpoint, max_depth, out);
                }
            }
        } else if !node.subsample.is_empty() {
            out.extend(node.subsample.iter());
        } else {
            node.collect(out);
        }
    }
}

impl<T: Clone + Sync + PartialEq> AdaptiveOctree<T> {
    /// Remove one object matching both payload and coordinate.
    pub fn remove(&mut self, obj: &T, point: &Coord) -> bool {
        self.tree.remove(obj, point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> Envelope {
        Envelope::new(0.0, 0.0, 0.0, 100.0, 100.0, 100.0)
    }

    /// A dense cluster of points inside a small cube anchored at `origin`.
    fn cluster(origin: (f64, f64, f64), count: usize) -> Vec<Coord> {
        (0..count)
            .map(|i| {
                let step = i as f64 * 0.4 / count as f64;
                Coord::new(origin.0 + step, origin.1 + step, origin.2 + step)
            })
            .collect()
    }

    #[test]
    fn test_without_subsamples_returns_full_detail() {
        let mut tree = AdaptiveOctree::new(bounds(), 1.0).unwrap();
        for (i, c) in cluster((10.0, 10.0, 10.0), 20).iter().enumerate() {
            tree.add(i, *c).unwrap();
        }
        // No generate_subsamples call: every node falls back to full detail
        let lod = tree.get_subsamples(&Coord::new(90.0, 90.0, 0.0));
        assert_eq!(lod.len(), 20);
    }

    #[test]
    fn test_search_with_coords_pairs_objects_and_points() {
        let mut tree = AdaptiveOctree::new(bounds(), 1.0).unwrap();
        let points = cluster((10.0, 10.0, 10.0), 12);
        for (i, c) in points.iter().enumerate() {
            tree.add(i, *c).unwrap();
        }
        let region = Envelope::new(5.0, 5.0, 5.0, 15.0, 15.0, 15.0);
        let hits = tree.search_with_coords(&region);
        assert_eq!(hits.len(), 12);
        for hit in hits {
            assert_eq!(points[hit.obj], hit.point);
            assert!(region.contains_coord(&hit.point));
        }
    }

    #[test]
    fn test_subsamples_thin_distant_clusters() {
        let mut tree = AdaptiveOctree::new(bounds(), 1.0).unwrap();
        // Dense cluster far from the viewpoint
        for (i, c) in cluster((10.0, 10.0, 10.0), 40).iter().enumerate() {
            tree.add(i, *c).unwrap();
        }
        tree.generate_subsamples();

        // Viewpoint in the opposite octant: only representatives come back
        let lod = tree.get_subsamples(&Coord::new(90.0, 90.0, 0.0));
        assert!(!lod.is_empty());
        assert!(lod.len() < 40, "expected thinning, got {} of 40", lod.len());

        // Plain search is unaffected by subsampling
        assert_eq!(tree.search(&bounds()).len(), 40);
    }

    #[test]
    fn test_viewpoint_footprint_keeps_full_detail() {
        let mut tree = AdaptiveOctree::new(bounds(), 1.0).unwrap();
        let near = cluster((10.0, 10.0, 10.0), 30);
        let far = cluster((80.0, 80.0, 80.0), 30);
        for (i, c) in near.iter().chain(far.iter()).enumerate() {
            tree.add(i, *c).unwrap();
        }
        tree.generate_subsamples();

        // Viewpoint over the near cluster, z far away: z must not matter
        let lod = tree.get_subsamples(&Coord::new(10.2, 10.2, 500.0));
        let near_hits = lod.iter().filter(|&&&i| i < 30).count();
        let far_hits = lod.len() - near_hits;
        assert_eq!(near_hits, 30, "full detail expected under the viewpoint");
        assert!(far_hits >= 1);
        assert!(far_hits < 30, "expected thinning away from the viewpoint");
    }

    #[test]
    fn test_max_depth_returns_deep_subtrees_whole() {
        let mut tree = AdaptiveOctree::new(bounds(), 1.0)
            .unwrap()
            .with_subsample_max_depth(0);
        for (i, c) in cluster((10.0, 10.0, 10.0), 40).iter().enumerate() {
            tree.add(i, *c).unwrap();
        }
        tree.generate_subsamples();

        // Depth 0 is the root; every child subtree is past the limit and
        // comes back in full regardless of the viewpoint.
        let lod = tree.get_subsamples(&Coord::new(90.0, 90.0, 0.0));
        assert_eq!(lod.len(), 40);
    }

    #[test]
    fn test_rebuild_drops_subsamples() {
        let mut tree = AdaptiveOctree::new(bounds(), 1.0).unwrap();
        for (i, c) in cluster((10.0, 10.0, 10.0), 40).iter().enumerate() {
            tree.add(i, *c).unwrap();
        }
        tree.generate_subsamples();
        tree.rebuild().unwrap();

        // Fallback to full detail until regenerated
        let lod = tree.get_subsamples(&Coord::new(90.0, 90.0, 0.0));
        assert_eq!(lod.len(), 40);
    }

    #[test]
    fn test_empty_tree() {
        let tree: AdaptiveOctree<u32> = AdaptiveOctree::new(bounds(), 1.0).unwrap();
        assert!(tree.get_subsamples(&Coord::new(50.0, 50.0, 0.0)).is_empty());
    }
}
