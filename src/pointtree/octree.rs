//! Octant fanout: full 3D subdivision.

use super::node::Fanout;
use super::PointTree;
use cloudtree_types::{Coord, Envelope};
use smallvec::SmallVec;

/// Eight-way subdivision at the envelope midpoints of all three axes.
#[derive(Debug, Clone, Copy)]
pub struct Octants;

impl Fanout for Octants {
    const CHILDREN: usize = 8;

    fn partition(envelope: &Envelope) -> SmallVec<[Envelope; 8]> {
        let mid_x = (envelope.min_x + envelope.max_x) / 2.0;
        let mid_y = (envelope.min_y + envelope.max_y) / 2.0;
        let mid_z = (envelope.min_z + envelope.max_z) / 2.0;
        let xs = [(envelope.min_x, mid_x), (mid_x, envelope.max_x)];
        let ys = [(envelope.min_y, mid_y), (mid_y, envelope.max_y)];
        let zs = [(envelope.min_z, mid_z), (mid_z, envelope.max_z)];

        let mut out = SmallVec::new();
        for &(min_z, max_z) in &zs {
            for &(min_y, max_y) in &ys {
                for &(min_x, max_x) in &xs {
                    out.push(Envelope::new(min_x, min_y, min_z, max_x, max_y, max_z));
                }
            }
        }
        out
    }

    fn world_size(envelope: &Envelope) -> f64 {
        envelope.max_dimension()
    }

    fn contains(envelope: &Envelope, coord: &Coord) -> bool {
        envelope.contains_coord(coord)
    }

    fn region_intersects(envelope: &Envelope, region: &Envelope) -> bool {
        envelope.intersects(region)
    }
}

/// Point octree over 3D space.
pub type PointOctree<T> = PointTree<T, Octants>;
