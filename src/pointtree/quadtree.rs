//! Quadrant fanout: 2D subdivision over the XY plane.

use super::node::Fanout;
use super::PointTree;
use cloudtree_types::{Coord, Envelope};
use smallvec::{smallvec, SmallVec};

/// Four-way XY subdivision. The z axis is carried along untouched:
/// containment, intersection, and the node size measure all ignore it.
#[derive(Debug, Clone, Copy)]
pub struct Quadrants;

impl Fanout for Quadrants {
    const CHILDREN: usize = 4;

    fn partition(envelope: &Envelope) -> SmallVec<[Envelope; 8]> {
        let mid_x = (envelope.min_x + envelope.max_x) / 2.0;
        let mid_y = (envelope.min_y + envelope.max_y) / 2.0;
        smallvec![
            Envelope::new(
                envelope.min_x,
                envelope.min_y,
                envelope.min_z,
                mid_x,
                mid_y,
                envelope.max_z
            ),
            Envelope::new(
                mid_x,
                envelope.min_y,
                envelope.min_z,
                envelope.max_x,
                mid_y,
                envelope.max_z
            ),
            Envelope::new(
                envelope.min_x,
                mid_y,
                envelope.min_z,
                mid_x,
                envelope.max_y,
                envelope.max_z
            ),
            Envelope::new(
                mid_x,
                mid_y,
                envelope.min_z,
                envelope.max_x,
                envelope.max_y,
                envelope.max_z
            ),
        ]
    }

    fn world_size(envelope: &Envelope) -> f64 {
        envelope.max_dimension_xy()
    }

    fn contains(envelope: &Envelope, coord: &Coord) -> bool {
        envelope.contains_coord_xy(coord)
    }

    fn region_intersects(envelope: &Envelope, region: &Envelope) -> bool {
        envelope.intersects_xy(region)
    }
}

/// Point quad-tree over the XY plane.
pub type PointQuadTree<T> = PointTree<T, Quadrants>;
