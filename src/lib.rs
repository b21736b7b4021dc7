//! Hierarchical spatial indexes for point clouds and bounding-box data.
//!
//! ```rust
//! use cloudtree::{Coord, Envelope, PointOctree, RStarTree};
//!
//! let mut boxes = RStarTree::new();
//! boxes.insert("site", Envelope::new(0.0, 0.0, 0.0, 10.0, 10.0, 0.0))?;
//! assert_eq!(boxes.search(&Envelope::new(5.0, 5.0, 0.0, 6.0, 6.0, 0.0)).len(), 1);
//!
//! let bounds = Envelope::new(0.0, 0.0, 0.0, 100.0, 100.0, 100.0);
//! let mut points = PointOctree::new(bounds, 1.0)?;
//! points.add("scan-0", Coord::new(12.0, 34.0, 5.0))?;
//! assert_eq!(points.len(), 1);
//! # Ok::<(), cloudtree::CloudtreeError>(())
//! ```
//!
//! Three index families are provided:
//!
//! - [`RStarTree`]: an R*-tree over bounding-box-keyed payloads, with
//!   forced reinsertion and overlap-minimizing splits
//! - [`PointQuadTree`] / [`PointOctree`]: capacity-bounded point trees with
//!   a minimum node size and automatic regrowth on out-of-bounds points
//! - [`AdaptiveOctree`]: a point octree with grid-thinned per-node
//!   subsamples for level-of-detail retrieval
//!
//! None of the indexes synchronize internally; wrap one in a lock for
//! shared mutation.

pub mod error;
pub mod pointtree;
pub mod rstar;
pub mod validation;

pub use cloudtree_types::{Coord, Envelope};

pub use error::{CloudtreeError, Result};

pub use pointtree::{
    AdaptiveOctree, Fanout, Octants, PointOctree, PointQuadTree, PointTree, Quadrants, TreeObject,
    NUM_OBJECTS_ALLOWED,
};

pub use rstar::RStarTree;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{CloudtreeError, Result};

    pub use crate::{Coord, Envelope};

    pub use crate::{AdaptiveOctree, PointOctree, PointQuadTree, TreeObject};

    pub use crate::RStarTree;
}
