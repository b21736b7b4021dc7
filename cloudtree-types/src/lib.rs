//! # cloudtree-types
//!
//! Core spatial value types for the cloudtree index structures.
//!
//! This crate provides the two primitives every index in cloudtree is built
//! on:
//!
//! - **`Coord`**: a copyable 3D coordinate (2D data uses `z = 0`)
//! - **`Envelope`**: an immutable axis-aligned bounding box over 2D/3D space
//!   with containment, intersection, union, and center/surface queries
//!
//! All types are serializable with Serde.
//!
//! ## Examples
//!
//! ```rust
//! use cloudtree_types::{Coord, Envelope};
//!
//! let bounds = Envelope::new(0.0, 0.0, 0.0, 100.0, 100.0, 50.0);
//! let point = Coord::new(10.0, 20.0, 5.0);
//! assert!(bounds.contains_coord(&point));
//! ```

pub mod coord;
pub mod envelope;

pub use coord::Coord;
pub use envelope::Envelope;
