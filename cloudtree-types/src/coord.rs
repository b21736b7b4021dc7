use serde::{Deserialize, Serialize};

/// A 3D coordinate.
///
/// Used both as the key under which point payloads are indexed and as the
/// query location for proximity lookups. Two-dimensional data sets simply
/// leave `z` at `0.0`.
///
/// # Examples
///
/// ```
/// use cloudtree_types::Coord;
///
/// let c = Coord::new(10.0, 20.0, 5.0);
/// assert_eq!(c.x, 10.0);
///
/// let flat = Coord::new_2d(10.0, 20.0);
/// assert_eq!(flat.z, 0.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate (elevation for point-cloud data)
    pub z: f64,
}

impl Coord {
    /// Create a new 3D coordinate.
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Create a coordinate in the `z = 0` plane.
    #[inline]
    pub fn new_2d(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    /// Whether all components are finite (not NaN or infinite).
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Squared Euclidean distance to `other`.
    ///
    /// Cheaper than [`Coord::distance`] and sufficient for ordering.
    #[inline]
    pub fn distance_sq(&self, other: &Coord) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }

    /// Euclidean distance to `other`.
    #[inline]
    pub fn distance(&self, other: &Coord) -> f64 {
        self.distance_sq(other).sqrt()
    }
}
