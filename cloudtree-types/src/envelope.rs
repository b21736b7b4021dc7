use crate::coord::Coord;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box over 2D/3D space.
///
/// An envelope is immutable once built; operations that would grow or shrink
/// bounds ([`Envelope::union`], [`Envelope::expand`]) return a new envelope.
/// Two-dimensional regions are represented as flat boxes with
/// `min_z == max_z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Minimum x coordinate
    pub min_x: f64,
    /// Minimum y coordinate
    pub min_y: f64,
    /// Minimum z coordinate
    pub min_z: f64,
    /// Maximum x coordinate
    pub max_x: f64,
    /// Maximum y coordinate
    pub max_y: f64,
    /// Maximum z coordinate
    pub max_z: f64,
}

impl Envelope {
    /// Create a new envelope from minimum and maximum coordinates.
    ///
    /// # Examples
    ///
    /// ```
    /// use cloudtree_types::Envelope;
    ///
    /// let bounds = Envelope::new(0.0, 0.0, 0.0, 10.0, 10.0, 10.0);
    /// assert_eq!(bounds.width(), 10.0);
    /// ```
    pub fn new(min_x: f64, min_y: f64, min_z: f64, max_x: f64, max_y: f64, max_z: f64) -> Self {
        Self {
            min_x,
            min_y,
            min_z,
            max_x,
            max_y,
            max_z,
        }
    }

    /// Create an envelope spanning two corner coordinates, normalizing the
    /// per-axis min/max ordering.
    pub fn from_corners(a: Coord, b: Coord) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            min_z: a.z.min(b.z),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
            max_z: a.z.max(b.z),
        }
    }

    /// Create the tightest envelope containing every coordinate in `coords`,
    /// or `None` when `coords` is empty.
    pub fn from_coords<'a, I>(coords: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coord>,
    {
        let mut iter = coords.into_iter();
        let first = iter.next()?;
        let mut env = Self::from_corners(*first, *first);
        for c in iter {
            env = env.union_coord(c);
        }
        Some(env)
    }

    /// The identity envelope for [`Envelope::union`]: contains nothing and
    /// intersects nothing.
    pub fn empty() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            min_z: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
            max_z: f64::NEG_INFINITY,
        }
    }

    /// Whether this is the empty envelope (inverted bounds on some axis).
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y || self.min_z > self.max_z
    }

    /// The smallest envelope containing both `self` and `other`.
    pub fn union(&self, other: &Envelope) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            min_z: self.min_z.min(other.min_z),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
            max_z: self.max_z.max(other.max_z),
        }
    }

    /// The smallest envelope containing `self` and the coordinate `c`.
    pub fn union_coord(&self, c: &Coord) -> Self {
        Self {
            min_x: self.min_x.min(c.x),
            min_y: self.min_y.min(c.y),
            min_z: self.min_z.min(c.z),
            max_x: self.max_x.max(c.x),
            max_y: self.max_y.max(c.y),
            max_z: self.max_z.max(c.z),
        }
    }

    /// The center coordinate of the envelope.
    pub fn center(&self) -> Coord {
        Coord::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
            (self.min_z + self.max_z) / 2.0,
        )
    }

    /// Width (x extent).
    #[inline]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height (y extent).
    #[inline]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Depth (z extent).
    #[inline]
    pub fn depth(&self) -> f64 {
        self.max_z - self.min_z
    }

    /// Whether the envelope is degenerate in z (a 2D region).
    #[inline]
    pub fn is_flat(&self) -> bool {
        self.min_z == self.max_z
    }

    /// Size measure used by enlargement comparisons: plain area for flat
    /// envelopes, volume otherwise.
    pub fn surface(&self) -> f64 {
        if self.is_flat() {
            self.width() * self.height()
        } else {
            self.width() * self.height() * self.depth()
        }
    }

    /// The largest of the three extents.
    pub fn max_dimension(&self) -> f64 {
        self.width().max(self.height()).max(self.depth())
    }

    /// The larger of the x and y extents.
    pub fn max_dimension_xy(&self) -> f64 {
        self.width().max(self.height())
    }

    /// Whether the coordinate lies within the envelope (bounds inclusive).
    pub fn contains_coord(&self, c: &Coord) -> bool {
        c.x >= self.min_x
            && c.x <= self.max_x
            && c.y >= self.min_y
            && c.y <= self.max_y
            && c.z >= self.min_z
            && c.z <= self.max_z
    }

    /// Whether the coordinate lies within the XY footprint of the envelope,
    /// ignoring z on both sides.
    pub fn contains_coord_xy(&self, c: &Coord) -> bool {
        c.x >= self.min_x && c.x <= self.max_x && c.y >= self.min_y && c.y <= self.max_y
    }

    /// Whether `other` lies entirely within `self`.
    pub fn contains_envelope(&self, other: &Envelope) -> bool {
        other.min_x >= self.min_x
            && other.max_x <= self.max_x
            && other.min_y >= self.min_y
            && other.max_y <= self.max_y
            && other.min_z >= self.min_z
            && other.max_z <= self.max_z
    }

    /// Whether `self` and `other` overlap (shared boundaries count).
    pub fn intersects(&self, other: &Envelope) -> bool {
        !(self.max_x < other.min_x
            || self.min_x > other.max_x
            || self.max_y < other.min_y
            || self.min_y > other.max_y
            || self.max_z < other.min_z
            || self.min_z > other.max_z)
    }

    /// Whether the XY footprints of `self` and `other` overlap, ignoring z
    /// on both sides (shared boundaries count).
    pub fn intersects_xy(&self, other: &Envelope) -> bool {
        !(self.max_x < other.min_x
            || self.min_x > other.max_x
            || self.max_y < other.min_y
            || self.min_y > other.max_y)
    }

    /// A new envelope grown by `amount` in every direction.
    pub fn expand(&self, amount: f64) -> Self {
        Self::new(
            self.min_x - amount,
            self.min_y - amount,
            self.min_z - amount,
            self.max_x + amount,
            self.max_y + amount,
            self.max_z + amount,
        )
    }

    /// Whether all bounds are finite.
    pub fn is_finite(&self) -> bool {
        self.min_x.is_finite()
            && self.min_y.is_finite()
            && self.min_z.is_finite()
            && self.max_x.is_finite()
            && self.max_y.is_finite()
            && self.max_z.is_finite()
    }
}
