//! Geometric primitives backing the R*-tree split and subtree-choice
//! heuristics.

use cloudtree_types::Envelope;

/// Perimeter-like margin measure: `2 * (width + height + depth)`.
///
/// Applied uniformly; for flat envelopes the depth term degenerates to zero.
pub(crate) fn compute_margin(envelope: &Envelope) -> f64 {
    2.0 * (envelope.width() + envelope.height() + envelope.depth())
}

/// Growth in size needed for `base` to absorb `add`.
pub(crate) fn compute_enlargement(base: &Envelope, add: &Envelope) -> f64 {
    base.union(add).surface() - base.surface()
}

/// Overlap measure between two envelopes.
///
/// Zero when the boxes are disjoint on any axis. When both envelopes are
/// flat in z the result is the plain 2D intersection area. Otherwise it is
/// the doubled sum of the three pairwise face-overlap areas. The 3D branch
/// is intentionally not an overlap volume: the split heuristics were tuned
/// against this measure and changing it would change every split decision.
pub(crate) fn compute_overlap(a: &Envelope, b: &Envelope) -> f64 {
    let dx = a.max_x.min(b.max_x) - a.min_x.max(b.min_x);
    let dy = a.max_y.min(b.max_y) - a.min_y.max(b.min_y);
    let dz = a.max_z.min(b.max_z) - a.min_z.max(b.min_z);

    if dx < 0.0 || dy < 0.0 || dz < 0.0 {
        return 0.0;
    }

    if a.is_flat() && b.is_flat() {
        dx * dy
    } else {
        2.0 * (dx * dy + dx * dz + dy * dz)
    }
}
