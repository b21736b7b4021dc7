//! Grid-based thinning for level-of-detail subsamples.

use cloudtree_types::Coord;
use rand::Rng;
use rayon::prelude::*;
use rustc_hash::FxHashMap;

/// Thin a point set to one representative per occupied grid cell.
///
/// Points are bucketed into a cubic grid of edge `cell_size`; one payload
/// per occupied cell is chosen uniformly at random. A non-positive or
/// non-finite cell size disables thinning and every payload is kept.
///
/// Bucketing runs on the rayon global pool; the random draw stays on the
/// calling thread.
pub(crate) fn grid_subsample<T: Clone + Sync>(points: &[(Coord, T)], cell_size: f64) -> Vec<T> {
    if points.is_empty() {
        return Vec::new();
    }
    if !(cell_size.is_finite() && cell_size > 0.0) {
        return points.iter().map(|(_, obj)| obj.clone()).collect();
    }

    let cells: FxHashMap<(i64, i64, i64), Vec<usize>> = points
        .par_iter()
        .enumerate()
        .fold(FxHashMap::default, |mut acc, (i, (coord, _))| {
            let key = (
                (coord.x / cell_size).floor() as i64,
                (coord.y / cell_size).floor() as i64,
                (coord.z / cell_size).floor() as i64,
            );
            acc.entry(key).or_insert_with(Vec::new).push(i);
            acc
        })
        .reduce(FxHashMap::default, |mut merged, partial| {
            for (key, mut indices) in partial {
                merged.entry(key).or_insert_with(Vec::new).append(&mut indices);
            }
            merged
        });

    let mut rng = rand::rng();
    let mut out = Vec::with_capacity(cells.len());
    for bucket in cells.values() {
        let pick = bucket[rng.random_range(0..bucket.len())];
        out.push(points[pick].1.clone());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled(coords: &[(f64, f64, f64)]) -> Vec<(Coord, usize)> {
        coords
            .iter()
            .enumerate()
            .map(|(i, &(x, y, z))| (Coord::new(x, y, z), i))
            .collect()
    }

    #[test]
    fn test_one_representative_per_cell() {
        // Two tight clusters in distinct cells of a unit grid
        let points = labeled(&[
            (0.1, 0.1, 0.1),
            (0.2, 0.2, 0.2),
            (0.3, 0.1, 0.4),
            (5.1, 5.1, 5.1),
            (5.2, 5.3, 5.2),
        ]);
        let sample = grid_subsample(&points, 1.0);
        assert_eq!(sample.len(), 2);
        // One representative from each cluster
        assert!(sample.iter().any(|&i| i < 3));
        assert!(sample.iter().any(|&i| i >= 3));
    }

    #[test]
    fn test_sparse_points_all_survive() {
        let points = labeled(&[(0.0, 0.0, 0.0), (10.0, 0.0, 0.0), (0.0, 10.0, 10.0)]);
        let mut sample = grid_subsample(&points, 1.0);
        sample.sort_unstable();
        assert_eq!(sample, vec![0, 1, 2]);
    }

    #[test]
    fn test_negative_coordinates_bucket_separately() {
        // floor() keeps cells on either side of zero distinct
        let points = labeled(&[(-0.5, 0.0, 0.0), (0.5, 0.0, 0.0)]);
        assert_eq!(grid_subsample(&points, 1.0).len(), 2);
    }

    #[test]
    fn test_degenerate_cell_size_keeps_everything() {
        let points = labeled(&[(0.0, 0.0, 0.0), (0.1, 0.0, 0.0)]);
        assert_eq!(grid_subsample(&points, 0.0).len(), 2);
        assert_eq!(grid_subsample(&points, f64::NAN).len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let points: Vec<(Coord, usize)> = Vec::new();
        assert!(grid_subsample(&points, 1.0).is_empty());
    }
}
