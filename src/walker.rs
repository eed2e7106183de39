//! Cell walker: enumerates the cells whose extent intersects a query ball, with periodic image
//! shifts where the ball straddles a wrapped boundary.

use std::collections::HashSet;

use itertools::Itertools;

use crate::grid::Grid;
use crate::periodic::Axis;

/// One cell to inspect for a query: its folded coordinate, plus the per-axis image multiple
/// needed to translate that cell's contents back into the vicinity of the query centre.
///
/// Under periodic boundaries a logical "cell to visit" is the pair (coordinate, image), not just
/// the coordinate: the same folded cell can be reached through more than one image when the
/// query radius exceeds half the box length, and each occurrence is a distinct candidate set of
/// shifted coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CellVisit {
    pub coord: Vec<usize>,
    /// Per-axis integer multiple of the period; zero on aperiodic axes.
    image: Vec<i64>,
}

impl CellVisit {
    /// The coordinate shift to add to a point's raw data coordinate on `axis`, given that axis's
    /// period length (0.0 if aperiodic or this visit carries no image shift on that axis).
    pub fn shift(&self, axis: usize, period: Option<f64>) -> f64 {
        match period {
            Some(length) => self.image[axis] as f64 * length,
            None => 0.0,
        }
    }
}

/// Enumerates the candidate cells for a bubble/shell query of radius `r` around `centre`.
///
/// For metrics whose iso-distance contours are not axis-aligned boxes (the angular metrics), the
/// grid is visited in full: every non-empty cell is a candidate, with no image shift (the
/// periodicity module does not apply to those metrics).
pub(crate) fn candidate_cells(grid: &Grid, centre: &[f64], r: f64, axis_aligned: bool) -> Vec<CellVisit> {
    if !axis_aligned {
        return grid
            .cell_map()
            .keys()
            .map(|&key| CellVisit {
                coord: unpack_cell(key, grid.dim(), grid.resolution()),
                image: vec![0; grid.dim()],
            })
            .collect();
    }

    let bbox = grid.bounding_box();
    let widths = grid.widths();
    let resolution = grid.resolution();

    let per_axis: Vec<Vec<(usize, i64)>> = (0..grid.dim())
        .map(|i| axis_range(centre[i], r, bbox[i], widths[i], resolution, &grid.axes()[i]))
        .collect();

    if per_axis.iter().any(Vec::is_empty) {
        return Vec::new();
    }

    let mut seen = HashSet::new();
    per_axis
        .iter()
        .map(|axis_cells| axis_cells.iter())
        .multi_cartesian_product()
        .filter_map(|combo| {
            let coord: Vec<usize> = combo.iter().map(|&&(k, _)| k).collect();
            let image: Vec<i64> = combo.iter().map(|&&(_, t)| t).collect();
            if seen.insert((coord.clone(), image.clone())) {
                Some(CellVisit { coord, image })
            } else {
                None
            }
        })
        .collect()
}

/// Per-axis set of (folded cell index, image multiple) pairs whose interval intersects
/// `[centre - r, centre + r]`.
fn axis_range(
    centre: f64,
    r: f64,
    (axis_min, axis_max): (f64, f64),
    width: f64,
    resolution: usize,
    axis: &Axis,
) -> Vec<(usize, i64)> {
    let lo = ((centre - r - axis_min) / width).floor() as i64;
    let hi = ((centre + r - axis_min) / width).floor() as i64;
    if lo > hi {
        return Vec::new();
    }

    match axis {
        Axis::Aperiodic => {
            let clamped_lo = lo.max(0);
            let clamped_hi = hi.min(resolution as i64 - 1);
            if clamped_lo > clamped_hi {
                Vec::new()
            } else {
                (clamped_lo..=clamped_hi).map(|k| (k as usize, 0)).collect()
            }
        }
        Axis::Periodic { .. } => {
            let _ = axis_max;
            let resolution = resolution as i64;
            let mut seen = HashSet::new();
            let mut out = Vec::new();
            for k in lo..=hi {
                let folded = k.rem_euclid(resolution);
                let image = (k - folded) / resolution;
                if seen.insert((folded, image)) {
                    out.push((folded as usize, image));
                }
            }
            out
        }
    }
}

fn unpack_cell(mut key: u64, dim: usize, resolution: usize) -> Vec<usize> {
    let mut coord = Vec::with_capacity(dim);
    for _ in 0..dim {
        coord.push((key % resolution as u64) as usize);
        key /= resolution as u64;
    }
    coord
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn line_grid() -> Grid {
        // 100 evenly spaced points on [0, 10), periodic with period 10, resolution 10.
        let points: Vec<[f64; 1]> = (0..100).map(|i| [i as f64 * 0.1]).collect();
        let data = ndarray::Array2::from_shape_vec(
            (points.len(), 1),
            points.into_iter().flatten().collect(),
        )
        .unwrap();
        Grid::build(data.view(), vec![Axis::Periodic { lo: 0.0, hi: 10.0 }], 10).unwrap()
    }

    #[test]
    fn small_radius_does_not_wrap() {
        let grid = line_grid();
        let visits = candidate_cells(&grid, &[5.0], 0.2, true);
        assert!(visits.iter().all(|v| v.image == vec![0]));
    }

    #[test]
    fn radius_past_the_boundary_produces_an_image_shift() {
        let grid = line_grid();
        // Near the lo boundary, a radius bigger than the distance to 0 should wrap and pick up
        // cells folded from negative (or >= M) unwrapped indices, carrying a nonzero image.
        let visits = candidate_cells(&grid, &[0.05], 0.3, true);
        assert!(visits.iter().any(|v| v.image != vec![0]));
    }

    #[test]
    fn large_radius_revisits_the_same_cell_under_distinct_shifts() {
        let grid = line_grid();
        // With period 10 and radius well past half the box, the same folded cell can be reached
        // through more than one image; each occurrence must be a distinct (coord, image) pair.
        let visits = candidate_cells(&grid, &[5.0], 8.0, true);
        let mut seen = HashSet::new();
        for v in &visits {
            assert!(seen.insert((v.coord.clone(), v.image.clone())), "duplicate visit");
        }
        let coord0_images: Vec<_> = visits
            .iter()
            .filter(|v| v.coord == vec![0])
            .map(|v| v.image.clone())
            .collect();
        assert!(coord0_images.len() >= 2);
    }

    #[test]
    fn aperiodic_axis_clamps_to_grid_bounds() {
        let data = array![[0.0], [1.0], [2.0], [3.0]];
        let grid = Grid::build(data.view(), vec![Axis::Aperiodic], 4).unwrap();
        let visits = candidate_cells(&grid, &[0.0], 100.0, true);
        assert!(visits.iter().all(|v| v.coord[0] < 4));
        assert!(visits.iter().all(|v| v.image == vec![0]));
    }
}
