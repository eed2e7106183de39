//! The regular-grid builder: partitions the bounding box into an `M^d` lattice and buckets point
//! indices into the non-empty cells.

use ndarray::ArrayView2;
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::error::GridError;
use crate::periodic::Axis;

/// The built lattice: bounding box, cell widths, and the sparse non-empty cell map.
///
/// Holds no point coordinates of its own — only the index partition. The coordinates live in
/// [`crate::data::Data`], alongside the [`SpatialIndex`](crate::SpatialIndex) that owns both.
#[derive(Debug)]
pub struct Grid {
    dim: usize,
    resolution: usize,
    axes: Vec<Axis>,
    bbox: Vec<(f64, f64)>,
    widths: Vec<f64>,
    /// Non-empty cell coordinate (packed, mixed-radix base `resolution`) -> point indices.
    cells: FxHashMap<u64, Vec<u32>>,
}

impl Grid {
    /// Builds the lattice over `data` given the axis configuration and resolution.
    ///
    /// # Errors
    ///
    /// - [`GridError::EmptyData`] if `data` has zero rows.
    /// - [`GridError::BadShape`] if `data`'s row width does not match `axes.len()`.
    /// - [`GridError::BadResolution`] if `resolution < 1`.
    /// - [`GridError::BadAxisConfig`] if a periodic axis has `lo >= hi`, or a data point falls
    ///   outside its declared periodic range.
    pub fn build(
        data: ArrayView2<f64>,
        axes: Vec<Axis>,
        resolution: usize,
    ) -> Result<Self, GridError> {
        if data.nrows() == 0 {
            return Err(GridError::EmptyData);
        }
        if data.ncols() != axes.len() {
            return Err(GridError::BadShape {
                expected: axes.len(),
                actual: data.ncols(),
            });
        }
        if resolution < 1 {
            return Err(GridError::BadResolution(resolution));
        }
        for (i, axis) in axes.iter().enumerate() {
            if let Axis::Periodic { lo, hi } = axis {
                if lo >= hi {
                    return Err(GridError::BadAxisConfig {
                        axis: i,
                        reason: format!("periodic bounds must satisfy lo < hi, got lo={lo}, hi={hi}"),
                    });
                }
            }
        }

        let dim = axes.len();
        let bbox = bounding_box(data, &axes)?;
        let widths: Vec<f64> = bbox
            .iter()
            .map(|&(lo, hi)| (hi - lo) / resolution as f64)
            .collect();

        let mut cells: FxHashMap<u64, Vec<u32>> = FxHashMap::default();
        for (j, point) in data.outer_iter().enumerate() {
            let coord: Vec<usize> = (0..dim)
                .map(|i| cell_of(point[i], bbox[i].0, widths[i], resolution))
                .collect();
            let key = pack_cell(&coord, resolution);
            cells.entry(key).or_default().push(j as u32);
        }

        debug!(
            dim,
            resolution,
            n_points = data.nrows(),
            n_cells = cells.len(),
            "built regular grid",
        );

        Ok(Self {
            dim,
            resolution,
            axes,
            bbox,
            widths,
            cells,
        })
    }

    /// Dimension `d`.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Resolution `M` (identical on every axis).
    #[must_use]
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Number of non-empty cells.
    #[must_use]
    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    /// The axis configuration the grid was built with.
    #[must_use]
    pub fn axes(&self) -> &[Axis] {
        &self.axes
    }

    /// The bounding box `[min_i, max_i]` per axis.
    #[must_use]
    pub fn bounding_box(&self) -> &[(f64, f64)] {
        &self.bbox
    }

    /// Cell width `w_i` per axis.
    #[must_use]
    pub fn widths(&self) -> &[f64] {
        &self.widths
    }

    /// The `M+1` cell edges on axis `i`, matching `k_bins` in the external interface.
    #[must_use]
    pub fn edges(&self, axis: usize) -> Vec<f64> {
        let (lo, _) = self.bbox[axis];
        let w = self.widths[axis];
        (0..=self.resolution).map(|k| lo + k as f64 * w).collect()
    }

    /// The non-empty cell map, for debugging and tests: packed cell key to point indices.
    #[must_use]
    pub fn cell_map(&self) -> &FxHashMap<u64, Vec<u32>> {
        &self.cells
    }

    /// Point indices bucketed into the cell at `coord`, or `None` if that cell is empty.
    #[must_use]
    pub fn points_in(&self, coord: &[usize]) -> Option<&[u32]> {
        self.cells.get(&pack_cell(coord, self.resolution)).map(Vec::as_slice)
    }

    /// Iterates over every non-empty cell's point indices, ignoring cell coordinates. Used by the
    /// angular-metric full-scan fallback.
    pub fn all_points(&self) -> impl Iterator<Item = &u32> {
        self.cells.values().flatten()
    }
}

/// Computes the bounding box per axis: the data's min/max on aperiodic axes, the declared
/// `[lo, hi]` on periodic axes. Rejects periodic-axis points outside `[lo, hi)`.
fn bounding_box(data: ArrayView2<f64>, axes: &[Axis]) -> Result<Vec<(f64, f64)>, GridError> {
    let dim = axes.len();
    let mut bbox = Vec::with_capacity(dim);
    for (i, axis) in axes.iter().enumerate() {
        match axis {
            Axis::Aperiodic => {
                let column = data.column(i);
                let min = column.iter().copied().fold(f64::INFINITY, f64::min);
                let max = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                bbox.push((min, max));
            }
            Axis::Periodic { lo, hi } => {
                if let Some((j, &value)) = data
                    .column(i)
                    .iter()
                    .enumerate()
                    .find(|&(_, &x)| x < *lo || x >= *hi)
                {
                    return Err(GridError::BadAxisConfig {
                        axis: i,
                        reason: format!(
                            "point {j} has coordinate {value} outside declared periodic range [{lo}, {hi})"
                        ),
                    });
                }
                bbox.push((*lo, *hi));
            }
        }
    }
    Ok(bbox)
}

/// Cell index of a single coordinate on one axis, clamped to `[0, resolution)`.
fn cell_of(x: f64, min: f64, width: f64, resolution: usize) -> usize {
    let raw = ((x - min) / width).floor();
    if raw.is_nan() {
        0
    } else {
        (raw as i64).clamp(0, resolution as i64 - 1) as usize
    }
}

/// Packs a `d`-dimensional cell coordinate into a `u64` using mixed radix `resolution`.
pub(crate) fn pack_cell(coord: &[usize], resolution: usize) -> u64 {
    coord
        .iter()
        .rev()
        .fold(0u64, |acc, &c| acc * resolution as u64 + c as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn cube() -> ndarray::Array2<f64> {
        array![
            [0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0],
            [0.0, 1.0, 0.0],
            [0.0, 1.0, 1.0],
            [1.0, 0.0, 0.0],
            [1.0, 0.0, 1.0],
            [1.0, 1.0, 0.0],
            [1.0, 1.0, 1.0],
        ]
    }

    #[test]
    fn partitions_every_point_into_exactly_one_cell() {
        let data = cube();
        let axes = vec![Axis::Aperiodic; 3];
        let grid = Grid::build(data.view(), axes, 4).unwrap();

        let mut seen: Vec<u32> = grid.all_points().copied().collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..8).collect::<Vec<_>>());
    }

    #[test]
    fn rejects_empty_data() {
        let data = ndarray::Array2::<f64>::zeros((0, 2));
        let err = Grid::build(data.view(), vec![Axis::Aperiodic; 2], 4).unwrap_err();
        assert_eq!(err, GridError::EmptyData);
    }

    #[test]
    fn rejects_zero_resolution() {
        let data = cube();
        let err = Grid::build(data.view(), vec![Axis::Aperiodic; 3], 0).unwrap_err();
        assert_eq!(err, GridError::BadResolution(0));
    }

    #[test]
    fn rejects_axis_count_mismatched_with_data_width() {
        let data = cube();
        let err = Grid::build(data.view(), vec![Axis::Aperiodic; 2], 4).unwrap_err();
        assert_eq!(
            err,
            GridError::BadShape {
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn rejects_inverted_periodic_bounds() {
        let data = cube();
        let axes = vec![
            Axis::Periodic { lo: 1.0, hi: 0.0 },
            Axis::Aperiodic,
            Axis::Aperiodic,
        ];
        let err = Grid::build(data.view(), axes, 4).unwrap_err();
        assert!(matches!(err, GridError::BadAxisConfig { axis: 0, .. }));
    }

    #[test]
    fn rejects_points_outside_declared_periodic_range() {
        let data = array![[5.0, 0.0], [-1.0, 0.0]];
        let axes = vec![Axis::Periodic { lo: 0.0, hi: 10.0 }, Axis::Aperiodic];
        let err = Grid::build(data.view(), axes, 2).unwrap_err();
        assert!(matches!(err, GridError::BadAxisConfig { axis: 0, .. }));
    }

    #[test]
    fn edges_span_the_bounding_box() {
        let data = cube();
        let grid = Grid::build(data.view(), vec![Axis::Aperiodic; 3], 4).unwrap();
        let edges = grid.edges(0);
        assert_eq!(edges.len(), 5);
        assert_eq!(*edges.first().unwrap(), 0.0);
        assert_eq!(*edges.last().unwrap(), 1.0);
    }

    #[test]
    fn pack_cell_round_trips_distinct_coordinates() {
        let resolution = 5;
        let a = pack_cell(&[1, 2, 3], resolution);
        let b = pack_cell(&[3, 2, 1], resolution);
        assert_ne!(a, b);
        assert_eq!(pack_cell(&[0, 0, 0], resolution), 0);
    }
}
