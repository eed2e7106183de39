//! The query engine: bubble, shell, and k-nearest-neighbor searches over a built [`Grid`].

use float_cmp::approx_eq;
use ndarray::{Array2, ArrayView1, ArrayView2};
use rayon::prelude::*;
use tracing::trace;

use crate::error::GridError;
use crate::grid::Grid;
use crate::metric::Metric;
use crate::periodic::Axis;
use crate::walker::candidate_cells;

/// Output of a batch query: one distance vector and one index vector per input centre.
pub type BatchResult = (Vec<Vec<f64>>, Vec<Vec<u32>>);

/// Returns every indexed point within radius `r` of each centre.
pub fn bubble(
    grid: &Grid,
    data: ArrayView2<f64>,
    metric: Metric,
    centres: ArrayView2<f64>,
    r: f64,
    sorted: bool,
) -> Result<BatchResult, GridError> {
    if r < 0.0 {
        return Err(GridError::BadRange(format!("radius must be non-negative, got {r}")));
    }
    check_centres_shape(grid, centres)?;

    let rows: Vec<_> = centres.outer_iter().collect();
    let per_centre: Vec<_> = rows
        .into_par_iter()
        .map(|centre| bubble_one(grid, data, metric, centre, r, sorted))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(per_centre.into_iter().unzip())
}

/// Returns every indexed point whose distance from each centre lies in `[r_lo, r_hi]`.
pub fn shell(
    grid: &Grid,
    data: ArrayView2<f64>,
    metric: Metric,
    centres: ArrayView2<f64>,
    r_lo: f64,
    r_hi: f64,
    sorted: bool,
) -> Result<BatchResult, GridError> {
    if r_lo < 0.0 || r_lo > r_hi {
        return Err(GridError::BadRange(format!(
            "shell radii must satisfy 0 <= r_lo <= r_hi, got r_lo={r_lo}, r_hi={r_hi}"
        )));
    }
    check_centres_shape(grid, centres)?;

    let rows: Vec<_> = centres.outer_iter().collect();
    let per_centre: Vec<_> = rows
        .into_par_iter()
        .map(|centre| {
            let (dists, idxs) = bubble_one(grid, data, metric, centre, r_hi, sorted)?;
            let mut out_d = Vec::with_capacity(dists.len());
            let mut out_i = Vec::with_capacity(idxs.len());
            for (d, i) in dists.into_iter().zip(idxs) {
                if d >= r_lo || approx_eq!(f64, d, r_lo, ulps = 4) {
                    out_d.push(d);
                    out_i.push(i);
                }
            }
            Ok::<_, GridError>((out_d, out_i))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(per_centre.into_iter().unzip())
}

/// Returns the `n` nearest indexed points to each centre, sorted ascending, ties broken by
/// ascending point index.
pub fn nearest_neighbors(
    grid: &Grid,
    data: ArrayView2<f64>,
    metric: Metric,
    centres: ArrayView2<f64>,
    n: usize,
) -> Result<BatchResult, GridError> {
    let available = data.nrows();
    if n > available {
        return Err(GridError::InsufficientPoints {
            requested: n,
            available,
        });
    }
    check_centres_shape(grid, centres)?;

    let rows: Vec<_> = centres.outer_iter().collect();
    let per_centre: Vec<_> = rows
        .into_par_iter()
        .map(|centre| nearest_one(grid, data, metric, centre, n))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(per_centre.into_iter().unzip())
}

fn check_centres_shape(grid: &Grid, centres: ArrayView2<f64>) -> Result<(), GridError> {
    if centres.ncols() != grid.dim() {
        return Err(GridError::BadShape {
            expected: grid.dim(),
            actual: centres.ncols(),
        });
    }
    Ok(())
}

/// Gathers every candidate within radius `r` of `centre`, computes exact distances in one batch,
/// and filters to `d <= r`.
fn bubble_one(
    grid: &Grid,
    data: ArrayView2<f64>,
    metric: Metric,
    centre: ArrayView1<f64>,
    r: f64,
    sorted: bool,
) -> Result<(Vec<f64>, Vec<u32>), GridError> {
    let dim = grid.dim();
    let visits = candidate_cells(grid, centre.as_slice().expect("contiguous row"), r, metric.is_axis_aligned());

    let mut idxs: Vec<u32> = Vec::new();
    let mut flat: Vec<f64> = Vec::new();
    for visit in &visits {
        let Some(bucket) = grid.points_in(&visit.coord) else {
            continue;
        };
        for &j in bucket {
            let row = data.row(j as usize);
            if metric.is_axis_aligned() {
                for axis in 0..dim {
                    let period = grid.axes()[axis].length();
                    flat.push(row[axis] + visit.shift(axis, period));
                }
            } else {
                flat.extend(row.iter());
            }
            idxs.push(j);
        }
    }

    let n = idxs.len();
    let points = Array2::from_shape_vec((n, dim), flat).expect("flat buffer matches (n, dim)");
    let dists = metric.distance(centre, points.view(), grid.axes())?;

    let mut out_d = Vec::with_capacity(n);
    let mut out_i = Vec::with_capacity(n);
    for (&d, &i) in dists.iter().zip(idxs.iter()) {
        if d <= r || approx_eq!(f64, d, r, ulps = 4) {
            out_d.push(d);
            out_i.push(i);
        }
    }

    if sorted {
        stable_sort_by_distance(&mut out_d, &mut out_i);
    }

    Ok((out_d, out_i))
}

fn nearest_one(
    grid: &Grid,
    data: ArrayView2<f64>,
    metric: Metric,
    centre: ArrayView1<f64>,
    n: usize,
) -> Result<(Vec<f64>, Vec<u32>), GridError> {
    if n == 0 {
        return Ok((Vec::new(), Vec::new()));
    }

    let mut radius = seed_radius(grid, n);
    let (mut dists, mut idxs) = bubble_one(grid, data, metric, centre, radius, false)?;

    while dists.len() < n {
        radius *= 2.0;
        trace!(radius, found = dists.len(), needed = n, "expanding k-NN search radius");
        let (d2, i2) = bubble_one(grid, data, metric, centre, radius, false)?;
        dists = d2;
        idxs = i2;
    }

    let mut order: Vec<usize> = (0..dists.len()).collect();
    order.sort_by(|&a, &b| {
        dists[a]
            .partial_cmp(&dists[b])
            .expect("distances are never NaN")
            .then_with(|| idxs[a].cmp(&idxs[b]))
    });
    order.truncate(n);

    let out_d: Vec<f64> = order.iter().map(|&i| dists[i]).collect();
    let out_i: Vec<u32> = order.iter().map(|&i| idxs[i]).collect();
    Ok((out_d, out_i))
}

/// Seed radius for k-NN radius expansion: `w_min * ceil((n / rho)^(1/d))`, where `rho` is the
/// average points-per-cell over the full `M^d` lattice.
fn seed_radius(grid: &Grid, n: usize) -> f64 {
    let dim = grid.dim() as i32;
    let total_cells = (grid.resolution() as f64).powi(dim);
    let n_points: f64 = grid.cell_map().values().map(Vec::len).sum::<usize>() as f64;
    let rho = if total_cells > 0.0 { n_points / total_cells } else { 0.0 };

    let w_min = grid.widths().iter().copied().fold(f64::INFINITY, f64::min);
    if rho <= 0.0 || !rho.is_finite() {
        return w_min.max(f64::MIN_POSITIVE);
    }

    let cells_needed = (n as f64 / rho).powf(1.0 / f64::from(dim));
    let seed = w_min * cells_needed.ceil();
    if seed.is_finite() && seed > 0.0 {
        seed
    } else {
        w_min.max(f64::MIN_POSITIVE)
    }
}

fn stable_sort_by_distance(dists: &mut [f64], idxs: &mut [u32]) {
    let mut order: Vec<usize> = (0..dists.len()).collect();
    order.sort_by(|&a, &b| dists[a].partial_cmp(&dists[b]).expect("distances are never NaN"));

    let sorted_d: Vec<f64> = order.iter().map(|&i| dists[i]).collect();
    let sorted_i: Vec<u32> = order.iter().map(|&i| idxs[i]).collect();
    dists.copy_from_slice(&sorted_d);
    idxs.copy_from_slice(&sorted_i);
}
