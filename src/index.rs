//! The index facade: the single object an external caller holds.

use ndarray::{Array2, ArrayView2};

use crate::config::GridConfig;
use crate::data::Data;
use crate::error::GridError;
use crate::grid::Grid;
use crate::metric::Metric;
use crate::periodic::{periodic_flag, Axis};
use crate::query::{self, BatchResult};

/// A fixed-resolution regular-grid spatial index over a point set.
///
/// Built once from a point set and queried any number of times. Holds no mutable state across
/// queries: the built grid may be read concurrently by any number of calls to `bubble`, `shell`,
/// or `nearest_neighbors` without synchronization, and each of those parallelises its per-centre
/// work across a `rayon` thread pool.
#[derive(Debug)]
pub struct SpatialIndex<'a> {
    data: Data<'a>,
    grid: Grid,
    metric: Metric,
}

impl<'a> SpatialIndex<'a> {
    /// Builds an index that owns a copy of `data`. This is the default entry point: a safe
    /// implementation should own its point set rather than borrow it.
    ///
    /// # Errors
    ///
    /// See [`GridError`]: `EmptyData`, `BadResolution`, `BadAxisConfig`, or `BadShape` if
    /// `periodic.len()` does not match `data`'s row width.
    pub fn new(
        data: Array2<f64>,
        periodic: Vec<Axis>,
        resolution: usize,
        metric: Metric,
    ) -> Result<Self, GridError> {
        Self::check_dim(data.view(), &periodic)?;
        let grid = Grid::build(data.view(), periodic, resolution)?;
        Ok(Self {
            data: Data::Owned(data),
            grid,
            metric,
        })
    }

    /// Builds an index that borrows `data` from the caller.
    ///
    /// Borrowing is a performance contract: the caller promises not to mutate `data` for as long
    /// as the returned index lives. This is not enforced by the type system beyond Rust's
    /// ordinary borrow checking.
    ///
    /// # Errors
    ///
    /// Same as [`SpatialIndex::new`].
    pub fn borrowing(
        data: &'a Array2<f64>,
        periodic: Vec<Axis>,
        resolution: usize,
        metric: Metric,
    ) -> Result<Self, GridError> {
        Self::check_dim(data.view(), &periodic)?;
        let grid = Grid::build(data.view(), periodic, resolution)?;
        Ok(Self {
            data: Data::Borrowed(data),
            grid,
            metric,
        })
    }

    /// Builds an owning index from a [`GridConfig`] bundle.
    ///
    /// # Errors
    ///
    /// Same as [`SpatialIndex::new`].
    pub fn with_config(data: Array2<f64>, config: GridConfig) -> Result<Self, GridError> {
        Self::new(data, config.periodic, config.resolution, config.metric)
    }

    fn check_dim(data: ArrayView2<f64>, periodic: &[Axis]) -> Result<(), GridError> {
        if data.ncols() != periodic.len() {
            return Err(GridError::BadShape {
                expected: periodic.len(),
                actual: data.ncols(),
            });
        }
        Ok(())
    }

    /// All indexed points within radius `r` of each centre.
    ///
    /// # Errors
    ///
    /// [`GridError::BadRange`] if `r < 0`; [`GridError::BadShape`] if a centre's dimension
    /// doesn't match the index.
    pub fn bubble(&self, centres: ArrayView2<f64>, r: f64, sorted: bool) -> Result<BatchResult, GridError> {
        query::bubble(&self.grid, self.data.view(), self.metric, centres, r, sorted)
    }

    /// All indexed points whose distance from each centre lies in `[r_lo, r_hi]`.
    ///
    /// # Errors
    ///
    /// [`GridError::BadRange`] if `r_lo < 0` or `r_lo > r_hi`; [`GridError::BadShape`] if a
    /// centre's dimension doesn't match the index.
    pub fn shell(
        &self,
        centres: ArrayView2<f64>,
        r_lo: f64,
        r_hi: f64,
        sorted: bool,
    ) -> Result<BatchResult, GridError> {
        query::shell(&self.grid, self.data.view(), self.metric, centres, r_lo, r_hi, sorted)
    }

    /// The `n` nearest indexed points to each centre, sorted ascending by distance with ties
    /// broken by ascending point index.
    ///
    /// # Errors
    ///
    /// [`GridError::InsufficientPoints`] if `n` exceeds the number of indexed points;
    /// [`GridError::BadShape`] if a centre's dimension doesn't match the index.
    pub fn nearest_neighbors(&self, centres: ArrayView2<f64>, n: usize) -> Result<BatchResult, GridError> {
        query::nearest_neighbors(&self.grid, self.data.view(), self.metric, centres, n)
    }

    /// Dimension `d`.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.grid.dim()
    }

    /// Number of non-empty cells.
    #[must_use]
    #[allow(non_snake_case)]
    pub fn n_cells(&self) -> usize {
        self.grid.n_cells()
    }

    /// The distance metric the index was built with.
    #[must_use]
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// The per-axis periodicity configuration.
    #[must_use]
    pub fn periodic(&self) -> &[Axis] {
        self.grid.axes()
    }

    /// `true` iff at least one axis is periodic.
    #[must_use]
    pub fn periodic_flag(&self) -> bool {
        periodic_flag(self.grid.axes())
    }

    /// A read-only view of the indexed point set.
    #[must_use]
    pub fn data(&self) -> ArrayView2<f64> {
        self.data.view()
    }

    /// The per-axis cell edges, `M + 1` floats per axis.
    #[must_use]
    pub fn k_bins(&self) -> Vec<Vec<f64>> {
        (0..self.grid.dim()).map(|i| self.grid.edges(i)).collect()
    }

    /// The non-empty cell map, for debugging and tests.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }
}
