//! Error kinds surfaced at the boundary of the index.

use thiserror::Error;

/// Every failure condition the index can raise, at construction or at query time.
///
/// No variant is ever produced by an internal bug; each one corresponds to a caller-triggerable
/// condition. None are recovered from internally and none are logged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    /// The point set, or a batch of query centres, was not a 2-D array of the expected row
    /// width, or its row width did not match the dimension the index was built with.
    #[error("expected points with row width {expected}, got {actual}")]
    BadShape {
        /// Row width the caller's context requires.
        expected: usize,
        /// Row width actually observed.
        actual: usize,
    },

    /// The point set passed to the grid builder had zero rows.
    #[error("point set is empty")]
    EmptyData,

    /// A periodic axis was misconfigured, or a data point fell outside its declared range.
    #[error("axis {axis}: {reason}")]
    BadAxisConfig {
        /// Index of the offending axis.
        axis: usize,
        /// Human-readable description of what went wrong.
        reason: String,
    },

    /// The requested grid resolution was less than one.
    #[error("resolution must be at least 1, got {0}")]
    BadResolution(usize),

    /// A radius or radius pair was invalid: negative, or `r_lo > r_hi`.
    #[error("invalid radius range: {0}")]
    BadRange(String),

    /// `nearest_neighbors` was asked for more points than the index holds.
    #[error("requested {requested} nearest neighbors but the index holds only {available} points")]
    InsufficientPoints {
        /// Number of neighbors requested.
        requested: usize,
        /// Number of points actually indexed.
        available: usize,
    },

    /// A metric tag did not name one of the supported kinds.
    #[error("unsupported metric: {0:?}")]
    UnsupportedMetric(String),

    /// An angular metric (haversine, vincenty) was requested outside of two dimensions.
    #[error("angular metrics require dimension 2, got {0}")]
    DimensionMismatch(usize),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, GridError>;
