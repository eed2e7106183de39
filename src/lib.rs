//! A fixed-resolution regular-grid spatial index for fixed-radius, shell, and k-nearest-neighbor
//! queries over `d`-dimensional point sets.
//!
//! The index partitions a bounding box into an `M^d` lattice of cells, buckets point indices into
//! the non-empty cells, and answers queries by walking only the cells a query ball can possibly
//! reach. Axes may be declared periodic (wrap-around) independently of one another, and distances
//! may be measured with ordinary Euclidean geometry or with a great-circle metric for the common
//! `(longitude, latitude)` case.
//!
//! The entry point is [`SpatialIndex`]; construction borrows or copies a point set and builds the
//! lattice once, after which [`SpatialIndex::bubble`], [`SpatialIndex::shell`], and
//! [`SpatialIndex::nearest_neighbors`] may be called any number of times, each parallelising
//! across its batch of query centres.

pub mod config;
pub mod data;
pub mod error;
pub mod grid;
pub mod index;
pub mod metric;
pub mod periodic;
pub mod query;
mod walker;

pub use config::GridConfig;
pub use data::Data;
pub use error::{GridError, Result};
pub use grid::Grid;
pub use index::SpatialIndex;
pub use metric::Metric;
pub use periodic::Axis;
pub use query::BatchResult;
