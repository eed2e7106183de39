//! Construction-time configuration bundle for callers building several indices with shared
//! settings. There is no file- or environment-based configuration surface: a read-only,
//! in-process spatial index has no persistent state to configure.

use crate::metric::Metric;
use crate::periodic::Axis;

/// Bundles the non-data construction parameters of [`crate::SpatialIndex`].
#[derive(Debug, Clone)]
pub struct GridConfig {
    /// Lattice resolution `M`, identical on every axis.
    pub resolution: usize,
    /// Distance metric.
    pub metric: Metric,
    /// Per-axis periodicity, one entry per dimension.
    pub periodic: Vec<Axis>,
}

impl GridConfig {
    /// A configuration for an aperiodic, Euclidean index of dimension `dim` at the given
    /// resolution.
    #[must_use]
    pub fn euclidean(dim: usize, resolution: usize) -> Self {
        Self {
            resolution,
            metric: Metric::Euclid,
            periodic: vec![Axis::Aperiodic; dim],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euclidean_default_is_fully_aperiodic() {
        let config = GridConfig::euclidean(3, 16);
        assert_eq!(config.periodic.len(), 3);
        assert!(config.periodic.iter().all(|a| !a.is_periodic()));
        assert_eq!(config.metric, Metric::Euclid);
    }
}
