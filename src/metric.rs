//! Distance metrics. Pure functions of a centre and a batch of points; no knowledge of the grid.

use std::str::FromStr;

use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::error::GridError;
use crate::periodic::{minimum_image, Axis};

/// The supported distance kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    /// Standard L2 distance, reduced to the minimum image on periodic axes.
    Euclid,
    /// Great-circle central angle (radians) via the half-angle (haversine) formula. Requires
    /// `d == 2`, inputs `(longitude, latitude)` in radians.
    Haversine,
    /// Great-circle central angle (radians) via the stable `atan2` (Vincenty) formula. Requires
    /// `d == 2`.
    Vincenty,
}

impl Metric {
    /// Whether this metric can be evaluated in dimension `d`.
    #[must_use]
    pub fn supports_dim(&self, d: usize) -> bool {
        match self {
            Self::Euclid => true,
            Self::Haversine | Self::Vincenty => d == 2,
        }
    }

    /// Whether this metric composes with the grid's axis-aligned cell walk. Angular metrics do
    /// not: great-circle iso-distance contours are not axis-aligned boxes in `(lon, lat)` space,
    /// so the walker falls back to a full scan of non-empty cells for these.
    #[must_use]
    pub fn is_axis_aligned(&self) -> bool {
        matches!(self, Self::Euclid)
    }

    /// Computes the distance from `centre` to every row of `points`, in the minimum-image sense
    /// on periodic axes (`Euclid` only; periodicity is meaningless for the angular metrics, which
    /// already wrap on the sphere).
    ///
    /// # Errors
    ///
    /// Returns [`GridError::DimensionMismatch`] if an angular metric is used outside `d == 2`.
    pub fn distance(
        &self,
        centre: ArrayView1<f64>,
        points: ArrayView2<f64>,
        axes: &[Axis],
    ) -> Result<Array1<f64>, GridError> {
        let d = centre.len();
        if !self.supports_dim(d) {
            return Err(GridError::DimensionMismatch(d));
        }

        let out = match self {
            Self::Euclid => points
                .outer_iter()
                .map(|p| euclid_one(centre, p, axes))
                .collect(),
            Self::Haversine => points
                .outer_iter()
                .map(|p| haversine_one(centre, p))
                .collect(),
            Self::Vincenty => points
                .outer_iter()
                .map(|p| vincenty_one(centre, p))
                .collect(),
        };
        Ok(out)
    }
}

impl FromStr for Metric {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "euclid" => Ok(Self::Euclid),
            "haversine" => Ok(Self::Haversine),
            "vincenty" => Ok(Self::Vincenty),
            other => Err(GridError::UnsupportedMetric(other.to_string())),
        }
    }
}

fn euclid_one(centre: ArrayView1<f64>, point: ArrayView1<f64>, axes: &[Axis]) -> f64 {
    centre
        .iter()
        .zip(point.iter())
        .zip(axes.iter())
        .map(|((&c, &x), axis)| minimum_image(x - c, axis).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Half-angle (haversine) central angle between two `(lon, lat)` points, in radians.
fn haversine_one(centre: ArrayView1<f64>, point: ArrayView1<f64>) -> f64 {
    let (lon1, lat1) = (centre[0], centre[1]);
    let (lon2, lat2) = (point[0], point[1]);

    let sin_dlat = ((lat2 - lat1) / 2.0).sin();
    let sin_dlon = ((lon2 - lon1) / 2.0).sin();
    let a = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    // Clamp against rounding pushing `a` a hair past 1 (antipodal points).
    2.0 * a.sqrt().min(1.0).asin()
}

/// Vincenty's `atan2` form of the great-circle central angle between two `(lon, lat)` points, in
/// radians. Stable at small separations where `asin`-based formulas lose precision.
fn vincenty_one(centre: ArrayView1<f64>, point: ArrayView1<f64>) -> f64 {
    let (lon1, lat1) = (centre[0], centre[1]);
    let (lon2, lat2) = (point[0], point[1]);
    let dlon = lon2 - lon1;

    let (sin_lat1, cos_lat1) = lat1.sin_cos();
    let (sin_lat2, cos_lat2) = lat2.sin_cos();
    let (sin_dlon, cos_dlon) = dlon.sin_cos();

    let numerator = ((cos_lat2 * sin_dlon).powi(2)
        + (cos_lat1 * sin_lat2 - sin_lat1 * cos_lat2 * cos_dlon).powi(2))
    .sqrt();
    let denominator = sin_lat1 * sin_lat2 + cos_lat1 * cos_lat2 * cos_dlon;

    numerator.atan2(denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn axes2() -> Vec<Axis> {
        vec![Axis::Aperiodic, Axis::Aperiodic]
    }

    #[test]
    fn euclid_matches_pythagoras() {
        let centre = array![0.0, 0.0];
        let points = array![[3.0, 4.0]];
        let d = Metric::Euclid.distance(centre.view(), points.view(), &axes2()).unwrap();
        assert_eq!(d[0], 5.0);
    }

    #[test]
    fn euclid_is_symmetric() {
        let a = array![1.0, 1.0];
        let b = array![2.0, 2.0];
        let d_ab = Metric::Euclid
            .distance(a.view(), array![[2.0, 2.0]].view(), &axes2())
            .unwrap()[0];
        let d_ba = Metric::Euclid
            .distance(b.view(), array![[1.0, 1.0]].view(), &axes2())
            .unwrap()[0];
        approx::assert_relative_eq!(d_ab, d_ba, epsilon = 1e-16);
    }

    #[test]
    fn haversine_is_symmetric_and_positive() {
        let a = array![1.0_f64, 1.0];
        let b = array![2.0_f64, 2.0];
        let d_ab = Metric::Haversine
            .distance(a.view(), array![[2.0, 2.0]].view(), &axes2())
            .unwrap()[0];
        let d_ba = Metric::Haversine
            .distance(b.view(), array![[1.0, 1.0]].view(), &axes2())
            .unwrap()[0];
        approx::assert_relative_eq!(d_ab, d_ba, epsilon = 1e-10);
        assert!(d_ab > 0.0);
    }

    #[test]
    fn vincenty_agrees_with_haversine_at_small_separation() {
        let a = array![0.3_f64, 0.2];
        let points = array![[0.301, 0.201]];
        let hav = Metric::Haversine.distance(a.view(), points.view(), &axes2()).unwrap()[0];
        let vin = Metric::Vincenty.distance(a.view(), points.view(), &axes2()).unwrap()[0];
        approx::assert_relative_eq!(hav, vin, epsilon = 1e-10);
    }

    #[test]
    fn zero_distance_for_identical_points() {
        let a = array![0.5_f64, -0.25];
        let d = Metric::Euclid.distance(a.view(), array![[0.5, -0.25]].view(), &axes2()).unwrap()[0];
        assert_eq!(d, 0.0);
    }

    #[test]
    fn angular_metrics_reject_non_2d() {
        let centre = array![0.0, 0.0, 0.0];
        let points = array![[1.0, 1.0, 1.0]];
        let axes = vec![Axis::Aperiodic; 3];
        let err = Metric::Haversine
            .distance(centre.view(), points.view(), &axes)
            .unwrap_err();
        assert_eq!(err, GridError::DimensionMismatch(3));
    }

    #[test]
    fn unknown_metric_tag_is_rejected() {
        assert_eq!(
            "spherical".parse::<Metric>().unwrap_err(),
            GridError::UnsupportedMetric("spherical".to_string())
        );
        assert_eq!("euclid".parse::<Metric>().unwrap(), Metric::Euclid);
    }
}
