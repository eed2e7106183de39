//! Per-axis periodicity configuration and the minimum-image convention.

/// Configuration of a single axis: either unbounded, or wrapping on `[lo, hi)` with period
/// `hi - lo`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Axis {
    /// No wrap-around; the axis extent is taken from the data.
    Aperiodic,
    /// Wraps at `lo` and `hi`. Requires `lo < hi`.
    Periodic {
        /// Lower bound of the wrap interval.
        lo: f64,
        /// Upper bound of the wrap interval.
        hi: f64,
    },
}

impl Axis {
    /// Period length `hi - lo`, or `None` for an aperiodic axis.
    #[must_use]
    pub fn length(&self) -> Option<f64> {
        match self {
            Self::Aperiodic => None,
            Self::Periodic { lo, hi } => Some(hi - lo),
        }
    }

    /// Whether this axis wraps.
    #[must_use]
    pub fn is_periodic(&self) -> bool {
        matches!(self, Self::Periodic { .. })
    }
}

/// `true` iff at least one axis in `axes` is periodic.
#[must_use]
pub fn periodic_flag(axes: &[Axis]) -> bool {
    axes.iter().any(Axis::is_periodic)
}

/// Reduces a single coordinate difference `delta = x - c` to the minimum-image convention on
/// `axis`. Aperiodic axes are returned unchanged. Idempotent: reducing an already-minimal
/// difference is a no-op, which lets callers pre-shift periodic candidates and still run the
/// reduction again without changing the result.
#[must_use]
pub fn minimum_image(delta: f64, axis: &Axis) -> f64 {
    match axis.length() {
        None => delta,
        Some(length) => delta - length * (delta / length).round(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aperiodic_is_a_no_op() {
        assert_eq!(minimum_image(123.456, &Axis::Aperiodic), 123.456);
        assert_eq!(minimum_image(-7.0, &Axis::Aperiodic), -7.0);
    }

    #[test]
    fn wraps_to_the_nearest_image() {
        let axis = Axis::Periodic { lo: 0.0, hi: 10.0 };
        // 9.0 away the "long way" is really 1.0 away the short way, with a sign flip.
        assert_eq!(minimum_image(9.0, &axis), -1.0);
        assert_eq!(minimum_image(-9.0, &axis), 1.0);
        assert_eq!(minimum_image(3.0, &axis), 3.0);
    }

    #[test]
    fn is_idempotent_on_already_minimal_deltas() {
        let axis = Axis::Periodic { lo: -50.0, hi: 50.0 };
        for delta in [-49.0, -1.0, 0.0, 1.0, 49.0] {
            let once = minimum_image(delta, &axis);
            let twice = minimum_image(once, &axis);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn periodic_flag_detects_any_wrapping_axis() {
        assert!(!periodic_flag(&[Axis::Aperiodic, Axis::Aperiodic]));
        assert!(periodic_flag(&[
            Axis::Aperiodic,
            Axis::Periodic { lo: 0.0, hi: 1.0 }
        ]));
    }
}
