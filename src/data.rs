//! Ownership of the indexed point set: owned copy or borrow from the caller.

use ndarray::{Array2, ArrayView2};

/// The point set backing an index, either owned or borrowed.
///
/// Borrowing is a performance contract: the caller promises not to mutate the underlying array
/// for as long as the index lives. A safe implementation should default to owning, which is why
/// [`crate::SpatialIndex::new`] copies and only [`crate::SpatialIndex::borrowing`] borrows.
#[derive(Debug)]
pub enum Data<'a> {
    /// The index holds its own copy of the point set.
    Owned(Array2<f64>),
    /// The index borrows the point set from the caller.
    Borrowed(&'a Array2<f64>),
}

impl<'a> Data<'a> {
    /// A read-only view of the point set, regardless of ownership.
    #[must_use]
    pub fn view(&self) -> ArrayView2<f64> {
        match self {
            Self::Owned(array) => array.view(),
            Self::Borrowed(array) => array.view(),
        }
    }

    /// Number of points, `N`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.view().nrows()
    }

    /// `true` if the point set has zero points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dimension `d`.
    #[must_use]
    pub fn dim(&self) -> usize {
        self.view().ncols()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn owned_reports_shape() {
        let data = Data::Owned(array![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]);
        assert_eq!(data.len(), 3);
        assert_eq!(data.dim(), 2);
        assert!(!data.is_empty());
    }

    #[test]
    fn borrowed_views_the_same_storage() {
        let owned = array![[0.0, 1.0], [2.0, 3.0]];
        let data = Data::Borrowed(&owned);
        assert_eq!(data.view(), owned.view());
    }

    #[test]
    fn empty_point_set_is_reported() {
        let data = Data::Owned(Array2::<f64>::zeros((0, 3)));
        assert!(data.is_empty());
    }
}
