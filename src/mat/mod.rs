//! Matrix abstraction and storage types.
//!
//! [`Matrix`] is the read-only interface every matrix implements. The raw storage probes
//! ([`Matrix::as_general`] and friends) default to `None`, so an implementation only has to
//! provide its dimensions and element access to be usable everywhere.

use crate::Side;
use core::{marker::PhantomData, ptr::NonNull};
use reborrow::*;

mod dense;
mod matmut;
mod matref;
mod overlap;
mod sym;
mod transpose;
mod tri;
mod vecdense;
mod vector;

pub use dense::Dense;
pub use matmut::GeneralMut;
pub use matref::GeneralRef;
pub use overlap::{Footprint, Overlap};
pub use sym::{SymDense, SymmetricMut, SymmetricRef};
pub use transpose::Transpose;
pub use tri::{TriDense, TriangularMut, TriangularRef};
pub use vecdense::VecDense;
pub use vector::{VectorMut, VectorRef};

pub(crate) use overlap::Alias;

/// Read access to a matrix.
pub trait Matrix {
    /// Returns the number of rows and columns of the matrix.
    fn dims(&self) -> (usize, usize);

    /// Returns the element at row `i` and column `j`.
    ///
    /// # Panics
    /// Panics if either index is out of bounds.
    fn at(&self, i: usize, j: usize) -> f64;

    /// Returns a strided view over the elements, if the matrix is backed by general storage.
    #[inline]
    fn as_general(&self) -> Option<GeneralRef<'_>> {
        None
    }

    /// Returns a view over the storage, if the matrix is backed by symmetric storage.
    #[inline]
    fn as_symmetric(&self) -> Option<SymmetricRef<'_>> {
        None
    }

    /// Returns a view over the storage, if the matrix is backed by triangular storage.
    #[inline]
    fn as_triangular(&self) -> Option<TriangularRef<'_>> {
        None
    }

    /// Returns a view over the storage, if the matrix is a column vector backed by strided
    /// storage.
    #[inline]
    fn as_vector(&self) -> Option<VectorRef<'_>> {
        None
    }

    /// Returns the lazy transpose of the matrix.
    #[inline]
    fn t(&self) -> Transpose<'_, Self>
    where
        Self: Sized,
    {
        Transpose { inner: self }
    }
}

impl<'a> dyn Matrix + 'a {
    /// Returns the lazy transpose of the matrix.
    #[inline]
    pub fn t(&self) -> Transpose<'_, dyn Matrix + 'a> {
        Transpose { inner: self }
    }
}

impl<M: Matrix + ?Sized> Matrix for &M {
    #[inline]
    fn dims(&self) -> (usize, usize) {
        (**self).dims()
    }

    #[track_caller]
    #[inline]
    fn at(&self, i: usize, j: usize) -> f64 {
        (**self).at(i, j)
    }

    #[inline]
    fn as_general(&self) -> Option<GeneralRef<'_>> {
        (**self).as_general()
    }

    #[inline]
    fn as_symmetric(&self) -> Option<SymmetricRef<'_>> {
        (**self).as_symmetric()
    }

    #[inline]
    fn as_triangular(&self) -> Option<TriangularRef<'_>> {
        (**self).as_triangular()
    }

    #[inline]
    fn as_vector(&self) -> Option<VectorRef<'_>> {
        (**self).as_vector()
    }
}

/// Write access to a matrix.
pub trait MatrixMut: Matrix {
    /// Sets the element at row `i` and column `j`.
    fn set(&mut self, i: usize, j: usize, value: f64);
}

/// Symmetric matrix, `at(i, j) == at(j, i)` for all indices.
pub trait Symmetric: Matrix {
    /// Returns the dimension of the matrix.
    fn symmetric_dim(&self) -> usize;
}

/// Triangular matrix, elements on the structurally zero side read as `0.0`.
pub trait Triangular: Matrix {
    /// Returns the dimension of the matrix and its stored side.
    fn triangle(&self) -> (usize, Side);
}

impl<M: Symmetric + ?Sized> Symmetric for &M {
    #[inline]
    fn symmetric_dim(&self) -> usize {
        (**self).symmetric_dim()
    }
}

impl<M: Triangular + ?Sized> Triangular for &M {
    #[inline]
    fn triangle(&self) -> (usize, Side) {
        (**self).triangle()
    }
}

/// Matrix norm selector.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Norm {
    /// Maximum absolute column sum.
    One,
    /// Frobenius norm, the square root of the sum of squares of the elements.
    Frobenius,
    /// Maximum absolute row sum.
    Inf,
}

/// Returns a copy of row `i` of `a`.
#[track_caller]
pub fn row(a: &dyn Matrix, i: usize) -> Vec<f64> {
    let (r, c) = a.dims();
    crate::assert!(i < r);
    if let Some(g) = a.as_general() {
        return g.row(i).iter().collect();
    }
    (0..c).map(|j| a.at(i, j)).collect()
}

/// Returns a copy of column `j` of `a`.
#[track_caller]
pub fn col(a: &dyn Matrix, j: usize) -> Vec<f64> {
    let (r, c) = a.dims();
    crate::assert!(j < c);
    if let Some(g) = a.as_general() {
        return g.col(j).iter().collect();
    }
    (0..r).map(|i| a.at(i, j)).collect()
}

/// Returns `true` if `a` and `b` have the same dimensions and equal elements.
pub fn equal(a: &dyn Matrix, b: &dyn Matrix) -> bool {
    equal_by(a, b, |x, y| x == y)
}

/// Returns `true` if `a` and `b` have the same dimensions and their elements are equal within
/// `epsilon`, either in absolute terms or relative to their magnitude.
pub fn equal_approx(a: &dyn Matrix, b: &dyn Matrix, epsilon: f64) -> bool {
    equal_by(a, b, |x, y| {
        if x == y {
            return true;
        }
        let diff = (x - y).abs();
        if diff <= epsilon {
            return true;
        }
        let scale = f64::max(x.abs(), y.abs());
        diff / scale <= epsilon
    })
}

fn equal_by(a: &dyn Matrix, b: &dyn Matrix, mut same: impl FnMut(f64, f64) -> bool) -> bool {
    let (r, c) = a.dims();
    if b.dims() != (r, c) {
        return false;
    }
    if let (Some(x), Some(y)) = (a.as_symmetric(), b.as_symmetric()) {
        for i in 0..r {
            for j in i..c {
                if !same(unsafe { x.read_unchecked(i, j) }, unsafe { y.read_unchecked(i, j) }) {
                    return false;
                }
            }
        }
        return true;
    }
    for i in 0..r {
        for j in 0..c {
            if !same(a.at(i, j), b.at(i, j)) {
                return false;
            }
        }
    }
    true
}

pub(crate) fn fmt_rows(f: &mut core::fmt::Formatter<'_>, m: &dyn Matrix) -> core::fmt::Result {
    struct Row<'a>(&'a dyn Matrix, usize);

    impl core::fmt::Debug for Row<'_> {
        fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
            let ncols = self.0.dims().1;
            f.debug_list()
                .entries((0..ncols).map(|j| self.0.at(self.1, j)))
                .finish()
        }
    }

    let nrows = m.dims().0;
    f.debug_list()
        .entries((0..nrows).map(|i| Row(m, i)))
        .finish()
}
