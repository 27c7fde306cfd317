//! `dense-la` is a dense linear algebra library built around a small polymorphic matrix
//! abstraction.
//!
//! Every matrix type implements [`Matrix`], which only requires the dimensions and element
//! access. Routines that accept arbitrary matrices additionally probe for raw storage
//! ([`Matrix::as_general`], [`Matrix::as_symmetric`], [`Matrix::as_triangular`],
//! [`Matrix::as_vector`]) and dispatch to strided kernels when it is available, so that user
//! defined matrices with no backing buffer still work, while the concrete storage types take
//! the fast paths.
//!
//! The concrete storage types are:
//! - [`Dense`]: general row-major matrix with a row stride,
//! - [`SymDense`]: symmetric matrix, only the upper triangle is stored,
//! - [`TriDense`]: upper or lower triangular matrix,
//! - [`VecDense`]: column vector with an increment.
//!
//! On top of them, the [`linalg`] module provides the arithmetic engine, the LU, Cholesky, QR
//! and LQ factorizations, and the matrix chain product. The [`io`] module encodes matrices and
//! vectors in a little-endian binary format.
//!
//! # Receivers
//! Operations that write into a [`Dense`] receiver follow the same rule everywhere: an empty
//! receiver is resized to the shape of the result, while a non-empty receiver must already have
//! that shape.
//!
//! # Example
//! ```
//! use dense_la::{mat, Dense, Matrix};
//!
//! let a = mat![[4.0, 1.0], [1.0, 3.0]];
//! let b = mat![[1.0], [2.0]];
//!
//! let mut x = Dense::new();
//! x.solve(&a, &b).unwrap();
//!
//! let mut ax = Dense::new();
//! ax.mul(&a, &x);
//! assert!((ax.at(0, 0) - 1.0).abs() < 1e-12);
//! assert!((ax.at(1, 0) - 2.0).abs() < 1e-12);
//! ```

#![allow(clippy::too_many_arguments)]
#![allow(clippy::needless_range_loop)]
#![allow(non_snake_case)]

use equator::{assert, debug_assert};

pub mod backend;
pub mod error;
pub mod io;
pub mod linalg;
pub mod mat;

pub use dyn_stack;
pub use reborrow;

pub use backend::Engine;
pub use error::{MatError, CONDITION_TOLERANCE};
pub use mat::{
    Dense, GeneralMut, GeneralRef, Matrix, MatrixMut, SymDense, Symmetric, SymmetricMut,
    SymmetricRef, Transpose, TriDense, Triangular, TriangularMut, TriangularRef, VecDense,
    VectorMut, VectorRef,
};

/// Specifies whether the triangular lower or upper part of a matrix should be accessed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Side {
    /// Lower half should be accessed.
    Lower,
    /// Upper half should be accessed.
    Upper,
}

impl Side {
    /// Returns the opposite side, which is the side of the transposed matrix.
    #[inline]
    pub fn flip(self) -> Side {
        match self {
            Side::Lower => Side::Upper,
            Side::Upper => Side::Lower,
        }
    }
}

/// Creates a [`Dense`] matrix from rows of values.
///
/// ```
/// use dense_la::{mat, Matrix};
///
/// let m = mat![
///     [1.0, 2.0, 3.0],
///     [4.0, 5.0, 6.0],
/// ];
///
/// assert_eq!(m.dims(), (2, 3));
/// assert_eq!(m.at(0, 2), 3.0);
/// assert_eq!(m.at(1, 0), 4.0);
/// ```
#[macro_export]
macro_rules! mat {
    () => {
        {
            compile_error!("number of columns in the matrix is ambiguous");
        }
    };

    ($([$($v:expr),* $(,)?] ),+ $(,)?) => {
        {
            let rows: &[&[f64]] = &[$(&[$(($v) as f64),*]),+];
            $crate::mat::Dense::from_rows(rows)
        }
    };
}

/// Creates a [`VecDense`] containing the arguments.
///
/// ```
/// use dense_la::{vector, Matrix};
///
/// let v = vector![3.0, 5.0, 7.0];
///
/// assert_eq!(v.len(), 3);
/// assert_eq!(v.at_vec(1), 5.0);
/// assert_eq!(v.at(2, 0), 7.0);
/// ```
#[macro_export]
macro_rules! vector {
    ($($v:expr),+ $(,)?) => {
        $crate::mat::VecDense::from_vec(::std::vec![$(($v) as f64),+])
    };
}

#[cfg(feature = "perf-warn")]
#[macro_export]
#[doc(hidden)]
macro_rules! __perf_warn {
    ($name: ident) => {{
        #[inline(always)]
        #[allow(non_snake_case)]
        fn $name() -> &'static ::core::sync::atomic::AtomicBool {
            static $name: ::core::sync::atomic::AtomicBool =
                ::core::sync::atomic::AtomicBool::new(false);
            &$name
        }
        ::core::matches!(
            $name().compare_exchange(
                false,
                true,
                ::core::sync::atomic::Ordering::Relaxed,
                ::core::sync::atomic::Ordering::Relaxed,
            ),
            Ok(_)
        )
    }};
}

/// Commonly used items.
pub mod prelude {
    pub use crate::{
        backend::Engine,
        error::MatError,
        linalg::{chain::optimal_order, cholesky::Cholesky, lq::Lq, lu::Lu, qr::Qr},
        mat::{
            Dense, GeneralMut, GeneralRef, Matrix, MatrixMut, Norm, SymDense, Symmetric,
            TriDense, Triangular, VecDense,
        },
        mat, vector, Side,
    };
}
