//! Error kinds reported by the library.
//!
//! Violated preconditions (mismatched shapes, out of bounds indices, non-square inputs) panic at
//! the call site through `equator` assertions. The remaining structural violations panic with a
//! [`MatError`] rendered as the panic message, and numerical conditions, which callers usually
//! want to handle, are returned as `Err(MatError)`.

use core::fmt;

/// Condition number above which a linear solve is reported as [`MatError::Singular`].
pub const CONDITION_TOLERANCE: f64 = 1e16;

/// Error kinds of the library.
#[derive(Debug, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub enum MatError {
    /// A matrix or vector was constructed with a zero dimension.
    ZeroLength,
    /// A storage descriptor does not satisfy the invariants of its layout, e.g. a symmetric
    /// matrix stored in its lower triangle, or a non row-major buffer.
    IllegalStorage,
    /// A write targeted the structurally zero half of a triangular matrix.
    TriangleSet,
    /// The receiver and an operand describe exactly the same region of memory, in a context
    /// where this cannot be handled.
    RegionIdentity,
    /// The receiver and an operand share part of their memory.
    RegionOverlap,
    /// The matrix is singular or too close to singular for the result to be meaningful.
    ///
    /// `cond` is the estimated condition number, infinite for an exactly singular matrix.
    Singular {
        /// Estimated condition number.
        cond: f64,
    },
    /// The matrix does not have full rank.
    NotFullRank,
    /// The matrix is not numerically positive definite.
    NotPositiveDefinite {
        /// Dimension of the first square top-left block that is not positive definite.
        minor: usize,
    },
    /// The matrix is not symmetric.
    NotSymmetric {
        /// Row of the first mismatching pair.
        row: usize,
        /// Column of the first mismatching pair.
        col: usize,
    },
}

impl MatError {
    /// Returns the inverse of the condition number carried by a [`MatError::Singular`], or
    /// `None` for every other kind.
    #[inline]
    pub fn rcond(&self) -> Option<f64> {
        match *self {
            MatError::Singular { cond } => Some(1.0 / cond),
            _ => None,
        }
    }
}

impl fmt::Display for MatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            MatError::ZeroLength => f.write_str("matrix: zero length in matrix dimension"),
            MatError::IllegalStorage => f.write_str("matrix: illegal storage layout"),
            MatError::TriangleSet => {
                f.write_str("matrix: triangular set out of bounds")
            }
            MatError::RegionIdentity => f.write_str("matrix: region identity"),
            MatError::RegionOverlap => f.write_str("matrix: region overlap"),
            MatError::Singular { cond } => {
                write!(f, "matrix: singular or near singular, condition number {cond:e}")
            }
            MatError::NotFullRank => f.write_str("matrix: not full rank"),
            MatError::NotPositiveDefinite { minor } => write!(
                f,
                "matrix: not positive definite, leading minor of order {minor}"
            ),
            MatError::NotSymmetric { row, col } => {
                write!(f, "matrix: not symmetric at ({row}, {col})")
            }
        }
    }
}

impl std::error::Error for MatError {}

#[cold]
#[track_caller]
pub(crate) fn fail(err: MatError) -> ! {
    panic!("{err}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert;

    #[test]
    fn display() {
        assert_eq!(MatError::RegionOverlap.to_string(), "matrix: region overlap");
        assert_eq!(
            MatError::NotPositiveDefinite { minor: 3 }.to_string(),
            "matrix: not positive definite, leading minor of order 3"
        );
        assert!(MatError::Singular { cond: f64::INFINITY }
            .to_string()
            .contains("singular"));
    }

    #[test]
    fn rcond() {
        assert_eq!(MatError::Singular { cond: 4.0 }.rcond(), Some(0.25));
        assert_eq!(MatError::Singular { cond: f64::INFINITY }.rcond(), Some(0.0));
        assert_eq!(MatError::NotFullRank.rcond(), None);
    }

    #[test]
    #[should_panic(expected = "matrix: region identity")]
    fn fail_panics_with_message() {
        fail(MatError::RegionIdentity);
    }
}
