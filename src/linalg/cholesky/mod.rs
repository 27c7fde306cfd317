//! The Cholesky decomposition of a symmetric positive definite matrix $A$ is such that:
//! $$A = LL^\top,$$
//! where $L$ is a lower triangular matrix with a positive diagonal.
//!
//! Only the upper triangle of the input is read, consistently with the storage of
//! [`SymDense`](crate::SymDense).
//!
//! ```
//! use dense_la::{linalg::cholesky::Cholesky, SymDense, VecDense, vector};
//!
//! let a = SymDense::from_vec(2, vec![4.0, 2.0, 0.0, 5.0]);
//! let mut chol = Cholesky::new();
//! chol.factorize(&a).unwrap();
//! assert!((chol.det() - 16.0).abs() < 1e-12);
//!
//! let mut x = VecDense::new();
//! chol.solve_vec_to(&mut x, &vector![6.0, 7.0]).unwrap();
//! assert!((x.at_vec(0) - 1.0).abs() < 1e-12);
//! assert!((x.at_vec(1) - 1.0).abs() < 1e-12);
//! ```

use crate::{TriDense, TriangularRef};

/// Computing the decomposition.
pub mod compute;
/// Solving linear systems using the decomposition.
pub mod solve;
/// Updating the decomposition.
pub mod update;

/// Cholesky decomposition of a symmetric positive definite matrix.
///
/// A handle is invalid until a factorization succeeds. A failed factorization leaves it
/// invalid.
#[derive(Clone, Debug, Default)]
pub struct Cholesky {
    chol: TriDense,
    anorm: f64,
    cond: f64,
    valid: bool,
}

impl Cholesky {
    /// Creates an invalid handle.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the handle holds a decomposition.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Invalidates the handle and releases its storage.
    pub fn reset(&mut self) {
        self.chol.reset();
        self.anorm = 0.0;
        self.cond = 0.0;
        self.valid = false;
    }

    #[track_caller]
    #[inline]
    fn check_valid(&self) {
        if !self.valid {
            panic!("cholesky: factorization missing");
        }
    }

    /// Returns the dimension of the factorized matrix.
    #[track_caller]
    #[inline]
    pub fn dim(&self) -> usize {
        self.check_valid();
        self.chol.dim()
    }

    #[inline]
    pub(crate) fn factor(&self) -> TriangularRef<'_> {
        self.chol.as_tri_ref()
    }

    /// Returns an estimate of the 1-norm condition number of the factorized matrix.
    #[track_caller]
    #[inline]
    pub fn cond(&self) -> f64 {
        self.check_valid();
        self.cond
    }

    /// Returns the determinant of the factorized matrix.
    #[track_caller]
    pub fn det(&self) -> f64 {
        self.log_det().exp()
    }

    /// Returns the natural logarithm of the determinant of the factorized matrix, which is
    /// always positive.
    #[track_caller]
    pub fn log_det(&self) -> f64 {
        let n = self.dim();
        let l = self.factor();
        2.0 * (0..n).map(|k| l.read(k, k).ln()).sum::<f64>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert, SymDense};
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn determinant() {
        let a = SymDense::from_vec(3, vec![4.0, 1.0, 1.0, 1.0, 2.0, 3.0, 1.0, 3.0, 6.0]);
        let mut chol = Cholesky::new();
        assert!(!chol.is_valid());
        chol.factorize(&a).unwrap();
        assert!(chol.is_valid());
        assert_approx_eq!(chol.det(), 10.0, 1e-12);
        assert_approx_eq!(chol.log_det(), 10f64.ln(), 1e-12);

        let mut lu = crate::linalg::lu::Lu::new();
        lu.factorize(&a.to_dense());
        assert_approx_eq!(lu.det(), chol.det(), 1e-12);
    }

    #[test]
    #[should_panic(expected = "cholesky: factorization missing")]
    fn invalid_handle_panics() {
        Cholesky::new().cond();
    }

    #[test]
    fn reset_invalidates() {
        let mut chol = Cholesky::new();
        chol.factorize(&SymDense::from_vec(1, vec![9.0])).unwrap();
        assert_approx_eq!(chol.det(), 9.0);
        chol.reset();
        assert!(!chol.is_valid());
    }
}
