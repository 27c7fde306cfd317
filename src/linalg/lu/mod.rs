//! The partial pivoting LU decomposition is such that:
//! $$PA = LU,$$
//! where $P$ is a permutation matrix, $L$ is a unit lower triangular matrix, and $U$ is
//! an upper triangular matrix.
//!
//! The factors are packed in a single square matrix, $L$ below the diagonal and $U$ on and above
//! it. The permutation is stored as a sequence of row transpositions: at step $k$, row $k$ was
//! swapped with row `pivots()[k]`, which is always `>= k`.
//!
//! ```
//! use dense_la::{mat, linalg::lu::Lu, Dense};
//!
//! let a = mat![[0.0, 2.0], [3.0, 1.0]];
//! let mut lu = Lu::new();
//! lu.factorize(&a);
//! assert!((lu.det() + 6.0).abs() < 1e-12);
//!
//! let mut x = Dense::new();
//! lu.solve_to(&mut x, false, &mat![[2.0], [4.0]]).unwrap();
//! assert!((x.raw_data()[0] - 1.0).abs() < 1e-12);
//! assert!((x.raw_data()[1] - 1.0).abs() < 1e-12);
//! ```

use crate::{Dense, Side, TriDense, TriangularRef};

/// Computing the decomposition.
pub mod compute;
/// Solving linear systems using the decomposition.
pub mod solve;

/// LU decomposition with partial pivoting of a square matrix.
///
/// A handle is invalid until [`Lu::factorize`] is called, and can be refactorized any number of
/// times; its storage is reused when the dimension does not change.
#[derive(Clone, Debug, Default)]
pub struct Lu {
    lu: Dense,
    pivots: Vec<usize>,
    n_transpositions: usize,
    anorm: f64,
    cond: f64,
    valid: bool,
}

impl Lu {
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
        self.lu.reset();
        self.pivots.clear();
        self.n_transpositions = 0;
        self.anorm = 0.0;
        self.cond = 0.0;
        self.valid = false;
    }

    #[track_caller]
    #[inline]
    fn check_valid(&self) {
        if !self.valid {
            panic!("lu: factorization missing");
        }
    }

    /// Returns the dimension of the factorized matrix.
    #[track_caller]
    #[inline]
    pub fn dim(&self) -> usize {
        self.check_valid();
        self.lu.nrows()
    }

    /// Returns the packed factors.
    #[track_caller]
    #[inline]
    pub fn factors(&self) -> &Dense {
        self.check_valid();
        &self.lu
    }

    /// Returns the row transpositions applied during the factorization.
    #[track_caller]
    #[inline]
    pub fn pivots(&self) -> &[usize] {
        self.check_valid();
        &self.pivots
    }

    /// Returns the row permutation `perm` such that row `i` of `PA` is row `perm[i]` of `A`.
    #[track_caller]
    pub fn row_perm(&self) -> Vec<usize> {
        let mut perm: Vec<usize> = (0..self.dim()).collect();
        for (k, &p) in self.pivots.iter().enumerate() {
            perm.swap(k, p);
        }
        perm
    }

    /// Returns an estimate of the 1-norm condition number of the factorized matrix, computed at
    /// factorization time. Infinite for an exactly singular matrix.
    #[track_caller]
    #[inline]
    pub fn cond(&self) -> f64 {
        self.check_valid();
        self.cond
    }

    /// Returns the determinant of the factorized matrix.
    #[track_caller]
    pub fn det(&self) -> f64 {
        let (log_abs, sign) = self.log_det();
        sign * log_abs.exp()
    }

    /// Returns the natural logarithm of the absolute value of the determinant, and its sign.
    ///
    /// For an exactly singular matrix this is `(-inf, 0.0)`.
    #[track_caller]
    pub fn log_det(&self) -> (f64, f64) {
        let n = self.dim();
        let lu = self.lu.as_ref();
        let mut sign = if self.n_transpositions % 2 == 0 { 1.0 } else { -1.0 };
        let mut log_abs = 0.0;
        for k in 0..n {
            let d = lu.read(k, k);
            if d < 0.0 {
                sign = -sign;
            }
            log_abs += d.abs().ln();
        }
        if log_abs == f64::NEG_INFINITY {
            sign = 0.0;
        }
        (log_abs, sign)
    }

    /// Stores the unit lower triangular factor `L` in `dst`.
    #[track_caller]
    pub fn l_to(&self, dst: &mut TriDense) {
        let n = self.dim();
        dst.reuse_as_tri(n, Side::Lower);
        let mut l = dst.as_tri_mut();
        l.copy_from(TriangularRef::new(self.lu.as_ref(), Side::Lower));
        for k in 0..n {
            l.write(k, k, 1.0);
        }
    }

    /// Stores the upper triangular factor `U` in `dst`.
    #[track_caller]
    pub fn u_to(&self, dst: &mut TriDense) {
        let n = self.dim();
        dst.reuse_as_tri(n, Side::Upper);
        dst.as_tri_mut()
            .copy_from(TriangularRef::new(self.lu.as_ref(), Side::Upper));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert, mat, Matrix};
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn determinant() {
        let a = mat![[2.0, 1.0, 1.0], [4.0, -6.0, 0.0], [-2.0, 7.0, 2.0]];
        let mut lu = Lu::new();
        assert!(!lu.is_valid());
        lu.factorize(&a);
        assert!(lu.is_valid());
        assert_approx_eq!(lu.det(), -16.0, 1e-12);
        let (log_abs, sign) = lu.log_det();
        assert_approx_eq!(log_abs, 16f64.ln(), 1e-12);
        assert!(sign == -1.0);
        assert!(lu.pivots().iter().enumerate().all(|(k, &p)| p >= k));
    }

    #[test]
    fn singular_determinant() {
        let a = mat![[1.0, 2.0], [2.0, 4.0]];
        let mut lu = Lu::new();
        lu.factorize(&a);
        assert!(lu.det() == 0.0);
        assert!(lu.log_det() == (f64::NEG_INFINITY, 0.0));
        assert!(lu.cond().is_infinite());
    }

    #[test]
    fn row_permutation() {
        let a = mat![[0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]];
        let mut lu = Lu::new();
        lu.factorize(&a);
        let perm = lu.row_perm();
        // PA is the identity, so row i of PA is the row of A with its one in column i
        for (i, &p) in perm.iter().enumerate() {
            assert!(a.at(p, i) == 1.0);
        }
        lu.reset();
        assert!(!lu.is_valid());
    }

    #[test]
    #[should_panic(expected = "lu: factorization missing")]
    fn invalid_handle_panics() {
        Lu::new().det();
    }
}
