//! The QR decomposition decomposes an `m × n` matrix $A$, with $m \geq n$, into the product
//! $$A = QR,$$
//! where $Q$ is an orthogonal matrix, represented as a Householder sequence, and $R$ is an
//! upper trapezoidal matrix.
//!
//! The Householder vectors are stored below the diagonal of the factorized matrix, and the
//! strictly upper part of $R$ above it. The diagonal of $R$ is stored separately.

use crate::{
    backend::Diag,
    linalg::{householder, workspace},
    Dense, Side, TriangularRef, VectorRef,
};
use dyn_stack::PodStack;

/// Computing the decomposition.
pub mod compute;
/// Solving linear systems and least squares problems using the decomposition.
pub mod solve;

/// Householder QR decomposition of a matrix with at least as many rows as columns.
#[derive(Clone, Debug, Default)]
pub struct Qr {
    qr: Dense,
    rdiag: Vec<f64>,
    cond: f64,
    valid: bool,
}

impl Qr {
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
        self.qr.reset();
        self.rdiag.clear();
        self.cond = 0.0;
        self.valid = false;
    }

    #[track_caller]
    #[inline]
    fn check_valid(&self) {
        if !self.valid {
            panic!("qr: factorization missing");
        }
    }

    /// Returns the dimensions of the factorized matrix.
    #[track_caller]
    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        self.check_valid();
        (self.qr.nrows(), self.qr.ncols())
    }

    /// Returns the square upper triangle of `R`, with its diagonal.
    #[inline]
    fn r_factor(&self) -> (TriangularRef<'_>, Diag<'_>) {
        let n = self.qr.ncols();
        (
            TriangularRef::new(self.qr.as_ref().subrows(0, n), Side::Upper),
            Diag::Explicit(VectorRef::from_slice(&self.rdiag)),
        )
    }

    /// Returns `true` if every diagonal element of `R` is non zero.
    #[track_caller]
    pub fn is_full_rank(&self) -> bool {
        self.check_valid();
        self.rdiag.iter().all(|&d| d != 0.0)
    }

    /// Returns an estimate of the 1-norm condition number of `R`, which is also the condition
    /// number of the factorized matrix in the 2-norm sense of least squares problems. Infinite
    /// if the matrix is rank deficient.
    #[track_caller]
    #[inline]
    pub fn cond(&self) -> f64 {
        self.check_valid();
        self.cond
    }

    /// Stores the `m × n` factor `R` in `dst`.
    #[track_caller]
    pub fn r_to(&self, dst: &mut Dense) {
        let (m, n) = self.dims();
        dst.reuse_as(m, n);
        let mut r = dst.as_mut();
        r.fill_zero();
        let qr = self.qr.as_ref();
        for i in 0..n {
            r.write(i, i, self.rdiag[i]);
            for j in i + 1..n {
                r.write(i, j, qr.read(i, j));
            }
        }
    }

    /// Stores the `m × m` orthogonal factor `Q` in `dst`.
    #[track_caller]
    pub fn q_to(&self, dst: &mut Dense) {
        let (m, _) = self.dims();
        dst.reuse_as(m, m);
        dst.as_mut().copy_from(Dense::identity(m).as_ref());
        let mut mem = workspace(householder::apply_householder_sequence_req(m));
        householder::apply_householder_sequence_on_the_left_in_place(
            self.qr.as_ref(),
            dst.as_mut(),
            PodStack::new(&mut mem),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert, mat, mat::equal_approx, Matrix};

    #[test]
    fn factors_of_known_matrix() {
        let a = mat![[3.0, 1.0], [4.0, 2.0], [0.0, 2.0]];
        let mut qr = Qr::new();
        assert!(!qr.is_valid());
        qr.factorize(&a);
        assert!(qr.is_valid());
        assert!(qr.dims() == (3, 2));
        assert!(qr.is_full_rank());

        let mut r = Dense::new();
        qr.r_to(&mut r);
        // the first column has norm 5, and its sign is flipped
        assert!((r.at(0, 0) + 5.0).abs() < 1e-14);
        assert!(all(r.at(1, 0) == 0.0, r.at(2, 0) == 0.0, r.at(2, 1) == 0.0));

        let mut q = Dense::new();
        qr.q_to(&mut q);
        let mut prod = Dense::new();
        prod.mul(&q, &r);
        assert!(equal_approx(&prod, &a, 1e-14));
    }

    #[test]
    #[should_panic(expected = "qr: factorization missing")]
    fn invalid_handle_panics() {
        Qr::new().cond();
    }
}
