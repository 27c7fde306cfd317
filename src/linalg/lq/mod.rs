//! The LQ decomposition decomposes an `m × n` matrix $A$, with $m \leq n$, into the product
//! $$A = LQ,$$
//! where $L$ is a lower trapezoidal matrix and $Q$ is an orthogonal matrix.
//!
//! It is the row-wise dual of the [QR decomposition](crate::linalg::qr): the Householder
//! reflections are computed from the rows of $A$ instead of its columns, so the decomposition is
//! the QR decomposition of $A^\top$, computed in place through a transposed view. The Householder
//! vectors are stored to the right of the diagonal, the strictly lower part of $L$ below it, and
//! the diagonal of $L$ separately.

use crate::{
    backend::Diag,
    linalg::{householder, workspace},
    Dense, GeneralRef, Side, TriangularRef, VectorRef,
};
use dyn_stack::PodStack;

/// Computing the decomposition.
pub mod compute;
/// Solving linear systems and least squares problems using the decomposition.
pub mod solve;

/// Householder LQ decomposition of a matrix with at most as many rows as columns.
#[derive(Clone, Debug, Default)]
pub struct Lq {
    lq: Dense,
    ldiag: Vec<f64>,
    cond: f64,
    valid: bool,
}

impl Lq {
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
        self.lq.reset();
        self.ldiag.clear();
        self.cond = 0.0;
        self.valid = false;
    }

    #[track_caller]
    #[inline]
    fn check_valid(&self) {
        if !self.valid {
            panic!("lq: factorization missing");
        }
    }

    /// Returns the dimensions of the factorized matrix.
    #[track_caller]
    #[inline]
    pub fn dims(&self) -> (usize, usize) {
        self.check_valid();
        (self.lq.nrows(), self.lq.ncols())
    }

    /// Householder basis, whose column `k` is the vector of the reflection computed from row `k`.
    #[inline]
    fn basis(&self) -> GeneralRef<'_> {
        self.lq.as_ref().transpose()
    }

    /// Returns the square lower triangle of `L`, with its diagonal.
    #[inline]
    fn l_factor(&self) -> (TriangularRef<'_>, Diag<'_>) {
        let m = self.lq.nrows();
        (
            TriangularRef::new(self.lq.as_ref().subcols(0, m), Side::Lower),
            Diag::Explicit(VectorRef::from_slice(&self.ldiag)),
        )
    }

    /// Returns `true` if every diagonal element of `L` is non zero.
    #[track_caller]
    pub fn is_full_rank(&self) -> bool {
        self.check_valid();
        self.ldiag.iter().all(|&d| d != 0.0)
    }

    /// Returns an estimate of the 1-norm condition number of `L`. Infinite if the matrix is
    /// rank deficient.
    #[track_caller]
    #[inline]
    pub fn cond(&self) -> f64 {
        self.check_valid();
        self.cond
    }

    /// Stores the `m × n` factor `L` in `dst`.
    #[track_caller]
    pub fn l_to(&self, dst: &mut Dense) {
        let (m, n) = self.dims();
        dst.reuse_as(m, n);
        let mut l = dst.as_mut();
        l.fill_zero();
        let lq = self.lq.as_ref();
        for i in 0..m {
            for j in 0..i {
                l.write(i, j, lq.read(i, j));
            }
            l.write(i, i, self.ldiag[i]);
        }
    }

    /// Stores the `n × n` orthogonal factor `Q` in `dst`.
    #[track_caller]
    pub fn q_to(&self, dst: &mut Dense) {
        let (_, n) = self.dims();
        dst.reuse_as(n, n);
        dst.as_mut().copy_from(Dense::identity(n).as_ref());
        // Q = (H_0 ⋯ H_{m-1})ᵀ
        let mut mem = workspace(householder::apply_householder_sequence_req(n));
        householder::apply_householder_sequence_transpose_on_the_left_in_place(
            self.basis(),
            dst.as_mut(),
            PodStack::new(&mut mem),
        );
    }
}
