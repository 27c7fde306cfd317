use super::Lu;
use crate::{
    assert,
    backend::{level1, level2},
    linalg::{cond, reductions, swap_rows, workspace},
    GeneralMut, Matrix,
};
use dyn_stack::PodStack;
use reborrow::*;

/// Computes the LU decomposition of `matrix` in place, with partial pivoting, storing the row
/// transpositions in `transpositions`. Returns the number of transpositions that are not the
/// identity.
///
/// At step `k`, the row with the largest absolute value in column `k` (among rows `k..`) is
/// chosen as the pivot. A zero pivot column is skipped, leaving a zero on the diagonal of `U`.
#[track_caller]
pub fn lu_in_place(mut matrix: GeneralMut<'_>, transpositions: &mut [usize]) -> usize {
    let n = matrix.nrows();
    assert!(all(matrix.ncols() == n, transpositions.len() == n));

    let mut n_transpositions = 0;
    for (k, t) in transpositions.iter_mut().enumerate() {
        let imax = k + level1::idamax(matrix.rb().col(k).subvec(k, n - k)).unwrap_or(0);
        *t = imax;

        if imax != k {
            n_transpositions += 1;
            swap_rows(matrix.rb_mut(), k, imax);
        }

        let pivot = matrix.read(k, k);
        if pivot == 0.0 {
            continue;
        }

        let (top, bot) = matrix.rb_mut().split_at_row_mut(k + 1);
        let u12 = top.rb().row(k).subvec(k + 1, n - k - 1);
        let (mut left, right) = bot.split_at_col_mut(k + 1);
        let mut l21 = left.rb_mut().col_mut(k);
        level1::scal(1.0 / pivot, l21.rb_mut());
        // A22 -= l21 * u12ᵀ
        level2::ger(right, -1.0, l21.rb(), u12);
    }

    n_transpositions
}

impl Lu {
    /// Computes the LU decomposition of the square matrix `a`.
    ///
    /// The decomposition is computed even when `a` is singular; its condition number estimate
    /// is then infinite and solves report [`MatError::Singular`](crate::MatError::Singular).
    ///
    /// # Panics
    /// Panics if `a` is not square.
    #[track_caller]
    pub fn factorize(&mut self, a: &dyn Matrix) {
        let (n, c) = a.dims();
        assert!(n == c);
        self.valid = false;

        if self.lu.dims() != (n, n) {
            self.lu.reset();
        }
        self.lu.reuse_as(n, n);
        self.lu.as_mut().copy_from_matrix(a);
        self.pivots.resize(n, 0);
        self.anorm = reductions::norm_one(self.lu.as_ref());
        self.n_transpositions = lu_in_place(self.lu.as_mut(), &mut self.pivots);
        self.valid = true;

        self.cond = self.compute_cond();
        log::trace!("lu: factorized {n} × {n} matrix, condition estimate {:e}", self.cond);
    }

    fn compute_cond(&self) -> f64 {
        let n = self.lu.nrows();
        let lu = self.lu.as_ref();
        if (0..n).any(|k| lu.read(k, k) == 0.0) {
            return f64::INFINITY;
        }
        let mut mem = workspace(cond::inv_norm1_req(n));
        let inv = cond::inv_norm1(
            n,
            &mut |b| self.solve_in_place(GeneralMut::from_row_major_slice_mut(b, n, 1), false),
            &mut |b| self.solve_in_place(GeneralMut::from_row_major_slice_mut(b, n, 1), true),
            PodStack::new(&mut mem),
        );
        self.anorm * inv
    }
}
