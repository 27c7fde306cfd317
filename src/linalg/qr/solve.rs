use super::Qr;
use crate::{
    assert,
    backend::level3,
    error::MatError,
    linalg::{cond, householder, workspace},
    Dense, GeneralMut, Matrix, VecDense,
};
use dyn_stack::PodStack;
use reborrow::*;

impl Qr {
    #[track_caller]
    fn check_solvable(&self) -> Result<(), MatError> {
        if !self.is_full_rank() {
            return Err(MatError::NotFullRank);
        }
        if cond::is_ill_conditioned(self.cond) {
            return Err(MatError::Singular { cond: self.cond });
        }
        Ok(())
    }

    /// Solves in `work`, which has `m` rows.
    ///
    /// Without `trans`, `work` holds `b` on entry and the least squares solution in its first
    /// `n` rows on exit. With `trans`, `work` holds `b` in its first `n` rows on entry and the
    /// minimum norm solution on exit.
    fn solve_in_place(&self, mut work: GeneralMut<'_>, trans: bool) {
        let n = self.qr.ncols();
        let (r, diag) = self.r_factor();
        let mut mem = workspace(householder::apply_householder_sequence_req(work.ncols()));
        let stack = PodStack::new(&mut mem);

        if !trans {
            // x = R⁻¹ (Qᵀ b)[..n]
            householder::apply_householder_sequence_transpose_on_the_left_in_place(
                self.qr.as_ref(),
                work.rb_mut(),
                stack,
            );
            level3::trsm(r, diag, work.subrows_mut(0, n));
        } else {
            // Aᵀ = [Rᵀ 0] Qᵀ, so x = Q [R⁻ᵀ b; 0]
            level3::trsm(r.transpose(), diag, work.rb_mut().subrows_mut(0, n));
            let m = work.nrows();
            work.rb_mut().subrows_mut(n, m - n).fill_zero();
            householder::apply_householder_sequence_on_the_left_in_place(self.qr.as_ref(), work, stack);
        }
    }

    #[track_caller]
    fn solve_work(&self, trans: bool, b: &dyn Matrix) -> Result<(Dense, usize), MatError> {
        let (m, n) = self.dims();
        let (r, c) = b.dims();
        let (rows_in, rows_out) = if trans { (n, m) } else { (m, n) };
        assert!(r == rows_in);
        self.check_solvable()?;

        let mut work = Dense::zeros(m, c);
        work.as_mut().subrows_mut(0, rows_in).copy_from_matrix(b);
        self.solve_in_place(work.as_mut(), trans);
        Ok((work, rows_out))
    }

    /// Without `trans`, stores in `dst` the solution `x` of the least squares problem
    /// `min ‖A x - b‖₂`. With `trans`, stores the minimum norm solution of `Aᵀ x = b`.
    ///
    /// # Errors
    /// Returns [`MatError::NotFullRank`] if `A` is rank deficient, or [`MatError::Singular`]
    /// if the condition number estimate of `R` exceeds
    /// [`CONDITION_TOLERANCE`](crate::CONDITION_TOLERANCE). `dst` is left untouched in both
    /// cases.
    ///
    /// # Panics
    /// Panics if the handle is invalid or if `b` does not have `m` rows (`n` with `trans`).
    #[track_caller]
    pub fn solve_to(&self, dst: &mut Dense, trans: bool, b: &dyn Matrix) -> Result<(), MatError> {
        let (work, rows) = self.solve_work(trans, b)?;
        dst.reuse_as(rows, b.dims().1);
        dst.as_mut().copy_from(work.as_ref().subrows(0, rows));
        Ok(())
    }

    /// Same as [`Qr::solve_to`], for a column vector `b`.
    #[track_caller]
    pub fn solve_vec_to(&self, dst: &mut VecDense, trans: bool, b: &dyn Matrix) -> Result<(), MatError> {
        assert!(b.dims().1 == 1);
        let (work, rows) = self.solve_work(trans, b)?;
        dst.reuse_as_vec(rows);
        dst.as_vec_mut()
            .as_column_mut()
            .copy_from(work.as_ref().subrows(0, rows));
        Ok(())
    }
}
