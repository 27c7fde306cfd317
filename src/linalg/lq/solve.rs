use super::Lq;
use crate::{
    assert,
    backend::level3,
    error::MatError,
    linalg::{cond, householder, workspace},
    Dense, GeneralMut, Matrix, VecDense,
};
use dyn_stack::PodStack;
use reborrow::*;

impl Lq {
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

    /// Solves in `work`, which has `n` rows.
    ///
    /// Without `trans`, `work` holds `b` in its first `m` rows on entry and the minimum norm
    /// solution on exit. With `trans`, `work` holds `b` on entry and the least squares solution
    /// in its first `m` rows on exit.
    fn solve_in_place(&self, mut work: GeneralMut<'_>, trans: bool) {
        let m = self.lq.nrows();
        let (l, diag) = self.l_factor();
        let mut mem = workspace(householder::apply_householder_sequence_req(work.ncols()));
        let stack = PodStack::new(&mut mem);

        if !trans {
            // A = [L 0] Pᵀ with P = H_0 ⋯ H_{m-1}, so x = P [L⁻¹ b; 0]
            level3::trsm(l, diag, work.rb_mut().subrows_mut(0, m));
            let n = work.nrows();
            work.rb_mut().subrows_mut(m, n - m).fill_zero();
            householder::apply_householder_sequence_on_the_left_in_place(self.basis(), work, stack);
        } else {
            // Aᵀ = P [Lᵀ; 0], so x = L⁻ᵀ (Pᵀ b)[..m]
            householder::apply_householder_sequence_transpose_on_the_left_in_place(
                self.basis(),
                work.rb_mut(),
                stack,
            );
            level3::trsm(l.transpose(), diag, work.subrows_mut(0, m));
        }
    }

    #[track_caller]
    fn solve_work(&self, trans: bool, b: &dyn Matrix) -> Result<(Dense, usize), MatError> {
        let (m, n) = self.dims();
        let (r, c) = b.dims();
        let (rows_in, rows_out) = if trans { (n, m) } else { (m, n) };
        assert!(r == rows_in);
        self.check_solvable()?;

        let mut work = Dense::zeros(n, c);
        work.as_mut().subrows_mut(0, rows_in).copy_from_matrix(b);
        self.solve_in_place(work.as_mut(), trans);
        Ok((work, rows_out))
    }

    /// Without `trans`, stores in `dst` the minimum norm solution of `A x = b`. With `trans`,
    /// stores the solution `x` of the least squares problem `min ‖Aᵀ x - b‖₂`.
    ///
    /// # Errors
    /// Returns [`MatError::NotFullRank`] if `A` is rank deficient, or [`MatError::Singular`]
    /// if the condition number estimate of `L` exceeds
    /// [`CONDITION_TOLERANCE`](crate::CONDITION_TOLERANCE). `dst` is left untouched in both
    /// cases.
    #[track_caller]
    pub fn solve_to(&self, dst: &mut Dense, trans: bool, b: &dyn Matrix) -> Result<(), MatError> {
        let (work, rows) = self.solve_work(trans, b)?;
        dst.reuse_as(rows, b.dims().1);
        dst.as_mut().copy_from(work.as_ref().subrows(0, rows));
        Ok(())
    }

    /// Same as [`Lq::solve_to`], for a column vector `b`.
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert;
    use crate::{mat, mat::equal_approx, vector};
    use assert_approx_eq::assert_approx_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn minimum_norm_solution_of_a_plane() {
        let a = mat![[1.0, 1.0]];
        let mut lq = Lq::new();
        lq.factorize(&a);

        let mut x = VecDense::new();
        lq.solve_vec_to(&mut x, false, &vector![4.0]).unwrap();
        assert!(x.len() == 2);
        assert_approx_eq!(x.at_vec(0), 2.0, 1e-14);
        assert_approx_eq!(x.at_vec(1), 2.0, 1e-14);

        let mut x = VecDense::new();
        lq.solve_vec_to(&mut x, true, &vector![1.0, 3.0]).unwrap();
        assert!(x.len() == 1);
        assert_approx_eq!(x.at_vec(0), 2.0, 1e-14);
    }

    #[test]
    fn underdetermined_system() {
        let mut rng = StdRng::seed_from_u64(4);
        let a = Dense::from_fn(3, 8, |_, _| rng.gen::<f64>() - 0.5);
        let b = Dense::from_fn(3, 2, |_, _| rng.gen::<f64>());
        let mut lq = Lq::new();
        lq.factorize(&a);

        let mut x = Dense::new();
        lq.solve_to(&mut x, false, &b).unwrap();
        assert!(x.dims() == (8, 2));
        let mut ax = Dense::new();
        ax.mul(&a, &x);
        assert!(equal_approx(&ax, &b, 1e-12));

        // x = Aᵀ (A Aᵀ)⁻¹ b
        let mut aat = Dense::new();
        aat.mul(&a, &a.t());
        let mut y = Dense::new();
        y.solve(&aat, &b).unwrap();
        let mut expected = Dense::new();
        expected.mul(&a.t(), &y);
        assert!(equal_approx(&expected, &x, 1e-10));
    }

    #[test]
    fn transposed_least_squares() {
        let mut rng = StdRng::seed_from_u64(5);
        let a = Dense::from_fn(2, 6, |_, _| rng.gen::<f64>() - 0.5);
        let b = Dense::from_fn(6, 1, |_, _| rng.gen::<f64>());
        let mut lq = Lq::new();
        lq.factorize(&a);

        let mut x = Dense::new();
        lq.solve_to(&mut x, true, &b).unwrap();
        let mut res = Dense::new();
        res.mul(&a.t(), &x);
        res.sub_assign(&b);
        let mut normal = Dense::new();
        normal.mul(&a, &res);
        assert!(equal_approx(&normal, &Dense::zeros(2, 1), 1e-12));
    }

    #[test]
    fn rank_deficient_solve_is_reported() {
        let mut lq = Lq::new();
        lq.factorize(&mat![[1.0, 2.0], [0.0, 0.0]]);
        let mut x = Dense::new();
        assert!(lq.solve_to(&mut x, false, &mat![[1.0], [1.0]]) == Err(MatError::NotFullRank));
        assert!(x.is_empty());
    }
}
