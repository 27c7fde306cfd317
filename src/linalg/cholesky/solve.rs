use super::Cholesky;
use crate::{
    assert,
    backend::{level3, Diag},
    error::MatError,
    linalg::cond,
    Dense, GeneralMut, Matrix, Side, SymDense, SymmetricRef, TriDense, VecDense,
};
use reborrow::*;

impl Cholesky {
    /// Overwrites `rhs` with `A⁻¹ rhs`, with no condition check.
    pub(crate) fn solve_in_place(&self, mut rhs: GeneralMut<'_>) {
        let l = self.factor();
        // L y = b, then Lᵀ x = y
        level3::trsm(l, Diag::Stored, rhs.rb_mut());
        level3::trsm(l.transpose(), Diag::Stored, rhs);
    }

    #[inline]
    fn check_cond(&self) -> Result<(), MatError> {
        if cond::is_ill_conditioned(self.cond) {
            return Err(MatError::Singular { cond: self.cond });
        }
        Ok(())
    }

    /// Solves `A x = b`, storing `x` in `dst`.
    ///
    /// Returns [`MatError::Singular`] and leaves `dst` untouched if the condition number
    /// estimate of `A` exceeds [`CONDITION_TOLERANCE`](crate::CONDITION_TOLERANCE).
    #[track_caller]
    pub fn solve_to(&self, dst: &mut Dense, b: &dyn Matrix) -> Result<(), MatError> {
        let n = self.dim();
        let (r, c) = b.dims();
        assert!(r == n);
        self.check_cond()?;

        dst.reuse_as(n, c);
        dst.as_mut().copy_from_matrix(b);
        self.solve_in_place(dst.as_mut());
        Ok(())
    }

    /// Solves `A x = b` for a column vector `b`, storing `x` in `dst`.
    #[track_caller]
    pub fn solve_vec_to(&self, dst: &mut VecDense, b: &dyn Matrix) -> Result<(), MatError> {
        let n = self.dim();
        assert!(b.dims() == (n, 1));
        self.check_cond()?;

        dst.reuse_as_vec(n);
        let mut x = dst.as_vec_mut().as_column_mut();
        x.copy_from_matrix(b);
        self.solve_in_place(x);
        Ok(())
    }

    /// Solves `A X = B`, where `B` is the matrix factorized by `b`, storing `X` in `dst`.
    #[track_caller]
    pub fn solve_chol_to(&self, dst: &mut Dense, b: &Cholesky) -> Result<(), MatError> {
        let n = self.dim();
        assert!(b.dim() == n);
        self.check_cond()?;

        // the structurally zero half of the factor storage is zero, so it can be used as a
        // general matrix
        let m = b.factor().storage();
        let mut rhs = Dense::new();
        rhs.mul(&m, &m.transpose());
        self.solve_in_place(rhs.as_mut());
        dst.reuse_as(n, n);
        dst.as_mut().copy_from(rhs.as_ref());
        Ok(())
    }

    /// Stores the inverse of the factorized matrix in `dst`.
    #[track_caller]
    pub fn inverse_to(&self, dst: &mut SymDense) -> Result<(), MatError> {
        let n = self.dim();
        self.check_cond()?;

        let mut inv = Dense::identity(n);
        self.solve_in_place(inv.as_mut());
        dst.reuse_as_sym(n);
        dst.as_sym_mut()
            .copy_from(SymmetricRef::new(inv.as_ref(), Side::Upper));
        Ok(())
    }

    /// Stores the lower triangular factor `L` in `dst`.
    #[track_caller]
    pub fn l_to(&self, dst: &mut TriDense) {
        let n = self.dim();
        dst.reuse_as_tri(n, Side::Lower);
        dst.as_tri_mut().copy_from(self.factor());
    }

    /// Stores the upper triangular factor `U = Lᵀ` in `dst`.
    #[track_caller]
    pub fn u_to(&self, dst: &mut TriDense) {
        let n = self.dim();
        dst.reuse_as_tri(n, Side::Upper);
        dst.as_tri_mut().copy_from(self.factor().transpose());
    }

    /// Stores the factorized matrix `L Lᵀ` in `dst`.
    #[track_caller]
    pub fn to_sym(&self, dst: &mut SymDense) {
        let n = self.dim();
        dst.reuse_as_sym(n);
        level3::syrk(dst.as_sym_mut(), 1.0, self.factor().storage(), 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert;
    use crate::{mat::equal_approx, vector};

    fn spd() -> SymDense {
        SymDense::from_vec(3, vec![4.0, 1.0, 1.0, 0.0, 2.0, 3.0, 0.0, 0.0, 6.0])
    }

    #[test]
    fn solve_round_trips() {
        let a = spd();
        let mut chol = Cholesky::new();
        chol.factorize(&a).unwrap();

        let b = vector![1.0, 2.0, 3.0];
        let mut x = VecDense::new();
        chol.solve_vec_to(&mut x, &b).unwrap();
        let mut ax = VecDense::new();
        ax.mul_vec(&a, &x);
        assert!(equal_approx(&ax, &b, 1e-12));

        let b = Dense::from_fn(3, 2, |i, j| (i + 3 * j) as f64);
        let mut x = Dense::new();
        chol.solve_to(&mut x, &b).unwrap();
        let mut ax = Dense::new();
        ax.mul(&a, &x);
        assert!(equal_approx(&ax, &b, 1e-12));
    }

    #[test]
    fn factors_and_reconstruction() {
        let a = spd();
        let mut chol = Cholesky::new();
        chol.factorize(&a).unwrap();

        let mut l = TriDense::new();
        let mut u = TriDense::new();
        chol.l_to(&mut l);
        chol.u_to(&mut u);
        assert!(u.side() == Side::Upper);
        assert!(crate::mat::equal(&u, &l.t()));

        let mut s = SymDense::new();
        chol.to_sym(&mut s);
        assert!(equal_approx(&s, &a, 1e-12));
    }

    #[test]
    fn inverse() {
        let a = spd();
        let mut chol = Cholesky::new();
        chol.factorize(&a).unwrap();
        let mut inv = SymDense::new();
        chol.inverse_to(&mut inv).unwrap();
        let mut prod = Dense::new();
        prod.mul(&a, &inv);
        assert!(equal_approx(&prod, &Dense::identity(3), 1e-12));
    }

    #[test]
    fn solve_with_factorized_rhs() {
        let a = spd();
        let b = SymDense::from_fn(3, |i, j| if i == j { 3.0 } else { 1.0 });
        let mut ca = Cholesky::new();
        let mut cb = Cholesky::new();
        ca.factorize(&a).unwrap();
        cb.factorize(&b).unwrap();

        let mut x = Dense::new();
        ca.solve_chol_to(&mut x, &cb).unwrap();
        let mut ax = Dense::new();
        ax.mul(&a, &x);
        assert!(equal_approx(&ax, &b, 1e-12));
    }

    #[test]
    fn ill_conditioned_solve_is_reported() {
        let a = SymDense::from_vec(2, vec![1.0, 0.0, 0.0, 1e-20]);
        let mut chol = Cholesky::new();
        chol.factorize(&a).unwrap();
        assert!(chol.cond() > 1e19);
        let mut x = Dense::new();
        assert!(matches!(
            chol.solve_to(&mut x, &Dense::identity(2)),
            Err(MatError::Singular { .. })
        ));
        assert!(x.is_empty());
    }
}
