use super::Lu;
use crate::{
    assert,
    error::MatError,
    linalg::{cond, swap_rows, triangular_solve::*},
    Dense, GeneralMut, Matrix, VecDense,
};
use reborrow::*;

impl Lu {
    /// Overwrites `rhs` with `A⁻¹ rhs`, or `A⁻ᵀ rhs` if `trans` is set, with no condition check.
    pub(crate) fn solve_in_place(&self, mut rhs: GeneralMut<'_>, trans: bool) {
        let lu = self.lu.as_ref();
        if !trans {
            // A = Pᵀ L U, so x = U⁻¹ L⁻¹ P b
            for (k, &p) in self.pivots.iter().enumerate() {
                swap_rows(rhs.rb_mut(), k, p);
            }
            solve_unit_lower_triangular_in_place(lu, rhs.rb_mut());
            solve_upper_triangular_in_place(lu, rhs);
        } else {
            // Aᵀ = Uᵀ Lᵀ P, so x = Pᵀ L⁻ᵀ U⁻ᵀ b
            solve_lower_triangular_in_place(lu.transpose(), rhs.rb_mut());
            solve_unit_upper_triangular_in_place(lu.transpose(), rhs.rb_mut());
            for (k, &p) in self.pivots.iter().enumerate().rev() {
                swap_rows(rhs.rb_mut(), k, p);
            }
        }
    }

    #[inline]
    fn check_cond(&self) -> Result<(), MatError> {
        if cond::is_ill_conditioned(self.cond) {
            return Err(MatError::Singular { cond: self.cond });
        }
        Ok(())
    }

    /// Solves `A x = b`, or `Aᵀ x = b` if `trans` is set, storing `x` in `dst`.
    ///
    /// Returns [`MatError::Singular`] and leaves `dst` untouched if the condition number
    /// estimate of `A` exceeds [`CONDITION_TOLERANCE`](crate::CONDITION_TOLERANCE).
    ///
    /// # Panics
    /// Panics if the handle is invalid, or if `b` does not have as many rows as `A`.
    #[track_caller]
    pub fn solve_to(&self, dst: &mut Dense, trans: bool, b: &dyn Matrix) -> Result<(), MatError> {
        let n = self.dim();
        let (r, c) = b.dims();
        assert!(r == n);
        self.check_cond()?;

        dst.reuse_as(n, c);
        dst.as_mut().copy_from_matrix(b);
        self.solve_in_place(dst.as_mut(), trans);
        Ok(())
    }

    /// Solves `A x = b`, or `Aᵀ x = b` if `trans` is set, for a column vector `b`, storing `x`
    /// in `dst`.
    ///
    /// Returns [`MatError::Singular`] and leaves `dst` untouched if the condition number
    /// estimate of `A` exceeds [`CONDITION_TOLERANCE`](crate::CONDITION_TOLERANCE).
    #[track_caller]
    pub fn solve_vec_to(&self, dst: &mut VecDense, trans: bool, b: &dyn Matrix) -> Result<(), MatError> {
        let n = self.dim();
        assert!(b.dims() == (n, 1));
        self.check_cond()?;

        dst.reuse_as_vec(n);
        let mut x = dst.as_vec_mut().as_column_mut();
        x.copy_from_matrix(b);
        self.solve_in_place(x, trans);
        Ok(())
    }
}
