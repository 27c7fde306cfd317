//! Triangular solves on general storage.
//!
//! These read only the relevant triangle of `triangular`, so the packed factors of an LU or
//! QR decomposition can be passed directly, and write the solution over `rhs`.

use super::cond;
use crate::{
    assert,
    backend::{level3, Diag},
    error::MatError,
    GeneralMut, GeneralRef, Side, TriDense, Triangular, TriangularRef,
};

/// Solves `L x = rhs` in place, where `L` is the lower triangle of `triangular`.
#[track_caller]
pub fn solve_lower_triangular_in_place(triangular: GeneralRef<'_>, rhs: GeneralMut<'_>) {
    level3::trsm(TriangularRef::new(triangular, Side::Lower), Diag::Stored, rhs)
}

/// Solves `L x = rhs` in place, where `L` is the lower triangle of `triangular` with an implicit
/// unit diagonal.
#[track_caller]
pub fn solve_unit_lower_triangular_in_place(triangular: GeneralRef<'_>, rhs: GeneralMut<'_>) {
    level3::trsm(TriangularRef::new(triangular, Side::Lower), Diag::Unit, rhs)
}

/// Solves `U x = rhs` in place, where `U` is the upper triangle of `triangular`.
#[track_caller]
pub fn solve_upper_triangular_in_place(triangular: GeneralRef<'_>, rhs: GeneralMut<'_>) {
    level3::trsm(TriangularRef::new(triangular, Side::Upper), Diag::Stored, rhs)
}

/// Solves `U x = rhs` in place, where `U` is the upper triangle of `triangular` with an implicit
/// unit diagonal.
#[track_caller]
pub fn solve_unit_upper_triangular_in_place(triangular: GeneralRef<'_>, rhs: GeneralMut<'_>) {
    level3::trsm(TriangularRef::new(triangular, Side::Upper), Diag::Unit, rhs)
}

impl TriDense {
    /// Sets the receiver to the inverse of the triangular matrix `a`.
    ///
    /// Returns [`MatError::Singular`] and leaves the receiver untouched if `a` is singular or its
    /// condition number exceeds [`CONDITION_TOLERANCE`](crate::CONDITION_TOLERANCE).
    #[track_caller]
    pub fn inverse_tri(&mut self, a: &dyn Triangular) -> Result<(), MatError> {
        let (n, side) = a.triangle();
        assert!(n > 0);
        let owned;
        let tri = match a.as_triangular() {
            Some(t) => t,
            None => {
                owned = TriDense::from_fn(n, side, |i, j| a.at(i, j));
                owned.as_tri_ref()
            }
        };
        let cond = cond::tri_cond(tri, Diag::Stored);
        if cond::is_ill_conditioned(cond) {
            return Err(MatError::Singular { cond });
        }

        let mut inv = crate::Dense::identity(n);
        level3::trsm(tri, Diag::Stored, inv.as_mut());
        self.reuse_as_tri(n, side);
        // the inverse is triangular on the same side, the other half of `inv` is zero
        self.as_tri_mut().copy_from(TriangularRef::new(inv.as_ref(), side));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert;
    use crate::{mat, Dense, Matrix};

    #[test]
    fn packed_factors() {
        // lower triangle: [[2, 0], [1, 4]], upper triangle: [[2, 3], [0, 4]]
        let packed = mat![[2.0, 3.0], [1.0, 4.0]];
        let mut x = mat![[2.0], [9.0]];
        solve_lower_triangular_in_place(packed.as_ref(), x.as_mut());
        assert!(x == mat![[1.0], [2.0]]);

        let mut x = mat![[2.0], [9.0]];
        solve_unit_lower_triangular_in_place(packed.as_ref(), x.as_mut());
        assert!(x == mat![[2.0], [7.0]]);

        let mut x = mat![[8.0], [8.0]];
        solve_upper_triangular_in_place(packed.as_ref(), x.as_mut());
        assert!(x == mat![[1.0], [2.0]]);

        let mut x = mat![[8.0], [2.0]];
        solve_unit_upper_triangular_in_place(packed.as_ref(), x.as_mut());
        assert!(x == mat![[2.0], [2.0]]);
    }

    #[test]
    fn inverse_of_triangular() {
        let t = TriDense::from_vec(3, Side::Upper, vec![2.0, 1.0, 0.0, 0.0, 4.0, -1.0, 0.0, 0.0, 0.5]);
        let mut inv = TriDense::new();
        inv.inverse_tri(&t).unwrap();
        assert!(inv.side() == Side::Upper);

        let mut prod = Dense::new();
        prod.mul(&t, &inv);
        assert!(crate::mat::equal_approx(&prod, &Dense::identity(3), 1e-14));
    }

    #[test]
    fn singular_triangular_inverse() {
        let t = TriDense::from_vec(2, Side::Lower, vec![1.0, 0.0, 5.0, 0.0]);
        let mut inv = TriDense::new();
        assert!(matches!(inv.inverse_tri(&t), Err(MatError::Singular { .. })));
        assert!(inv.is_empty());
        assert!(t.dims() == (2, 2));
    }
}
