use super::Cholesky;
use crate::{
    assert,
    backend::level1,
    error::MatError,
    linalg::{cond, workspace},
    GeneralMut, GeneralRef, Matrix, Side, Symmetric, TriangularRef,
};
use dyn_stack::PodStack;
use reborrow::*;

/// Computes the Cholesky factor of the symmetric matrix whose lower triangle is stored in
/// `matrix`, and stores it back in the lower triangle. The upper triangle is neither read nor
/// written.
///
/// The factor is computed one row at a time: the off-diagonal elements of row `j` are obtained
/// by forward substitution against the rows above it, then the diagonal element is the square
/// root of what remains of `A[j, j]`.
///
/// # Errors
/// Returns [`MatError::NotPositiveDefinite`] with the order of the first leading minor that is
/// not positive definite. The rows from that one on are then left partially updated.
#[track_caller]
pub fn cholesky_in_place(mut matrix: GeneralMut<'_>) -> Result<(), MatError> {
    let n = matrix.nrows();
    assert!(matrix.ncols() == n);

    for j in 0..n {
        for k in 0..j {
            let s = {
                let m = matrix.rb();
                m.read(j, k) - level1::dot(m.row(k).subvec(0, k), m.row(j).subvec(0, k))
            };
            let ljk = s / matrix.read(k, k);
            matrix.write(j, k, ljk);
        }
        let d = {
            let row = matrix.rb().row(j).subvec(0, j);
            matrix.read(j, j) - level1::dot(row, row)
        };
        if !(d > 0.0) {
            return Err(MatError::NotPositiveDefinite { minor: j + 1 });
        }
        matrix.write(j, j, d.sqrt());
    }
    Ok(())
}

/// 1-norm of the symmetric matrix whose lower triangle is stored in `a`.
pub(crate) fn sym_lower_norm_one(a: GeneralRef<'_>) -> f64 {
    let n = a.nrows();
    let mut norm = 0.0f64;
    for j in 0..n {
        let col: f64 = (0..n)
            .map(|i| if i >= j { a.read(i, j) } else { a.read(j, i) }.abs())
            .sum();
        if col.is_nan() {
            return f64::NAN;
        }
        norm = norm.max(col);
    }
    norm
}

impl Cholesky {
    #[track_caller]
    fn prepare(&mut self, n: usize) {
        self.valid = false;
        if self.chol.dim() != n || self.chol.side() != Side::Lower {
            self.chol.reset();
        }
        self.chol.reuse_as_tri(n, Side::Lower);
    }

    fn finish(&mut self) -> Result<(), MatError> {
        let n = self.chol.dim();
        let mut storage = self.chol.as_tri_mut().storage_mut();
        self.anorm = sym_lower_norm_one(storage.rb());
        if let Err(err) = cholesky_in_place(storage.rb_mut()) {
            log::trace!("cholesky: {n} × {n} matrix rejected, {err}");
            return Err(err);
        }
        self.valid = true;
        self.cond = self.compute_cond();
        log::trace!("cholesky: factorized {n} × {n} matrix, condition estimate {:e}", self.cond);
        Ok(())
    }

    /// Computes the Cholesky decomposition of the symmetric matrix `a`.
    ///
    /// # Errors
    /// Returns [`MatError::NotPositiveDefinite`] if `a` is not numerically positive definite,
    /// in which case the handle is left invalid.
    ///
    /// # Panics
    /// Panics with [`MatError::ZeroLength`](crate::MatError::ZeroLength) if `a` is empty.
    #[track_caller]
    pub fn factorize(&mut self, a: &dyn Symmetric) -> Result<(), MatError> {
        let n = a.symmetric_dim();
        self.prepare(n);
        let mut l = self.chol.as_tri_mut();
        match a.as_symmetric() {
            Some(s) => l.copy_from(TriangularRef::new(s.storage().transpose(), Side::Lower)),
            None => {
                for i in 0..n {
                    for j in 0..=i {
                        l.write(i, j, a.at(j, i));
                    }
                }
            }
        }
        self.finish()
    }

    /// Computes the Cholesky decomposition of the square matrix `a`, after checking that it is
    /// exactly symmetric.
    ///
    /// # Errors
    /// Returns [`MatError::NotSymmetric`] with the first mismatching pair, in row-major order
    /// over the upper triangle, or [`MatError::NotPositiveDefinite`]. The handle is left
    /// invalid in both cases.
    #[track_caller]
    pub fn factorize_general(&mut self, a: &dyn Matrix) -> Result<(), MatError> {
        let (n, c) = a.dims();
        assert!(n == c);
        for i in 0..n {
            for j in i + 1..n {
                if a.at(i, j) != a.at(j, i) {
                    self.valid = false;
                    return Err(MatError::NotSymmetric { row: i, col: j });
                }
            }
        }

        self.prepare(n);
        let mut l = self.chol.as_tri_mut();
        match a.as_general() {
            Some(g) => l.copy_from(TriangularRef::new(g.transpose(), Side::Lower)),
            None => {
                for i in 0..n {
                    for j in 0..=i {
                        l.write(i, j, a.at(j, i));
                    }
                }
            }
        }
        self.finish()
    }

    pub(crate) fn compute_cond(&self) -> f64 {
        let n = self.chol.dim();
        let mut mem = workspace(cond::inv_norm1_req(n));
        let inv = cond::inv_norm1(
            n,
            &mut |b| self.solve_in_place(GeneralMut::from_row_major_slice_mut(b, n, 1)),
            &mut |b| self.solve_in_place(GeneralMut::from_row_major_slice_mut(b, n, 1)),
            PodStack::new(&mut mem),
        );
        self.anorm * inv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert;
    use crate::{mat, mat::equal_approx, Dense, SymDense, SymmetricRef, TriDense};
    use assert_approx_eq::assert_approx_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_positive_definite(n: usize, rng: &mut StdRng) -> SymDense {
        let b = Dense::from_fn(n, n, |_, _| rng.gen::<f64>() - 0.5);
        let mut a = SymDense::new();
        a.sym_outer_k(1.0, &b);
        for i in 0..n {
            let d = a.at(i, i);
            a.set_sym(i, i, d + n as f64);
        }
        a
    }

    #[test]
    fn compute_llt() {
        let mut rng = StdRng::seed_from_u64(0);
        for n in [1, 2, 3, 10, 21] {
            let a = random_positive_definite(n, &mut rng);
            let mut chol = Cholesky::new();
            chol.factorize(&a).unwrap();

            let mut l = TriDense::new();
            chol.l_to(&mut l);
            let mut llt = Dense::new();
            llt.mul(&l, &l.t());
            assert!(equal_approx(&llt, &a, 1e-12));
            assert!(chol.cond().is_finite());
        }
    }

    #[test]
    fn known_factor() {
        let a = SymDense::from_vec(3, vec![4.0, 1.0, 1.0, 0.0, 2.0, 3.0, 0.0, 0.0, 6.0]);
        let mut chol = Cholesky::new();
        chol.factorize(&a).unwrap();
        let mut l = TriDense::new();
        chol.l_to(&mut l);
        let expected = [[2.0, 0.0, 0.0], [0.5, 1.3229, 0.0], [0.5, 2.0788, 1.1952]];
        for i in 0..3 {
            for j in 0..3 {
                assert_approx_eq!(l.at(i, j), expected[i][j], 1e-4);
            }
        }
    }

    #[test]
    fn only_the_upper_triangle_is_read() {
        let storage = mat![[4.0, 2.0], [f64::NAN, 5.0]];
        let mut chol = Cholesky::new();
        chol.factorize(&SymmetricRef::new(storage.as_ref(), Side::Upper)).unwrap();
        assert_approx_eq!(chol.det(), 16.0, 1e-12);
    }

    #[test]
    fn indefinite_matrix_is_rejected() {
        let a = SymDense::from_vec(3, vec![1.0, 2.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0]);
        let mut chol = Cholesky::new();
        assert!(chol.factorize(&a) == Err(MatError::NotPositiveDefinite { minor: 2 }));
        assert!(!chol.is_valid());

        let nan = SymDense::from_vec(1, vec![f64::NAN]);
        assert!(chol.factorize(&nan) == Err(MatError::NotPositiveDefinite { minor: 1 }));
    }

    #[test]
    fn general_input_must_be_symmetric() {
        let mut chol = Cholesky::new();
        let a = mat![[2.0, 1.0, 0.0], [1.0, 2.0, 1.0], [0.0, 1.5, 2.0]];
        assert!(chol.factorize_general(&a) == Err(MatError::NotSymmetric { row: 1, col: 2 }));
        assert!(!chol.is_valid());

        let a = mat![[2.0, 1.0], [1.0, 2.0]];
        chol.factorize_general(&a).unwrap();
        assert_approx_eq!(chol.det(), 3.0, 1e-12);
        chol.factorize_general(&a.t()).unwrap();
        assert_approx_eq!(chol.det(), 3.0, 1e-12);
    }

    #[test]
    fn refactorize_other_dimension() {
        let mut chol = Cholesky::new();
        chol.factorize(&SymDense::from_vec(1, vec![4.0])).unwrap();
        chol.factorize(&SymDense::from_fn(3, |i, j| if i == j { 2.0 } else { 0.0 })).unwrap();
        assert!(chol.dim() == 3);
        assert_approx_eq!(chol.det(), 8.0, 1e-12);
        assert_approx_eq!(chol.cond(), 1.0, 1e-12);
    }
}
