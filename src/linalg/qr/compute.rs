use super::Qr;
use crate::{
    assert,
    linalg::{
        cond,
        householder::{apply_householder, make_householder_in_place},
    },
    GeneralMut, Matrix,
};
use reborrow::*;

/// Computes the Householder QR decomposition of the `m × n` matrix `matrix`, with `m >= n`, in
/// place.
///
/// On exit, column `k` holds the Householder vector of step `k` in rows `k..`, the strictly
/// upper triangle holds the strictly upper part of `R`, and `rdiag` holds its diagonal. A zero
/// column at step `k` is skipped, leaving a zero on the diagonal of `R` and a zero Householder
/// vector, which stands for the identity.
///
/// The LQ decomposition runs the same routine on a transposed view.
#[track_caller]
pub fn qr_in_place(mut matrix: GeneralMut<'_>, rdiag: &mut [f64]) {
    let (m, n) = matrix.shape();
    assert!(all(m >= n, rdiag.len() == n));

    for (k, d) in rdiag.iter_mut().enumerate() {
        *d = make_householder_in_place(matrix.rb_mut().col_mut(k).subvec_mut(k, m - k));
        if *d == 0.0 {
            continue;
        }
        let (left, mut right) = matrix.rb_mut().split_at_col_mut(k + 1);
        let v = left.rb().col(k).subvec(k, m - k);
        for j in 0..right.ncols() {
            apply_householder(v, right.rb_mut().col_mut(j).subvec_mut(k, m - k));
        }
    }
}

impl Qr {
    /// Computes the QR decomposition of `a`.
    ///
    /// The decomposition is computed even when `a` is rank deficient; [`Qr::is_full_rank`] then
    /// returns `false` and solves report [`MatError::NotFullRank`](crate::MatError::NotFullRank).
    ///
    /// # Panics
    /// Panics if `a` has fewer rows than columns.
    #[track_caller]
    pub fn factorize(&mut self, a: &dyn Matrix) {
        let (m, n) = a.dims();
        assert!(m >= n);
        self.valid = false;

        if self.qr.dims() != (m, n) {
            self.qr.reset();
        }
        self.qr.reuse_as(m, n);
        self.qr.as_mut().copy_from_matrix(a);
        self.rdiag.resize(n, 0.0);
        qr_in_place(self.qr.as_mut(), &mut self.rdiag);
        self.valid = true;

        let (r, diag) = self.r_factor();
        self.cond = cond::tri_cond(r, diag);
        log::trace!("qr: factorized {m} × {n} matrix, condition estimate {:e}", self.cond);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert, mat, mat::equal_approx, Dense};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn compute_qr() {
        let mut rng = StdRng::seed_from_u64(0);
        for (m, n) in [(1, 1), (3, 3), (5, 2), (17, 9), (8, 8)] {
            let a = Dense::from_fn(m, n, |_, _| rng.gen::<f64>() - 0.5);
            let mut qr = Qr::new();
            qr.factorize(&a);

            let mut q = Dense::new();
            let mut r = Dense::new();
            qr.q_to(&mut q);
            qr.r_to(&mut r);

            let mut prod = Dense::new();
            prod.mul(&q, &r);
            assert!(equal_approx(&prod, &a, 1e-12));

            let mut qtq = Dense::new();
            qtq.mul(&q.t(), &q);
            assert!(equal_approx(&qtq, &Dense::identity(m), 1e-12));
            assert!(qr.cond().is_finite());
        }
    }

    #[test]
    fn rank_deficient_matrix() {
        let a = mat![[1.0, 0.0, 2.0], [2.0, 0.0, 1.0], [3.0, 0.0, 0.0], [4.0, 0.0, 1.0]];
        let mut qr = Qr::new();
        qr.factorize(&a);
        assert!(!qr.is_full_rank());
        assert!(qr.cond().is_infinite());

        // the reflections skipped for the zero column still reproduce the input
        let mut q = Dense::new();
        let mut r = Dense::new();
        qr.q_to(&mut q);
        qr.r_to(&mut r);
        let mut prod = Dense::new();
        prod.mul(&q, &r);
        assert!(equal_approx(&prod, &a, 1e-12));
    }

    #[test]
    fn refactorize_reuses_handle() {
        let mut qr = Qr::new();
        qr.factorize(&mat![[1.0], [1.0]]);
        qr.factorize(&mat![[2.0, 0.0], [0.0, 3.0], [0.0, 0.0]]);
        assert!(qr.dims() == (3, 2));
        assert!(qr.is_full_rank());
    }
}
