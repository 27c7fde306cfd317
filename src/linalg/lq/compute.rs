use super::Lq;
use crate::{
    assert,
    linalg::{cond, qr::compute::qr_in_place},
    Matrix,
};

impl Lq {
    /// Computes the LQ decomposition of `a`.
    ///
    /// The decomposition is computed even when `a` is rank deficient; [`Lq::is_full_rank`] then
    /// returns `false` and solves report [`MatError::NotFullRank`](crate::MatError::NotFullRank).
    ///
    /// # Panics
    /// Panics if `a` has more rows than columns.
    #[track_caller]
    pub fn factorize(&mut self, a: &dyn Matrix) {
        let (m, n) = a.dims();
        assert!(m <= n);
        self.valid = false;

        if self.lq.dims() != (m, n) {
            self.lq.reset();
        }
        self.lq.reuse_as(m, n);
        self.lq.as_mut().copy_from_matrix(a);
        self.ldiag.resize(m, 0.0);
        // the reflections of the rows of A are those of the columns of Aᵀ
        qr_in_place(self.lq.as_mut().transpose_mut(), &mut self.ldiag);
        self.valid = true;

        let (l, diag) = self.l_factor();
        self.cond = cond::tri_cond(l, diag);
        log::trace!("lq: factorized {m} × {n} matrix, condition estimate {:e}", self.cond);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert;
    use crate::{mat, mat::equal_approx, Dense};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn compute_lq() {
        let mut rng = StdRng::seed_from_u64(0);
        for (m, n) in [(1, 1), (2, 5), (4, 4), (9, 17)] {
            let a = Dense::from_fn(m, n, |_, _| rng.gen::<f64>() - 0.5);
            let mut lq = Lq::new();
            lq.factorize(&a);

            let mut l = Dense::new();
            let mut q = Dense::new();
            lq.l_to(&mut l);
            lq.q_to(&mut q);

            let mut prod = Dense::new();
            prod.mul(&l, &q);
            assert!(equal_approx(&prod, &a, 1e-12));

            let mut qqt = Dense::new();
            qqt.mul(&q, &q.t());
            assert!(equal_approx(&qqt, &Dense::identity(n), 1e-12));
        }
    }

    #[test]
    fn rank_deficient_matrix() {
        let mut lq = Lq::new();
        lq.factorize(&mat![[1.0, 2.0, 3.0], [0.0, 0.0, 0.0]]);
        assert!(!lq.is_full_rank());
        assert!(lq.cond().is_infinite());
    }
}
