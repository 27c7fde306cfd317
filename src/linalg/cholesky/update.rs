use super::{compute::sym_lower_norm_one, Cholesky};
use crate::{
    assert,
    error::MatError,
    GeneralMut, Matrix, SymDense, VectorMut,
};

/// Overwrites the Cholesky factor stored in the lower triangle of `l` with the factor of
/// `L Lᵀ + alpha w wᵀ`. `w` is used as scratch space and clobbered.
///
/// # Errors
/// Returns [`MatError::NotPositiveDefinite`] if the updated matrix is not numerically
/// positive definite, which can only happen for a negative `alpha`. `l` is then left
/// partially updated.
#[track_caller]
pub fn rank_one_update_clobber(
    mut l: GeneralMut<'_>,
    mut w: VectorMut<'_>,
    mut alpha: f64,
) -> Result<(), MatError> {
    let n = l.nrows();
    assert!(all(l.ncols() == n, w.len() == n));

    for j in 0..n {
        let ljj = l.read(j, j);
        let wj = w.read(j);
        let alpha_wj = alpha * wj;

        let sqr_nljj = ljj * ljj + alpha_wj * wj;
        if !(sqr_nljj > 0.0) {
            return Err(MatError::NotPositiveDefinite { minor: j + 1 });
        }
        let nljj = sqr_nljj.sqrt();
        let neg_wj_over_ljj = -wj / ljj;
        let nljj_over_ljj = nljj / ljj;
        let alpha_wj_over_nljj = alpha_wj / nljj;
        alpha -= alpha_wj_over_nljj * alpha_wj_over_nljj;

        l.write(j, j, nljj);
        for i in j + 1..n {
            let lij = l.read(i, j);
            let wi = w.read(i) + neg_wj_over_ljj * lij;
            w.write(i, wi);
            l.write(i, j, alpha_wj_over_nljj * wi + nljj_over_ljj * lij);
        }
    }
    Ok(())
}

impl Cholesky {
    /// Updates the decomposition of `A` into the decomposition of `A + alpha x xᵀ`, in `O(n²)`.
    ///
    /// # Errors
    /// Returns [`MatError::NotPositiveDefinite`] if the updated matrix is not numerically
    /// positive definite, in which case the handle is left unchanged.
    #[track_caller]
    pub fn sym_rank_one(&mut self, alpha: f64, x: &dyn Matrix) -> Result<(), MatError> {
        let n = self.dim();
        assert!(x.dims() == (n, 1));

        let mut w: Vec<f64> = (0..n).map(|i| x.at(i, 0)).collect();
        let mut updated = self.chol.clone();
        rank_one_update_clobber(
            updated.as_tri_mut().storage_mut(),
            VectorMut::from_slice_mut(&mut w),
            alpha,
        )?;
        self.chol = updated;

        let mut a = SymDense::new();
        self.to_sym(&mut a);
        self.anorm = sym_lower_norm_one(a.as_sym_ref().storage().transpose());
        self.cond = self.compute_cond();
        Ok(())
    }
}
