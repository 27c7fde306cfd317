//! Householder reflections.
//!
//! A Householder reflection is a linear transformation that describes a reflection about a
//! hyperplane that crosses the origin of the space. Given a vector $v$ with $v_0 \neq 0$, the
//! reflection used here is
//! $$H = I - \frac{vv^\top}{v_0},$$
//! which is orthogonal when $v$ is normalized so that $\|v\|^2 = 2 v_0$, as produced by
//! [`make_householder_in_place`].
//!
//! A Householder sequence $H_0 H_1 \dots H_{r-1}$ is stored as a basis matrix whose column $k$
//! holds $v_k$ in rows $k..$; the upper part of the basis is ignored. The QR decomposition
//! stores its basis below the diagonal of the factorized matrix, while the LQ decomposition stores
//! it to the right of the diagonal, so it passes a transposed view.

use super::{temp_vec_req, temp_vec_zeroed};
use crate::{
    assert,
    backend::{level1, level2},
    GeneralMut, GeneralRef, VectorMut, VectorRef,
};
use dyn_stack::{PodStack, SizeOverflow, StackReq};
use reborrow::*;

/// Euclidean norm of `x` accumulated with [`f64::hypot`], which avoids intermediate overflow and
/// underflow.
#[inline]
pub fn hypot_norm(x: VectorRef<'_>) -> f64 {
    x.iter().fold(0.0, f64::hypot)
}

/// Overwrites `v` with the vector of the reflection mapping it to a multiple of the first unit
/// vector, and returns that multiple.
///
/// The sign of the reflected value is chosen opposite to the sign of `v[0]`, so that no
/// cancellation happens when forming the vector. If `v` is zero, it is left untouched and `0.0`
/// is returned.
pub fn make_householder_in_place(mut v: VectorMut<'_>) -> f64 {
    if v.is_empty() {
        return 0.0;
    }
    let mut nrm = hypot_norm(v.rb());
    if nrm == 0.0 {
        return 0.0;
    }
    if v.read(0) < 0.0 {
        nrm = -nrm;
    }
    level1::scal(1.0 / nrm, v.rb_mut());
    let head = v.read(0);
    v.write(0, head + 1.0);
    -nrm
}

/// Applies the reflection of `v` to `x` in place, `x ← (I - v vᵀ / v₀) x`.
#[track_caller]
pub fn apply_householder(v: VectorRef<'_>, x: VectorMut<'_>) {
    assert!(v.len() == x.len());
    let head = v.read(0);
    let s = -level1::dot(v, x.rb()) / head;
    level1::axpy(s, v, x);
}

/// Returns the stack requirements of the sequence application routines, for a right hand side
/// with `ncols` columns.
pub fn apply_householder_sequence_req(ncols: usize) -> Result<StackReq, SizeOverflow> {
    temp_vec_req(ncols)
}

fn apply_one(basis: GeneralRef<'_>, k: usize, x: GeneralMut<'_>, mut w: VectorMut<'_>) {
    let m = basis.nrows();
    let v = basis.col(k).subvec(k, m - k);
    let head = v.read(0);
    if head == 0.0 {
        return;
    }
    let x = x.subrows_mut(k, m - k);
    // w = xᵀ v, x -= v wᵀ / v₀
    level2::gemv(w.rb_mut(), 1.0, x.rb().transpose(), v, 0.0);
    level2::ger(x, -1.0 / head, v, w.rb());
}

/// Computes `x ← H_0 H_1 ⋯ H_{r-1} x`, where `r` is the number of columns of `basis`.
#[track_caller]
pub fn apply_householder_sequence_on_the_left_in_place(
    basis: GeneralRef<'_>,
    mut x: GeneralMut<'_>,
    stack: PodStack<'_>,
) {
    assert!(all(basis.nrows() == x.nrows(), basis.ncols() <= basis.nrows()));
    let (mut w, _) = temp_vec_zeroed(x.ncols(), stack);
    for k in (0..basis.ncols()).rev() {
        apply_one(basis, k, x.rb_mut(), w.rb_mut());
    }
}

/// Computes `x ← (H_0 H_1 ⋯ H_{r-1})ᵀ x`, where `r` is the number of columns of `basis`.
#[track_caller]
pub fn apply_householder_sequence_transpose_on_the_left_in_place(
    basis: GeneralRef<'_>,
    mut x: GeneralMut<'_>,
    stack: PodStack<'_>,
) {
    assert!(all(basis.nrows() == x.nrows(), basis.ncols() <= basis.nrows()));
    let (mut w, _) = temp_vec_zeroed(x.ncols(), stack);
    for k in 0..basis.ncols() {
        apply_one(basis, k, x.rb_mut(), w.rb_mut());
    }
}
