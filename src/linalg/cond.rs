//! 1-norm condition number estimation.
//!
//! The norm of the inverse is estimated with Hager's method as refined by Higham, which only
//! needs solves with the matrix and its transpose, so it runs on top of an existing
//! factorization in `O(n²)` per iteration.

use super::temp_vec_req;
use crate::{
    backend::{level2, Diag},
    Side, TriangularRef, VectorMut,
};
use dyn_stack::{PodStack, SizeOverflow, StackReq};

const MAX_ITER: usize = 5;

/// Returns the stack requirements of [`inv_norm1`].
pub(crate) fn inv_norm1_req(n: usize) -> Result<StackReq, SizeOverflow> {
    StackReq::try_all_of([temp_vec_req(n)?, temp_vec_req(n)?, temp_vec_req(n)?])
}

#[inline]
fn sign(x: f64) -> f64 {
    if x >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

fn l1(x: &[f64]) -> f64 {
    x.iter().map(|v| v.abs()).sum()
}

fn argmax_abs(x: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in x.iter().enumerate() {
        if v.abs() > x[best].abs() {
            best = i;
        }
    }
    best
}

/// Estimates `‖A⁻¹‖₁` for an `n × n` matrix `A`, given `solve`, which overwrites its argument
/// `b` with `A⁻¹ b`, and `solve_t`, which does the same with `A⁻ᵀ`.
///
/// The estimate is a lower bound that is exact in most cases. `NaN` or infinite solves
/// propagate into the result.
pub(crate) fn inv_norm1(
    n: usize,
    solve: &mut dyn FnMut(&mut [f64]),
    solve_t: &mut dyn FnMut(&mut [f64]),
    stack: PodStack<'_>,
) -> f64 {
    if n == 0 {
        return 0.0;
    }
    let (x, stack) = stack.make_raw::<f64>(n);
    let (xi, stack) = stack.make_raw::<f64>(n);
    let (z, _) = stack.make_raw::<f64>(n);

    x.fill(1.0 / n as f64);
    solve(x);
    let mut est = l1(x);
    if n == 1 || !est.is_finite() {
        return est;
    }

    for (s, v) in xi.iter_mut().zip(x.iter()) {
        *s = sign(*v);
    }
    z.copy_from_slice(xi);
    solve_t(z);
    let mut j = argmax_abs(z);

    for _ in 1..MAX_ITER {
        x.fill(0.0);
        x[j] = 1.0;
        solve(x);
        let prev = est;
        est = l1(x);
        if !est.is_finite() {
            return est;
        }

        let repeated = x.iter().zip(xi.iter()).all(|(v, s)| sign(*v) == *s);
        if repeated || est <= prev {
            est = f64::max(est, prev);
            break;
        }
        for (s, v) in xi.iter_mut().zip(x.iter()) {
            *s = sign(*v);
        }
        z.copy_from_slice(xi);
        solve_t(z);
        let last = j;
        j = argmax_abs(z);
        if z[last].abs() == z[j].abs() {
            break;
        }
    }

    // alternative estimate guarding against the cases where the iteration is misled
    let mut alt = 1.0;
    for (i, v) in x.iter_mut().enumerate() {
        *v = alt * (1.0 + i as f64 / (n - 1) as f64);
        alt = -alt;
    }
    solve(x);
    f64::max(est, 2.0 * l1(x) / (3.0 * n as f64))
}

/// 1-norm of a triangular matrix, reading only its stored side.
pub(crate) fn tri_norm1(t: TriangularRef<'_>, diag: Diag<'_>) -> f64 {
    let n = t.dim();
    let s = t.storage();
    let mut norm = 0.0f64;
    for j in 0..n {
        let (start, end) = match t.side() {
            Side::Upper => (0, j),
            Side::Lower => (j + 1, n),
        };
        let mut col = diag.get(s, j).abs();
        for i in start..end {
            col += unsafe { s.read_unchecked(i, j) }.abs();
        }
        if col.is_nan() {
            return f64::NAN;
        }
        norm = norm.max(col);
    }
    norm
}

/// Estimates the 1-norm condition number of a triangular matrix.
///
/// Returns infinity when a diagonal element is zero.
pub(crate) fn tri_cond(t: TriangularRef<'_>, diag: Diag<'_>) -> f64 {
    let n = t.dim();
    let s = t.storage();
    if (0..n).any(|k| diag.get(s, k) == 0.0) {
        return f64::INFINITY;
    }
    let anorm = tri_norm1(t, diag);
    let mut mem = super::workspace(inv_norm1_req(n));
    let inv = inv_norm1(
        n,
        &mut |b| level2::trsv(t, diag, VectorMut::from_slice_mut(b)),
        &mut |b| level2::trsv(t.transpose(), diag, VectorMut::from_slice_mut(b)),
        PodStack::new(&mut mem),
    );
    anorm * inv
}

/// Returns `true` if a solve with the given condition estimate must be rejected.
#[inline]
pub(crate) fn is_ill_conditioned(cond: f64) -> bool {
    !(cond <= crate::CONDITION_TOLERANCE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert;
    use crate::{linalg::workspace, TriDense};
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn diagonal_condition_is_exact() {
        let t = TriDense::from_vec(3, Side::Upper, vec![4.0, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 2.0]);
        assert_approx_eq!(tri_cond(t.as_tri_ref(), Diag::Stored), 8.0);
    }

    #[test]
    fn inverse_norm_of_small_matrix() {
        // A = [[1, 2], [0, 1]], A⁻¹ = [[1, -2], [0, 1]], ‖A⁻¹‖₁ = 3
        let t = TriDense::from_vec(2, Side::Upper, vec![1.0, 2.0, 0.0, 1.0]);
        let tri = t.as_tri_ref();
        let mut mem = workspace(inv_norm1_req(2));
        let est = inv_norm1(
            2,
            &mut |b| level2::trsv(tri, Diag::Stored, VectorMut::from_slice_mut(b)),
            &mut |b| level2::trsv(tri.transpose(), Diag::Stored, VectorMut::from_slice_mut(b)),
            PodStack::new(&mut mem),
        );
        assert_approx_eq!(est, 3.0);
        assert_approx_eq!(tri_norm1(tri, Diag::Stored), 3.0);
        assert_approx_eq!(tri_norm1(tri.transpose(), Diag::Unit), 3.0);
    }

    #[test]
    fn singular_triangle() {
        let t = TriDense::from_vec(2, Side::Lower, vec![1.0, 0.0, 3.0, 0.0]);
        assert!(tri_cond(t.as_tri_ref(), Diag::Stored).is_infinite());
        assert!(is_ill_conditioned(f64::NAN));
        assert!(is_ill_conditioned(f64::INFINITY));
        assert!(!is_ill_conditioned(1e3));
    }
}
