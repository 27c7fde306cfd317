//! Matrix-vector kernels.
//!
//! Matrices are read through their strides, so transposed views are handled by passing
//! `a.transpose()`. Symmetric kernels only touch the upper triangle of their storage.

use super::{level1, Diag};
use crate::{assert, GeneralMut, GeneralRef, SymmetricMut, SymmetricRef, TriangularRef, VectorMut, VectorRef};
use reborrow::*;

/// `y = alpha * a * x + beta * y`. With `beta == 0.0` the previous contents of `y` are not
/// read.
#[track_caller]
pub fn gemv(mut y: VectorMut<'_>, alpha: f64, a: GeneralRef<'_>, x: VectorRef<'_>, beta: f64) {
    let (m, n) = a.shape();
    assert!(all(x.len() == n, y.len() == m));
    if a.is_row_major() {
        for i in 0..m {
            let v = alpha * level1::dot(a.row(i), x);
            let prev = if beta == 0.0 { 0.0 } else { beta * unsafe { y.read_unchecked(i) } };
            unsafe { y.write_unchecked(i, prev + v) };
        }
    } else {
        if beta == 0.0 {
            y.fill(0.0);
        } else if beta != 1.0 {
            level1::scal(beta, y.rb_mut());
        }
        for j in 0..n {
            level1::axpy(alpha * unsafe { x.read_unchecked(j) }, a.col(j), y.rb_mut());
        }
    }
}

/// `a += alpha * x * yᵀ`.
#[track_caller]
pub fn ger(mut a: GeneralMut<'_>, alpha: f64, x: VectorRef<'_>, y: VectorRef<'_>) {
    let (m, n) = a.shape();
    assert!(all(x.len() == m, y.len() == n));
    if alpha == 0.0 {
        return;
    }
    for i in 0..m {
        level1::axpy(alpha * unsafe { x.read_unchecked(i) }, y, a.rb_mut().row_mut(i));
    }
}

/// `a += alpha * x * xᵀ` on the upper triangle of `a`.
#[track_caller]
pub fn syr(a: SymmetricMut<'_>, alpha: f64, x: VectorRef<'_>) {
    let n = a.dim();
    assert!(x.len() == n);
    if alpha == 0.0 {
        return;
    }
    let mut s = a.storage_mut();
    for i in 0..n {
        let xi = unsafe { x.read_unchecked(i) };
        level1::axpy(
            alpha * xi,
            x.subvec(i, n - i),
            s.rb_mut().row_mut(i).subvec_mut(i, n - i),
        );
    }
}

/// `a += alpha * (x * yᵀ + y * xᵀ)` on the upper triangle of `a`.
#[track_caller]
pub fn syr2(a: SymmetricMut<'_>, alpha: f64, x: VectorRef<'_>, y: VectorRef<'_>) {
    let n = a.dim();
    assert!(all(x.len() == n, y.len() == n));
    if alpha == 0.0 {
        return;
    }
    let mut s = a.storage_mut();
    for i in 0..n {
        let (xi, yi) = unsafe { (x.read_unchecked(i), y.read_unchecked(i)) };
        let mut row = s.rb_mut().row_mut(i).subvec_mut(i, n - i);
        level1::axpy(alpha * xi, y.subvec(i, n - i), row.rb_mut());
        level1::axpy(alpha * yi, x.subvec(i, n - i), row.rb_mut());
    }
}

/// `y = alpha * a * x + beta * y` for a symmetric `a`.
#[track_caller]
pub fn symv(mut y: VectorMut<'_>, alpha: f64, a: SymmetricRef<'_>, x: VectorRef<'_>, beta: f64) {
    let n = a.dim();
    assert!(all(x.len() == n, y.len() == n));
    if beta == 0.0 {
        y.fill(0.0);
    } else if beta != 1.0 {
        level1::scal(beta, y.rb_mut());
    }
    let s = a.storage();
    for i in 0..n {
        let upper = s.row(i).subvec(i, n - i);
        // diagonal and right of it contribute to y[i], strictly right of it to y[i+1..]
        let dot = level1::dot(upper, x.subvec(i, n - i));
        unsafe { y.write_unchecked(i, y.read_unchecked(i) + alpha * dot) };
        if i + 1 < n {
            let xi = unsafe { x.read_unchecked(i) };
            level1::axpy(
                alpha * xi,
                upper.subvec(1, n - i - 1),
                y.rb_mut().subvec_mut(i + 1, n - i - 1),
            );
        }
    }
}

/// `x = a * x` for a triangular `a`. When `unit_diag` is set, the diagonal of `a` is assumed to
/// be one and is not read.
#[track_caller]
pub fn trmv(a: TriangularRef<'_>, unit_diag: bool, mut x: VectorMut<'_>) {
    let n = a.dim();
    assert!(x.len() == n);
    let s = a.storage();
    match a.side() {
        crate::Side::Upper => {
            // row i only reads x[i..], which has not been overwritten yet
            for i in 0..n {
                let diag = if unit_diag { 1.0 } else { unsafe { s.read_unchecked(i, i) } };
                let mut v = diag * unsafe { x.read_unchecked(i) };
                if i + 1 < n {
                    v += level1::dot(s.row(i).subvec(i + 1, n - i - 1), x.rb().subvec(i + 1, n - i - 1));
                }
                unsafe { x.write_unchecked(i, v) };
            }
        }
        crate::Side::Lower => {
            for i in (0..n).rev() {
                let diag = if unit_diag { 1.0 } else { unsafe { s.read_unchecked(i, i) } };
                let v = diag * unsafe { x.read_unchecked(i) }
                    + level1::dot(s.row(i).subvec(0, i), x.rb().subvec(0, i));
                unsafe { x.write_unchecked(i, v) };
            }
        }
    }
}

/// Solves `a * x = b` in place, where `x` holds `b` on entry, for a triangular `a`.
#[track_caller]
pub fn trsv(a: TriangularRef<'_>, diag: Diag<'_>, mut x: VectorMut<'_>) {
    let n = a.dim();
    assert!(x.len() == n);
    let s = a.storage();
    match a.side() {
        crate::Side::Upper => {
            for i in (0..n).rev() {
                let mut v = unsafe { x.read_unchecked(i) };
                if i + 1 < n {
                    v -= level1::dot(s.row(i).subvec(i + 1, n - i - 1), x.rb().subvec(i + 1, n - i - 1));
                }
                unsafe { x.write_unchecked(i, v / diag.get(s, i)) };
            }
        }
        crate::Side::Lower => {
            for i in 0..n {
                let v = unsafe { x.read_unchecked(i) } - level1::dot(s.row(i).subvec(0, i), x.rb().subvec(0, i));
                unsafe { x.write_unchecked(i, v / diag.get(s, i)) };
            }
        }
    }
}
