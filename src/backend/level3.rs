//! Matrix-matrix kernels for structured operands.
//!
//! General products go through [`Backend::gemm`](super::Backend::gemm). The kernels here exploit
//! the structure of one operand: the symmetric ones only read the upper triangle, the
//! triangular ones skip the structurally zero half.

use super::{level1, Diag, MulSide};
use crate::{assert, GeneralMut, GeneralRef, Side, SymmetricMut, SymmetricRef, TriangularRef};
use reborrow::*;

#[inline]
fn scale_dst(mut c: GeneralMut<'_>, beta: f64) {
    if beta == 0.0 {
        c.fill(0.0);
    } else if beta != 1.0 {
        for i in 0..c.nrows() {
            level1::scal(beta, c.rb_mut().row_mut(i));
        }
    }
}

/// `c = alpha * a * b + beta * c` for [`MulSide::Left`], or `c = alpha * b * a + beta * c` for
/// [`MulSide::Right`], with a symmetric `a`.
#[track_caller]
pub fn symm(
    side: MulSide,
    mut c: GeneralMut<'_>,
    alpha: f64,
    a: SymmetricRef<'_>,
    b: GeneralRef<'_>,
    beta: f64,
) {
    let n = a.dim();
    let (m, p) = c.shape();
    match side {
        MulSide::Left => assert!(all(n == m, b.nrows() == n, b.ncols() == p)),
        MulSide::Right => assert!(all(n == p, b.ncols() == n, b.nrows() == m)),
    }
    scale_dst(c.rb_mut(), beta);
    if alpha == 0.0 {
        return;
    }

    match side {
        MulSide::Left => {
            // row i of a*b is Σ_k a[i][k] b[k][:]
            for i in 0..m {
                for k in 0..n {
                    let aik = alpha * unsafe { a.read_unchecked(i, k) };
                    level1::axpy(aik, b.row(k), c.rb_mut().row_mut(i));
                }
            }
        }
        MulSide::Right => {
            // row i of b*a is Σ_k b[i][k] a[k][:]
            let s = a.storage();
            for i in 0..m {
                for k in 0..n {
                    let bik = alpha * unsafe { b.read_unchecked(i, k) };
                    if bik == 0.0 {
                        continue;
                    }
                    let mut ci = c.rb_mut().row_mut(i);
                    // a[k][k..] from row k of the storage, a[k][..k] from column k
                    level1::axpy(bik, s.row(k).subvec(k, n - k), ci.rb_mut().subvec_mut(k, n - k));
                    level1::axpy(bik, s.col(k).subvec(0, k), ci.subvec_mut(0, k));
                }
            }
        }
    }
}

/// `c = alpha * a * b` for [`MulSide::Left`], or `c = alpha * b * a` for [`MulSide::Right`],
/// with a triangular `a`. When `unit_diag` is set, the diagonal of `a` is assumed to be one.
#[track_caller]
pub fn trmm(
    side: MulSide,
    mut c: GeneralMut<'_>,
    alpha: f64,
    a: TriangularRef<'_>,
    unit_diag: bool,
    b: GeneralRef<'_>,
) {
    let n = a.dim();
    let (m, p) = c.shape();
    match side {
        MulSide::Left => assert!(all(n == m, b.nrows() == n, b.ncols() == p)),
        MulSide::Right => assert!(all(n == p, b.ncols() == n, b.nrows() == m)),
    }
    c.fill(0.0);
    if alpha == 0.0 {
        return;
    }
    let s = a.storage();
    // strictly triangular part of row k
    let strict = |k: usize| match a.side() {
        Side::Upper => (k + 1, n - k - 1),
        Side::Lower => (0, k),
    };
    let diag = |k: usize| {
        if unit_diag {
            1.0
        } else {
            unsafe { s.read_unchecked(k, k) }
        }
    };

    match side {
        MulSide::Left => {
            for i in 0..m {
                let (start, len) = strict(i);
                for k in start..start + len {
                    let aik = unsafe { s.read_unchecked(i, k) };
                    level1::axpy(alpha * aik, b.row(k), c.rb_mut().row_mut(i));
                }
                level1::axpy(alpha * diag(i), b.row(i), c.rb_mut().row_mut(i));
            }
        }
        MulSide::Right => {
            // row i of b*a is Σ_k b[i][k] a[k][:]
            for i in 0..m {
                for k in 0..n {
                    let bik = alpha * unsafe { b.read_unchecked(i, k) };
                    if bik == 0.0 {
                        continue;
                    }
                    let (start, len) = strict(k);
                    let mut ci = c.rb_mut().row_mut(i);
                    level1::axpy(bik, s.row(k).subvec(start, len), ci.rb_mut().subvec_mut(start, len));
                    let cur = ci.read(k);
                    ci.write(k, cur + bik * diag(k));
                }
            }
        }
    }
}

/// Solves `a * x = b` in place, where `x` holds `b` on entry, for a triangular `a`.
///
/// Right-side solves `x * a = b` are obtained by passing the transposes of `a` and `b`.
#[track_caller]
pub fn trsm(a: TriangularRef<'_>, diag: Diag<'_>, mut x: GeneralMut<'_>) {
    let n = a.dim();
    assert!(x.nrows() == n);
    let s = a.storage();
    match a.side() {
        Side::Upper => {
            for i in (0..n).rev() {
                let (mut top, bot) = x.rb_mut().split_at_row_mut(i + 1);
                let bot = bot.rb();
                let mut xi = top.rb_mut().row_mut(i);
                for k in i + 1..n {
                    let aik = unsafe { s.read_unchecked(i, k) };
                    level1::axpy(-aik, bot.row(k - i - 1), xi.rb_mut());
                }
                level1::scal(1.0 / diag.get(s, i), xi);
            }
        }
        Side::Lower => {
            for i in 0..n {
                let (top, bot) = x.rb_mut().split_at_row_mut(i);
                let top = top.rb();
                let mut xi = bot.row_mut(0);
                for k in 0..i {
                    let aik = unsafe { s.read_unchecked(i, k) };
                    level1::axpy(-aik, top.row(k), xi.rb_mut());
                }
                level1::scal(1.0 / diag.get(s, i), xi);
            }
        }
    }
}

/// `c = alpha * a * aᵀ + beta * c` on the upper triangle of `c`.
#[track_caller]
pub fn syrk(c: SymmetricMut<'_>, alpha: f64, a: GeneralRef<'_>, beta: f64) {
    let n = c.dim();
    assert!(a.nrows() == n);
    let mut s = c.storage_mut();
    for i in 0..n {
        let ai = a.row(i);
        for j in i..n {
            let v = alpha * level1::dot(ai, a.row(j));
            let prev = if beta == 0.0 { 0.0 } else { beta * unsafe { s.read_unchecked(i, j) } };
            unsafe { s.write_unchecked(i, j, prev + v) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert;
    use crate::{mat, Dense, Matrix, SymDense, TriDense};

    fn naive(a: &dyn Matrix, b: &dyn Matrix) -> Dense {
        let (m, k) = a.dims();
        let n = b.dims().1;
        Dense::from_fn(m, n, |i, j| (0..k).map(|l| a.at(i, l) * b.at(l, j)).sum())
    }

    #[test]
    fn symm_both_sides() {
        let s = SymDense::from_fn(3, |i, j| (i + 2 * j) as f64 - 1.0);
        let b = Dense::from_fn(3, 2, |i, j| (i * 2 + j) as f64);

        let mut c = Dense::zeros(3, 2);
        symm(MulSide::Left, c.as_mut(), 1.0, s.as_sym_ref(), b.as_ref(), 0.0);
        assert_eq!(c, naive(&s, &b));

        let bt = Dense::from_fn(2, 3, |i, j| (i + j * j) as f64);
        let mut c = Dense::zeros(2, 3);
        symm(MulSide::Right, c.as_mut(), 1.0, s.as_sym_ref(), bt.as_ref(), 0.0);
        assert_eq!(c, naive(&bt, &s));
    }

    #[test]
    fn trmm_both_sides() {
        for side in [Side::Upper, Side::Lower] {
            let t = TriDense::from_fn(3, side, |i, j| (1 + i + j) as f64);
            let b = mat![[1.0, 2.0, 0.0], [0.0, 1.0, 3.0], [2.0, 0.0, 1.0]];

            let mut c = Dense::zeros(3, 3);
            trmm(MulSide::Left, c.as_mut(), 1.0, t.as_tri_ref(), false, b.as_ref());
            assert_eq!(c, naive(&t, &b));

            trmm(MulSide::Right, c.as_mut(), 2.0, t.as_tri_ref(), false, b.as_ref());
            let mut expected = naive(&b, &t);
            expected.raw_data_mut().iter_mut().for_each(|x| *x *= 2.0);
            assert_eq!(c, expected);
        }
    }

    #[test]
    fn trmm_unit_diagonal() {
        let t = TriDense::from_vec(2, Side::Upper, vec![5.0, 2.0, 0.0, 7.0]);
        let unit = mat![[1.0, 2.0], [0.0, 1.0]];
        let b = mat![[1.0, 1.0], [2.0, 3.0]];
        let mut c = Dense::zeros(2, 2);
        trmm(MulSide::Right, c.as_mut(), 1.0, t.as_tri_ref(), true, b.as_ref());
        assert_eq!(c, naive(&b, &unit));
        trmm(MulSide::Left, c.as_mut(), 1.0, t.as_tri_ref(), true, b.as_ref());
        assert_eq!(c, naive(&unit, &b));
    }

    #[test]
    fn trsm_inverts_trmm() {
        let b = mat![[1.0, 2.0], [0.0, -1.0], [3.0, 0.5]];
        for side in [Side::Upper, Side::Lower] {
            let t = TriDense::from_fn(3, side, |i, j| 2.0 + (i + 2 * j) as f64);
            for tri in [t.as_tri_ref(), t.as_tri_ref().transpose()] {
                let mut c = Dense::zeros(3, 2);
                trmm(MulSide::Left, c.as_mut(), 1.0, tri, false, b.as_ref());
                trsm(tri, Diag::Stored, c.as_mut());
                assert!(crate::mat::equal_approx(&c, &b, 1e-13));

                trmm(MulSide::Left, c.as_mut(), 1.0, tri, true, b.as_ref());
                trsm(tri, Diag::Unit, c.as_mut());
                assert!(crate::mat::equal_approx(&c, &b, 1e-13));
            }
        }
    }

    #[test]
    fn syrk_upper() {
        let a = mat![[1.0, 2.0], [3.0, 4.0], [0.0, 1.0]];
        let mut s = SymDense::zeros(3);
        syrk(s.as_sym_mut(), 1.0, a.as_ref(), 0.0);
        assert_eq!(s.to_dense(), naive(&a, &a.t()));
    }
}
