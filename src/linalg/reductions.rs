//! Reductions over all the elements of a matrix.
//!
//! Maximum-based reductions ([`max`], [`min`], [`norm`] with [`Norm::One`] or [`Norm::Inf`])
//! propagate `NaN`: if any element is `NaN`, so is the result.

use super::with_vector;
use crate::{
    assert,
    backend::{level1, level2},
    error::{fail, MatError},
    mat::Norm,
    GeneralRef, Matrix, VectorMut,
};

#[track_caller]
fn check_nonempty(a: &dyn Matrix) -> (usize, usize) {
    let (m, n) = a.dims();
    if m == 0 || n == 0 {
        fail(MatError::ZeroLength);
    }
    (m, n)
}

#[inline]
fn nan_max(acc: f64, x: f64) -> f64 {
    if acc.is_nan() || x.is_nan() {
        f64::NAN
    } else {
        f64::max(acc, x)
    }
}

/// Returns the sum of the elements of `a`.
pub fn sum(a: &dyn Matrix) -> f64 {
    let (m, n) = a.dims();
    if let Some(g) = a.as_general() {
        return (0..m).map(|i| level1::sum(g.row(i))).sum();
    }
    if let Some(s) = a.as_symmetric() {
        let storage = s.storage();
        let mut acc = 0.0;
        for i in 0..m {
            acc += storage.read(i, i);
            if i + 1 < n {
                acc += 2.0 * level1::sum(storage.row(i).subvec(i + 1, n - i - 1));
            }
        }
        return acc;
    }
    let mut acc = 0.0;
    for i in 0..m {
        for j in 0..n {
            acc += a.at(i, j);
        }
    }
    acc
}

fn fold(a: &dyn Matrix, init: f64, mut f: impl FnMut(f64, f64) -> f64) -> f64 {
    let (m, n) = a.dims();
    let g = a.as_general();
    let mut acc = init;
    for i in 0..m {
        for j in 0..n {
            let x = match g {
                Some(g) => unsafe { g.read_unchecked(i, j) },
                None => a.at(i, j),
            };
            acc = f(acc, x);
        }
    }
    acc
}

/// Returns the largest element of `a`, or `NaN` if any element is `NaN`.
///
/// # Panics
/// Panics with [`MatError::ZeroLength`] if `a` is empty.
#[track_caller]
pub fn max(a: &dyn Matrix) -> f64 {
    check_nonempty(a);
    fold(a, f64::NEG_INFINITY, nan_max)
}

/// Returns the smallest element of `a`, or `NaN` if any element is `NaN`.
///
/// # Panics
/// Panics with [`MatError::ZeroLength`] if `a` is empty.
#[track_caller]
pub fn min(a: &dyn Matrix) -> f64 {
    check_nonempty(a);
    -fold(a, f64::NEG_INFINITY, |acc, x| nan_max(acc, -x))
}

/// Returns the sum of the diagonal elements of the square matrix `a`.
#[track_caller]
pub fn trace(a: &dyn Matrix) -> f64 {
    let (m, n) = check_nonempty(a);
    assert!(m == n);
    if let Some(g) = a.as_general() {
        return level1::sum(g.diagonal());
    }
    (0..n).map(|i| a.at(i, i)).sum()
}

/// Maximum absolute column sum of `a`.
pub(crate) fn norm_one(a: GeneralRef<'_>) -> f64 {
    norm_inf(a.transpose())
}

/// Maximum absolute row sum of `a`.
fn norm_inf(a: GeneralRef<'_>) -> f64 {
    (0..a.nrows()).fold(0.0, |acc, i| nan_max(acc, level1::asum(a.row(i))))
}

/// Returns the norm of `a` selected by `kind`.
///
/// # Panics
/// Panics with [`MatError::ZeroLength`] if `a` is empty.
#[track_caller]
pub fn norm(a: &dyn Matrix, kind: Norm) -> f64 {
    let (m, n) = check_nonempty(a);
    if let Some(g) = a.as_general() {
        return match kind {
            Norm::One => norm_one(g),
            Norm::Inf => norm_inf(g),
            Norm::Frobenius => {
                if let Some(v) = a.as_vector() {
                    level1::nrm2(v)
                } else {
                    let sq: f64 = (0..m)
                        .map(|i| {
                            let r = level1::nrm2(g.row(i));
                            r * r
                        })
                        .sum();
                    sq.sqrt()
                }
            }
        };
    }
    match kind {
        Norm::One => (0..n).fold(0.0, |acc, j| {
            nan_max(acc, (0..m).map(|i| a.at(i, j).abs()).sum())
        }),
        Norm::Inf => (0..m).fold(0.0, |acc, i| {
            nan_max(acc, (0..n).map(|j| a.at(i, j).abs()).sum())
        }),
        Norm::Frobenius => fold(a, 0.0, |acc, x| acc + x * x).sqrt(),
    }
}

/// Returns the dot product of the column vectors `x` and `y`.
#[track_caller]
pub fn dot(x: &dyn Matrix, y: &dyn Matrix) -> f64 {
    assert!(all(x.dims().1 == 1, y.dims() == x.dims()));
    with_vector(x, |x| with_vector(y, |y| level1::dot(x, y)))
}

/// Returns `xᵀ A y`, for column vectors `x` and `y`.
#[track_caller]
pub fn inner(x: &dyn Matrix, a: &dyn Matrix, y: &dyn Matrix) -> f64 {
    let (m, n) = a.dims();
    assert!(all(x.dims() == (m, 1), y.dims() == (n, 1)));
    if m == 0 || n == 0 {
        return 0.0;
    }
    let mut ay = vec![0.0; m];
    with_vector(y, |y| {
        let out = VectorMut::from_slice_mut(&mut ay);
        if let Some(s) = a.as_symmetric() {
            level2::symv(out, 1.0, s, y, 0.0);
        } else if let Some(g) = a.as_general() {
            level2::gemv(out, 1.0, g, y, 0.0);
        } else {
            let mut out = out;
            for i in 0..m {
                let v = (0..n).map(|j| a.at(i, j) * y.read(j)).sum();
                out.write(i, v);
            }
        }
    });
    with_vector(x, |x| level1::dot(x, crate::VectorRef::from_slice(&ay)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert;
    use crate::{mat, vector, Dense, SymDense};
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn sums_and_extrema() {
        let a = mat![[1.0, -2.0], [3.0, 4.0]];
        assert!(sum(&a) == 6.0);
        assert!(sum(&a.t()) == 6.0);
        assert!(max(&a) == 4.0);
        assert!(min(&a) == -2.0);
        assert!(trace(&a) == 5.0);

        let s = SymDense::from_fn(2, |i, j| (i + j + 1) as f64);
        assert!(sum(&s) == 1.0 + 2.0 * 2.0 + 3.0);
    }

    #[test]
    fn nan_propagates_in_either_position() {
        let first = mat![[f64::NAN, 1.0]];
        let last = mat![[1.0, f64::NAN]];
        for a in [&first, &last] {
            assert!(max(a).is_nan());
            assert!(min(a).is_nan());
            assert!(norm(a, Norm::Inf).is_nan());
            assert!(norm(a, Norm::One).is_nan());
        }
    }

    #[test]
    fn matrix_norms() {
        let a = mat![[1.0, -2.0], [-3.0, 4.0]];
        assert!(norm(&a, Norm::One) == 6.0);
        assert!(norm(&a, Norm::Inf) == 7.0);
        assert_approx_eq!(norm(&a, Norm::Frobenius), 30f64.sqrt());
        assert!(norm(&a.t(), Norm::One) == 7.0);

        let s = SymDense::from_fn(2, |i, j| -((i + j) as f64));
        assert!(norm(&s, Norm::One) == 3.0);
        assert_approx_eq!(norm(&vector![3.0, 4.0], Norm::Frobenius), 5.0);
    }

    #[test]
    fn dot_and_inner() {
        let x = vector![1.0, 2.0];
        let y = vector![3.0, -1.0, 2.0];
        let a = Dense::from_fn(2, 3, |i, j| (i + j) as f64);
        assert!(dot(&x, &x) == 5.0);
        // a y = [0 - 1 + 4, 3 - 2 + 6] = [3, 7]
        assert!(inner(&x, &a, &y) == 17.0);

        let s = SymDense::from_fn(2, |i, j| (1 + i + j) as f64);
        // s x = [1 + 4, 2 + 6]
        assert!(inner(&x, &s, &x) == 5.0 + 16.0);
    }

    #[test]
    #[should_panic(expected = "matrix: zero length")]
    fn empty_max_panics() {
        max(&Dense::new());
    }
}
