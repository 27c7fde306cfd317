//! Vector kernels.
//!
//! Every kernel accepts strided views. When all operands are contiguous the work is done on
//! slices inside [`pulp::Arch::dispatch`], which lets the compiler vectorize the loops for the
//! instruction set detected at runtime.
//!
//! The reductions propagate `NaN`: [`norm_inf`], [`nrm2`] and [`idamax`] report a `NaN` input
//! instead of skipping it.

use crate::{assert, VectorMut, VectorRef};
use pulp::Arch;
use reborrow::*;

/// `y += alpha * x`.
#[track_caller]
pub fn axpy(alpha: f64, x: VectorRef<'_>, mut y: VectorMut<'_>) {
    assert!(x.len() == y.len());
    if alpha == 0.0 {
        return;
    }
    if let (Some(x), Some(y)) = (x.try_as_slice(), y.rb_mut().try_as_slice_mut()) {
        return axpy_unit(alpha, x, y);
    }
    for i in 0..x.len() {
        unsafe { y.write_unchecked(i, y.read_unchecked(i) + alpha * x.read_unchecked(i)) };
    }
}

/// `dst = alpha * x + y`.
#[track_caller]
pub fn axpy_to(mut dst: VectorMut<'_>, alpha: f64, x: VectorRef<'_>, y: VectorRef<'_>) {
    assert!(all(x.len() == y.len(), dst.len() == x.len()));
    if let (Some(x), Some(y), Some(dst)) =
        (x.try_as_slice(), y.try_as_slice(), dst.rb_mut().try_as_slice_mut())
    {
        return axpy_to_unit(dst, alpha, x, y);
    }
    for i in 0..x.len() {
        unsafe {
            dst.write_unchecked(i, alpha * x.read_unchecked(i) + y.read_unchecked(i));
        }
    }
}

/// `x *= alpha`.
pub fn scal(alpha: f64, mut x: VectorMut<'_>) {
    if let Some(x) = x.rb_mut().try_as_slice_mut() {
        return Arch::new().dispatch(|| {
            for x in x.iter_mut() {
                *x *= alpha;
            }
        });
    }
    for i in 0..x.len() {
        unsafe { x.write_unchecked(i, alpha * x.read_unchecked(i)) };
    }
}

/// `dst = alpha * x`.
#[track_caller]
pub fn scal_to(mut dst: VectorMut<'_>, alpha: f64, x: VectorRef<'_>) {
    assert!(dst.len() == x.len());
    if let (Some(x), Some(dst)) = (x.try_as_slice(), dst.rb_mut().try_as_slice_mut()) {
        return Arch::new().dispatch(|| {
            for (d, &x) in dst.iter_mut().zip(x) {
                *d = alpha * x;
            }
        });
    }
    for i in 0..x.len() {
        unsafe { dst.write_unchecked(i, alpha * x.read_unchecked(i)) };
    }
}

/// `dst = x ⊙ y`, the element-wise product.
#[track_caller]
pub fn mul_to(mut dst: VectorMut<'_>, x: VectorRef<'_>, y: VectorRef<'_>) {
    assert!(all(x.len() == y.len(), dst.len() == x.len()));
    if let (Some(x), Some(y), Some(dst)) =
        (x.try_as_slice(), y.try_as_slice(), dst.rb_mut().try_as_slice_mut())
    {
        return Arch::new().dispatch(|| {
            for ((d, &x), &y) in dst.iter_mut().zip(x).zip(y) {
                *d = x * y;
            }
        });
    }
    for i in 0..x.len() {
        unsafe { dst.write_unchecked(i, x.read_unchecked(i) * y.read_unchecked(i)) };
    }
}

/// `dst = x ⊘ y`, the element-wise quotient.
#[track_caller]
pub fn div_to(mut dst: VectorMut<'_>, x: VectorRef<'_>, y: VectorRef<'_>) {
    assert!(all(x.len() == y.len(), dst.len() == x.len()));
    if let (Some(x), Some(y), Some(dst)) =
        (x.try_as_slice(), y.try_as_slice(), dst.rb_mut().try_as_slice_mut())
    {
        return Arch::new().dispatch(|| {
            for ((d, &x), &y) in dst.iter_mut().zip(x).zip(y) {
                *d = x / y;
            }
        });
    }
    for i in 0..x.len() {
        unsafe { dst.write_unchecked(i, x.read_unchecked(i) / y.read_unchecked(i)) };
    }
}

/// Returns `xᵀ y`.
#[track_caller]
pub fn dot(x: VectorRef<'_>, y: VectorRef<'_>) -> f64 {
    assert!(x.len() == y.len());
    if let (Some(x), Some(y)) = (x.try_as_slice(), y.try_as_slice()) {
        return dot_unit(x, y);
    }
    let mut acc = 0.0;
    for i in 0..x.len() {
        acc += unsafe { x.read_unchecked(i) * y.read_unchecked(i) };
    }
    acc
}

/// Returns the sum of the absolute values of the elements.
pub fn asum(x: VectorRef<'_>) -> f64 {
    if let Some(x) = x.try_as_slice() {
        return Arch::new().dispatch(|| x.iter().map(|x| x.abs()).sum::<f64>());
    }
    x.iter().map(f64::abs).sum()
}

/// Returns the sum of the elements.
pub fn sum(x: VectorRef<'_>) -> f64 {
    if let Some(x) = x.try_as_slice() {
        return Arch::new().dispatch(|| x.iter().sum::<f64>());
    }
    x.iter().sum()
}

/// Returns the Euclidean norm of `x`, computed with scaling so that it neither overflows nor
/// underflows for representable results.
pub fn nrm2(x: VectorRef<'_>) -> f64 {
    let mut scale = 0.0f64;
    let mut ssq = 1.0f64;
    let mut inf = false;
    for v in x.iter() {
        if v.is_nan() {
            return f64::NAN;
        }
        if v.is_infinite() {
            inf = true;
            continue;
        }
        if v == 0.0 {
            continue;
        }
        let a = v.abs();
        if scale < a {
            ssq = 1.0 + ssq * (scale / a) * (scale / a);
            scale = a;
        } else {
            ssq += (a / scale) * (a / scale);
        }
    }
    if inf {
        f64::INFINITY
    } else {
        scale * ssq.sqrt()
    }
}

/// Returns the sum of the absolute values of the elements, the L1 norm.
#[inline]
pub fn norm_l1(x: VectorRef<'_>) -> f64 {
    asum(x)
}

/// Returns the largest absolute value of the elements, or `NaN` if any element is `NaN`.
pub fn norm_inf(x: VectorRef<'_>) -> f64 {
    let mut max = 0.0f64;
    for v in x.iter() {
        let a = v.abs();
        if a.is_nan() {
            return f64::NAN;
        }
        if a > max {
            max = a;
        }
    }
    max
}

/// Returns the index of the first element with the largest absolute value, or the index of
/// the first `NaN`. Returns `None` for an empty vector.
pub fn idamax(x: VectorRef<'_>) -> Option<usize> {
    if x.is_empty() {
        return None;
    }
    let mut idx = 0;
    let mut max = -1.0f64;
    for (i, v) in x.iter().enumerate() {
        let a = v.abs();
        if a.is_nan() {
            return Some(i);
        }
        if a > max {
            max = a;
            idx = i;
        }
    }
    Some(idx)
}

/// `dst[i] = x[0] + … + x[i]`.
#[track_caller]
pub fn cumsum(mut dst: VectorMut<'_>, x: VectorRef<'_>) {
    assert!(dst.len() == x.len());
    let mut acc = 0.0;
    for i in 0..x.len() {
        acc += unsafe { x.read_unchecked(i) };
        unsafe { dst.write_unchecked(i, acc) };
    }
}

/// `dst[i] = x[0] * … * x[i]`.
#[track_caller]
pub fn cumprod(mut dst: VectorMut<'_>, x: VectorRef<'_>) {
    assert!(dst.len() == x.len());
    let mut acc = 1.0;
    for i in 0..x.len() {
        acc *= unsafe { x.read_unchecked(i) };
        unsafe { dst.write_unchecked(i, acc) };
    }
}

/// `dst = src`.
#[track_caller]
pub fn copy(mut dst: VectorMut<'_>, src: VectorRef<'_>) {
    assert!(dst.len() == src.len());
    if let (Some(src), Some(dst)) = (src.try_as_slice(), dst.rb_mut().try_as_slice_mut()) {
        return dst.copy_from_slice(src);
    }
    for i in 0..src.len() {
        unsafe { dst.write_unchecked(i, src.read_unchecked(i)) };
    }
}

/// Exchanges the elements of `x` and `y`.
#[track_caller]
pub fn swap(mut x: VectorMut<'_>, mut y: VectorMut<'_>) {
    assert!(x.len() == y.len());
    if let (Some(x), Some(y)) = (x.rb_mut().try_as_slice_mut(), y.rb_mut().try_as_slice_mut()) {
        return x.swap_with_slice(y);
    }
    for i in 0..x.len() {
        unsafe {
            let tmp = x.read_unchecked(i);
            x.write_unchecked(i, y.read_unchecked(i));
            y.write_unchecked(i, tmp);
        }
    }
}

#[inline]
fn axpy_unit(alpha: f64, x: &[f64], y: &mut [f64]) {
    Arch::new().dispatch(|| {
        for (y, &x) in y.iter_mut().zip(x) {
            *y += alpha * x;
        }
    });
}

#[inline]
fn axpy_to_unit(dst: &mut [f64], alpha: f64, x: &[f64], y: &[f64]) {
    Arch::new().dispatch(|| {
        for ((d, &x), &y) in dst.iter_mut().zip(x).zip(y) {
            *d = alpha * x + y;
        }
    });
}

#[inline]
fn dot_unit(x: &[f64], y: &[f64]) -> f64 {
    Arch::new().dispatch(|| {
        let mut acc = [0.0f64; 4];
        let (x4, x1) = x.split_at(x.len() / 4 * 4);
        let (y4, y1) = y.split_at(x4.len());
        for (x, y) in x4.chunks_exact(4).zip(y4.chunks_exact(4)) {
            acc[0] += x[0] * y[0];
            acc[1] += x[1] * y[1];
            acc[2] += x[2] * y[2];
            acc[3] += x[3] * y[3];
        }
        let mut tail = 0.0;
        for (x, y) in x1.iter().zip(y1) {
            tail += x * y;
        }
        (acc[0] + acc[1]) + (acc[2] + acc[3]) + tail
    })
}
