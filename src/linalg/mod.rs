//! Arithmetic engine, factorizations and solvers.
//!
//! # Memory allocation
//! Routines that need scratch space take a [`stack: PodStack`](dyn_stack::PodStack) parameter
//! and come with a function of the same name ending in `_req` that returns the memory
//! requirements, so that callers can reuse a single buffer across calls. The methods on the
//! owned matrix types allocate that buffer themselves.
//!
//! Scratch space is also how aliasing is resolved: when the receiver of an element-wise
//! operation or a product partially overlaps one of its operands, the result is computed into a
//! temporary matrix taken from the stack and copied back afterwards.

use crate::{GeneralMut, Matrix, VectorMut, VectorRef};
use dyn_stack::{GlobalPodBuffer, PodStack, SizeOverflow, StackReq};

pub mod chain;
pub mod cholesky;
pub mod householder;
pub mod lq;
pub mod lu;
pub mod matmul;
pub mod qr;
pub mod reductions;
pub mod solvers;
pub mod triangular_solve;

pub(crate) mod cond;
mod mat_ops;

pub use mat_ops::{add, add_scaled, apply, div_elem, kronecker, mul_elem, scale, sub};
pub use reductions::{dot, inner, max, min, norm, sum, trace};
pub use solvers::{det, log_det, Solver};

/// Returns the stack requirements for creating a temporary matrix with the given dimensions.
#[inline]
pub fn temp_mat_req(nrows: usize, ncols: usize) -> Result<StackReq, SizeOverflow> {
    let size = nrows.checked_mul(ncols).ok_or(SizeOverflow)?;
    StackReq::try_new::<f64>(size)
}

/// Creates a temporary row-major matrix of unspecified values, from the given memory stack.
#[inline]
pub fn temp_mat_uninit(nrows: usize, ncols: usize, stack: PodStack<'_>) -> (GeneralMut<'_>, PodStack<'_>) {
    let (data, stack) = stack.make_raw::<f64>(nrows * ncols);
    (GeneralMut::from_row_major_slice_mut(data, nrows, ncols), stack)
}

/// Creates a temporary row-major matrix of zeros, from the given memory stack.
#[inline]
pub fn temp_mat_zeroed(nrows: usize, ncols: usize, stack: PodStack<'_>) -> (GeneralMut<'_>, PodStack<'_>) {
    let (mut mat, stack) = temp_mat_uninit(nrows, ncols, stack);
    mat.fill_zero();
    (mat, stack)
}

/// Returns the stack requirements for creating a temporary vector of length `n`.
#[inline]
pub fn temp_vec_req(n: usize) -> Result<StackReq, SizeOverflow> {
    StackReq::try_new::<f64>(n)
}

/// Creates a temporary contiguous vector of zeros, from the given memory stack.
#[inline]
pub fn temp_vec_zeroed(n: usize, stack: PodStack<'_>) -> (VectorMut<'_>, PodStack<'_>) {
    let (data, stack) = stack.make_raw::<f64>(n);
    data.fill(0.0);
    (VectorMut::from_slice_mut(data), stack)
}

/// Allocates a buffer satisfying `req`.
#[track_caller]
pub(crate) fn workspace(req: Result<StackReq, SizeOverflow>) -> GlobalPodBuffer {
    match req {
        Ok(req) => GlobalPodBuffer::new(req),
        Err(SizeOverflow) => panic!("workspace size overflows usize"),
    }
}

/// Swaps rows `i` and `j` of `m`.
#[track_caller]
pub(crate) fn swap_rows(m: GeneralMut<'_>, i: usize, j: usize) {
    if i == j {
        return;
    }
    let (i, j) = if i < j { (i, j) } else { (j, i) };
    let (top, bot) = m.split_at_row_mut(j);
    crate::backend::level1::swap(top.row_mut(i), bot.row_mut(0));
}

/// Calls `f` with a strided view of the column vector `m`, copying it first if it has no
/// strided storage.
#[track_caller]
pub(crate) fn with_vector<R>(m: &dyn Matrix, f: impl FnOnce(VectorRef<'_>) -> R) -> R {
    let (n, c) = m.dims();
    crate::assert!(c == 1);
    if let Some(v) = m.as_vector() {
        return f(v);
    }
    if let Some(g) = m.as_general() {
        return f(g.col(0));
    }
    let copy: Vec<f64> = (0..n).map(|i| m.at(i, 0)).collect();
    f(VectorRef::from_slice(&copy))
}
