//! Element-wise arithmetic.
//!
//! The free functions write into a [`GeneralMut`] receiver, which may be the same view as one
//! of the operands: each output element only depends on the input elements at the same
//! position, so an identical operand is read right before being overwritten. A receiver that
//! partially overlaps an operand is handled by computing into a temporary.

use super::{temp_mat_req, temp_mat_uninit, workspace};
use crate::{
    assert,
    backend::level1,
    mat::{Alias, Footprint},
    Dense, GeneralMut, Matrix, SymDense, Symmetric, TriDense, Triangular, VecDense,
};
use dyn_stack::PodStack;
use reborrow::*;

#[derive(Copy, Clone, Debug)]
enum BinaryOp {
    AddScaled(f64),
    MulElem,
    DivElem,
}

impl BinaryOp {
    #[inline(always)]
    fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            BinaryOp::AddScaled(alpha) => alpha * b + a,
            BinaryOp::MulElem => a * b,
            BinaryOp::DivElem => a / b,
        }
    }
}

/// Runs `f` on `dst` directly, or on a temporary that is then copied into `dst` when
/// `isolate` is set.
fn compute_into(mut dst: GeneralMut<'_>, isolate: bool, f: impl FnOnce(GeneralMut<'_>)) {
    if !isolate {
        return f(dst);
    }

    #[cfg(feature = "perf-warn")]
    if crate::__perf_warn!(OVERLAP_WARN) {
        log::warn!(target: "dense_la_perf", "receiver partially overlaps an operand, computing through a temporary");
    }

    let (m, n) = dst.shape();
    let mut mem = workspace(temp_mat_req(m, n));
    let (mut tmp, _) = temp_mat_uninit(m, n, PodStack::new(&mut mem));
    f(tmp.rb_mut());
    dst.copy_from(tmp.rb());
}

#[track_caller]
fn binary(dst: GeneralMut<'_>, lhs: &dyn Matrix, rhs: &dyn Matrix, op: BinaryOp) {
    let (m, n) = lhs.dims();
    assert!(all(rhs.dims() == (m, n), dst.shape() == (m, n)));
    let fp = dst.rb().footprint();
    let (la, ra) = (Alias::of(fp, lhs), Alias::of(fp, rhs));
    let isolate = la == Alias::Overlap || ra == Alias::Overlap;
    let aliased = la == Alias::Same || ra == Alias::Same;
    compute_into(dst, isolate, |dst| binary_direct(dst, lhs, rhs, op, aliased && !isolate));
}

fn binary_direct(mut dst: GeneralMut<'_>, lhs: &dyn Matrix, rhs: &dyn Matrix, op: BinaryOp, aliased: bool) {
    let (m, n) = dst.shape();
    match (lhs.as_general(), rhs.as_general()) {
        (Some(a), Some(b)) if !aliased => {
            for i in 0..m {
                let d = dst.rb_mut().row_mut(i);
                match op {
                    BinaryOp::AddScaled(alpha) => level1::axpy_to(d, alpha, b.row(i), a.row(i)),
                    BinaryOp::MulElem => level1::mul_to(d, a.row(i), b.row(i)),
                    BinaryOp::DivElem => level1::div_to(d, a.row(i), b.row(i)),
                }
            }
        }
        (Some(a), Some(b)) => {
            for i in 0..m {
                for j in 0..n {
                    unsafe {
                        let v = op.apply(a.read_unchecked(i, j), b.read_unchecked(i, j));
                        dst.write_unchecked(i, j, v);
                    }
                }
            }
        }
        _ => {
            for i in 0..m {
                for j in 0..n {
                    let v = op.apply(lhs.at(i, j), rhs.at(i, j));
                    unsafe { dst.write_unchecked(i, j, v) };
                }
            }
        }
    }
}

/// `dst = lhs + rhs`.
#[track_caller]
pub fn add(dst: GeneralMut<'_>, lhs: &dyn Matrix, rhs: &dyn Matrix) {
    binary(dst, lhs, rhs, BinaryOp::AddScaled(1.0))
}

/// `dst = lhs - rhs`.
#[track_caller]
pub fn sub(dst: GeneralMut<'_>, lhs: &dyn Matrix, rhs: &dyn Matrix) {
    binary(dst, lhs, rhs, BinaryOp::AddScaled(-1.0))
}

/// `dst = lhs + alpha * rhs`.
#[track_caller]
pub fn add_scaled(dst: GeneralMut<'_>, lhs: &dyn Matrix, alpha: f64, rhs: &dyn Matrix) {
    binary(dst, lhs, rhs, BinaryOp::AddScaled(alpha))
}

/// `dst = lhs ⊙ rhs`, the element-wise product.
#[track_caller]
pub fn mul_elem(dst: GeneralMut<'_>, lhs: &dyn Matrix, rhs: &dyn Matrix) {
    binary(dst, lhs, rhs, BinaryOp::MulElem)
}

/// `dst = lhs ⊘ rhs`, the element-wise quotient.
#[track_caller]
pub fn div_elem(dst: GeneralMut<'_>, lhs: &dyn Matrix, rhs: &dyn Matrix) {
    binary(dst, lhs, rhs, BinaryOp::DivElem)
}

/// `dst = alpha * a`.
#[track_caller]
pub fn scale(mut dst: GeneralMut<'_>, alpha: f64, a: &dyn Matrix) {
    let (m, n) = a.dims();
    assert!(dst.shape() == (m, n));
    match Alias::of(dst.rb().footprint(), a) {
        Alias::Same => {
            for i in 0..m {
                level1::scal(alpha, dst.rb_mut().row_mut(i));
            }
        }
        alias => compute_into(dst, alias == Alias::Overlap, |mut dst| match a.as_general() {
            Some(g) => {
                for i in 0..m {
                    level1::scal_to(dst.rb_mut().row_mut(i), alpha, g.row(i));
                }
            }
            None => {
                for i in 0..m {
                    for j in 0..n {
                        unsafe { dst.write_unchecked(i, j, alpha * a.at(i, j)) };
                    }
                }
            }
        }),
    }
}

/// `dst[i][j] = f(i, j, a[i][j])`.
#[track_caller]
pub fn apply(mut dst: GeneralMut<'_>, f: &mut dyn FnMut(usize, usize, f64) -> f64, a: &dyn Matrix) {
    let (m, n) = a.dims();
    assert!(dst.shape() == (m, n));
    match Alias::of(dst.rb().footprint(), a) {
        Alias::Same => {
            for i in 0..m {
                for j in 0..n {
                    unsafe {
                        let v = f(i, j, dst.read_unchecked(i, j));
                        dst.write_unchecked(i, j, v);
                    }
                }
            }
        }
        alias => compute_into(dst, alias == Alias::Overlap, |mut dst| {
            let g = a.as_general();
            for i in 0..m {
                for j in 0..n {
                    let x = match g {
                        Some(g) => unsafe { g.read_unchecked(i, j) },
                        None => a.at(i, j),
                    };
                    unsafe { dst.write_unchecked(i, j, f(i, j, x)) };
                }
            }
        }),
    }
}

/// `dst = a ⊗ b`, the Kronecker product.
#[track_caller]
pub fn kronecker(dst: GeneralMut<'_>, a: &dyn Matrix, b: &dyn Matrix) {
    let (ma, na) = a.dims();
    let (mb, nb) = b.dims();
    assert!(dst.shape() == (ma * mb, na * nb));
    let fp = dst.rb().footprint();
    let isolate = Alias::of(fp, a) != Alias::None || Alias::of(fp, b) != Alias::None;
    compute_into(dst, isolate, |mut dst| {
        for i in 0..ma {
            for j in 0..na {
                let aij = a.at(i, j);
                let block = dst.rb_mut().submatrix_mut(i * mb, j * nb, mb, nb);
                match b.as_general() {
                    Some(g) => scale(block, aij, &g),
                    None => {
                        let mut block = block;
                        for k in 0..mb {
                            for l in 0..nb {
                                unsafe { block.write_unchecked(k, l, aij * b.at(k, l)) };
                            }
                        }
                    }
                }
            }
        }
    });
}

impl Dense {
    /// Sets the receiver to `a + b`.
    #[track_caller]
    pub fn add(&mut self, a: &dyn Matrix, b: &dyn Matrix) {
        let (m, n) = a.dims();
        self.reuse_as(m, n);
        add(self.as_mut(), a, b)
    }

    /// Sets the receiver to `a - b`.
    #[track_caller]
    pub fn sub(&mut self, a: &dyn Matrix, b: &dyn Matrix) {
        let (m, n) = a.dims();
        self.reuse_as(m, n);
        sub(self.as_mut(), a, b)
    }

    /// Sets the receiver to `a + alpha * b`.
    #[track_caller]
    pub fn add_scaled(&mut self, a: &dyn Matrix, alpha: f64, b: &dyn Matrix) {
        let (m, n) = a.dims();
        self.reuse_as(m, n);
        add_scaled(self.as_mut(), a, alpha, b)
    }

    /// Sets the receiver to the element-wise product of `a` and `b`.
    #[track_caller]
    pub fn mul_elem(&mut self, a: &dyn Matrix, b: &dyn Matrix) {
        let (m, n) = a.dims();
        self.reuse_as(m, n);
        mul_elem(self.as_mut(), a, b)
    }

    /// Sets the receiver to the element-wise quotient of `a` and `b`.
    #[track_caller]
    pub fn div_elem(&mut self, a: &dyn Matrix, b: &dyn Matrix) {
        let (m, n) = a.dims();
        self.reuse_as(m, n);
        div_elem(self.as_mut(), a, b)
    }

    /// Sets the receiver to `alpha * a`.
    #[track_caller]
    pub fn scale(&mut self, alpha: f64, a: &dyn Matrix) {
        let (m, n) = a.dims();
        self.reuse_as(m, n);
        scale(self.as_mut(), alpha, a)
    }

    /// Sets the receiver element `(i, j)` to `f(i, j, a[i][j])`.
    #[track_caller]
    pub fn apply(&mut self, mut f: impl FnMut(usize, usize, f64) -> f64, a: &dyn Matrix) {
        let (m, n) = a.dims();
        self.reuse_as(m, n);
        apply(self.as_mut(), &mut f, a)
    }

    /// Sets the receiver to the Kronecker product `a ⊗ b`.
    #[track_caller]
    pub fn kronecker(&mut self, a: &dyn Matrix, b: &dyn Matrix) {
        let (ma, na) = a.dims();
        let (mb, nb) = b.dims();
        self.reuse_as(ma * mb, na * nb);
        kronecker(self.as_mut(), a, b)
    }

    /// `self += b`.
    #[track_caller]
    pub fn add_assign(&mut self, b: &dyn Matrix) {
        let dst = self.as_mut();
        let lhs = unsafe { dst.alias() };
        add(dst, &lhs, b)
    }

    /// `self -= b`.
    #[track_caller]
    pub fn sub_assign(&mut self, b: &dyn Matrix) {
        let dst = self.as_mut();
        let lhs = unsafe { dst.alias() };
        sub(dst, &lhs, b)
    }

    /// `self ⊙= b`.
    #[track_caller]
    pub fn mul_elem_assign(&mut self, b: &dyn Matrix) {
        let dst = self.as_mut();
        let lhs = unsafe { dst.alias() };
        mul_elem(dst, &lhs, b)
    }

    /// `self ⊘= b`.
    #[track_caller]
    pub fn div_elem_assign(&mut self, b: &dyn Matrix) {
        let dst = self.as_mut();
        let lhs = unsafe { dst.alias() };
        div_elem(dst, &lhs, b)
    }

    /// `self *= alpha`.
    pub fn scale_assign(&mut self, alpha: f64) {
        level1::scal(alpha, crate::VectorMut::from_slice_mut(self.raw_data_mut()));
    }

    /// Replaces every element `x` at `(i, j)` with `f(i, j, x)`.
    pub fn apply_assign(&mut self, mut f: impl FnMut(usize, usize, f64) -> f64) {
        let dst = self.as_mut();
        let a = unsafe { dst.alias() };
        apply(dst, &mut f, &a)
    }
}

impl VecDense {
    /// Sets the receiver to `a + b`.
    #[track_caller]
    pub fn add_vec(&mut self, a: &dyn Matrix, b: &dyn Matrix) {
        self.reuse_as_vec(a.dims().0);
        add(self.as_vec_mut().as_column_mut(), a, b)
    }

    /// Sets the receiver to `a - b`.
    #[track_caller]
    pub fn sub_vec(&mut self, a: &dyn Matrix, b: &dyn Matrix) {
        self.reuse_as_vec(a.dims().0);
        sub(self.as_vec_mut().as_column_mut(), a, b)
    }

    /// Sets the receiver to `a + alpha * b`.
    #[track_caller]
    pub fn add_scaled_vec(&mut self, a: &dyn Matrix, alpha: f64, b: &dyn Matrix) {
        self.reuse_as_vec(a.dims().0);
        add_scaled(self.as_vec_mut().as_column_mut(), a, alpha, b)
    }

    /// Sets the receiver to the element-wise product of `a` and `b`.
    #[track_caller]
    pub fn mul_elem_vec(&mut self, a: &dyn Matrix, b: &dyn Matrix) {
        self.reuse_as_vec(a.dims().0);
        mul_elem(self.as_vec_mut().as_column_mut(), a, b)
    }

    /// Sets the receiver to the element-wise quotient of `a` and `b`.
    #[track_caller]
    pub fn div_elem_vec(&mut self, a: &dyn Matrix, b: &dyn Matrix) {
        self.reuse_as_vec(a.dims().0);
        div_elem(self.as_vec_mut().as_column_mut(), a, b)
    }

    /// Sets the receiver to `alpha * a`.
    #[track_caller]
    pub fn scale_vec(&mut self, alpha: f64, a: &dyn Matrix) {
        self.reuse_as_vec(a.dims().0);
        scale(self.as_vec_mut().as_column_mut(), alpha, a)
    }
}

#[track_caller]
fn check_disjoint(dst: Footprint, operand: &dyn Matrix) {
    let fp = if let Some(s) = operand.as_symmetric() {
        s.footprint()
    } else if let Some(t) = operand.as_triangular() {
        t.footprint()
    } else if let Some(g) = operand.as_general() {
        g.footprint()
    } else {
        return;
    };
    dst.check(&fp);
}

impl SymDense {
    /// Sets the receiver to `a + b`.
    #[track_caller]
    pub fn add_sym(&mut self, a: &dyn Symmetric, b: &dyn Symmetric) {
        let n = a.symmetric_dim();
        assert!(b.symmetric_dim() == n);
        self.reuse_as_sym(n);
        let mut s = self.as_sym_mut();
        let fp = s.rb().footprint();
        check_disjoint(fp, a);
        check_disjoint(fp, b);
        for i in 0..n {
            for j in i..n {
                unsafe { s.write_unchecked(i, j, a.at(i, j) + b.at(i, j)) };
            }
        }
    }

    /// Sets the receiver to `alpha * a`.
    #[track_caller]
    pub fn scale_sym(&mut self, alpha: f64, a: &dyn Symmetric) {
        let n = a.symmetric_dim();
        self.reuse_as_sym(n);
        let mut s = self.as_sym_mut();
        check_disjoint(s.rb().footprint(), a);
        for i in 0..n {
            for j in i..n {
                unsafe { s.write_unchecked(i, j, alpha * a.at(i, j)) };
            }
        }
    }
}

impl SymDense {
    /// Sets the receiver to the principal submatrix of `a` selected by `set`, so that
    /// `self[i][j] == a[set[i]][set[j]]`. Indices may repeat.
    #[track_caller]
    pub fn subset_sym(&mut self, a: &dyn Symmetric, set: &[usize]) {
        let n = a.symmetric_dim();
        assert!(set.iter().all(|&k| k < n));
        self.reuse_as_sym(set.len());
        let mut s = self.as_sym_mut();
        check_disjoint(s.rb().footprint(), a);
        for (i, &si) in set.iter().enumerate() {
            for (j, &sj) in set.iter().enumerate().skip(i) {
                unsafe { s.write_unchecked(i, j, a.at(si, sj)) };
            }
        }
    }
}

impl TriDense {
    /// Sets the receiver to `alpha * a`, stored on the side of `a`.
    #[track_caller]
    pub fn scale_tri(&mut self, alpha: f64, a: &dyn Triangular) {
        let (n, side) = a.triangle();
        self.reuse_as_tri(n, side);
        let mut t = self.as_tri_mut();
        check_disjoint(t.rb().footprint(), a);
        for i in 0..n {
            let (start, len) = match side {
                crate::Side::Upper => (i, n - i),
                crate::Side::Lower => (0, i + 1),
            };
            for j in start..start + len {
                t.write(i, j, alpha * a.at(i, j));
            }
        }
    }
}
