//! Matrix multiplication.
//!
//! [`mul_into`] inspects the storage of both operands and picks the most specific kernel:
//! matrix-vector kernels when the right operand is a column vector, [`Backend::gemm`] when both
//! operands have general storage, and the symmetric or triangular level 3 kernels when one of
//! them is structured. Operands with no raw storage go through a slow element-wise loop.
//!
//! [`Backend::gemm`]: crate::backend::Backend::gemm

use super::{temp_mat_req, temp_mat_uninit, with_vector, workspace};
use crate::{
    assert,
    backend::{level2, level3, MulSide},
    mat::{Alias, Footprint},
    Dense, Engine, GeneralMut, Matrix, SymDense, Symmetric, TriDense, Triangular,
    TriangularRef, VecDense,
};
use dyn_stack::{PodStack, SizeOverflow, StackReq};
use reborrow::*;

/// Returns the stack requirements of [`mul_into`] for an `nrows × ncols` product.
#[inline]
pub fn mul_req(nrows: usize, ncols: usize) -> Result<StackReq, SizeOverflow> {
    temp_mat_req(nrows, ncols)
}

#[inline]
fn needs_temp(dst: Footprint, lhs: &dyn Matrix, rhs: &dyn Matrix) -> bool {
    Alias::of(dst, lhs) != Alias::None || Alias::of(dst, rhs) != Alias::None
}

/// Returns the stack requirements of a product into `dst`, which are only non-empty when `dst`
/// shares memory with an operand.
fn mul_req_for(dst: Footprint, lhs: &dyn Matrix, rhs: &dyn Matrix) -> Result<StackReq, SizeOverflow> {
    if needs_temp(dst, lhs, rhs) {
        mul_req(lhs.dims().0, rhs.dims().1)
    } else {
        Ok(StackReq::empty())
    }
}

/// Computes `dst = lhs * rhs`.
///
/// If `dst` shares memory with either operand, the product is computed into a temporary taken
/// from `stack`, then copied into `dst`.
///
/// # Panics
/// Panics if the shapes are not compatible.
#[track_caller]
pub fn mul_into(engine: Engine, mut dst: GeneralMut<'_>, lhs: &dyn Matrix, rhs: &dyn Matrix, stack: PodStack<'_>) {
    let (m, k) = lhs.dims();
    let n = rhs.dims().1;
    assert!(all(rhs.dims().0 == k, dst.shape() == (m, n)));

    if needs_temp(dst.rb().footprint(), lhs, rhs) {
        #[cfg(feature = "perf-warn")]
        if crate::__perf_warn!(MATMUL_ALIAS_WARN) {
            log::warn!(target: "dense_la_perf", "matrix product receiver shares memory with an operand, computing through a temporary");
        }
        let (mut tmp, _) = temp_mat_uninit(m, n, stack);
        mul_direct(engine, tmp.rb_mut(), lhs, rhs);
        dst.copy_from(tmp.rb());
    } else {
        mul_direct(engine, dst, lhs, rhs);
    }
}

fn mul_direct(engine: Engine, mut dst: GeneralMut<'_>, lhs: &dyn Matrix, rhs: &dyn Matrix) {
    let (m, n) = dst.shape();
    if m == 0 || n == 0 {
        return;
    }

    if n == 1 {
        let x = rhs.as_vector().or_else(|| rhs.as_general().map(|g| g.col(0)));
        if let Some(x) = x {
            let mut y = dst.rb_mut().col_mut(0);
            if let Some(s) = lhs.as_symmetric() {
                return level2::symv(y, 1.0, s, x, 0.0);
            }
            if let Some(t) = lhs.as_triangular() {
                y.copy_from(x);
                return level2::trmv(t, false, y);
            }
            if let Some(a) = lhs.as_general() {
                return level2::gemv(y, 1.0, a, x, 0.0);
            }
        }
    }

    if let (Some(a), Some(b)) = (lhs.as_general(), rhs.as_general()) {
        return engine.gemm(dst, 1.0, a, b, 0.0);
    }
    if let Some(b) = rhs.as_general() {
        if let Some(t) = lhs.as_triangular() {
            return level3::trmm(MulSide::Left, dst, 1.0, t, false, b);
        }
        if let Some(s) = lhs.as_symmetric() {
            return level3::symm(MulSide::Left, dst, 1.0, s, b, 0.0);
        }
    }
    if let Some(a) = lhs.as_general() {
        if let Some(t) = rhs.as_triangular() {
            return level3::trmm(MulSide::Right, dst, 1.0, t, false, a);
        }
        if let Some(s) = rhs.as_symmetric() {
            return level3::symm(MulSide::Right, dst, 1.0, s, a, 0.0);
        }
    }

    #[cfg(feature = "perf-warn")]
    if crate::__perf_warn!(MATMUL_GENERIC_WARN) {
        log::warn!(target: "dense_la_perf", "matrix product operands have no usable storage, falling back to element access");
    }
    let k = lhs.dims().1;
    for i in 0..m {
        for j in 0..n {
            let v = (0..k).map(|l| lhs.at(i, l) * rhs.at(l, j)).sum();
            unsafe { dst.write_unchecked(i, j, v) };
        }
    }
}

impl Dense {
    /// Sets the receiver to the matrix product `a * b`.
    ///
    /// # Panics
    /// Panics if the number of columns of `a` differs from the number of rows of `b`, or if the
    /// receiver is not empty and does not have the shape of the product.
    #[track_caller]
    pub fn mul(&mut self, a: &dyn Matrix, b: &dyn Matrix) {
        self.mul_with(Engine::default(), a, b)
    }

    /// Same as [`Dense::mul`], running general products on the backend of `engine`.
    #[track_caller]
    pub fn mul_with(&mut self, engine: Engine, a: &dyn Matrix, b: &dyn Matrix) {
        let (m, k) = a.dims();
        let (k2, n) = b.dims();
        assert!(k == k2);
        self.reuse_as(m, n);
        let dst = self.as_mut();
        let mut mem = workspace(mul_req_for(dst.rb().footprint(), a, b));
        mul_into(engine, dst, a, b, PodStack::new(&mut mem));
    }

    /// Sets the receiver to `self * b`. `b` must be square.
    #[track_caller]
    pub fn mul_assign_right(&mut self, b: &dyn Matrix) {
        let (m, n) = (self.nrows(), self.ncols());
        assert!(b.dims() == (n, n));
        let dst = self.as_mut();
        let lhs = unsafe { dst.alias() };
        let mut mem = workspace(mul_req(m, n));
        mul_into(Engine::default(), dst, &lhs, b, PodStack::new(&mut mem));
    }

    /// Sets the receiver to `a * self`. `a` must be square.
    #[track_caller]
    pub fn mul_assign_left(&mut self, a: &dyn Matrix) {
        let m = self.nrows();
        assert!(a.dims() == (m, m));
        let dst = self.as_mut();
        let rhs = unsafe { dst.alias() };
        let mut mem = workspace(mul_req(m, rhs.ncols()));
        mul_into(Engine::default(), dst, a, &rhs, PodStack::new(&mut mem));
    }

    /// Sets the receiver to the matrix exponential of the square matrix `a`.
    #[track_caller]
    pub fn exp(&mut self, a: &dyn Matrix) {
        self.exp_with(Engine::default(), a)
    }

    /// Same as [`Dense::exp`], running general products on the backend of `engine`.
    ///
    /// The exponential is computed by scaling and squaring: `a` is scaled by `2⁻⁴`, its
    /// exponential is approximated by the Taylor polynomial of degree 10, and the result is
    /// squared 4 times.
    #[track_caller]
    pub fn exp_with(&mut self, engine: Engine, a: &dyn Matrix) {
        const SQUARINGS: i32 = 4;
        const DEGREE: usize = 10;

        let (n, c) = a.dims();
        assert!(n == c);
        if n == 1 {
            self.reuse_as(1, 1);
            self.as_mut().write(0, 0, a.at(0, 0).exp());
            return;
        }

        let mut x = Dense::new();
        x.scale(2f64.powi(-SQUARINGS), a);

        // Horner evaluation of I + x (I + x/2 (I + x/3 (⋯ (I + x/10))))
        let mut p = Dense::identity(n);
        let mut tmp = Dense::zeros(n, n);
        for k in (1..=DEGREE).rev() {
            tmp.mul_with(engine, &x, &p);
            tmp.scale_assign(1.0 / k as f64);
            for i in 0..n {
                let v = tmp.as_ref().read(i, i);
                tmp.as_mut().write(i, i, v + 1.0);
            }
            core::mem::swap(&mut p, &mut tmp);
        }
        for _ in 0..SQUARINGS {
            tmp.mul_with(engine, &p, &p);
            core::mem::swap(&mut p, &mut tmp);
        }

        self.reuse_as(n, n);
        self.as_mut().copy_from(p.as_ref());
    }

    /// Sets the receiver to `a` raised to the power `k`, for a square `a`.
    #[track_caller]
    pub fn pow(&mut self, a: &dyn Matrix, k: usize) {
        self.pow_with(Engine::default(), a, k)
    }

    /// Same as [`Dense::pow`], running general products on the backend of `engine`.
    #[track_caller]
    pub fn pow_with(&mut self, engine: Engine, a: &dyn Matrix, k: usize) {
        let (n, c) = a.dims();
        assert!(n == c);
        match k {
            0 => {
                self.reuse_as(n, n);
                self.as_mut().copy_from(Dense::identity(n).as_ref());
                return;
            }
            1 => {
                self.reuse_as(n, n);
                self.as_mut().copy_from_matrix(a);
                return;
            }
            2 => return self.mul_with(engine, a, a),
            _ => {}
        }

        let mut base = Dense::zeros(n, n);
        base.as_mut().copy_from_matrix(a);
        let mut acc: Option<Dense> = None;
        let mut tmp = Dense::zeros(n, n);
        let mut k = k;
        loop {
            if k & 1 == 1 {
                acc = Some(match acc {
                    None => base.clone(),
                    Some(prev) => {
                        tmp.mul_with(engine, &prev, &base);
                        core::mem::replace(&mut tmp, prev)
                    }
                });
            }
            k >>= 1;
            if k == 0 {
                break;
            }
            tmp.mul_with(engine, &base, &base);
            core::mem::swap(&mut base, &mut tmp);
        }

        self.reuse_as(n, n);
        if let Some(acc) = acc {
            self.as_mut().copy_from(acc.as_ref());
        }
    }

    /// Sets the receiver to the rank-one update `a + alpha * x * yᵀ`.
    #[track_caller]
    pub fn rank_one(&mut self, a: &dyn Matrix, alpha: f64, x: &dyn Matrix, y: &dyn Matrix) {
        let (m, n) = a.dims();
        assert!(all(x.dims() == (m, 1), y.dims() == (n, 1)));
        self.reuse_as(m, n);
        let mut dst = self.as_mut();
        let fp = dst.rb().footprint();
        // vectors sharing memory with the receiver are read before it is modified
        let snapshot = |v: &dyn Matrix, len: usize| {
            (Alias::of(fp, v) != Alias::None).then(|| VecDense::from_vec((0..len).map(|i| v.at(i, 0)).collect()))
        };
        let x_copy = snapshot(x, m);
        let y_copy = snapshot(y, n);
        let x: &dyn Matrix = x_copy.as_ref().map_or(x, |v| v as &dyn Matrix);
        let y: &dyn Matrix = y_copy.as_ref().map_or(y, |v| v as &dyn Matrix);

        dst.copy_from_matrix(a);
        with_vector(x, |x| with_vector(y, |y| level2::ger(dst, alpha, x, y)));
    }

    /// Sets the receiver to the outer product `alpha * x * yᵀ`.
    #[track_caller]
    pub fn outer(&mut self, alpha: f64, x: &dyn Matrix, y: &dyn Matrix) {
        let (m, c) = x.dims();
        let (n, d) = y.dims();
        assert!(all(c == 1, d == 1));
        let mut tmp = Dense::zeros(m, n);
        with_vector(x, |x| with_vector(y, |y| level2::ger(tmp.as_mut(), alpha, x, y)));
        self.reuse_as(m, n);
        self.as_mut().copy_from(tmp.as_ref());
    }
}

impl VecDense {
    /// Sets the receiver to the matrix-vector product `a * b`.
    #[track_caller]
    pub fn mul_vec(&mut self, a: &dyn Matrix, b: &dyn Matrix) {
        let (m, k) = a.dims();
        assert!(b.dims() == (k, 1));
        self.reuse_as_vec(m);
        let dst = self.as_vec_mut().as_column_mut();
        let mut mem = workspace(mul_req_for(dst.rb().footprint(), a, b));
        mul_into(Engine::default(), dst, a, b, PodStack::new(&mut mem));
    }
}

#[track_caller]
fn check_symmetric_target(dst: &SymDense, operands: &[&dyn Matrix]) {
    let fp = dst.as_sym_ref().footprint();
    for op in operands {
        if Alias::of(fp, *op) != Alias::None {
            crate::error::fail(crate::MatError::RegionOverlap);
        }
    }
}

impl SymDense {
    /// Sets the receiver to the symmetric rank-one update `a + alpha * x * xᵀ`.
    #[track_caller]
    pub fn sym_rank_one(&mut self, a: &dyn Symmetric, alpha: f64, x: &dyn Matrix) {
        let n = a.symmetric_dim();
        assert!(x.dims() == (n, 1));
        self.reuse_as_sym(n);
        check_symmetric_target(self, &[x]);
        self.copy_sym(a);
        with_vector(x, |x| level2::syr(self.as_sym_mut(), alpha, x));
    }

    /// Sets the receiver to the symmetric rank-two update `a + alpha * (x * yᵀ + y * xᵀ)`.
    #[track_caller]
    pub fn rank_two(&mut self, a: &dyn Symmetric, alpha: f64, x: &dyn Matrix, y: &dyn Matrix) {
        let n = a.symmetric_dim();
        assert!(all(x.dims() == (n, 1), y.dims() == (n, 1)));
        self.reuse_as_sym(n);
        check_symmetric_target(self, &[x, y]);
        self.copy_sym(a);
        with_vector(x, |x| with_vector(y, |y| level2::syr2(self.as_sym_mut(), alpha, x, y)));
    }

    /// Sets the receiver to `alpha * x * xᵀ`, for an `n × k` matrix `x`.
    #[track_caller]
    pub fn sym_outer_k(&mut self, alpha: f64, x: &dyn Matrix) {
        let (n, _) = x.dims();
        self.reuse_as_sym(n);
        check_symmetric_target(self, &[x]);
        match x.as_general() {
            Some(g) => level3::syrk(self.as_sym_mut(), alpha, g, 0.0),
            None => {
                let owned = Dense::from_fn(n, x.dims().1, |i, j| x.at(i, j));
                level3::syrk(self.as_sym_mut(), alpha, owned.as_ref(), 0.0)
            }
        }
    }
}

impl TriDense {
    /// Sets the receiver to the product `a * b` of two triangular matrices stored on the same
    /// side, which is triangular on that side too.
    #[track_caller]
    pub fn mul_tri(&mut self, a: &dyn Triangular, b: &dyn Triangular) {
        let (n, side) = a.triangle();
        assert!(b.triangle() == (n, side));
        let owned_a;
        let ta = match a.as_triangular() {
            Some(t) => t,
            None => {
                owned_a = TriDense::from_fn(n, side, |i, j| a.at(i, j));
                owned_a.as_tri_ref()
            }
        };
        let b = Dense::from_fn(n, n, |i, j| b.at(i, j));
        let mut prod = Dense::zeros(n, n);
        level3::trmm(MulSide::Left, prod.as_mut(), 1.0, ta, false, b.as_ref());

        self.reuse_as_tri(n, side);
        self.as_tri_mut().copy_from(TriangularRef::new(prod.as_ref(), side));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert;
    use crate::{mat, mat::equal_approx, vector, Side, Transpose};
    use assert_approx_eq::assert_approx_eq;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn naive(a: &dyn Matrix, b: &dyn Matrix) -> Dense {
        let (m, k) = a.dims();
        let n = b.dims().1;
        Dense::from_fn(m, n, |i, j| (0..k).map(|l| a.at(i, l) * b.at(l, j)).sum())
    }

    struct Hilbert(usize);

    impl Matrix for Hilbert {
        fn dims(&self) -> (usize, usize) {
            (self.0, self.0)
        }

        fn at(&self, i: usize, j: usize) -> f64 {
            1.0 / (i + j + 1) as f64
        }
    }

    #[test]
    fn dispatch_paths_agree() {
        let mut rng = StdRng::seed_from_u64(2);
        let g = Dense::from_fn(4, 4, |_, _| rng.gen::<f64>());
        let s = SymDense::from_fn(4, |i, j| (i * j) as f64 + 1.0);
        let t = TriDense::from_fn(4, Side::Lower, |i, j| (i + j) as f64 - 2.0);
        let v = vector![1.0, -1.0, 2.0, 0.5];
        let h = Hilbert(4);

        let gt = g.t();
        let operands: [&dyn Matrix; 5] = [&g, &s, &t, &h, &gt];
        for a in operands {
            for b in operands {
                let mut c = Dense::new();
                c.mul(a, b);
                assert!(equal_approx(&c, &naive(a, b), 1e-12));
            }
            let mut y = VecDense::new();
            y.mul_vec(a, &v);
            assert!(equal_approx(&y, &naive(a, &v), 1e-12));
        }
    }

    #[test]
    fn empty_receiver_grows() {
        let a = Dense::identity(4);
        let mut c = Dense::new();
        c.mul(&a, &a);
        assert!(c == Dense::identity(4));
    }

    #[test]
    #[should_panic]
    fn mismatched_receiver_panics() {
        let a = Dense::identity(2);
        let mut c = Dense::zeros(3, 3);
        c.mul(&a, &a);
    }

    #[test]
    fn engines_agree() {
        let a = Dense::from_fn(5, 3, |i, j| (i as f64).sin() + j as f64);
        let b = Dense::from_fn(3, 4, |i, j| (j as f64).cos() - i as f64);
        let mut c0 = Dense::new();
        let mut c1 = Dense::new();
        c0.mul_with(Engine::NATIVE, &a, &b);
        c1.mul_with(Engine::REFERENCE, &a, &b);
        assert!(equal_approx(&c0, &c1, 1e-13));
    }

    #[test]
    fn in_place_products() {
        let a = mat![[1.0, 2.0], [3.0, 4.0]];
        let b = mat![[0.0, 1.0], [1.0, 0.0]];
        let mut c = a.clone();
        c.mul_assign_right(&b);
        assert!(c == mat![[2.0, 1.0], [4.0, 3.0]]);
        let mut c = a.clone();
        c.mul_assign_left(&b);
        assert!(c == mat![[3.0, 4.0], [1.0, 2.0]]);
        let mut c = a.clone();
        c.mul_assign_right(&a.clone());
        assert!(c == naive(&a, &a));
    }

    #[test]
    fn receiver_overlapping_operand() {
        // dst is the bottom 2 × 2 block of a 3 × 2 buffer, the operand is the top block
        let mut data = vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        let ptr = data.as_mut_ptr();
        let src = unsafe { crate::GeneralRef::from_raw_parts(ptr, 2, 2, 2, 1) };
        let dst = unsafe { GeneralMut::from_raw_parts_mut(ptr.add(2), 2, 2, 2, 1) };
        let expected = naive(&src, &src);
        let mut mem = workspace(mul_req(2, 2));
        mul_into(Engine::default(), dst, &src, &src, PodStack::new(&mut mem));
        assert_eq!(&data[2..], expected.raw_data());
    }

    #[test]
    fn exponential() {
        let mut e = Dense::new();
        e.exp(&mat![[1.0]]);
        assert_approx_eq!(e.at(0, 0), 1f64.exp());

        let mut e = Dense::new();
        e.exp(&mat![[0.0, 1.0], [0.0, 0.0]]);
        assert!(equal_approx(&e, &mat![[1.0, 1.0], [0.0, 1.0]], 1e-14));

        let mut e = Dense::new();
        e.exp(&mat![[1.0, 0.0], [0.0, 2.0]]);
        assert!(equal_approx(&e, &mat![[1f64.exp(), 0.0], [0.0, 2f64.exp()]], 1e-12));

        // rotation generator
        let mut e = Dense::new();
        e.exp(&mat![[0.0, -1.0], [1.0, 0.0]]);
        let (c, s) = (1f64.cos(), 1f64.sin());
        assert!(equal_approx(&e, &mat![[c, -s], [s, c]], 1e-12));
    }

    #[test]
    fn power() {
        let a = mat![[1.0, 1.0], [1.0, 0.0]];
        let mut p = Dense::new();
        p.pow(&a, 0);
        assert!(p == Dense::identity(2));
        for (k, fib) in [(1, 1.0), (2, 1.0), (5, 5.0), (10, 55.0), (13, 233.0)] {
            let mut p = Dense::new();
            p.pow(&a, k);
            assert!(p.at(0, 1) == fib);
        }
    }

    #[test]
    fn rank_updates() {
        let a = Dense::identity(2);
        let x = vector![1.0, 2.0];
        let y = vector![3.0, 4.0];
        let mut r = Dense::new();
        r.rank_one(&a, 2.0, &x, &y);
        assert!(r == mat![[7.0, 8.0], [12.0, 17.0]]);

        let mut o = Dense::new();
        o.outer(1.0, &x, &y);
        assert!(o == mat![[3.0, 4.0], [6.0, 8.0]]);

        let s = SymDense::from_fn(2, |i, j| (i + j) as f64);
        let mut r = SymDense::new();
        r.sym_rank_one(&s, 1.0, &x);
        assert!(r.to_dense() == mat![[1.0, 3.0], [3.0, 6.0]]);

        let mut r = SymDense::new();
        r.rank_two(&s, 0.5, &x, &y);
        assert!(r.to_dense() == mat![[3.0, 6.0], [6.0, 10.0]]);

        let mut k = SymDense::new();
        k.sym_outer_k(1.0, &mat![[1.0, 2.0], [3.0, 4.0]]);
        assert!(k.to_dense() == mat![[5.0, 11.0], [11.0, 25.0]]);
    }

    #[test]
    fn triangular_product() {
        let a = TriDense::from_fn(3, Side::Upper, |i, j| (1 + i + j) as f64);
        let b = TriDense::from_fn(3, Side::Upper, |i, j| (i as f64) - (j as f64) + 2.0);
        let mut c = TriDense::new();
        c.mul_tri(&a, &b);
        assert!(c.to_dense() == naive(&a, &b));

        let lower: Transpose<'_, TriDense> = a.t();
        let mut d = TriDense::new();
        d.mul_tri(&lower, &b.t());
        assert!(d.side() == Side::Lower);
        assert!(d.to_dense() == naive(&lower, &b.t()));
    }
}
