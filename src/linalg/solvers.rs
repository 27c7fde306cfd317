//! High level solvers.
//!
//! [`Solver`] abstracts over the decompositions that can solve a linear system, and
//! [`Dense::solve`] picks the decomposition matching the shape of the system.

use crate::{
    assert,
    error::MatError,
    linalg::{cholesky::Cholesky, lq::Lq, lu::Lu, qr::Qr},
    Dense, Matrix, VecDense,
};
use core::cmp::Ordering;

/// Decomposition that can solve the linear system of the matrix it factorized.
pub trait Solver {
    /// Stores in `dst` the solution `x` of `A x = b`, in the sense of the decomposition: exact
    /// for square systems, least squares for overdetermined ones, and minimum norm for
    /// underdetermined ones.
    fn solve_into(&self, dst: &mut Dense, b: &dyn Matrix) -> Result<(), MatError>;

    /// Same as [`Solver::solve_into`], with `Aᵀ` in place of `A`.
    fn solve_transpose_into(&self, dst: &mut Dense, b: &dyn Matrix) -> Result<(), MatError>;
}

const _: () = {
    fn __assert_object_safe() {
        let _: Option<&dyn Solver> = None;
    }
};

impl Solver for Lu {
    #[track_caller]
    fn solve_into(&self, dst: &mut Dense, b: &dyn Matrix) -> Result<(), MatError> {
        self.solve_to(dst, false, b)
    }

    #[track_caller]
    fn solve_transpose_into(&self, dst: &mut Dense, b: &dyn Matrix) -> Result<(), MatError> {
        self.solve_to(dst, true, b)
    }
}

impl Solver for Cholesky {
    #[track_caller]
    fn solve_into(&self, dst: &mut Dense, b: &dyn Matrix) -> Result<(), MatError> {
        self.solve_to(dst, b)
    }

    #[track_caller]
    fn solve_transpose_into(&self, dst: &mut Dense, b: &dyn Matrix) -> Result<(), MatError> {
        self.solve_to(dst, b)
    }
}

impl Solver for Qr {
    #[track_caller]
    fn solve_into(&self, dst: &mut Dense, b: &dyn Matrix) -> Result<(), MatError> {
        self.solve_to(dst, false, b)
    }

    #[track_caller]
    fn solve_transpose_into(&self, dst: &mut Dense, b: &dyn Matrix) -> Result<(), MatError> {
        self.solve_to(dst, true, b)
    }
}

impl Solver for Lq {
    #[track_caller]
    fn solve_into(&self, dst: &mut Dense, b: &dyn Matrix) -> Result<(), MatError> {
        self.solve_to(dst, false, b)
    }

    #[track_caller]
    fn solve_transpose_into(&self, dst: &mut Dense, b: &dyn Matrix) -> Result<(), MatError> {
        self.solve_to(dst, true, b)
    }
}

/// Factorizes `a` with the decomposition matching its shape.
#[track_caller]
fn decompose(a: &dyn Matrix) -> Box<dyn Solver> {
    let (m, n) = a.dims();
    match m.cmp(&n) {
        Ordering::Equal => {
            let mut lu = Lu::new();
            lu.factorize(a);
            Box::new(lu)
        }
        Ordering::Greater => {
            let mut qr = Qr::new();
            qr.factorize(a);
            Box::new(qr)
        }
        Ordering::Less => {
            let mut lq = Lq::new();
            lq.factorize(a);
            Box::new(lq)
        }
    }
}

impl Dense {
    /// Sets the receiver to the solution `x` of `A x = b`.
    ///
    /// A square `a` is solved with the [LU decomposition](Lu), an overdetermined system (more
    /// rows than columns) in the least squares sense with the [QR decomposition](Qr), and an
    /// underdetermined system (fewer rows than columns) for the minimum norm solution with the
    /// [LQ decomposition](Lq).
    ///
    /// # Errors
    /// Returns [`MatError::Singular`] if `a` is singular or near singular, or
    /// [`MatError::NotFullRank`] for a rank deficient rectangular `a`. The receiver is left
    /// untouched.
    ///
    /// # Panics
    /// Panics if `a` and `b` do not have the same number of rows.
    #[track_caller]
    pub fn solve(&mut self, a: &dyn Matrix, b: &dyn Matrix) -> Result<(), MatError> {
        assert!(a.dims().0 == b.dims().0);
        decompose(a).solve_into(self, b)
    }

    /// Sets the receiver to the inverse of the square matrix `a`.
    ///
    /// # Errors
    /// Returns [`MatError::Singular`] and leaves the receiver untouched if `a` is singular or
    /// near singular.
    #[track_caller]
    pub fn inverse(&mut self, a: &dyn Matrix) -> Result<(), MatError> {
        let (m, n) = a.dims();
        assert!(m == n);
        let mut lu = Lu::new();
        lu.factorize(a);
        lu.solve_to(self, false, &Dense::identity(n))
    }
}

impl VecDense {
    /// Sets the receiver to the solution `x` of `A x = b`, for a column vector `b`, following
    /// the same rules as [`Dense::solve`].
    #[track_caller]
    pub fn solve_vec(&mut self, a: &dyn Matrix, b: &dyn Matrix) -> Result<(), MatError> {
        let (m, n) = a.dims();
        assert!(b.dims() == (m, 1));
        match m.cmp(&n) {
            Ordering::Equal => {
                let mut lu = Lu::new();
                lu.factorize(a);
                lu.solve_vec_to(self, false, b)
            }
            Ordering::Greater => {
                let mut qr = Qr::new();
                qr.factorize(a);
                qr.solve_vec_to(self, false, b)
            }
            Ordering::Less => {
                let mut lq = Lq::new();
                lq.factorize(a);
                lq.solve_vec_to(self, false, b)
            }
        }
    }
}

/// Returns the determinant of the square matrix `a`.
#[track_caller]
pub fn det(a: &dyn Matrix) -> f64 {
    let (log_abs, sign) = log_det(a);
    sign * log_abs.exp()
}

/// Returns the natural logarithm of the absolute value of the determinant of the square matrix
/// `a`, and its sign. For a singular matrix this is `(-inf, 0.0)`.
#[track_caller]
pub fn log_det(a: &dyn Matrix) -> (f64, f64) {
    let (m, n) = a.dims();
    assert!(m == n);
    if let Some(t) = a.as_triangular() {
        let mut sign = 1.0;
        let mut log_abs = 0.0;
        for k in 0..n {
            let d = t.read(k, k);
            if d < 0.0 {
                sign = -sign;
            }
            log_abs += d.abs().ln();
        }
        if log_abs == f64::NEG_INFINITY {
            sign = 0.0;
        }
        return (log_abs, sign);
    }
    let mut lu = Lu::new();
    lu.factorize(a);
    lu.log_det()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert;
    use crate::{mat, mat::equal_approx, vector, Side, TriDense};
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn dispatch_on_shape() {
        let square = mat![[2.0, 1.0], [1.0, 3.0]];
        let mut x = Dense::new();
        x.solve(&square, &mat![[3.0], [4.0]]).unwrap();
        assert!(equal_approx(&x, &mat![[1.0], [1.0]], 1e-14));

        let tall = mat![[1.0], [1.0], [1.0]];
        let mut x = Dense::new();
        x.solve(&tall, &mat![[1.0], [2.0], [6.0]]).unwrap();
        assert_approx_eq!(x.at(0, 0), 3.0, 1e-14);

        let wide = mat![[1.0, 1.0, 1.0]];
        let mut x = Dense::new();
        x.solve(&wide, &mat![[3.0]]).unwrap();
        assert!(equal_approx(&x, &mat![[1.0], [1.0], [1.0]], 1e-14));

        let mut v = VecDense::new();
        v.solve_vec(&wide, &vector![6.0]).unwrap();
        assert!(v.len() == 3);
        assert_approx_eq!(v.at_vec(2), 2.0, 1e-14);
    }

    #[test]
    fn singular_square_system() {
        let a = mat![[1.0, 2.0], [2.0, 4.0]];
        let mut x = Dense::new();
        assert!(matches!(x.solve(&a, &mat![[1.0], [2.0]]), Err(MatError::Singular { .. })));
        assert!(matches!(x.inverse(&a), Err(MatError::Singular { .. })));
        assert!(x.is_empty());
        assert!(det(&a) == 0.0);
    }

    #[test]
    fn inverse_and_determinant() {
        let a = mat![[4.0, 7.0], [2.0, 6.0]];
        let mut inv = Dense::new();
        inv.inverse(&a).unwrap();
        assert!(equal_approx(&inv, &mat![[0.6, -0.7], [-0.2, 0.4]], 1e-14));
        assert_approx_eq!(det(&a), 10.0, 1e-13);

        let t = TriDense::from_vec(2, Side::Lower, vec![-2.0, 0.0, 5.0, 3.0]);
        let (log_abs, sign) = log_det(&t);
        assert_approx_eq!(log_abs, 6f64.ln(), 1e-14);
        assert!(sign == -1.0);
    }

    #[test]
    fn decompositions_as_solvers() {
        let a = mat![[2.0, 1.0], [1.0, 3.0]];
        let mut chol = Cholesky::new();
        chol.factorize_general(&a).unwrap();
        let mut lu = Lu::new();
        lu.factorize(&a);

        let b = mat![[1.0], [-1.0]];
        let solvers: [&dyn Solver; 2] = [&chol, &lu];
        for s in solvers {
            let mut x = Dense::new();
            s.solve_into(&mut x, &b).unwrap();
            let mut y = Dense::new();
            s.solve_transpose_into(&mut y, &b).unwrap();
            assert!(equal_approx(&x, &y, 1e-14));
            assert!(equal_approx(&x, &mat![[0.8], [-0.6]], 1e-14));
        }
    }
}
