//! Numerical kernels.
//!
//! [`level1`], [`level2`] and [`level3`] hold the vector, matrix-vector and structured
//! matrix-matrix kernels. The general matrix product is abstracted behind [`Backend`] so that
//! an [`Engine`] can be pointed at a different implementation, e.g. the [`Reference`] loops when
//! checking results.

use crate::{assert, GeneralMut, GeneralRef, VectorRef};
use reborrow::*;

pub mod level1;
pub mod level2;
pub mod level3;

/// Position of the structured operand in a product.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MulSide {
    /// The structured operand is the left factor.
    Left,
    /// The structured operand is the right factor.
    Right,
}

/// Diagonal of a triangular operand.
#[derive(Copy, Clone, Debug)]
pub enum Diag<'a> {
    /// The diagonal is implicitly one and is not read.
    Unit,
    /// The diagonal is read from the storage of the triangular matrix.
    Stored,
    /// The diagonal is taken from the given vector instead of the storage.
    Explicit(VectorRef<'a>),
}

impl Diag<'_> {
    #[inline(always)]
    pub(crate) fn get(&self, storage: GeneralRef<'_>, k: usize) -> f64 {
        match self {
            Diag::Unit => 1.0,
            Diag::Stored => storage.read(k, k),
            Diag::Explicit(d) => d.read(k),
        }
    }
}

/// Provider of the general matrix product.
pub trait Backend: Sync + core::fmt::Debug {
    /// Computes `dst = alpha * lhs * rhs + beta * dst`.
    ///
    /// Implementations may assume that the shapes are compatible, that no dimension is zero,
    /// and that `dst` shares no memory with `lhs` or `rhs`. With `beta == 0.0` the previous
    /// contents of `dst` must not be read.
    fn gemm(&self, dst: GeneralMut<'_>, alpha: f64, lhs: GeneralRef<'_>, rhs: GeneralRef<'_>, beta: f64);

    /// Name of the backend, used in log messages.
    fn name(&self) -> &'static str;
}

/// Backend running the general product through the `gemm` crate.
#[derive(Copy, Clone, Debug, Default)]
pub struct Native;

/// Backend running the general product with plain inner products.
#[derive(Copy, Clone, Debug, Default)]
pub struct Reference;

impl Backend for Native {
    fn gemm(&self, mut dst: GeneralMut<'_>, alpha: f64, lhs: GeneralRef<'_>, rhs: GeneralRef<'_>, beta: f64) {
        let (m, n) = dst.shape();
        let k = lhs.ncols();
        unsafe {
            gemm::gemm(
                m,
                n,
                k,
                dst.rb_mut().as_ptr_mut(),
                dst.col_stride() as isize,
                dst.row_stride() as isize,
                beta != 0.0,
                lhs.as_ptr(),
                lhs.col_stride() as isize,
                lhs.row_stride() as isize,
                rhs.as_ptr(),
                rhs.col_stride() as isize,
                rhs.row_stride() as isize,
                beta,
                alpha,
                false,
                false,
                false,
                gemm::Parallelism::None,
            )
        };
    }

    fn name(&self) -> &'static str {
        "native"
    }
}

impl Backend for Reference {
    fn gemm(&self, mut dst: GeneralMut<'_>, alpha: f64, lhs: GeneralRef<'_>, rhs: GeneralRef<'_>, beta: f64) {
        let (m, n) = dst.shape();
        for i in 0..m {
            let row = lhs.row(i);
            for j in 0..n {
                let v = alpha * level1::dot(row, rhs.col(j));
                let prev = if beta == 0.0 { 0.0 } else { beta * unsafe { dst.read_unchecked(i, j) } };
                unsafe { dst.write_unchecked(i, j, prev + v) };
            }
        }
    }

    fn name(&self) -> &'static str {
        "reference"
    }
}

/// Handle selecting the [`Backend`] used by the arithmetic routines.
///
/// The default engine uses [`Native`]. Engines are cheap to copy and are passed explicitly to
/// the `*_with` variants of the arithmetic methods.
#[derive(Copy, Clone, Debug)]
pub struct Engine {
    backend: &'static dyn Backend,
}

impl Default for Engine {
    #[inline]
    fn default() -> Self {
        Self::NATIVE
    }
}

impl Engine {
    /// Engine using the [`Native`] backend.
    pub const NATIVE: Engine = Engine { backend: &Native };
    /// Engine using the [`Reference`] backend.
    pub const REFERENCE: Engine = Engine { backend: &Reference };

    /// Creates an engine using the given backend.
    #[inline]
    pub const fn new(backend: &'static dyn Backend) -> Self {
        Self { backend }
    }

    /// Returns the backend of the engine.
    #[inline]
    pub fn backend(&self) -> &'static dyn Backend {
        self.backend
    }

    /// Computes `dst = alpha * lhs * rhs + beta * dst`.
    ///
    /// # Panics
    /// Panics if the shapes are not compatible.
    #[track_caller]
    pub fn gemm(&self, mut dst: GeneralMut<'_>, alpha: f64, lhs: GeneralRef<'_>, rhs: GeneralRef<'_>, beta: f64) {
        let (m, n) = dst.shape();
        assert!(all(lhs.nrows() == m, rhs.ncols() == n, lhs.ncols() == rhs.nrows()));
        if m == 0 || n == 0 {
            return;
        }
        if lhs.ncols() == 0 || alpha == 0.0 {
            if beta == 0.0 {
                dst.fill(0.0);
            } else if beta != 1.0 {
                for i in 0..m {
                    level1::scal(beta, dst.rb_mut().row_mut(i));
                }
            }
            return;
        }
        self.backend.gemm(dst, alpha, lhs, rhs, beta)
    }
}
