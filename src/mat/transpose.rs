use super::*;

/// Lazy transpose of a matrix.
///
/// Reading `(i, j)` reads `(j, i)` of the wrapped matrix. The raw storage probes are forwarded
/// with their strides swapped, so transposed operands keep the strided fast paths.
#[derive(Copy, Clone)]
pub struct Transpose<'a, M: ?Sized> {
    pub(super) inner: &'a M,
}

impl<'a, M: ?Sized> Transpose<'a, M> {
    /// Returns the wrapped matrix.
    #[inline]
    pub fn untranspose(&self) -> &'a M {
        self.inner
    }
}

impl<M: Matrix + ?Sized> Matrix for Transpose<'_, M> {
    #[inline]
    fn dims(&self) -> (usize, usize) {
        let (r, c) = self.inner.dims();
        (c, r)
    }

    #[track_caller]
    #[inline]
    fn at(&self, i: usize, j: usize) -> f64 {
        self.inner.at(j, i)
    }

    #[inline]
    fn as_general(&self) -> Option<GeneralRef<'_>> {
        self.inner.as_general().map(GeneralRef::transpose)
    }

    #[inline]
    fn as_symmetric(&self) -> Option<SymmetricRef<'_>> {
        self.inner.as_symmetric()
    }

    #[inline]
    fn as_triangular(&self) -> Option<TriangularRef<'_>> {
        self.inner.as_triangular().map(TriangularRef::transpose)
    }
}

impl<M: Symmetric + ?Sized> Symmetric for Transpose<'_, M> {
    #[inline]
    fn symmetric_dim(&self) -> usize {
        self.inner.symmetric_dim()
    }
}

impl<M: Triangular + ?Sized> Triangular for Transpose<'_, M> {
    #[inline]
    fn triangle(&self) -> (usize, Side) {
        let (n, side) = self.inner.triangle();
        (n, side.flip())
    }
}

impl<M: Matrix + ?Sized> core::fmt::Debug for Transpose<'_, M> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        fmt_rows(f, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert, mat};

    struct Hilbert(usize);

    impl Matrix for Hilbert {
        fn dims(&self) -> (usize, usize) {
            (self.0, self.0 + 1)
        }

        fn at(&self, i: usize, j: usize) -> f64 {
            1.0 / (i + j + 1) as f64
        }
    }

    #[test]
    fn transpose_of_general() {
        let a = mat![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let t = a.t();
        assert!(t.dims() == (3, 2));
        assert!(t.at(2, 1) == 6.0);
        let g = t.as_general().map(|g| (g.row_stride(), g.col_stride()));
        assert!(g == Some((1, 3)));
        assert!(core::ptr::eq(t.untranspose(), &a));
    }

    #[test]
    fn transpose_of_user_matrix() {
        let h = Hilbert(2);
        let dyn_h: &dyn Matrix = &h;
        let t = <dyn Matrix>::t(dyn_h);
        assert!(t.dims() == (3, 2));
        assert!(t.at(2, 0) == 1.0 / 3.0);
        assert!(t.as_general().is_none());
    }

    #[test]
    fn double_transpose() {
        let a = mat![[1.0, 2.0], [3.0, 4.0]];
        let t = a.t();
        let tt = t.t();
        assert!(tt.at(0, 1) == 2.0);
        assert!(tt.as_general().map(|g| g.col_stride()) == Some(1));
    }
}
