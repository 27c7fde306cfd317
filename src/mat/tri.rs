use super::*;
use crate::{
    assert,
    error::{fail, MatError},
};

/// Immutable view over a triangular matrix.
///
/// Elements on the structurally zero side read as `0.0` and the storage there is never
/// accessed.
#[derive(Copy, Clone)]
pub struct TriangularRef<'a> {
    inner: GeneralRef<'a>,
    side: Side,
}

/// Mutable view over a triangular matrix.
pub struct TriangularMut<'a> {
    inner: GeneralMut<'a>,
    side: Side,
}

impl<'short> Reborrow<'short> for TriangularMut<'_> {
    type Target = TriangularRef<'short>;

    #[inline]
    fn rb(&'short self) -> Self::Target {
        TriangularRef {
            inner: self.inner.rb(),
            side: self.side,
        }
    }
}

impl<'short> ReborrowMut<'short> for TriangularMut<'_> {
    type Target = TriangularMut<'short>;

    #[inline]
    fn rb_mut(&'short mut self) -> Self::Target {
        TriangularMut {
            inner: self.inner.rb_mut(),
            side: self.side,
        }
    }
}

impl<'a> IntoConst for TriangularMut<'a> {
    type Target = TriangularRef<'a>;

    #[inline]
    fn into_const(self) -> Self::Target {
        TriangularRef {
            inner: self.inner.into_const(),
            side: self.side,
        }
    }
}

#[inline(always)]
fn is_stored(side: Side, i: usize, j: usize) -> bool {
    match side {
        Side::Upper => i <= j,
        Side::Lower => i >= j,
    }
}

impl<'a> TriangularRef<'a> {
    /// Creates a triangular view over the given square storage.
    #[track_caller]
    #[inline]
    pub fn new(storage: GeneralRef<'a>, side: Side) -> Self {
        assert!(storage.nrows() == storage.ncols());
        Self {
            inner: storage,
            side,
        }
    }

    /// Returns the dimension of the matrix.
    #[inline]
    pub fn dim(&self) -> usize {
        self.inner.nrows()
    }

    /// Returns the stored side of the matrix.
    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Returns the underlying storage. Only the stored side is meaningful.
    #[inline]
    pub fn storage(self) -> GeneralRef<'a> {
        self.inner
    }

    /// Returns a view over the transpose of `self`, stored on the opposite side.
    #[inline]
    #[must_use]
    pub fn transpose(self) -> Self {
        Self {
            inner: self.inner.transpose(),
            side: self.side.flip(),
        }
    }

    /// Reads the element at the given indices, with no bound checks.
    ///
    /// # Safety
    /// Both indices must be less than `self.dim()`.
    #[inline(always)]
    pub unsafe fn read_unchecked(&self, i: usize, j: usize) -> f64 {
        if is_stored(self.side, i, j) {
            self.inner.read_unchecked(i, j)
        } else {
            0.0
        }
    }

    /// Reads the element at the given indices.
    #[track_caller]
    #[inline(always)]
    pub fn read(&self, i: usize, j: usize) -> f64 {
        assert!(all(i < self.dim(), j < self.dim()));
        unsafe { self.read_unchecked(i, j) }
    }

    /// Returns the memory footprint of the storage.
    #[inline]
    pub fn footprint(&self) -> Footprint {
        self.inner.footprint()
    }
}

impl<'a> TriangularMut<'a> {
    /// Creates a mutable triangular view over the given square storage.
    #[track_caller]
    #[inline]
    pub fn new(storage: GeneralMut<'a>, side: Side) -> Self {
        assert!(storage.nrows() == storage.ncols());
        Self {
            inner: storage,
            side,
        }
    }

    /// Returns the dimension of the matrix.
    #[inline]
    pub fn dim(&self) -> usize {
        self.inner.nrows()
    }

    /// Returns the stored side of the matrix.
    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Returns the underlying storage.
    #[inline]
    pub fn storage_mut(self) -> GeneralMut<'a> {
        self.inner
    }

    /// Reads the element at the given indices.
    #[track_caller]
    #[inline(always)]
    pub fn read(&self, i: usize, j: usize) -> f64 {
        self.rb().read(i, j)
    }

    /// Writes the element at the given indices.
    ///
    /// # Panics
    /// Panics with [`MatError::TriangleSet`] if `(i, j)` lies on the structurally zero side.
    #[track_caller]
    #[inline]
    pub fn write(&mut self, i: usize, j: usize, value: f64) {
        assert!(all(i < self.dim(), j < self.dim()));
        if !is_stored(self.side, i, j) {
            fail(MatError::TriangleSet);
        }
        unsafe { self.inner.write_unchecked(i, j, value) }
    }

    /// Copies the stored side of `other`, which must be stored on the same side, into `self`.
    #[track_caller]
    pub fn copy_from(&mut self, other: TriangularRef<'_>) {
        let n = self.dim();
        assert!(all(other.dim() == n, other.side == self.side));
        match (*self).rb().footprint().classify(&other.footprint()) {
            Overlap::Identical => return,
            Overlap::Partial => fail(MatError::RegionOverlap),
            Overlap::Disjoint => {}
        }
        for i in 0..n {
            let (start, len) = match self.side {
                Side::Upper => (i, n - i),
                Side::Lower => (0, i + 1),
            };
            self.inner
                .rb_mut()
                .row_mut(i)
                .subvec_mut(start, len)
                .copy_from(other.inner.row(i).subvec(start, len));
        }
    }
}

impl Matrix for TriangularRef<'_> {
    #[inline]
    fn dims(&self) -> (usize, usize) {
        (self.dim(), self.dim())
    }

    #[track_caller]
    #[inline]
    fn at(&self, i: usize, j: usize) -> f64 {
        self.read(i, j)
    }

    #[inline]
    fn as_triangular(&self) -> Option<TriangularRef<'_>> {
        Some(*self)
    }
}

impl Triangular for TriangularRef<'_> {
    #[inline]
    fn triangle(&self) -> (usize, Side) {
        (self.dim(), self.side)
    }
}

impl Matrix for TriangularMut<'_> {
    #[inline]
    fn dims(&self) -> (usize, usize) {
        (self.dim(), self.dim())
    }

    #[track_caller]
    #[inline]
    fn at(&self, i: usize, j: usize) -> f64 {
        self.read(i, j)
    }

    #[inline]
    fn as_triangular(&self) -> Option<TriangularRef<'_>> {
        Some(self.rb())
    }
}

impl MatrixMut for TriangularMut<'_> {
    #[track_caller]
    #[inline]
    fn set(&mut self, i: usize, j: usize, value: f64) {
        self.write(i, j, value)
    }
}

impl Triangular for TriangularMut<'_> {
    #[inline]
    fn triangle(&self) -> (usize, Side) {
        (self.dim(), self.side)
    }
}

/// Owning triangular matrix stored in a row-major buffer.
///
/// The structurally zero side of the buffer is kept filled with zeros.
#[derive(Clone)]
pub struct TriDense {
    n: usize,
    side: Side,
    data: Vec<f64>,
}

impl Default for TriDense {
    fn default() -> Self {
        Self {
            n: 0,
            side: Side::Upper,
            data: Vec::new(),
        }
    }
}

impl TriDense {
    /// Returns an empty matrix, which can be used as the receiver of any operation.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an `n × n` triangular matrix filled with zeros.
    ///
    /// # Panics
    /// Panics with [`MatError::ZeroLength`] if `n == 0`.
    #[track_caller]
    pub fn zeros(n: usize, side: Side) -> Self {
        if n == 0 {
            fail(MatError::ZeroLength);
        }
        Self {
            n,
            side,
            data: vec![0.0; n * n],
        }
    }

    /// Creates an `n × n` triangular matrix from a row-major buffer. Elements of `data` on the
    /// structurally zero side are discarded.
    #[track_caller]
    pub fn from_vec(n: usize, side: Side, mut data: Vec<f64>) -> Self {
        if n == 0 {
            fail(MatError::ZeroLength);
        }
        assert!(data.len() == n * n);
        for i in 0..n {
            for j in 0..n {
                if !is_stored(side, i, j) {
                    data[i * n + j] = 0.0;
                }
            }
        }
        Self { n, side, data }
    }

    /// Creates an `n × n` triangular matrix whose stored elements are `f(i, j)`.
    #[track_caller]
    pub fn from_fn(n: usize, side: Side, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut out = Self::zeros(n, side);
        for i in 0..n {
            for j in 0..n {
                if is_stored(side, i, j) {
                    out.data[i * n + j] = f(i, j);
                }
            }
        }
        out
    }

    /// Returns `true` if the matrix has zero size.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Empties the matrix, keeping the allocated memory for later reuse.
    #[inline]
    pub fn reset(&mut self) {
        self.n = 0;
        self.data.clear();
    }

    /// Prepares `self` to receive an `n × n` result stored on `side`: an empty matrix is
    /// resized, a non-empty one must already have this dimension and side.
    #[track_caller]
    pub fn reuse_as_tri(&mut self, n: usize, side: Side) {
        if n == 0 {
            fail(MatError::ZeroLength);
        }
        if self.is_empty() {
            self.n = n;
            self.side = side;
            self.data.clear();
            self.data.resize(n * n, 0.0);
        } else {
            assert!(all(self.n == n, self.side == side));
        }
    }

    /// Returns the dimension of the matrix.
    #[inline]
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Returns the stored side of the matrix.
    #[inline]
    pub fn side(&self) -> Side {
        self.side
    }

    /// Sets the element `(i, j)`.
    ///
    /// # Panics
    /// Panics with [`MatError::TriangleSet`] if `(i, j)` lies on the structurally zero side.
    #[track_caller]
    #[inline]
    pub fn set_tri(&mut self, i: usize, j: usize, value: f64) {
        self.as_tri_mut().write(i, j, value)
    }

    /// Returns the row-major storage.
    #[inline]
    pub fn raw_data(&self) -> &[f64] {
        &self.data
    }

    /// Returns a view over the matrix.
    #[inline]
    pub fn as_tri_ref(&self) -> TriangularRef<'_> {
        TriangularRef {
            inner: GeneralRef::from_row_major_slice(&self.data, self.n, self.n),
            side: self.side,
        }
    }

    /// Returns a mutable view over the matrix.
    #[inline]
    pub fn as_tri_mut(&mut self) -> TriangularMut<'_> {
        let n = self.n;
        TriangularMut {
            inner: GeneralMut::from_row_major_slice_mut(&mut self.data, n, n),
            side: self.side,
        }
    }

    /// Copies the triangular matrix `a` into the receiver, which takes the side of `a`.
    #[track_caller]
    pub fn copy_tri(&mut self, a: &dyn Triangular) {
        let (n, side) = a.triangle();
        self.reuse_as_tri(n, side);
        if let Some(t) = a.as_triangular() {
            return self.as_tri_mut().copy_from(t);
        }
        for i in 0..n {
            for j in 0..n {
                if is_stored(side, i, j) {
                    self.data[i * n + j] = a.at(i, j);
                }
            }
        }
    }

    /// Returns the matrix as a [`Dense`].
    pub fn to_dense(&self) -> Dense {
        Dense::from_vec(self.n, self.n, self.data.clone())
    }
}

impl Matrix for TriDense {
    #[inline]
    fn dims(&self) -> (usize, usize) {
        (self.n, self.n)
    }

    #[track_caller]
    #[inline]
    fn at(&self, i: usize, j: usize) -> f64 {
        self.as_tri_ref().read(i, j)
    }

    #[inline]
    fn as_triangular(&self) -> Option<TriangularRef<'_>> {
        Some(self.as_tri_ref())
    }
}

impl MatrixMut for TriDense {
    #[track_caller]
    #[inline]
    fn set(&mut self, i: usize, j: usize, value: f64) {
        self.set_tri(i, j, value)
    }
}

impl Triangular for TriDense {
    #[inline]
    fn triangle(&self) -> (usize, Side) {
        (self.n, self.side)
    }
}

impl PartialEq for TriDense {
    fn eq(&self, other: &Self) -> bool {
        self.n == other.n && self.side == other.side && self.data == other.data
    }
}

impl core::fmt::Debug for TriDense {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        fmt_rows(f, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert;

    #[test]
    fn forbidden_side_reads_zero() {
        let t = TriDense::from_vec(2, Side::Lower, vec![1.0, 5.0, 2.0, 3.0]);
        assert!(t.at(0, 1) == 0.0);
        assert!(t.at(1, 0) == 2.0);
        assert!(t.raw_data() == [1.0, 0.0, 2.0, 3.0]);

        let tt = t.t();
        assert!(tt.triangle() == (2, Side::Upper));
        assert!(tt.at(0, 1) == 2.0);
        assert!(tt.as_triangular().map(|v| v.side()) == Some(Side::Upper));
    }

    #[test]
    #[should_panic(expected = "triangular set out of bounds")]
    fn write_forbidden_side() {
        let mut t = TriDense::zeros(3, Side::Upper);
        t.set_tri(2, 0, 1.0);
    }

    #[test]
    fn copy_keeps_side() {
        let t = TriDense::from_fn(3, Side::Upper, |i, j| (1 + i + j) as f64);
        let mut c = TriDense::new();
        c.copy_tri(&t.t());
        assert!(c.side() == Side::Lower);
        assert!(c.at(2, 0) == 3.0);
        assert!(c.at(0, 2) == 0.0);
    }
}
