use super::*;
use crate::{
    assert,
    error::{fail, MatError},
};

/// Immutable view over a symmetric matrix.
///
/// Only the upper triangle of the underlying row-major storage is ever read, element `(i, j)`
/// with `i > j` is read from `(j, i)`.
#[derive(Copy, Clone)]
pub struct SymmetricRef<'a> {
    inner: GeneralRef<'a>,
}

/// Mutable view over a symmetric matrix, writing only the upper triangle of its storage.
pub struct SymmetricMut<'a> {
    inner: GeneralMut<'a>,
}

impl<'short> Reborrow<'short> for SymmetricMut<'_> {
    type Target = SymmetricRef<'short>;

    #[inline]
    fn rb(&'short self) -> Self::Target {
        SymmetricRef {
            inner: self.inner.rb(),
        }
    }
}

impl<'short> ReborrowMut<'short> for SymmetricMut<'_> {
    type Target = SymmetricMut<'short>;

    #[inline]
    fn rb_mut(&'short mut self) -> Self::Target {
        SymmetricMut {
            inner: self.inner.rb_mut(),
        }
    }
}

impl<'a> IntoConst for SymmetricMut<'a> {
    type Target = SymmetricRef<'a>;

    #[inline]
    fn into_const(self) -> Self::Target {
        SymmetricRef {
            inner: self.inner.into_const(),
        }
    }
}

#[track_caller]
fn check_storage(nrows: usize, ncols: usize, row_major: bool, uplo: Side) {
    assert!(nrows == ncols);
    if uplo != Side::Upper || !row_major {
        fail(MatError::IllegalStorage);
    }
}

impl<'a> SymmetricRef<'a> {
    /// Creates a symmetric view over the given square storage.
    ///
    /// # Panics
    /// Panics with [`MatError::IllegalStorage`] unless `uplo` is [`Side::Upper`] and the storage
    /// is row-major.
    #[track_caller]
    #[inline]
    pub fn new(storage: GeneralRef<'a>, uplo: Side) -> Self {
        check_storage(storage.nrows(), storage.ncols(), storage.is_row_major(), uplo);
        Self { inner: storage }
    }

    /// Returns the dimension of the matrix.
    #[inline]
    pub fn dim(&self) -> usize {
        self.inner.nrows()
    }

    /// Returns the underlying storage. Only its upper triangle is meaningful.
    #[inline]
    pub fn storage(self) -> GeneralRef<'a> {
        self.inner
    }

    /// Reads the element at the given indices, with no bound checks.
    ///
    /// # Safety
    /// Both indices must be less than `self.dim()`.
    #[inline(always)]
    pub unsafe fn read_unchecked(&self, i: usize, j: usize) -> f64 {
        if i <= j {
            self.inner.read_unchecked(i, j)
        } else {
            self.inner.read_unchecked(j, i)
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

    /// Returns an owning copy of the matrix.
    pub fn to_sym_dense(&self) -> SymDense {
        let mut out = SymDense::zeros(self.dim());
        out.as_sym_mut().copy_from(*self);
        out
    }
}

impl<'a> SymmetricMut<'a> {
    /// Creates a mutable symmetric view over the given square storage.
    ///
    /// # Panics
    /// Panics with [`MatError::IllegalStorage`] unless `uplo` is [`Side::Upper`] and the storage
    /// is row-major.
    #[track_caller]
    #[inline]
    pub fn new(storage: GeneralMut<'a>, uplo: Side) -> Self {
        check_storage(storage.nrows(), storage.ncols(), storage.rb().is_row_major(), uplo);
        Self { inner: storage }
    }

    /// Returns the dimension of the matrix.
    #[inline]
    pub fn dim(&self) -> usize {
        self.inner.nrows()
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

    /// Writes the element at `(i, j)`, which is also the element at `(j, i)`, with no bound
    /// checks.
    ///
    /// # Safety
    /// Both indices must be less than `self.dim()`.
    #[inline(always)]
    pub unsafe fn write_unchecked(&mut self, i: usize, j: usize, value: f64) {
        if i <= j {
            self.inner.write_unchecked(i, j, value)
        } else {
            self.inner.write_unchecked(j, i, value)
        }
    }

    /// Writes the element at `(i, j)`, which is also the element at `(j, i)`.
    #[track_caller]
    #[inline(always)]
    pub fn write(&mut self, i: usize, j: usize, value: f64) {
        assert!(all(i < self.dim(), j < self.dim()));
        unsafe { self.write_unchecked(i, j, value) }
    }

    /// Copies the upper triangle of `other` into `self`.
    #[track_caller]
    pub fn copy_from(&mut self, other: SymmetricRef<'_>) {
        let n = self.dim();
        assert!(other.dim() == n);
        match (*self).rb().footprint().classify(&other.footprint()) {
            Overlap::Identical => return,
            Overlap::Partial => fail(MatError::RegionOverlap),
            Overlap::Disjoint => {}
        }
        for i in 0..n {
            self.inner
                .rb_mut()
                .row_mut(i)
                .subvec_mut(i, n - i)
                .copy_from(other.inner.row(i).subvec(i, n - i));
        }
    }
}

impl Matrix for SymmetricRef<'_> {
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
    fn as_symmetric(&self) -> Option<SymmetricRef<'_>> {
        Some(*self)
    }
}

impl Symmetric for SymmetricRef<'_> {
    #[inline]
    fn symmetric_dim(&self) -> usize {
        self.dim()
    }
}

impl Matrix for SymmetricMut<'_> {
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
    fn as_symmetric(&self) -> Option<SymmetricRef<'_>> {
        Some(self.rb())
    }
}

impl MatrixMut for SymmetricMut<'_> {
    #[track_caller]
    #[inline]
    fn set(&mut self, i: usize, j: usize, value: f64) {
        self.write(i, j, value)
    }
}

impl Symmetric for SymmetricMut<'_> {
    #[inline]
    fn symmetric_dim(&self) -> usize {
        self.dim()
    }
}

/// Owning symmetric matrix, storing its upper triangle in a row-major buffer.
#[derive(Clone, Default)]
pub struct SymDense {
    n: usize,
    data: Vec<f64>,
}

impl SymDense {
    /// Returns an empty matrix, which can be used as the receiver of any operation.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an `n × n` matrix filled with zeros.
    ///
    /// # Panics
    /// Panics with [`MatError::ZeroLength`] if `n == 0`.
    #[track_caller]
    pub fn zeros(n: usize) -> Self {
        if n == 0 {
            fail(MatError::ZeroLength);
        }
        Self {
            n,
            data: vec![0.0; n * n],
        }
    }

    /// Creates an `n × n` matrix from a row-major buffer. Only the upper triangle of `data` is
    /// used, the lower one is overwritten with zeros.
    #[track_caller]
    pub fn from_vec(n: usize, mut data: Vec<f64>) -> Self {
        if n == 0 {
            fail(MatError::ZeroLength);
        }
        assert!(data.len() == n * n);
        for i in 1..n {
            data[i * n..i * n + i].fill(0.0);
        }
        Self { n, data }
    }

    /// Creates an `n × n` matrix whose element `(i, j)` with `i <= j` is `f(i, j)`.
    #[track_caller]
    pub fn from_fn(n: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut out = Self::zeros(n);
        for i in 0..n {
            for j in i..n {
                out.data[i * n + j] = f(i, j);
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

    /// Prepares `self` to receive an `n × n` result: an empty matrix is resized, a non-empty
    /// one must already have this dimension.
    #[track_caller]
    pub fn reuse_as_sym(&mut self, n: usize) {
        if n == 0 {
            fail(MatError::ZeroLength);
        }
        if self.is_empty() {
            self.n = n;
            self.data.clear();
            self.data.resize(n * n, 0.0);
        } else {
            assert!(self.n == n);
        }
    }

    /// Returns the dimension of the matrix.
    #[inline]
    pub fn dim(&self) -> usize {
        self.n
    }

    /// Sets the elements `(i, j)` and `(j, i)` to `value`.
    #[track_caller]
    #[inline]
    pub fn set_sym(&mut self, i: usize, j: usize, value: f64) {
        self.as_sym_mut().write(i, j, value)
    }

    /// Returns the row-major storage. Only its upper triangle is meaningful.
    #[inline]
    pub fn raw_data(&self) -> &[f64] {
        &self.data
    }

    /// Returns a view over the matrix.
    #[inline]
    pub fn as_sym_ref(&self) -> SymmetricRef<'_> {
        SymmetricRef {
            inner: GeneralRef::from_row_major_slice(&self.data, self.n, self.n),
        }
    }

    /// Returns a mutable view over the matrix.
    #[inline]
    pub fn as_sym_mut(&mut self) -> SymmetricMut<'_> {
        let n = self.n;
        SymmetricMut {
            inner: GeneralMut::from_row_major_slice_mut(&mut self.data, n, n),
        }
    }

    /// Copies the symmetric matrix `a` into the receiver.
    #[track_caller]
    pub fn copy_sym(&mut self, a: &dyn Symmetric) {
        let n = a.symmetric_dim();
        self.reuse_as_sym(n);
        if let Some(s) = a.as_symmetric() {
            return self.as_sym_mut().copy_from(s);
        }
        for i in 0..n {
            for j in i..n {
                self.data[i * n + j] = a.at(i, j);
            }
        }
    }

    /// Returns the full matrix as a [`Dense`].
    pub fn to_dense(&self) -> Dense {
        let s = self.as_sym_ref();
        Dense::from_fn(self.n, self.n, |i, j| unsafe { s.read_unchecked(i, j) })
    }
}

impl Matrix for SymDense {
    #[inline]
    fn dims(&self) -> (usize, usize) {
        (self.n, self.n)
    }

    #[track_caller]
    #[inline]
    fn at(&self, i: usize, j: usize) -> f64 {
        self.as_sym_ref().read(i, j)
    }

    #[inline]
    fn as_symmetric(&self) -> Option<SymmetricRef<'_>> {
        Some(self.as_sym_ref())
    }
}

impl MatrixMut for SymDense {
    #[track_caller]
    #[inline]
    fn set(&mut self, i: usize, j: usize, value: f64) {
        self.set_sym(i, j, value)
    }
}

impl Symmetric for SymDense {
    #[inline]
    fn symmetric_dim(&self) -> usize {
        self.n
    }
}

impl PartialEq for SymDense {
    fn eq(&self, other: &Self) -> bool {
        self.n == other.n && equal(self, other)
    }
}

impl core::fmt::Debug for SymDense {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        fmt_rows(f, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert;

    #[test]
    fn reads_mirror_upper_triangle() {
        let s = SymDense::from_vec(3, vec![1.0, 2.0, 3.0, 9.0, 4.0, 5.0, 9.0, 9.0, 6.0]);
        assert!(s.at(1, 0) == 2.0);
        assert!(s.at(2, 1) == 5.0);
        assert!(s.raw_data()[3] == 0.0);

        let mut s = s;
        s.set_sym(2, 0, 7.0);
        assert!(s.at(0, 2) == 7.0);
        assert!(s.to_dense() == crate::mat![[1.0, 2.0, 7.0], [2.0, 4.0, 5.0], [7.0, 5.0, 6.0]]);
    }

    #[test]
    #[should_panic(expected = "illegal storage")]
    fn lower_storage_is_rejected() {
        let data = [1.0, 0.0, 2.0, 3.0];
        SymmetricRef::new(GeneralRef::from_row_major_slice(&data, 2, 2), Side::Lower);
    }

    #[test]
    #[should_panic(expected = "illegal storage")]
    fn column_major_storage_is_rejected() {
        let data = [1.0, 2.0, 2.0, 3.0];
        SymmetricRef::new(
            GeneralRef::from_row_major_slice(&data, 2, 2).transpose(),
            Side::Upper,
        );
    }

    #[test]
    #[should_panic(expected = "zero length")]
    fn zero_dimension() {
        SymDense::zeros(0);
    }

    #[test]
    fn copy_from_generic_symmetric() {
        let s = SymDense::from_fn(3, |i, j| (i * 3 + j) as f64);
        let mut c = SymDense::new();
        c.copy_sym(&s.t());
        assert!(c == s);
    }
}
