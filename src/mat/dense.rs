use super::*;
use crate::{
    assert,
    error::{fail, MatError},
};

/// Owning general matrix stored in a contiguous row-major buffer.
///
/// The owned buffer has no padding, so its row stride is always `ncols`. Strided views over
/// it, or over a block of it, are obtained with [`Dense::as_ref`] / [`Dense::as_mut`] followed
/// by [`GeneralRef::submatrix`], or directly with [`Dense::slice`] and [`Dense::slice_mut`].
///
/// An empty matrix (`Dense::new()`) has no dimensions and is the only matrix with a zero
/// dimension that can exist; it adopts the shape of the first result written into it.
#[derive(Clone, Default)]
pub struct Dense {
    nrows: usize,
    ncols: usize,
    data: Vec<f64>,
}

impl Dense {
    /// Returns an empty matrix, which can be used as the receiver of any operation.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns an `nrows × ncols` matrix filled with zeros.
    ///
    /// # Panics
    /// Panics with [`MatError::ZeroLength`] if either dimension is zero.
    #[track_caller]
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        if nrows == 0 || ncols == 0 {
            fail(MatError::ZeroLength);
        }
        Self {
            nrows,
            ncols,
            data: vec![0.0; nrows * ncols],
        }
    }

    /// Creates an `nrows × ncols` matrix from a row-major buffer.
    ///
    /// # Panics
    /// Panics with [`MatError::ZeroLength`] if either dimension is zero, and if the length of
    /// `data` is not `nrows * ncols`.
    #[track_caller]
    pub fn from_vec(nrows: usize, ncols: usize, data: Vec<f64>) -> Self {
        if nrows == 0 || ncols == 0 {
            fail(MatError::ZeroLength);
        }
        assert!(data.len() == nrows * ncols);
        Self { nrows, ncols, data }
    }

    /// Creates a matrix from a slice of rows, which must all have the same length.
    #[track_caller]
    pub fn from_rows(rows: &[&[f64]]) -> Self {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, |r| r.len());
        if nrows == 0 || ncols == 0 {
            fail(MatError::ZeroLength);
        }
        let mut data = Vec::with_capacity(nrows * ncols);
        for row in rows {
            assert!(row.len() == ncols);
            data.extend_from_slice(row);
        }
        Self { nrows, ncols, data }
    }

    /// Creates an `nrows × ncols` matrix whose element `(i, j)` is `f(i, j)`.
    #[track_caller]
    pub fn from_fn(nrows: usize, ncols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut out = Self::zeros(nrows, ncols);
        for i in 0..nrows {
            for j in 0..ncols {
                out.data[i * ncols + j] = f(i, j);
            }
        }
        out
    }

    /// Returns the `n × n` identity matrix.
    #[track_caller]
    pub fn identity(n: usize) -> Self {
        let mut out = Self::zeros(n, n);
        out.as_mut().diagonal_mut().fill(1.0);
        out
    }

    /// Returns `true` if the matrix has zero size.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nrows == 0
    }

    /// Empties the matrix, keeping the allocated memory for later reuse.
    #[inline]
    pub fn reset(&mut self) {
        self.nrows = 0;
        self.ncols = 0;
        self.data.clear();
    }

    /// Prepares `self` to receive an `nrows × ncols` result: an empty matrix is resized to
    /// this shape, a non-empty one must already have it.
    ///
    /// The contents of a resized matrix are zero, those of a non-empty one are left as is.
    #[track_caller]
    pub fn reuse_as(&mut self, nrows: usize, ncols: usize) {
        if nrows == 0 || ncols == 0 {
            fail(MatError::ZeroLength);
        }
        if self.is_empty() {
            self.nrows = nrows;
            self.ncols = ncols;
            self.data.clear();
            self.data.resize(nrows * ncols, 0.0);
        } else {
            assert!(all(self.nrows == nrows, self.ncols == ncols));
        }
    }

    /// Same as [`Dense::reuse_as`], then fills the matrix with zeros.
    #[track_caller]
    pub fn reuse_as_zeroed(&mut self, nrows: usize, ncols: usize) {
        self.reuse_as(nrows, ncols);
        self.data.fill(0.0);
    }

    /// Returns the number of rows of the matrix.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Returns the number of columns of the matrix.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Returns the row-major storage.
    #[inline]
    pub fn raw_data(&self) -> &[f64] {
        &self.data
    }

    /// Returns the row-major storage.
    #[inline]
    pub fn raw_data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consumes the matrix, returning its row-major storage.
    #[inline]
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Returns a view over the matrix.
    #[inline]
    pub fn as_ref(&self) -> GeneralRef<'_> {
        GeneralRef::from_row_major_slice(&self.data, self.nrows, self.ncols)
    }

    /// Returns a mutable view over the matrix.
    #[inline]
    pub fn as_mut(&mut self) -> GeneralMut<'_> {
        let (nrows, ncols) = (self.nrows, self.ncols);
        GeneralMut::from_row_major_slice_mut(&mut self.data, nrows, ncols)
    }

    /// Returns a view over rows `i..k` and columns `j..l`, sharing storage with `self`.
    #[track_caller]
    #[inline]
    pub fn slice(&self, i: usize, k: usize, j: usize, l: usize) -> GeneralRef<'_> {
        assert!(all(i <= k, j <= l));
        self.as_ref().submatrix(i, j, k - i, l - j)
    }

    /// Returns a mutable view over rows `i..k` and columns `j..l`.
    #[track_caller]
    #[inline]
    pub fn slice_mut(&mut self, i: usize, k: usize, j: usize, l: usize) -> GeneralMut<'_> {
        assert!(all(i <= k, j <= l));
        self.as_mut().submatrix_mut(i, j, k - i, l - j)
    }

    /// Returns a view over row `i`.
    #[track_caller]
    #[inline]
    pub fn row_view(&self, i: usize) -> VectorRef<'_> {
        self.as_ref().row(i)
    }

    /// Returns a view over column `j`.
    #[track_caller]
    #[inline]
    pub fn col_view(&self, j: usize) -> VectorRef<'_> {
        self.as_ref().col(j)
    }

    /// Returns a mutable view over row `i`.
    #[track_caller]
    #[inline]
    pub fn row_view_mut(&mut self, i: usize) -> VectorMut<'_> {
        self.as_mut().row_mut(i)
    }

    /// Returns a mutable view over column `j`.
    #[track_caller]
    #[inline]
    pub fn col_view_mut(&mut self, j: usize) -> VectorMut<'_> {
        self.as_mut().col_mut(j)
    }

    /// Overwrites row `i` with `src`.
    #[track_caller]
    pub fn set_row(&mut self, i: usize, src: &[f64]) {
        assert!(src.len() == self.ncols);
        self.row_view_mut(i).copy_from(VectorRef::from_slice(src));
    }

    /// Overwrites column `j` with `src`.
    #[track_caller]
    pub fn set_col(&mut self, j: usize, src: &[f64]) {
        assert!(src.len() == self.nrows);
        self.col_view_mut(j).copy_from(VectorRef::from_slice(src));
    }

    /// Fills the matrix with zeros.
    #[inline]
    pub fn zero(&mut self) {
        self.data.fill(0.0);
    }

    /// Copies the top-left corner of `a` into the top-left corner of `self`, over as many rows
    /// and columns as both matrices have. Returns the number of copied rows and columns.
    #[track_caller]
    pub fn copy_from(&mut self, a: &dyn Matrix) -> (usize, usize) {
        let (ar, ac) = a.dims();
        let r = Ord::min(self.nrows, ar);
        let c = Ord::min(self.ncols, ac);
        if r == 0 || c == 0 {
            return (r, c);
        }
        let mut dst = self.as_mut().submatrix_mut(0, 0, r, c);
        if let Some(g) = a.as_general() {
            dst.copy_from(g.submatrix(0, 0, r, c));
        } else {
            for i in 0..r {
                for j in 0..c {
                    unsafe { dst.write_unchecked(i, j, a.at(i, j)) };
                }
            }
        }
        (r, c)
    }

    /// Makes `self` an exact copy of `a`, with the dimensions of `a`.
    #[track_caller]
    pub fn clone_from_matrix(&mut self, a: &dyn Matrix) {
        let (r, c) = a.dims();
        self.reset();
        self.reuse_as(r, c);
        self.copy_from(a);
    }

    /// Returns a copy of `self` grown by `r` rows and `c` columns, with the new elements set to
    /// zero.
    #[track_caller]
    pub fn grow(&self, r: usize, c: usize) -> Dense {
        let mut out = Dense::zeros(self.nrows + r, self.ncols + c);
        if !self.is_empty() {
            out.copy_from(self);
        }
        out
    }

    /// Sets the receiver to `a` stacked on top of `b`.
    #[track_caller]
    pub fn stack(&mut self, a: &dyn Matrix, b: &dyn Matrix) {
        let (ar, ac) = a.dims();
        let (br, bc) = b.dims();
        assert!(ac == bc);
        self.reuse_as(ar + br, ac);
        self.slice_mut(0, ar, 0, ac).copy_from_matrix(a);
        self.slice_mut(ar, ar + br, 0, bc).copy_from_matrix(b);
    }

    /// Sets the receiver to `a` followed by `b` on the right.
    #[track_caller]
    pub fn augment(&mut self, a: &dyn Matrix, b: &dyn Matrix) {
        let (ar, ac) = a.dims();
        let (br, bc) = b.dims();
        assert!(ar == br);
        self.reuse_as(ar, ac + bc);
        self.slice_mut(0, ar, 0, ac).copy_from_matrix(a);
        self.slice_mut(0, br, ac, ac + bc).copy_from_matrix(b);
    }

    /// Copies the lower triangle of `self` onto its upper triangle, or the upper onto the lower.
    #[track_caller]
    pub fn symmetrize_from(&mut self, side: Side) {
        assert!(self.nrows == self.ncols);
        let n = self.nrows;
        for i in 0..n {
            for j in i + 1..n {
                match side {
                    Side::Upper => self.data[j * n + i] = self.data[i * n + j],
                    Side::Lower => self.data[i * n + j] = self.data[j * n + i],
                }
            }
        }
    }
}

impl Matrix for Dense {
    #[inline]
    fn dims(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    #[track_caller]
    #[inline]
    fn at(&self, i: usize, j: usize) -> f64 {
        assert!(all(i < self.nrows, j < self.ncols));
        self.data[i * self.ncols + j]
    }

    #[inline]
    fn as_general(&self) -> Option<GeneralRef<'_>> {
        Some(self.as_ref())
    }
}

impl MatrixMut for Dense {
    #[track_caller]
    #[inline]
    fn set(&mut self, i: usize, j: usize, value: f64) {
        assert!(all(i < self.nrows, j < self.ncols));
        self.data[i * self.ncols + j] = value;
    }
}

impl PartialEq for Dense {
    fn eq(&self, other: &Self) -> bool {
        self.nrows == other.nrows && self.ncols == other.ncols && self.data == other.data
    }
}

impl core::fmt::Debug for Dense {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        fmt_rows(f, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{assert, mat};

    #[test]
    fn views_carry_the_stride() {
        let mut m = Dense::from_fn(3, 4, |i, j| (4 * i + j) as f64);
        let full = m.as_ref();
        assert!(all(full.row_stride() == 4, full.col_stride() == 1));
        let block = m.slice(1, 3, 1, 3);
        assert!(all(block.shape() == (2, 2), block.row_stride() == 4));
        assert!(block.read(1, 1) == 10.0);

        let mut sub = m.as_mut().submatrix_mut(0, 2, 2, 2);
        sub.copy_from(crate::mat![[-1.0, -2.0], [-3.0, -4.0]].as_ref());
        assert!(m.at(1, 3) == -4.0);
    }

    #[test]
    fn receiver_rules() {
        let mut m = Dense::new();
        assert!(m.is_empty());
        m.reuse_as(2, 3);
        assert!(m.dims() == (2, 3));
        m.set(1, 2, 4.0);
        m.reuse_as(2, 3);
        assert!(m.at(1, 2) == 4.0);

        m.reset();
        assert!(m.is_empty());
        m.reuse_as_zeroed(3, 1);
        assert!(m.raw_data() == [0.0; 3]);
    }

    #[test]
    #[should_panic]
    fn reuse_with_wrong_shape() {
        let mut m = Dense::zeros(2, 2);
        m.reuse_as(3, 2);
    }

    #[test]
    #[should_panic(expected = "zero length")]
    fn zero_dimension() {
        Dense::zeros(0, 3);
    }

    #[test]
    fn slices_share_storage() {
        let mut m = Dense::from_fn(3, 4, |i, j| (i * 4 + j) as f64);
        let s = m.slice(1, 3, 1, 3);
        assert!(s.shape() == (2, 2));
        assert!(s.read(1, 1) == 10.0);
        assert!(s.row_stride() == 4);

        m.slice_mut(0, 1, 2, 4).fill(-1.0);
        assert!(m.row_view(0).iter().collect::<Vec<_>>() == [0.0, 1.0, -1.0, -1.0]);
        m.set_col(0, &[7.0, 8.0, 9.0]);
        assert!(m.col_view(0).read(2) == 9.0);
    }

    #[test]
    fn copy_grow_stack_augment() {
        let a = mat![[1.0, 2.0], [3.0, 4.0]];
        let mut small = Dense::zeros(1, 3);
        assert!(small.copy_from(&a) == (1, 2));
        assert!(small == mat![[1.0, 2.0, 0.0]]);

        let g = a.grow(1, 1);
        assert!(g == mat![[1.0, 2.0, 0.0], [3.0, 4.0, 0.0], [0.0, 0.0, 0.0]]);

        let mut s = Dense::new();
        s.stack(&a, &a.t());
        assert!(s == mat![[1.0, 2.0], [3.0, 4.0], [1.0, 3.0], [2.0, 4.0]]);

        let mut aug = Dense::new();
        aug.augment(&a, &Dense::identity(2));
        assert!(aug == mat![[1.0, 2.0, 1.0, 0.0], [3.0, 4.0, 0.0, 1.0]]);

        let mut c = Dense::zeros(5, 5);
        c.clone_from_matrix(&a.t());
        assert!(c == mat![[1.0, 3.0], [2.0, 4.0]]);
    }

    #[test]
    fn symmetrize() {
        let mut m = mat![[1.0, 2.0], [3.0, 4.0]];
        m.symmetrize_from(Side::Lower);
        assert!(m == mat![[1.0, 3.0], [3.0, 4.0]]);
    }
}
