use super::*;
use crate::{assert, debug_assert};

/// Immutable view over a general matrix, similar to an immutable reference to a 2D strided
/// [prim@slice].
///
/// Element `(i, j)` lives at offset `i * row_stride + j * col_stride` from the base pointer.
/// Views created from owned matrices are row-major (`col_stride == 1`), transposed views swap
/// the two strides.
#[derive(Copy, Clone)]
pub struct GeneralRef<'a> {
    pub(super) ptr: NonNull<f64>,
    pub(super) nrows: usize,
    pub(super) ncols: usize,
    pub(super) row_stride: usize,
    pub(super) col_stride: usize,
    pub(super) __marker: PhantomData<&'a f64>,
}

unsafe impl Send for GeneralRef<'_> {}
unsafe impl Sync for GeneralRef<'_> {}

impl<'short> Reborrow<'short> for GeneralRef<'_> {
    type Target = GeneralRef<'short>;

    #[inline]
    fn rb(&'short self) -> Self::Target {
        *self
    }
}

impl<'short> ReborrowMut<'short> for GeneralRef<'_> {
    type Target = GeneralRef<'short>;

    #[inline]
    fn rb_mut(&'short mut self) -> Self::Target {
        *self
    }
}

impl IntoConst for GeneralRef<'_> {
    type Target = Self;

    #[inline]
    fn into_const(self) -> Self::Target {
        self
    }
}

impl<'a> GeneralRef<'a> {
    /// Creates a view from a pointer and a strided layout.
    ///
    /// # Safety
    /// `ptr` must be non null and every element `(i, j)` with `i < nrows`, `j < ncols` must be
    /// valid for reads at `ptr + i * row_stride + j * col_stride` for the lifetime `'a`.
    /// The memory must not be written through a reference for that lifetime.
    #[inline]
    pub unsafe fn from_raw_parts(
        ptr: *const f64,
        nrows: usize,
        ncols: usize,
        row_stride: usize,
        col_stride: usize,
    ) -> Self {
        debug_assert!(!ptr.is_null());
        Self {
            ptr: NonNull::new_unchecked(ptr as *mut f64),
            nrows,
            ncols,
            row_stride,
            col_stride,
            __marker: PhantomData,
        }
    }

    /// Creates a row-major view over `slice`, which must contain exactly `nrows * ncols`
    /// elements.
    #[track_caller]
    #[inline]
    pub fn from_row_major_slice(slice: &'a [f64], nrows: usize, ncols: usize) -> Self {
        assert!(slice.len() == nrows * ncols);
        unsafe { Self::from_raw_parts(slice.as_ptr(), nrows, ncols, ncols, 1) }
    }

    /// Creates a row-major view over `slice`, with consecutive rows `row_stride` elements
    /// apart.
    #[track_caller]
    #[inline]
    pub fn from_row_major_slice_with_stride(
        slice: &'a [f64],
        nrows: usize,
        ncols: usize,
        row_stride: usize,
    ) -> Self {
        assert!(row_stride >= ncols);
        if nrows > 0 && ncols > 0 {
            assert!((nrows - 1) * row_stride + ncols <= slice.len());
        }
        unsafe { Self::from_raw_parts(slice.as_ptr(), nrows, ncols, row_stride, 1) }
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

    /// Returns the number of rows and columns of the matrix.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Returns the row stride of the matrix, specified in number of elements, not in bytes.
    #[inline]
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// Returns the column stride of the matrix, specified in number of elements, not in bytes.
    #[inline]
    pub fn col_stride(&self) -> usize {
        self.col_stride
    }

    /// Returns a pointer to the first element of the matrix.
    #[inline]
    pub fn as_ptr(self) -> *const f64 {
        self.ptr.as_ptr()
    }

    /// Returns a pointer to the element at the given indices, without bound checks.
    #[inline(always)]
    pub fn ptr_at(self, row: usize, col: usize) -> *const f64 {
        self.ptr
            .as_ptr()
            .wrapping_add(row * self.row_stride + col * self.col_stride)
    }

    /// Returns `true` if the rows of the matrix are contiguous in memory.
    #[inline]
    pub fn is_row_major(&self) -> bool {
        self.col_stride == 1 || self.ncols <= 1
    }

    /// Reads the value of the element at the given indices, with no bound checks.
    ///
    /// # Safety
    /// `row < self.nrows()` and `col < self.ncols()`.
    #[inline(always)]
    pub unsafe fn read_unchecked(&self, row: usize, col: usize) -> f64 {
        debug_assert!(all(row < self.nrows, col < self.ncols));
        *self.ptr_at(row, col)
    }

    /// Reads the value of the element at the given indices.
    ///
    /// # Panics
    /// Panics if either index is out of bounds.
    #[track_caller]
    #[inline(always)]
    pub fn read(&self, row: usize, col: usize) -> f64 {
        assert!(all(row < self.nrows, col < self.ncols));
        unsafe { self.read_unchecked(row, col) }
    }

    /// Returns a view over the transpose of `self`.
    #[inline]
    #[must_use]
    pub fn transpose(self) -> Self {
        Self {
            ptr: self.ptr,
            nrows: self.ncols,
            ncols: self.nrows,
            row_stride: self.col_stride,
            col_stride: self.row_stride,
            __marker: PhantomData,
        }
    }

    /// Returns a view over the submatrix starting at `(row_start, col_start)`, with dimensions
    /// `(nrows, ncols)`.
    #[track_caller]
    #[inline]
    pub fn submatrix(self, row_start: usize, col_start: usize, nrows: usize, ncols: usize) -> Self {
        assert!(all(row_start <= self.nrows, col_start <= self.ncols));
        assert!(all(
            nrows <= self.nrows - row_start,
            ncols <= self.ncols - col_start,
        ));
        Self {
            ptr: if nrows == 0 || ncols == 0 {
                self.ptr
            } else {
                unsafe { NonNull::new_unchecked(self.ptr_at(row_start, col_start) as *mut f64) }
            },
            nrows,
            ncols,
            row_stride: self.row_stride,
            col_stride: self.col_stride,
            __marker: PhantomData,
        }
    }

    /// Returns a view over the rows `row_start..row_start + nrows`.
    #[track_caller]
    #[inline]
    pub fn subrows(self, row_start: usize, nrows: usize) -> Self {
        self.submatrix(row_start, 0, nrows, self.ncols)
    }

    /// Returns a view over the columns `col_start..col_start + ncols`.
    #[track_caller]
    #[inline]
    pub fn subcols(self, col_start: usize, ncols: usize) -> Self {
        self.submatrix(0, col_start, self.nrows, ncols)
    }

    /// Splits the matrix horizontally at the given row into two parts.
    #[track_caller]
    #[inline]
    pub fn split_at_row(self, row: usize) -> (Self, Self) {
        assert!(row <= self.nrows);
        (self.subrows(0, row), self.subrows(row, self.nrows - row))
    }

    /// Splits the matrix vertically at the given column into two parts.
    #[track_caller]
    #[inline]
    pub fn split_at_col(self, col: usize) -> (Self, Self) {
        assert!(col <= self.ncols);
        (self.subcols(0, col), self.subcols(col, self.ncols - col))
    }

    /// Returns a view over the row at the given index.
    #[track_caller]
    #[inline]
    pub fn row(self, row: usize) -> VectorRef<'a> {
        assert!(row < self.nrows);
        unsafe { VectorRef::from_raw_parts(self.ptr_at(row, 0), self.ncols, self.col_stride) }
    }

    /// Returns a view over the column at the given index.
    #[track_caller]
    #[inline]
    pub fn col(self, col: usize) -> VectorRef<'a> {
        assert!(col < self.ncols);
        unsafe { VectorRef::from_raw_parts(self.ptr_at(0, col), self.nrows, self.row_stride) }
    }

    /// Returns a view over the main diagonal of the matrix.
    #[inline]
    pub fn diagonal(self) -> VectorRef<'a> {
        let n = Ord::min(self.nrows, self.ncols);
        unsafe {
            VectorRef::from_raw_parts(self.as_ptr(), n, self.row_stride + self.col_stride)
        }
    }

    /// Returns the row at the given index as a slice, if its elements are contiguous.
    #[track_caller]
    #[inline]
    pub fn try_row_slice(self, row: usize) -> Option<&'a [f64]> {
        self.row(row).try_as_slice()
    }

    /// Returns the memory footprint of the view, used for aliasing checks.
    #[inline]
    pub fn footprint(&self) -> Footprint {
        Footprint::new(
            self.as_ptr(),
            self.nrows,
            self.ncols,
            self.row_stride,
            self.col_stride,
        )
    }

    /// Returns an owning [`Dense`] copy of the view.
    #[inline]
    pub fn to_dense(&self) -> Dense {
        Dense::from_fn(self.nrows, self.ncols, |i, j| unsafe { self.read_unchecked(i, j) })
    }
}

impl Matrix for GeneralRef<'_> {
    #[inline]
    fn dims(&self) -> (usize, usize) {
        self.shape()
    }

    #[track_caller]
    #[inline]
    fn at(&self, i: usize, j: usize) -> f64 {
        self.read(i, j)
    }

    #[inline]
    fn as_general(&self) -> Option<GeneralRef<'_>> {
        Some(*self)
    }
}

impl core::fmt::Debug for GeneralRef<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        fmt_rows(f, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert;

    #[test]
    fn views_share_layout() {
        let data: Vec<f64> = (0..12).map(|x| x as f64).collect();
        let m = GeneralRef::from_row_major_slice(&data, 3, 4);
        assert!(m.read(1, 2) == 6.0);

        let t = m.transpose();
        assert!(t.shape() == (4, 3));
        assert!(t.read(2, 1) == 6.0);

        let sub = m.submatrix(1, 1, 2, 2);
        assert!(sub.read(0, 0) == 5.0);
        assert!(sub.read(1, 1) == 10.0);

        let col = m.col(3);
        assert!(col.len() == 3);
        assert!(col.inc() == 4);
        assert!(col.read(2) == 11.0);

        assert!(m.try_row_slice(2) == Some(&data[8..12]));
        assert!(t.try_row_slice(0).is_none());
    }

    #[test]
    fn strided_view() {
        let data: Vec<f64> = (0..10).map(|x| x as f64).collect();
        let m = GeneralRef::from_row_major_slice_with_stride(&data, 2, 3, 5);
        assert!(m.read(1, 0) == 5.0);
        assert!(m.diagonal().read(1) == 6.0);
        assert!(m.to_dense() == crate::mat![[0.0, 1.0, 2.0], [5.0, 6.0, 7.0]]);
    }

    #[test]
    #[should_panic]
    fn out_of_bounds_read() {
        let data = [1.0, 2.0];
        let m = GeneralRef::from_row_major_slice(&data, 1, 2);
        m.read(1, 0);
    }
}
