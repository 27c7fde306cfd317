use super::*;
use crate::{
    assert, debug_assert,
    error::{fail, MatError},
};

/// Mutable view over a general matrix, similar to a mutable reference to a 2D strided
/// [prim@slice].
pub struct GeneralMut<'a> {
    pub(super) ptr: NonNull<f64>,
    pub(super) nrows: usize,
    pub(super) ncols: usize,
    pub(super) row_stride: usize,
    pub(super) col_stride: usize,
    pub(super) __marker: PhantomData<&'a mut f64>,
}

unsafe impl Send for GeneralMut<'_> {}
unsafe impl Sync for GeneralMut<'_> {}

impl<'short> Reborrow<'short> for GeneralMut<'_> {
    type Target = GeneralRef<'short>;

    #[inline]
    fn rb(&'short self) -> Self::Target {
        GeneralRef {
            ptr: self.ptr,
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.row_stride,
            col_stride: self.col_stride,
            __marker: PhantomData,
        }
    }
}

impl<'short> ReborrowMut<'short> for GeneralMut<'_> {
    type Target = GeneralMut<'short>;

    #[inline]
    fn rb_mut(&'short mut self) -> Self::Target {
        GeneralMut {
            ptr: self.ptr,
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.row_stride,
            col_stride: self.col_stride,
            __marker: PhantomData,
        }
    }
}

impl<'a> IntoConst for GeneralMut<'a> {
    type Target = GeneralRef<'a>;

    #[inline]
    fn into_const(self) -> Self::Target {
        GeneralRef {
            ptr: self.ptr,
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.row_stride,
            col_stride: self.col_stride,
            __marker: PhantomData,
        }
    }
}

impl<'a> GeneralMut<'a> {
    /// Creates a mutable view from a pointer and a strided layout.
    ///
    /// Unlike a slice, distinct views created this way may describe overlapping regions. The
    /// arithmetic routines detect such overlaps and either handle them or panic with
    /// [`MatError::RegionOverlap`].
    ///
    /// # Safety
    /// `ptr` must be non null and every element `(i, j)` with `i < nrows`, `j < ncols` must be
    /// valid for reads and writes at `ptr + i * row_stride + j * col_stride` for the lifetime
    /// `'a`. The memory must not be accessed through a reference for that lifetime.
    #[inline]
    pub unsafe fn from_raw_parts_mut(
        ptr: *mut f64,
        nrows: usize,
        ncols: usize,
        row_stride: usize,
        col_stride: usize,
    ) -> Self {
        debug_assert!(!ptr.is_null());
        Self {
            ptr: NonNull::new_unchecked(ptr),
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
    pub fn from_row_major_slice_mut(slice: &'a mut [f64], nrows: usize, ncols: usize) -> Self {
        assert!(slice.len() == nrows * ncols);
        unsafe { Self::from_raw_parts_mut(slice.as_mut_ptr(), nrows, ncols, ncols, 1) }
    }

    /// Creates a row-major view over `slice`, with consecutive rows `row_stride` elements
    /// apart.
    #[track_caller]
    #[inline]
    pub fn from_row_major_slice_with_stride_mut(
        slice: &'a mut [f64],
        nrows: usize,
        ncols: usize,
        row_stride: usize,
    ) -> Self {
        assert!(row_stride >= ncols);
        if nrows > 0 && ncols > 0 {
            assert!((nrows - 1) * row_stride + ncols <= slice.len());
        }
        unsafe { Self::from_raw_parts_mut(slice.as_mut_ptr(), nrows, ncols, row_stride, 1) }
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

    /// Returns a mutable pointer to the first element of the matrix.
    #[inline]
    pub fn as_ptr_mut(self) -> *mut f64 {
        self.ptr.as_ptr()
    }

    /// Returns a pointer to the element at the given indices, without bound checks.
    #[inline(always)]
    pub fn ptr_at_mut(self, row: usize, col: usize) -> *mut f64 {
        self.ptr
            .as_ptr()
            .wrapping_add(row * self.row_stride + col * self.col_stride)
    }

    /// Returns a view of the same region that may be read while `self` is written.
    ///
    /// # Safety
    /// Neither view may be turned into a slice while both are in use.
    #[inline]
    pub(crate) unsafe fn alias(&self) -> GeneralRef<'a> {
        GeneralRef {
            ptr: self.ptr,
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.row_stride,
            col_stride: self.col_stride,
            __marker: PhantomData,
        }
    }

    /// Reads the value of the element at the given indices, with no bound checks.
    ///
    /// # Safety
    /// `row < self.nrows()` and `col < self.ncols()`.
    #[inline(always)]
    pub unsafe fn read_unchecked(&self, row: usize, col: usize) -> f64 {
        self.rb().read_unchecked(row, col)
    }

    /// Reads the value of the element at the given indices.
    #[track_caller]
    #[inline(always)]
    pub fn read(&self, row: usize, col: usize) -> f64 {
        self.rb().read(row, col)
    }

    /// Writes the value to the element at the given indices, with no bound checks.
    ///
    /// # Safety
    /// `row < self.nrows()` and `col < self.ncols()`.
    #[inline(always)]
    pub unsafe fn write_unchecked(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(all(row < self.nrows, col < self.ncols));
        *self.rb_mut().ptr_at_mut(row, col) = value;
    }

    /// Writes the value to the element at the given indices.
    ///
    /// # Panics
    /// Panics if either index is out of bounds.
    #[track_caller]
    #[inline(always)]
    pub fn write(&mut self, row: usize, col: usize, value: f64) {
        assert!(all(row < self.nrows, col < self.ncols));
        unsafe { self.write_unchecked(row, col, value) }
    }

    /// Returns a view over the transpose of `self`.
    #[inline]
    #[must_use]
    pub fn transpose_mut(self) -> Self {
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
    pub fn submatrix_mut(
        self,
        row_start: usize,
        col_start: usize,
        nrows: usize,
        ncols: usize,
    ) -> Self {
        let sub = self.into_const().submatrix(row_start, col_start, nrows, ncols);
        Self {
            ptr: sub.ptr,
            nrows,
            ncols,
            row_stride: sub.row_stride,
            col_stride: sub.col_stride,
            __marker: PhantomData,
        }
    }

    /// Returns a view over the rows `row_start..row_start + nrows`.
    #[track_caller]
    #[inline]
    pub fn subrows_mut(self, row_start: usize, nrows: usize) -> Self {
        let ncols = self.ncols;
        self.submatrix_mut(row_start, 0, nrows, ncols)
    }

    /// Returns a view over the columns `col_start..col_start + ncols`.
    #[track_caller]
    #[inline]
    pub fn subcols_mut(self, col_start: usize, ncols: usize) -> Self {
        let nrows = self.nrows;
        self.submatrix_mut(0, col_start, nrows, ncols)
    }

    /// Splits the matrix horizontally at the given row into two disjoint parts.
    #[track_caller]
    #[inline]
    pub fn split_at_row_mut(self, row: usize) -> (Self, Self) {
        assert!(row <= self.nrows);
        let (top, bot) = self.into_const().split_at_row(row);
        unsafe { (top.const_cast(), bot.const_cast()) }
    }

    /// Splits the matrix vertically at the given column into two disjoint parts.
    #[track_caller]
    #[inline]
    pub fn split_at_col_mut(self, col: usize) -> (Self, Self) {
        assert!(col <= self.ncols);
        let (left, right) = self.into_const().split_at_col(col);
        unsafe { (left.const_cast(), right.const_cast()) }
    }

    /// Returns a view over the row at the given index.
    #[track_caller]
    #[inline]
    pub fn row_mut(self, row: usize) -> VectorMut<'a> {
        let r = self.into_const().row(row);
        unsafe { VectorMut::from_raw_parts_mut(r.as_ptr() as *mut f64, r.len(), r.inc()) }
    }

    /// Returns a view over the column at the given index.
    #[track_caller]
    #[inline]
    pub fn col_mut(self, col: usize) -> VectorMut<'a> {
        let c = self.into_const().col(col);
        unsafe { VectorMut::from_raw_parts_mut(c.as_ptr() as *mut f64, c.len(), c.inc()) }
    }

    /// Returns a view over the main diagonal of the matrix.
    #[inline]
    pub fn diagonal_mut(self) -> VectorMut<'a> {
        let d = self.into_const().diagonal();
        unsafe { VectorMut::from_raw_parts_mut(d.as_ptr() as *mut f64, d.len(), d.inc()) }
    }

    /// Returns the row at the given index as a mutable slice, if its elements are contiguous.
    #[track_caller]
    #[inline]
    pub fn try_row_slice_mut(self, row: usize) -> Option<&'a mut [f64]> {
        self.row_mut(row).try_as_slice_mut()
    }

    /// Fills the elements of `self` with `constant`.
    pub fn fill(&mut self, constant: f64) {
        for i in 0..self.nrows {
            self.rb_mut().row_mut(i).fill(constant);
        }
    }

    /// Fills the elements of `self` with zeros.
    #[inline]
    pub fn fill_zero(&mut self) {
        self.fill(0.0)
    }

    /// Copies the values from `other` into `self`.
    ///
    /// Copying a view onto itself is a no-op.
    ///
    /// # Panics
    /// Panics if the shapes differ, or with [`MatError::RegionOverlap`] if the two views
    /// partially overlap.
    #[track_caller]
    pub fn copy_from(&mut self, other: GeneralRef<'_>) {
        assert!(all(self.nrows == other.nrows, self.ncols == other.ncols));
        match (*self).rb().footprint().classify(&other.footprint()) {
            Overlap::Identical => return,
            Overlap::Partial => fail(MatError::RegionOverlap),
            Overlap::Disjoint => {}
        }
        for i in 0..self.nrows {
            self.rb_mut().row_mut(i).copy_from(other.row(i));
        }
    }

    /// Copies the values from an arbitrary matrix into `self`, going through its raw storage
    /// when it exposes one.
    #[track_caller]
    pub fn copy_from_matrix(&mut self, other: &dyn Matrix) {
        assert!(self.shape() == other.dims());
        if let Some(g) = other.as_general() {
            return self.copy_from(g);
        }
        let alias = Alias::of((*self).rb().footprint(), other);
        if alias != Alias::None {
            fail(MatError::RegionOverlap);
        }
        for i in 0..self.nrows {
            for j in 0..self.ncols {
                unsafe { self.write_unchecked(i, j, other.at(i, j)) };
            }
        }
    }
}

impl<'a> GeneralRef<'a> {
    /// # Safety
    /// The returned view must be the only one used to access the memory for `'a`.
    #[inline]
    pub(crate) unsafe fn const_cast(self) -> GeneralMut<'a> {
        GeneralMut {
            ptr: self.ptr,
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.row_stride,
            col_stride: self.col_stride,
            __marker: PhantomData,
        }
    }
}

impl Matrix for GeneralMut<'_> {
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
        Some(self.rb())
    }
}

impl MatrixMut for GeneralMut<'_> {
    #[track_caller]
    #[inline]
    fn set(&mut self, i: usize, j: usize, value: f64) {
        self.write(i, j, value)
    }
}

impl core::fmt::Debug for GeneralMut<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.rb().fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert;

    #[test]
    fn write_through_splits() {
        let mut data = vec![0.0; 6];
        let mut m = GeneralMut::from_row_major_slice_mut(&mut data, 2, 3);
        {
            let (mut top, mut bot) = m.rb_mut().split_at_row_mut(1);
            top.write(0, 2, 1.0);
            bot.write(0, 0, 2.0);
        }
        m.rb_mut().transpose_mut().write(1, 1, 3.0);
        m.rb_mut().col_mut(1).write(0, 4.0);
        assert!(data == [0.0, 4.0, 1.0, 2.0, 3.0, 0.0]);
    }

    #[test]
    fn copy_from_self_is_noop() {
        let mut data = vec![1.0, 2.0, 3.0, 4.0];
        let mut m = GeneralMut::from_row_major_slice_mut(&mut data, 2, 2);
        let same = unsafe { m.alias() };
        m.copy_from(same);
        assert!(data == [1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    #[should_panic(expected = "region overlap")]
    fn copy_from_overlap_panics() {
        let mut data = vec![0.0; 8];
        let ptr = data.as_mut_ptr();
        let mut dst = unsafe { GeneralMut::from_raw_parts_mut(ptr, 2, 2, 2, 1) };
        let src = unsafe { GeneralRef::from_raw_parts(ptr.add(1), 2, 2, 2, 1) };
        dst.copy_from(src);
    }

    #[test]
    fn fill_strided() {
        let mut data = vec![0.0; 6];
        let mut m = GeneralMut::from_row_major_slice_with_stride_mut(&mut data, 2, 2, 3);
        m.fill(7.0);
        assert!(data == [7.0, 7.0, 0.0, 7.0, 7.0, 0.0]);
    }
}
