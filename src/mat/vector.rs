use super::*;
use crate::{
    assert, debug_assert,
    error::{fail, MatError},
};

/// Immutable view over a strided vector.
///
/// Element `i` lives at offset `i * inc` from the base pointer.
#[derive(Copy, Clone)]
pub struct VectorRef<'a> {
    ptr: NonNull<f64>,
    len: usize,
    inc: usize,
    __marker: PhantomData<&'a f64>,
}

/// Mutable view over a strided vector.
pub struct VectorMut<'a> {
    ptr: NonNull<f64>,
    len: usize,
    inc: usize,
    __marker: PhantomData<&'a mut f64>,
}

unsafe impl Send for VectorRef<'_> {}
unsafe impl Sync for VectorRef<'_> {}
unsafe impl Send for VectorMut<'_> {}
unsafe impl Sync for VectorMut<'_> {}

impl<'short> Reborrow<'short> for VectorRef<'_> {
    type Target = VectorRef<'short>;

    #[inline]
    fn rb(&'short self) -> Self::Target {
        *self
    }
}

impl<'short> ReborrowMut<'short> for VectorRef<'_> {
    type Target = VectorRef<'short>;

    #[inline]
    fn rb_mut(&'short mut self) -> Self::Target {
        *self
    }
}

impl IntoConst for VectorRef<'_> {
    type Target = Self;

    #[inline]
    fn into_const(self) -> Self::Target {
        self
    }
}

impl<'short> Reborrow<'short> for VectorMut<'_> {
    type Target = VectorRef<'short>;

    #[inline]
    fn rb(&'short self) -> Self::Target {
        VectorRef {
            ptr: self.ptr,
            len: self.len,
            inc: self.inc,
            __marker: PhantomData,
        }
    }
}

impl<'short> ReborrowMut<'short> for VectorMut<'_> {
    type Target = VectorMut<'short>;

    #[inline]
    fn rb_mut(&'short mut self) -> Self::Target {
        VectorMut {
            ptr: self.ptr,
            len: self.len,
            inc: self.inc,
            __marker: PhantomData,
        }
    }
}

impl<'a> IntoConst for VectorMut<'a> {
    type Target = VectorRef<'a>;

    #[inline]
    fn into_const(self) -> Self::Target {
        VectorRef {
            ptr: self.ptr,
            len: self.len,
            inc: self.inc,
            __marker: PhantomData,
        }
    }
}

impl<'a> VectorRef<'a> {
    /// Creates a vector view from a pointer, a length and an increment.
    ///
    /// # Safety
    /// `ptr` must be non null and every element `i < len` must be valid for reads at
    /// `ptr + i * inc` for the lifetime `'a`.
    #[inline]
    pub unsafe fn from_raw_parts(ptr: *const f64, len: usize, inc: usize) -> Self {
        debug_assert!(!ptr.is_null());
        Self {
            ptr: NonNull::new_unchecked(ptr as *mut f64),
            len,
            inc,
            __marker: PhantomData,
        }
    }

    /// Creates a contiguous vector view over `slice`.
    #[inline]
    pub fn from_slice(slice: &'a [f64]) -> Self {
        unsafe { Self::from_raw_parts(slice.as_ptr(), slice.len(), 1) }
    }

    /// Creates a view over every `inc`-th element of `slice`, starting at the first one.
    #[track_caller]
    #[inline]
    pub fn from_slice_with_inc(slice: &'a [f64], len: usize, inc: usize) -> Self {
        if len > 0 {
            assert!(all(inc > 0, (len - 1) * inc < slice.len()));
        }
        unsafe { Self::from_raw_parts(slice.as_ptr(), len, inc) }
    }

    /// Returns the number of elements of the vector.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the vector has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the distance between consecutive elements, in number of elements.
    #[inline]
    pub fn inc(&self) -> usize {
        self.inc
    }

    /// Returns a pointer to the first element.
    #[inline]
    pub fn as_ptr(self) -> *const f64 {
        self.ptr.as_ptr()
    }

    /// Reads the element at the given index, with no bound checks.
    ///
    /// # Safety
    /// `i < self.len()`.
    #[inline(always)]
    pub unsafe fn read_unchecked(&self, i: usize) -> f64 {
        debug_assert!(i < self.len);
        *self.ptr.as_ptr().add(i * self.inc)
    }

    /// Reads the element at the given index.
    #[track_caller]
    #[inline(always)]
    pub fn read(&self, i: usize) -> f64 {
        assert!(i < self.len);
        unsafe { self.read_unchecked(i) }
    }

    /// Returns the elements as a slice if they are contiguous.
    #[inline]
    pub fn try_as_slice(self) -> Option<&'a [f64]> {
        if self.inc == 1 || self.len <= 1 {
            Some(unsafe { core::slice::from_raw_parts(self.ptr.as_ptr(), self.len) })
        } else {
            None
        }
    }

    /// Returns a view over the elements `start..start + len`.
    #[track_caller]
    #[inline]
    pub fn subvec(self, start: usize, len: usize) -> Self {
        assert!(all(start <= self.len, len <= self.len - start));
        Self {
            ptr: if len == 0 {
                self.ptr
            } else {
                unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(start * self.inc)) }
            },
            len,
            inc: self.inc,
            __marker: PhantomData,
        }
    }

    /// Returns the vector as a `len × 1` general matrix view.
    #[inline]
    pub fn as_column(self) -> GeneralRef<'a> {
        unsafe { GeneralRef::from_raw_parts(self.as_ptr(), self.len, 1, self.inc, 1) }
    }

    /// Returns an iterator over the elements.
    #[inline]
    pub fn iter(self) -> impl Iterator<Item = f64> + 'a {
        (0..self.len).map(move |i| unsafe { self.read_unchecked(i) })
    }

    /// Returns the memory footprint of the view, used for aliasing checks.
    #[inline]
    pub fn footprint(&self) -> Footprint {
        Footprint::new(self.ptr.as_ptr(), self.len, 1, self.inc, 1)
    }

    /// Returns an owning copy of the vector.
    pub fn to_vec_dense(&self) -> VecDense {
        VecDense::from_vec(self.iter().collect())
    }
}

impl<'a> VectorMut<'a> {
    /// Creates a mutable vector view from a pointer, a length and an increment.
    ///
    /// # Safety
    /// `ptr` must be non null and every element `i < len` must be valid for reads and writes
    /// at `ptr + i * inc` for the lifetime `'a`.
    #[inline]
    pub unsafe fn from_raw_parts_mut(ptr: *mut f64, len: usize, inc: usize) -> Self {
        debug_assert!(!ptr.is_null());
        Self {
            ptr: NonNull::new_unchecked(ptr),
            len,
            inc,
            __marker: PhantomData,
        }
    }

    /// Creates a contiguous mutable vector view over `slice`.
    #[inline]
    pub fn from_slice_mut(slice: &'a mut [f64]) -> Self {
        unsafe { Self::from_raw_parts_mut(slice.as_mut_ptr(), slice.len(), 1) }
    }

    /// Creates a mutable view over every `inc`-th element of `slice`.
    #[track_caller]
    #[inline]
    pub fn from_slice_with_inc_mut(slice: &'a mut [f64], len: usize, inc: usize) -> Self {
        if len > 0 {
            assert!(all(inc > 0, (len - 1) * inc < slice.len()));
        }
        unsafe { Self::from_raw_parts_mut(slice.as_mut_ptr(), len, inc) }
    }

    /// Returns the number of elements of the vector.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the vector has no elements.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the distance between consecutive elements, in number of elements.
    #[inline]
    pub fn inc(&self) -> usize {
        self.inc
    }

    /// Returns a mutable pointer to the first element.
    #[inline]
    pub fn as_ptr_mut(self) -> *mut f64 {
        self.ptr.as_ptr()
    }

    /// Reads the element at the given index.
    #[track_caller]
    #[inline(always)]
    pub fn read(&self, i: usize) -> f64 {
        self.rb().read(i)
    }

    /// Reads the element at the given index, with no bound checks.
    ///
    /// # Safety
    /// `i < self.len()`.
    #[inline(always)]
    pub unsafe fn read_unchecked(&self, i: usize) -> f64 {
        self.rb().read_unchecked(i)
    }

    /// Writes the element at the given index, with no bound checks.
    ///
    /// # Safety
    /// `i < self.len()`.
    #[inline(always)]
    pub unsafe fn write_unchecked(&mut self, i: usize, value: f64) {
        debug_assert!(i < self.len);
        *self.ptr.as_ptr().add(i * self.inc) = value;
    }

    /// Writes the element at the given index.
    #[track_caller]
    #[inline(always)]
    pub fn write(&mut self, i: usize, value: f64) {
        assert!(i < self.len);
        unsafe { self.write_unchecked(i, value) }
    }

    /// Returns the elements as a mutable slice if they are contiguous.
    #[inline]
    pub fn try_as_slice_mut(self) -> Option<&'a mut [f64]> {
        if self.inc == 1 || self.len <= 1 {
            Some(unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) })
        } else {
            None
        }
    }

    /// Returns a view over the elements `start..start + len`.
    #[track_caller]
    #[inline]
    pub fn subvec_mut(self, start: usize, len: usize) -> Self {
        let sub = self.into_const().subvec(start, len);
        unsafe { Self::from_raw_parts_mut(sub.as_ptr() as *mut f64, len, sub.inc()) }
    }

    /// Splits the vector at the given index into two disjoint parts.
    #[track_caller]
    #[inline]
    pub fn split_at_mut(self, mid: usize) -> (Self, Self) {
        let len = self.len;
        assert!(mid <= len);
        let ptr = self.ptr.as_ptr();
        let inc = self.inc;
        unsafe {
            let head = Self::from_raw_parts_mut(ptr, mid, inc);
            let tail = if mid == len {
                Self::from_raw_parts_mut(ptr, 0, inc)
            } else {
                Self::from_raw_parts_mut(ptr.add(mid * inc), len - mid, inc)
            };
            (head, tail)
        }
    }

    /// Returns the vector as a `len × 1` general matrix view.
    #[inline]
    pub fn as_column_mut(self) -> GeneralMut<'a> {
        let (len, inc) = (self.len, self.inc);
        unsafe { GeneralMut::from_raw_parts_mut(self.as_ptr_mut(), len, 1, inc, 1) }
    }

    /// Fills the vector with `constant`.
    pub fn fill(&mut self, constant: f64) {
        if let Some(slice) = self.rb_mut().try_as_slice_mut() {
            slice.fill(constant);
            return;
        }
        for i in 0..self.len {
            unsafe { self.write_unchecked(i, constant) };
        }
    }

    /// Copies the elements of `other` into `self`.
    ///
    /// # Panics
    /// Panics if the lengths differ, or with [`MatError::RegionOverlap`] if the two views
    /// partially overlap.
    #[track_caller]
    pub fn copy_from(&mut self, other: VectorRef<'_>) {
        assert!(self.len == other.len);
        match (*self).rb().footprint().classify(&other.footprint()) {
            Overlap::Identical => return,
            Overlap::Partial => fail(MatError::RegionOverlap),
            Overlap::Disjoint => {}
        }
        crate::backend::level1::copy(self.rb_mut(), other);
    }
}

impl Matrix for VectorRef<'_> {
    #[inline]
    fn dims(&self) -> (usize, usize) {
        (self.len, 1)
    }

    #[track_caller]
    #[inline]
    fn at(&self, i: usize, j: usize) -> f64 {
        assert!(j == 0);
        self.read(i)
    }

    #[inline]
    fn as_general(&self) -> Option<GeneralRef<'_>> {
        Some(self.as_column())
    }

    #[inline]
    fn as_vector(&self) -> Option<VectorRef<'_>> {
        Some(*self)
    }
}

impl Matrix for VectorMut<'_> {
    #[inline]
    fn dims(&self) -> (usize, usize) {
        (self.len, 1)
    }

    #[track_caller]
    #[inline]
    fn at(&self, i: usize, j: usize) -> f64 {
        assert!(j == 0);
        self.read(i)
    }

    #[inline]
    fn as_general(&self) -> Option<GeneralRef<'_>> {
        Some(self.rb().as_column())
    }

    #[inline]
    fn as_vector(&self) -> Option<VectorRef<'_>> {
        Some(self.rb())
    }
}

impl MatrixMut for VectorMut<'_> {
    #[track_caller]
    #[inline]
    fn set(&mut self, i: usize, j: usize, value: f64) {
        assert!(j == 0);
        self.write(i, value)
    }
}

impl core::fmt::Debug for VectorRef<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl core::fmt::Debug for VectorMut<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        self.rb().fmt(f)
    }
}
