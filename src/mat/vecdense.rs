use super::*;
use crate::{
    assert,
    error::{fail, MatError},
};

/// Owning column vector stored contiguously.
///
/// As a [`Matrix`], a vector of length `n` is an `n × 1` matrix.
#[derive(Clone, Default, PartialEq)]
pub struct VecDense {
    data: Vec<f64>,
}

impl VecDense {
    /// Returns an empty vector, which can be used as the receiver of any operation.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a vector of `n` zeros.
    ///
    /// # Panics
    /// Panics with [`MatError::ZeroLength`] if `n == 0`.
    #[track_caller]
    pub fn zeros(n: usize) -> Self {
        if n == 0 {
            fail(MatError::ZeroLength);
        }
        Self {
            data: vec![0.0; n],
        }
    }

    /// Creates a vector owning `data`.
    ///
    /// # Panics
    /// Panics with [`MatError::ZeroLength`] if `data` is empty.
    #[track_caller]
    pub fn from_vec(data: Vec<f64>) -> Self {
        if data.is_empty() {
            fail(MatError::ZeroLength);
        }
        Self { data }
    }

    /// Returns `true` if the vector has zero length.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Empties the vector, keeping the allocated memory for later reuse.
    #[inline]
    pub fn reset(&mut self) {
        self.data.clear();
    }

    /// Prepares `self` to receive a result of length `n`: an empty vector is resized, a
    /// non-empty one must already have this length.
    #[track_caller]
    pub fn reuse_as_vec(&mut self, n: usize) {
        if n == 0 {
            fail(MatError::ZeroLength);
        }
        if self.is_empty() {
            self.data.resize(n, 0.0);
        } else {
            assert!(self.data.len() == n);
        }
    }

    /// Returns the element at index `i`.
    #[track_caller]
    #[inline]
    pub fn at_vec(&self, i: usize) -> f64 {
        assert!(i < self.data.len());
        self.data[i]
    }

    /// Sets the element at index `i`.
    #[track_caller]
    #[inline]
    pub fn set_vec(&mut self, i: usize, value: f64) {
        assert!(i < self.data.len());
        self.data[i] = value;
    }

    /// Returns the elements as a slice.
    #[inline]
    pub fn raw_data(&self) -> &[f64] {
        &self.data
    }

    /// Returns the elements as a mutable slice.
    #[inline]
    pub fn raw_data_mut(&mut self) -> &mut [f64] {
        &mut self.data
    }

    /// Consumes the vector, returning its elements.
    #[inline]
    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Returns a view over the vector.
    #[inline]
    pub fn as_vec_ref(&self) -> VectorRef<'_> {
        VectorRef::from_slice(&self.data)
    }

    /// Returns a mutable view over the vector.
    #[inline]
    pub fn as_vec_mut(&mut self) -> VectorMut<'_> {
        VectorMut::from_slice_mut(&mut self.data)
    }

    /// Returns a view over the elements `i..k`.
    #[track_caller]
    #[inline]
    pub fn slice_vec(&self, i: usize, k: usize) -> VectorRef<'_> {
        assert!(i <= k);
        self.as_vec_ref().subvec(i, k - i)
    }

    /// Copies the elements of the column vector `a` into the receiver.
    #[track_caller]
    pub fn copy_vec(&mut self, a: &dyn Matrix) {
        let (n, c) = a.dims();
        assert!(c == 1);
        self.reuse_as_vec(n);
        self.as_vec_mut().as_column_mut().copy_from_matrix(a);
    }
}

impl Matrix for VecDense {
    #[inline]
    fn dims(&self) -> (usize, usize) {
        (self.data.len(), 1)
    }

    #[track_caller]
    #[inline]
    fn at(&self, i: usize, j: usize) -> f64 {
        assert!(j == 0);
        self.at_vec(i)
    }

    #[inline]
    fn as_general(&self) -> Option<GeneralRef<'_>> {
        Some(self.as_vec_ref().as_column())
    }

    #[inline]
    fn as_vector(&self) -> Option<VectorRef<'_>> {
        Some(self.as_vec_ref())
    }
}

impl MatrixMut for VecDense {
    #[track_caller]
    #[inline]
    fn set(&mut self, i: usize, j: usize, value: f64) {
        assert!(j == 0);
        self.set_vec(i, value)
    }
}

impl core::fmt::Debug for VecDense {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(&self.data).finish()
    }
}
