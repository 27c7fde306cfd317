//! Aliasing detection between strided regions of memory.
//!
//! Two regions are compared exactly when both are row-major (or both column-major) with the
//! same stride, which covers receivers and operands carved from the same owned matrix. Any
//! other pair of layouts is compared conservatively: intersecting address ranges count as a
//! partial overlap.

use super::*;

const ELEM: usize = core::mem::size_of::<f64>();

/// Memory region covered by a strided matrix or vector view.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Footprint {
    addr: usize,
    nrows: usize,
    ncols: usize,
    row_stride: usize,
    col_stride: usize,
}

/// Relation between two [`Footprint`]s.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Overlap {
    /// Both describe exactly the same elements with the same layout.
    Identical,
    /// The regions share some elements, or could not be proven disjoint.
    Partial,
    /// The regions share no element.
    Disjoint,
}

impl Footprint {
    /// Creates the footprint of a strided region. Strides are in number of elements.
    #[inline]
    pub fn new(
        ptr: *const f64,
        nrows: usize,
        ncols: usize,
        row_stride: usize,
        col_stride: usize,
    ) -> Self {
        let mut fp = Self {
            addr: ptr as usize,
            nrows,
            ncols,
            row_stride,
            col_stride,
        };
        // the stride of a single row or column does not affect the covered elements
        if fp.ncols == 1 {
            fp.col_stride = 1;
        }
        if fp.nrows == 1 {
            fp.row_stride = fp.ncols * fp.col_stride;
        }
        fp
    }

    /// Returns `true` if the region covers no element.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nrows == 0 || self.ncols == 0
    }

    /// Distance in bytes between the first and one past the last covered element.
    #[inline]
    fn span(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            ((self.nrows - 1) * self.row_stride + (self.ncols - 1) * self.col_stride + 1) * ELEM
        }
    }

    #[inline]
    fn transpose(self) -> Self {
        Self {
            addr: self.addr,
            nrows: self.ncols,
            ncols: self.nrows,
            row_stride: self.col_stride,
            col_stride: self.row_stride,
        }
    }

    /// Classifies how `self` and `other` share memory.
    pub fn classify(&self, other: &Footprint) -> Overlap {
        if self.is_empty() || other.is_empty() {
            return Overlap::Disjoint;
        }
        if self.addr + self.span() <= other.addr || other.addr + other.span() <= self.addr {
            return Overlap::Disjoint;
        }
        if self == other {
            return Overlap::Identical;
        }

        if let Some(overlaps) = row_major_overlap(self, other) {
            return if overlaps {
                Overlap::Partial
            } else {
                Overlap::Disjoint
            };
        }
        if let Some(overlaps) = row_major_overlap(&self.transpose(), &other.transpose()) {
            return if overlaps {
                Overlap::Partial
            } else {
                Overlap::Disjoint
            };
        }
        Overlap::Partial
    }

    /// Panics with [`MatError::RegionIdentity`](crate::MatError::RegionIdentity) or
    /// [`MatError::RegionOverlap`](crate::MatError::RegionOverlap) unless the regions are
    /// disjoint.
    #[track_caller]
    pub fn check(&self, other: &Footprint) {
        match self.classify(other) {
            Overlap::Identical => crate::error::fail(crate::MatError::RegionIdentity),
            Overlap::Partial => crate::error::fail(crate::MatError::RegionOverlap),
            Overlap::Disjoint => {}
        }
    }
}

/// Exact test for two row-major regions sharing the same row stride, `None` if the layouts do
/// not allow it.
fn row_major_overlap(a: &Footprint, b: &Footprint) -> Option<bool> {
    if a.col_stride != 1 || b.col_stride != 1 {
        return None;
    }
    let stride = match (a.nrows, b.nrows) {
        (1, 1) => Ord::max(a.row_stride, b.row_stride),
        (1, _) => b.row_stride,
        (_, 1) => a.row_stride,
        _ if a.row_stride == b.row_stride => a.row_stride,
        _ => return None,
    };
    if stride == 0 || a.ncols > stride || b.ncols > stride {
        return None;
    }
    let delta = a.addr.abs_diff(b.addr);
    if delta % ELEM != 0 {
        return None;
    }

    let (first, second) = if a.addr <= b.addr { (a, b) } else { (b, a) };
    let offset = delta / ELEM;
    let r = offset / stride;
    let c = offset % stride;

    Some((c < first.ncols && r < first.nrows) || (c + second.ncols > stride && r + 1 < first.nrows))
}

/// Relation between a receiver and an arbitrary operand.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Alias {
    /// The operand shares no memory with the receiver.
    None,
    /// The operand is a general view of exactly the receiver's elements.
    Same,
    /// Any other shared memory.
    Overlap,
}

impl Alias {
    /// Compares the receiver footprint `dst` with the raw storage exposed by `operand`.
    pub(crate) fn of(dst: Footprint, operand: &dyn Matrix) -> Alias {
        if let Some(g) = operand.as_general() {
            return match dst.classify(&g.footprint()) {
                Overlap::Identical => Alias::Same,
                Overlap::Partial => Alias::Overlap,
                Overlap::Disjoint => Alias::None,
            };
        }
        let fp = if let Some(s) = operand.as_symmetric() {
            s.footprint()
        } else if let Some(t) = operand.as_triangular() {
            t.footprint()
        } else if let Some(v) = operand.as_vector() {
            v.footprint()
        } else {
            return Alias::None;
        };
        match dst.classify(&fp) {
            Overlap::Disjoint => Alias::None,
            _ => Alias::Overlap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert;

    fn fp(base: &[f64], offset: usize, nrows: usize, ncols: usize, stride: usize) -> Footprint {
        Footprint::new(base.as_ptr().wrapping_add(offset), nrows, ncols, stride, 1)
    }

    #[test]
    fn identical_and_disjoint() {
        let buf = vec![0.0; 64];
        let a = fp(&buf, 0, 3, 3, 8);
        assert!(a.classify(&a) == Overlap::Identical);
        assert!(a.classify(&fp(&buf, 3, 3, 3, 8)) == Overlap::Disjoint);
        assert!(a.classify(&fp(&buf, 24, 2, 2, 8)) == Overlap::Disjoint);
        assert!(a.classify(&fp(&buf, 0, 2, 3, 8)) == Overlap::Partial);
    }

    #[test]
    fn interleaved_columns_are_disjoint() {
        let buf = vec![0.0; 64];
        // columns 0..2 and 2..4 of the same 8 wide buffer
        let left = fp(&buf, 0, 4, 2, 8);
        let right = fp(&buf, 2, 4, 2, 8);
        assert!(left.classify(&right) == Overlap::Disjoint);
        assert!(right.classify(&left) == Overlap::Disjoint);
    }

    #[test]
    fn wrapped_row_overlap() {
        let buf = vec![0.0; 64];
        // second view starts at column 6 of row 0 and wraps onto row 1 columns 0..2
        let a = fp(&buf, 0, 3, 2, 8);
        let b = fp(&buf, 6, 2, 4, 8);
        assert!(a.classify(&b) == Overlap::Partial);
        assert!(b.classify(&a) == Overlap::Partial);

        // same thing on the last row of a, where nothing wraps into a
        let c = fp(&buf, 22, 1, 4, 8);
        assert!(a.classify(&c) == Overlap::Disjoint);
    }

    #[test]
    fn strided_vectors() {
        let buf = vec![0.0; 16];
        let even = Footprint::new(buf.as_ptr(), 8, 1, 2, 1);
        let odd = Footprint::new(buf.as_ptr().wrapping_add(1), 8, 1, 2, 1);
        assert!(even.classify(&odd) == Overlap::Disjoint);
        let dense = Footprint::new(buf.as_ptr(), 16, 1, 1, 1);
        assert!(even.classify(&dense) == Overlap::Partial);
    }

    #[test]
    fn transposed_pair_is_checked_exactly() {
        let buf = vec![0.0; 16];
        let a = Footprint::new(buf.as_ptr(), 2, 4, 1, 4);
        let b = Footprint::new(buf.as_ptr().wrapping_add(2), 2, 4, 1, 4);
        assert!(a.classify(&b) == Overlap::Disjoint);
    }

    #[test]
    #[should_panic(expected = "matrix: region overlap")]
    fn check_rejects_partial_overlap() {
        let buf = vec![0.0; 16];
        fp(&buf, 0, 2, 2, 4).check(&fp(&buf, 1, 2, 2, 4));
    }

    #[test]
    #[should_panic(expected = "matrix: region identity")]
    fn check_rejects_identity() {
        let buf = vec![0.0; 16];
        fp(&buf, 0, 2, 2, 4).check(&fp(&buf, 0, 2, 2, 4));
    }
}
