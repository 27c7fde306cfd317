//! Binary encoding of matrices and vectors.
//!
//! A [`Dense`] is encoded as its dimensions followed by its elements in row-major order, and a
//! [`VecDense`] as its length followed by its elements:
//!
//! | field  | type                 |
//! |--------|----------------------|
//! | `rows` | `i64`                |
//! | `cols` | `i64`                |
//! | `data` | `f64 × (rows · cols)`|
//!
//! All values are little-endian. An empty matrix encodes as `rows = cols = 0` with no data.
//!
//! ```
//! use dense_la::{mat, Dense};
//!
//! let a = mat![[1.0, 2.0], [3.0, 4.0]];
//! let bytes = a.marshal_binary();
//! assert_eq!(bytes.len(), 16 + 4 * 8);
//!
//! let mut b = Dense::new();
//! b.unmarshal_binary(&bytes).unwrap();
//! assert!(a == b);
//! ```

use crate::{assert, Dense, VecDense};
use core::fmt;
use std::io::{Read, Write};

const HEADER_LEN: usize = 8;

/// Error returned when decoding a matrix or vector fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum DecodeError {
    /// A dimension is negative.
    NegativeDimension(i64),
    /// Exactly one of the two dimensions of a matrix is zero.
    ZeroLength,
    /// The number of elements does not fit in memory.
    TooBig,
    /// The buffer does not have the length implied by the dimensions.
    Length {
        /// Required number of bytes.
        expected: usize,
        /// Number of bytes available.
        found: usize,
    },
    /// The underlying reader failed.
    Io(std::io::ErrorKind),
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            DecodeError::NegativeDimension(d) => write!(f, "matrix: negative dimension {d}"),
            DecodeError::ZeroLength => f.write_str("matrix: zero length in matrix dimension"),
            DecodeError::TooBig => f.write_str("matrix: encoded size overflows"),
            DecodeError::Length { expected, found } => {
                write!(f, "matrix: expected {expected} bytes, found {found}")
            }
            DecodeError::Io(kind) => write!(f, "matrix: read failed: {kind}"),
        }
    }
}

impl std::error::Error for DecodeError {}

impl From<std::io::Error> for DecodeError {
    #[inline]
    fn from(e: std::io::Error) -> Self {
        DecodeError::Io(e.kind())
    }
}

#[inline]
fn read_i64(bytes: &[u8]) -> i64 {
    let mut buf = [0u8; HEADER_LEN];
    buf.copy_from_slice(&bytes[..HEADER_LEN]);
    i64::from_le_bytes(buf)
}

fn dim(d: i64) -> Result<usize, DecodeError> {
    if d < 0 {
        return Err(DecodeError::NegativeDimension(d));
    }
    usize::try_from(d).map_err(|_| DecodeError::TooBig)
}

fn data_len(header: usize, count: usize) -> Result<usize, DecodeError> {
    count
        .checked_mul(core::mem::size_of::<f64>())
        .and_then(|n| n.checked_add(header))
        .ok_or(DecodeError::TooBig)
}

fn check_len(expected: usize, found: usize) -> Result<(), DecodeError> {
    if expected != found {
        return Err(DecodeError::Length { expected, found });
    }
    Ok(())
}

fn decode_values(bytes: &[u8]) -> Vec<f64> {
    bytes
        .chunks_exact(8)
        .map(|c| {
            let mut buf = [0u8; 8];
            buf.copy_from_slice(c);
            f64::from_le_bytes(buf)
        })
        .collect()
}

/// Reads `count` values from `r`. The buffer grows with the data actually read, so a header
/// announcing more elements than the stream holds fails with `UnexpectedEof`.
fn read_values<R: Read>(r: &mut R, count: usize) -> Result<Vec<f64>, DecodeError> {
    let len = data_len(0, count)?;
    let mut bytes = Vec::new();
    r.by_ref().take(len as u64).read_to_end(&mut bytes)?;
    if bytes.len() != len {
        return Err(DecodeError::Io(std::io::ErrorKind::UnexpectedEof));
    }
    Ok(decode_values(&bytes))
}

/// Decodes the dimensions of a matrix header, returning `None` for an empty matrix.
fn matrix_dims(header: &[u8]) -> Result<Option<(usize, usize)>, DecodeError> {
    let nrows = dim(read_i64(header))?;
    let ncols = dim(read_i64(&header[HEADER_LEN..]))?;
    match (nrows == 0, ncols == 0) {
        (true, true) => Ok(None),
        (false, false) => Ok(Some((nrows, ncols))),
        _ => Err(DecodeError::ZeroLength),
    }
}

impl Dense {
    /// Returns the binary encoding of the matrix.
    pub fn marshal_binary(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(2 * HEADER_LEN + 8 * self.nrows() * self.ncols());
        self.encode(&mut out);
        out
    }

    /// Writes the binary encoding of the matrix to `w`, and returns the number of bytes written.
    pub fn marshal_binary_to<W: Write>(&self, w: &mut W) -> std::io::Result<usize> {
        let bytes = self.marshal_binary();
        w.write_all(&bytes)?;
        Ok(bytes.len())
    }

    fn encode(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&(self.nrows() as i64).to_le_bytes());
        out.extend_from_slice(&(self.ncols() as i64).to_le_bytes());
        let a = self.as_ref();
        for i in 0..self.nrows() {
            for j in 0..self.ncols() {
                out.extend_from_slice(&a.read(i, j).to_le_bytes());
            }
        }
    }

    /// Decodes a matrix from `data` into the receiver.
    ///
    /// On error the receiver is left empty.
    ///
    /// # Panics
    /// Panics if the receiver is not empty.
    #[track_caller]
    pub fn unmarshal_binary(&mut self, data: &[u8]) -> Result<(), DecodeError> {
        assert!(self.is_empty());
        let header = 2 * HEADER_LEN;
        if data.len() < header {
            return Err(DecodeError::Length {
                expected: header,
                found: data.len(),
            });
        }
        let Some((nrows, ncols)) = matrix_dims(&data[..header])? else {
            return check_len(header, data.len());
        };
        let count = nrows.checked_mul(ncols).ok_or(DecodeError::TooBig)?;
        check_len(data_len(header, count)?, data.len())?;
        *self = Dense::from_vec(nrows, ncols, decode_values(&data[header..]));
        Ok(())
    }

    /// Decodes a matrix read from `r` into the receiver, and returns the number of bytes read.
    ///
    /// # Panics
    /// Panics if the receiver is not empty.
    #[track_caller]
    pub fn unmarshal_binary_from<R: Read>(&mut self, r: &mut R) -> Result<usize, DecodeError> {
        assert!(self.is_empty());
        let mut header = [0u8; 2 * HEADER_LEN];
        r.read_exact(&mut header)?;
        let Some((nrows, ncols)) = matrix_dims(&header)? else {
            return Ok(header.len());
        };
        let count = nrows.checked_mul(ncols).ok_or(DecodeError::TooBig)?;
        let total = data_len(header.len(), count)?;
        let data = read_values(r, count)?;
        *self = Dense::from_vec(nrows, ncols, data);
        Ok(total)
    }
}

impl VecDense {
    /// Returns the binary encoding of the vector.
    pub fn marshal_binary(&self) -> Vec<u8> {
        let n = self.len();
        let mut out = Vec::with_capacity(HEADER_LEN + 8 * n);
        out.extend_from_slice(&(n as i64).to_le_bytes());
        let v = self.as_vec_ref();
        for i in 0..n {
            out.extend_from_slice(&v.read(i).to_le_bytes());
        }
        out
    }

    /// Writes the binary encoding of the vector to `w`, and returns the number of bytes written.
    pub fn marshal_binary_to<W: Write>(&self, w: &mut W) -> std::io::Result<usize> {
        let bytes = self.marshal_binary();
        w.write_all(&bytes)?;
        Ok(bytes.len())
    }

    /// Decodes a vector from `data` into the receiver.
    ///
    /// # Panics
    /// Panics if the receiver is not empty.
    #[track_caller]
    pub fn unmarshal_binary(&mut self, data: &[u8]) -> Result<(), DecodeError> {
        assert!(self.is_empty());
        if data.len() < HEADER_LEN {
            return Err(DecodeError::Length {
                expected: HEADER_LEN,
                found: data.len(),
            });
        }
        let n = dim(read_i64(data))?;
        check_len(data_len(HEADER_LEN, n)?, data.len())?;
        if n > 0 {
            *self = VecDense::from_vec(decode_values(&data[HEADER_LEN..]));
        }
        Ok(())
    }

    /// Decodes a vector read from `r` into the receiver, and returns the number of bytes read.
    ///
    /// # Panics
    /// Panics if the receiver is not empty.
    #[track_caller]
    pub fn unmarshal_binary_from<R: Read>(&mut self, r: &mut R) -> Result<usize, DecodeError> {
        assert!(self.is_empty());
        let mut header = [0u8; HEADER_LEN];
        r.read_exact(&mut header)?;
        let n = dim(i64::from_le_bytes(header))?;
        let total = data_len(HEADER_LEN, n)?;
        if n > 0 {
            *self = VecDense::from_vec(read_values(r, n)?);
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assert;
    use crate::{mat, vector, Matrix};

    fn header(rows: i64, cols: i64) -> Vec<u8> {
        let mut out = rows.to_le_bytes().to_vec();
        out.extend_from_slice(&cols.to_le_bytes());
        out
    }

    #[test]
    fn matrix_layout() {
        let a = mat![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]];
        let bytes = a.marshal_binary();
        assert_eq!(&bytes[..16], &header(2, 3)[..]);
        // row-major: the second element is (0, 1)
        assert_eq!(&bytes[24..32], &2.0f64.to_le_bytes()[..]);

        let mut b = Dense::new();
        b.unmarshal_binary(&bytes).unwrap();
        assert!(b == a);
    }

    #[test]
    fn empty_matrix() {
        let bytes = Dense::new().marshal_binary();
        assert!(bytes == header(0, 0));
        let mut b = Dense::new();
        b.unmarshal_binary(&bytes).unwrap();
        assert!(b.is_empty());
    }

    #[test]
    fn invalid_headers() {
        let mut b = Dense::new();
        assert!(b.unmarshal_binary(&header(-1, 2)) == Err(DecodeError::NegativeDimension(-1)));
        assert!(b.unmarshal_binary(&header(0, 2)) == Err(DecodeError::ZeroLength));
        assert!(b.unmarshal_binary(&header(i64::MAX, i64::MAX)) == Err(DecodeError::TooBig));
        assert!(
            b.unmarshal_binary(&[0u8; 9])
                == Err(DecodeError::Length {
                    expected: 16,
                    found: 9
                })
        );

        let mut short = header(1, 2);
        short.extend_from_slice(&1.0f64.to_le_bytes());
        assert!(
            b.unmarshal_binary(&short)
                == Err(DecodeError::Length {
                    expected: 32,
                    found: 24
                })
        );
        let mut long = mat![[1.0, 2.0]].marshal_binary();
        long.push(0);
        assert!(matches!(b.unmarshal_binary(&long), Err(DecodeError::Length { .. })));
        assert!(b.is_empty());
    }

    #[test]
    #[should_panic]
    fn non_empty_receiver_panics() {
        let a = mat![[1.0]];
        let mut b = mat![[2.0]];
        let _ = b.unmarshal_binary(&a.marshal_binary());
    }

    #[test]
    fn vectors() {
        let v = vector![1.5, -2.0, 0.25];
        let bytes = v.marshal_binary();
        assert!(bytes.len() == 8 + 3 * 8);
        assert_eq!(&bytes[..8], &3i64.to_le_bytes()[..]);

        let mut w = VecDense::new();
        w.unmarshal_binary(&bytes).unwrap();
        assert_eq!(w.raw_data(), v.raw_data());

        let mut e = VecDense::new();
        e.unmarshal_binary(&0i64.to_le_bytes()).unwrap();
        assert!(e.is_empty());
        assert!(
            e.unmarshal_binary(&(-3i64).to_le_bytes()) == Err(DecodeError::NegativeDimension(-3))
        );
    }

    #[test]
    fn streams() {
        let a = mat![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let v = vector![7.0, 8.0];
        let mut buf = Vec::new();
        let na = a.marshal_binary_to(&mut buf).unwrap();
        let nv = v.marshal_binary_to(&mut buf).unwrap();
        assert!(na + nv == buf.len());

        let mut r = buf.as_slice();
        let mut b = Dense::new();
        let mut w = VecDense::new();
        assert!(b.unmarshal_binary_from(&mut r).unwrap() == na);
        assert!(w.unmarshal_binary_from(&mut r).unwrap() == nv);
        assert!(b == a);
        assert!(w.dims() == (2, 1));
        assert!(r.is_empty());

        let mut c = Dense::new();
        let truncated = &a.marshal_binary()[..20];
        assert!(
            c.unmarshal_binary_from(&mut &truncated[..])
                == Err(DecodeError::Io(std::io::ErrorKind::UnexpectedEof))
        );
    }

    #[test]
    fn oversized_header_on_short_stream() {
        let eof = Err(DecodeError::Io(std::io::ErrorKind::UnexpectedEof));

        let bytes = header(1 << 26, 1 << 26);
        let mut m = Dense::new();
        assert!(m.unmarshal_binary_from(&mut bytes.as_slice()) == eof);
        assert!(m.is_empty());

        let mut bytes = (1i64 << 40).to_le_bytes().to_vec();
        bytes.extend_from_slice(&1.0f64.to_le_bytes());
        let mut v = VecDense::new();
        assert!(v.unmarshal_binary_from(&mut bytes.as_slice()) == eof);
        assert!(v.is_empty());
    }
}
