//! Little-endian primitive access for bytecode operands.
//!
//! Operand fields of every instruction format are stored little-endian. The
//! [`CodeIO`] trait abstracts over the fixed-width integer types the formats use
//! so the decoder and the assembler read and write them through one code path.

use crate::{Error::OutOfBounds, Result};

/// A fixed-width value that can appear as an instruction operand.
pub trait CodeIO: Sized + Copy {
    /// Encoded width in bytes
    const WIDTH: usize;

    /// Decode from exactly [`Self::WIDTH`] little-endian bytes.
    fn from_le_slice(bytes: &[u8]) -> Option<Self>;

    /// Append the little-endian encoding to `out`.
    fn write_le(self, out: &mut Vec<u8>);
}

macro_rules! impl_code_io {
    ($($ty:ty),* $(,)?) => {
        $(
            impl CodeIO for $ty {
                const WIDTH: usize = std::mem::size_of::<$ty>();

                fn from_le_slice(bytes: &[u8]) -> Option<Self> {
                    let array = bytes.try_into().ok()?;
                    Some(<$ty>::from_le_bytes(array))
                }

                fn write_le(self, out: &mut Vec<u8>) {
                    out.extend_from_slice(&self.to_le_bytes());
                }
            }
        )*
    };
}

impl_code_io!(u8, i8, u16, i16, u32, i32, u64, i64, f64);

/// Safely reads a value of type `T` in little-endian byte order at `offset`,
/// advancing `offset` past it.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if fewer than `T::WIDTH` bytes remain.
pub fn read_le_at<T: CodeIO>(data: &[u8], offset: &mut usize) -> Result<T> {
    let end = offset.checked_add(T::WIDTH).ok_or(OutOfBounds)?;
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let value = T::from_le_slice(&data[*offset..end]).ok_or(OutOfBounds)?;
    *offset = end;
    Ok(value)
}

/// Writes `value` in little-endian byte order into `data` at `offset`.
///
/// Used to patch branch offsets once labels are resolved.
///
/// # Errors
///
/// Returns [`crate::Error::OutOfBounds`] if the value does not fit.
pub fn write_le_at<T: CodeIO>(data: &mut [u8], offset: usize, value: T) -> Result<()> {
    let end = offset.checked_add(T::WIDTH).ok_or(OutOfBounds)?;
    if end > data.len() {
        return Err(OutOfBounds);
    }

    let mut encoded = Vec::with_capacity(T::WIDTH);
    value.write_le(&mut encoded);
    data[offset..end].copy_from_slice(&encoded);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_le_at_advances() {
        let data = [0x34, 0x12, 0xFF];
        let mut offset = 0;
        let value: u16 = read_le_at(&data, &mut offset).expect("read u16");
        assert_eq!(value, 0x1234);
        assert_eq!(offset, 2);

        let signed: i8 = read_le_at(&data, &mut offset).expect("read i8");
        assert_eq!(signed, -1);
        assert_eq!(offset, 3);
    }

    #[test]
    fn test_read_le_at_out_of_bounds() {
        let data = [0x01, 0x02, 0x03];
        let mut offset = 1;
        assert!(matches!(
            read_le_at::<u32>(&data, &mut offset),
            Err(crate::Error::OutOfBounds)
        ));
        assert_eq!(offset, 1, "offset must not move on failure");
    }

    #[test]
    fn test_write_le_at_patches_in_place() {
        let mut data = vec![0u8; 4];
        write_le_at(&mut data, 1, -2i16).expect("patch");
        assert_eq!(data, vec![0x00, 0xFE, 0xFF, 0x00]);
        assert!(write_le_at(&mut data, 3, 0u16).is_err());
    }

    #[test]
    fn test_f64_bits() {
        let mut out = Vec::new();
        1.5f64.write_le(&mut out);
        let mut offset = 0;
        let value: f64 = read_le_at(&out, &mut offset).expect("read f64");
        assert_eq!(value.to_bits(), 1.5f64.to_bits());
    }
}
