//! Cursor-based reader over method code.
//!
//! [`Parser`] keeps a position inside a byte slice and offers bounds-checked
//! reads of the primitive operand types. The decoder drives one parser across
//! a whole method; every read that would leave the slice reports
//! [`crate::Error::OutOfBounds`] instead of panicking.
//!
//! # Examples
//!
//! ```rust
//! use bytecircuit::file::Parser;
//!
//! let data = [0x01, 0x02, 0x03, 0x04];
//! let mut parser = Parser::new(&data);
//!
//! let value = parser.read_le::<u16>()?;
//! assert_eq!(value, 0x0201);
//! assert_eq!(parser.pos(), 2);
//! # Ok::<(), bytecircuit::Error>(())
//! ```

use crate::{
    file::io::{read_le_at, CodeIO},
    Result,
};

/// A bounds-checked cursor over a byte slice.
pub struct Parser<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> Parser<'a> {
    /// Create a new parser positioned at the start of `data`.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Parser { data, position: 0 }
    }

    /// Total length of the underlying data.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns `true` if the underlying data is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` while the cursor has not reached the end.
    #[must_use]
    pub fn has_more_data(&self) -> bool {
        self.position < self.data.len()
    }

    /// Move the cursor to `pos`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if `pos` lies past the end.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position = pos;
        Ok(())
    }

    /// Skip `step` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if fewer than `step` bytes remain.
    pub fn advance_by(&mut self, step: usize) -> Result<()> {
        if self.position + step > self.data.len() {
            return Err(out_of_bounds_error!());
        }

        self.position += step;
        Ok(())
    }

    /// Current cursor position.
    #[must_use]
    pub fn pos(&self) -> usize {
        self.position
    }

    /// Peek at the byte under the cursor without consuming it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] at the end of the data.
    pub fn peek_byte(&self) -> Result<u8> {
        self.data
            .get(self.position)
            .copied()
            .ok_or(out_of_bounds_error!())
    }

    /// Read a little-endian value and advance past it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::OutOfBounds`] if the value is truncated.
    pub fn read_le<T: CodeIO>(&mut self) -> Result<T> {
        read_le_at::<T>(self.data, &mut self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_sequential_reads() {
        let data = [0x2A, 0x10, 0x00, 0x00, 0x00, 0xFF];
        let mut parser = Parser::new(&data);

        assert_eq!(parser.read_le::<u8>().expect("u8"), 0x2A);
        assert_eq!(parser.read_le::<i32>().expect("i32"), 0x10);
        assert!(parser.has_more_data());
        assert_eq!(parser.peek_byte().expect("peek"), 0xFF);
        assert_eq!(parser.read_le::<i8>().expect("i8"), -1);
        assert!(!parser.has_more_data());
        assert!(parser.peek_byte().is_err());
    }

    #[test]
    fn test_parser_seek_and_advance() {
        let data = [0u8; 8];
        let mut parser = Parser::new(&data);

        parser.seek(8).expect("seek to end is allowed");
        assert!(!parser.has_more_data());
        assert!(parser.seek(9).is_err());

        parser.seek(2).expect("seek");
        parser.advance_by(6).expect("advance");
        assert_eq!(parser.pos(), 8);
        assert!(parser.advance_by(1).is_err());
    }

    #[test]
    fn test_parser_truncated_read() {
        let data = [0x01, 0x02];
        let mut parser = Parser::new(&data);
        assert!(parser.read_le::<u32>().is_err());
        assert_eq!(parser.pos(), 0);
        assert_eq!(parser.len(), 2);
        assert!(!parser.is_empty());
    }
}
