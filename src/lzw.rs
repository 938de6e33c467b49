// lzw.rs
//
// Copyright (c) 2020-2025  Douglas Lau
//
//! Lempel-Ziv-Welch decompression for GIF
use crate::error::{Error, Result};
use std::ops::AddAssign;

/// Code Bits
#[derive(Clone, Copy, Debug, PartialEq)]
struct Bits(u8);

impl From<u8> for Bits {
    fn from(bits: u8) -> Self {
        Bits(bits.min(Self::MAX.0))
    }
}

impl From<Bits> for u8 {
    fn from(bits: Bits) -> Self {
        bits.0
    }
}

impl AddAssign<u8> for Bits {
    fn add_assign(&mut self, rhs: u8) {
        self.0 = (self.0 + rhs).min(Self::MAX.0)
    }
}

impl Bits {
    /// Maximum code bits allowed for GIF
    const MAX: Self = Bits(12);

    /// Get the number of entries
    fn entries(self) -> u16 {
        1 << (self.0 as u16)
    }
}

/// Code type
type Code = u16;

/// Entry in the code table.
///
/// Each entry is its prefix code plus one trailing color index, so a
/// sequence is recovered by walking prefixes back to a literal.
#[derive(Clone, Copy, Debug)]
struct Entry {
    /// Prefix code (literal or table entry)
    prefix: Code,
    /// Last color index of the sequence
    index: u8,
    /// First color index of the sequence
    first: u8,
    /// Length of the sequence
    len: u16,
}

/// Reader for variable-width codes, packed LSB-first
struct CodeReader<'a> {
    /// Compressed data
    bytes: &'a [u8],
    /// Bit position
    pos: usize,
}

impl<'a> CodeReader<'a> {
    /// Bytes past the end of data which may be read (as zeros)
    const SLACK: usize = 2;

    fn new(bytes: &'a [u8]) -> Self {
        CodeReader { bytes, pos: 0 }
    }

    /// Read the next code, or `None` past the end of data plus slack
    fn next(&mut self, bits: Bits) -> Option<Code> {
        let n_bits = usize::from(u8::from(bits));
        if self.pos + n_bits > (self.bytes.len() + Self::SLACK) * 8 {
            return None;
        }
        let mut code = 0;
        for i in 0..n_bits {
            let p = self.pos + i;
            let byte = self.bytes.get(p / 8).copied().unwrap_or(0);
            code |= Code::from((byte >> (p % 8)) & 1) << i;
        }
        self.pos += n_bits;
        Some(code)
    }
}

/// LZW Data Decompressor
#[derive(Debug)]
pub struct Decompressor {
    /// Code table (codes starting after the end code)
    table: Vec<Entry>,
    /// Minimum code bits
    min_code_bits: u8,
    /// Current code bits
    code_bits: Bits,
    /// Last code (`None` right after a clear code)
    last: Option<Code>,
}

impl Decompressor {
    /// Create a new decompressor
    pub fn new(min_code_bits: u8) -> Self {
        let min_code_bits = min_code_bits.clamp(1, Bits::MAX.0 - 1);
        Decompressor {
            table: Vec::with_capacity(Bits::MAX.entries().into()),
            min_code_bits,
            code_bits: Bits::from(min_code_bits + 1),
            last: None,
        }
    }

    /// Get the current code width, in bits
    pub fn code_bits(&self) -> u8 {
        self.code_bits.into()
    }

    /// Get the number of entries added since the last clear code
    pub fn table_len(&self) -> usize {
        self.table.len()
    }

    /// Get the clear code
    fn clear_code(&self) -> Code {
        1 << self.min_code_bits
    }

    /// Get the end code
    fn end_code(&self) -> Code {
        self.clear_code() + 1
    }

    /// Get the first code available for table entries
    fn first_code(&self) -> Code {
        self.clear_code() + 2
    }

    /// Get the next code to be assigned
    fn next_code(&self) -> Code {
        self.first_code() + self.table.len() as Code
    }

    /// Reset the code table
    fn reset(&mut self) {
        self.table.clear();
        self.code_bits = Bits::from(self.min_code_bits + 1);
        self.last = None;
    }

    /// Decompress a complete block of data.
    ///
    /// Decoded color indices are appended to `buffer`; decoding stops at the
    /// end code, at the end of data, or once `limit` indices are decoded.
    pub fn decompress(
        &mut self,
        bytes: &[u8],
        buffer: &mut Vec<u8>,
        limit: usize,
    ) -> Result<()> {
        let mut reader = CodeReader::new(bytes);
        let mut n_clear = 0;
        while buffer.len() < limit {
            let code = match reader.next(self.code_bits) {
                Some(code) => code,
                None => {
                    warn!("LZW data ended without end code");
                    break;
                }
            };
            if code == self.end_code() {
                break;
            }
            if code == self.clear_code() {
                n_clear += 1;
            }
            self.decompress_code(code, buffer)?;
        }
        debug!(
            "lzw: {} bytes -> {} indices, {} clear codes, {} code bits",
            bytes.len(),
            buffer.len(),
            n_clear,
            self.code_bits()
        );
        Ok(())
    }

    /// Decompress one code
    fn decompress_code(&mut self, code: Code, buffer: &mut Vec<u8>) -> Result<()> {
        if code == self.clear_code() {
            self.reset();
            return Ok(());
        }
        match self.last {
            None => {
                if code >= self.clear_code() {
                    return Err(Error::InvalidLzwData);
                }
                buffer.push(code as u8);
            }
            Some(last) => {
                let next_code = self.next_code();
                if code < next_code {
                    let start = buffer.len();
                    self.push_sequence(code, buffer)?;
                    let first = buffer[start];
                    self.push_entry(last, first);
                } else if code == next_code {
                    self.push_entry(last, self.first_index(last));
                    self.push_sequence(code, buffer)?;
                } else {
                    return Err(Error::InvalidLzwData);
                }
            }
        }
        self.last = Some(code);
        Ok(())
    }

    /// Get a table entry
    fn entry(&self, code: Code) -> Entry {
        debug_assert!(code >= self.first_code());
        self.table[usize::from(code - self.first_code())]
    }

    /// Get the first color index of a code's sequence
    fn first_index(&self, code: Code) -> u8 {
        if code < self.clear_code() {
            code as u8
        } else {
            self.entry(code).first
        }
    }

    /// Get the length of a code's sequence
    fn sequence_len(&self, code: Code) -> u16 {
        if code < self.clear_code() {
            1
        } else {
            self.entry(code).len
        }
    }

    /// Append a new table entry, widening codes when needed
    fn push_entry(&mut self, prefix: Code, index: u8) {
        if self.next_code() >= Bits::MAX.entries() {
            return;
        }
        let entry = Entry {
            prefix,
            index,
            first: self.first_index(prefix),
            len: self.sequence_len(prefix) + 1,
        };
        self.table.push(entry);
        if self.next_code() >= self.code_bits.entries()
            && self.code_bits != Bits::MAX
        {
            self.code_bits += 1;
        }
    }

    /// Append the color indices of a code's sequence to a buffer
    fn push_sequence(&self, code: Code, buffer: &mut Vec<u8>) -> Result<()> {
        let len = usize::from(self.sequence_len(code));
        buffer.try_reserve(len)?;
        let start = buffer.len();
        buffer.resize(start + len, 0);
        let mut code = code;
        for slot in buffer[start..].iter_mut().rev() {
            if code < self.clear_code() {
                *slot = code as u8;
            } else {
                let entry = self.entry(code);
                *slot = entry.index;
                code = entry.prefix;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Pack (code, bits) pairs LSB-first
    fn pack(codes: &[(Code, u8)]) -> Vec<u8> {
        let mut bytes = vec![];
        let mut acc = 0u32;
        let mut n_bits = 0;
        for (code, bits) in codes {
            acc |= u32::from(*code) << n_bits;
            n_bits += bits;
            while n_bits >= 8 {
                bytes.push(acc as u8);
                acc >>= 8;
                n_bits -= 8;
            }
        }
        if n_bits > 0 {
            bytes.push(acc as u8);
        }
        bytes
    }

    fn decompress(min: u8, bytes: &[u8]) -> Result<Vec<u8>> {
        let mut dec = Decompressor::new(min);
        let mut buffer = vec![];
        dec.decompress(bytes, &mut buffer, usize::MAX)?;
        Ok(buffer)
    }

    #[test]
    fn two_by_two() -> Result<()> {
        assert_eq!(decompress(2, &[0x0C, 0x10, 0x05])?, [1, 0, 0, 1]);
        Ok(())
    }

    #[test]
    fn ten_by_ten() -> Result<()> {
        let data = [
            0x8C, 0x2D, 0x99, 0x87, 0x2A, 0x1C, 0xDC, 0x33, 0xA0, 0x02, 0x75,
            0xEC, 0x95, 0xFA, 0xA8, 0xDE, 0x60, 0x8C, 0x04, 0x91, 0x4C, 0x01,
        ];
        let image = [
            1, 1, 1, 1, 1, 2, 2, 2, 2, 2, //
            1, 1, 1, 1, 1, 2, 2, 2, 2, 2, //
            1, 1, 1, 1, 1, 2, 2, 2, 2, 2, //
            1, 1, 1, 0, 0, 0, 0, 2, 2, 2, //
            1, 1, 1, 0, 0, 0, 0, 2, 2, 2, //
            2, 2, 2, 0, 0, 0, 0, 1, 1, 1, //
            2, 2, 2, 0, 0, 0, 0, 1, 1, 1, //
            2, 2, 2, 2, 2, 1, 1, 1, 1, 1, //
            2, 2, 2, 2, 2, 1, 1, 1, 1, 1, //
            2, 2, 2, 2, 2, 1, 1, 1, 1, 1, //
        ];
        assert_eq!(decompress(2, &data)?, image);
        Ok(())
    }

    #[test]
    fn clear_resets() -> Result<()> {
        let data = pack(&[(4, 3), (0, 3), (0, 3), (6, 3), (4, 4), (1, 3)]);
        let mut dec = Decompressor::new(2);
        let mut buffer = vec![];
        // stop before the second clear code
        dec.decompress(&data[..], &mut buffer, 4)?;
        assert_eq!(buffer, [0, 0, 0, 0]);
        assert_eq!(dec.table_len(), 2);
        assert_eq!(dec.code_bits(), 4);
        let data = pack(&[
            (4, 3),
            (0, 3),
            (0, 3),
            (6, 3),
            (4, 4),
            (1, 3),
            (5, 3),
        ]);
        let mut dec = Decompressor::new(2);
        let mut buffer = vec![];
        dec.decompress(&data[..], &mut buffer, usize::MAX)?;
        assert_eq!(buffer, [0, 0, 0, 0, 1]);
        assert_eq!(dec.table_len(), 0);
        assert_eq!(dec.code_bits(), 3);
        Ok(())
    }

    #[test]
    fn code_not_yet_in_table() -> Result<()> {
        let data = pack(&[(4, 3), (1, 3), (6, 3), (5, 3)]);
        assert_eq!(decompress(2, &data)?, [1, 1, 1]);
        let data = pack(&[(4, 3), (2, 3), (6, 3), (7, 3), (5, 4)]);
        assert_eq!(decompress(2, &data)?, [2, 2, 2, 2, 2, 2]);
        Ok(())
    }

    #[test]
    fn invalid_codes() {
        let data = pack(&[(4, 3), (1, 3), (7, 3), (5, 3)]);
        assert!(matches!(decompress(2, &data), Err(Error::InvalidLzwData)));
        let data = pack(&[(4, 3), (6, 3), (5, 3)]);
        assert!(matches!(decompress(2, &data), Err(Error::InvalidLzwData)));
    }

    #[test]
    fn missing_end_code() -> Result<()> {
        assert_eq!(decompress(2, &[0x0C])?, [1, 0, 0, 0, 0, 0]);
        assert_eq!(decompress(2, &[])?, [0; 4]);
        Ok(())
    }

    #[test]
    fn widen_to_max() -> Result<()> {
        let mut codes = vec![(4, 3), (0, 3)];
        let mut bits = 3;
        let mut next_code = 6;
        for _ in 0..5000 {
            codes.push((0, bits));
            if next_code < 4096 {
                next_code += 1;
                if next_code == 1 << bits && bits < 12 {
                    bits += 1;
                }
            }
        }
        codes.push((5, bits));
        let data = pack(&codes);
        let mut dec = Decompressor::new(2);
        let mut buffer = vec![];
        dec.decompress(&data[..], &mut buffer, usize::MAX)?;
        assert_eq!(buffer.len(), 5001);
        assert!(buffer.iter().all(|i| *i == 0));
        assert_eq!(dec.code_bits(), 12);
        assert_eq!(dec.table_len(), 4096 - 6);
        Ok(())
    }

    #[test]
    fn widen_points() -> Result<()> {
        // min code size 2: widen once 8 and 16 codes are assigned
        let mut dec = Decompressor::new(2);
        let mut buffer = vec![];
        let data = pack(&[(4, 3), (0, 3), (0, 3)]);
        dec.decompress(&data[..], &mut buffer, 2)?;
        assert_eq!((dec.table_len(), dec.code_bits()), (1, 3));
        let mut dec = Decompressor::new(2);
        let mut buffer = vec![];
        let data = pack(&[(4, 3), (0, 3), (0, 3), (0, 3)]);
        dec.decompress(&data[..], &mut buffer, 3)?;
        assert_eq!((dec.table_len(), dec.code_bits()), (2, 4));
        Ok(())
    }

    #[test]
    fn min_code_size_one() -> Result<()> {
        // clear = 2, end = 3, 2-bit codes until the first entry is added
        assert_eq!(decompress(1, &[0xC6])?, [1, 0]);
        let data = pack(&[(2, 2), (1, 2), (1, 2), (4, 3), (3, 3)]);
        let mut dec = Decompressor::new(1);
        let mut buffer = vec![];
        dec.decompress(&data[..], &mut buffer, usize::MAX)?;
        assert_eq!(buffer, [1, 1, 1, 1]);
        assert_eq!(dec.code_bits(), 3);
        assert_eq!(dec.table_len(), 2);
        Ok(())
    }
}
