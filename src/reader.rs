// reader.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Sequential byte source for GIF input
use crate::error::{Error, Result};
use std::io::{ErrorKind, Read};

/// Byte reader which counts every byte consumed
pub(crate) struct ByteReader<R: Read> {
    /// Source of input data
    reader: R,
    /// Number of bytes consumed
    consumed: u64,
}

impl<R: Read> ByteReader<R> {
    /// Create a new byte reader
    pub fn new(reader: R) -> Self {
        ByteReader {
            reader,
            consumed: 0,
        }
    }

    /// Get the number of bytes consumed so far
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    /// Read the next byte
    pub fn next_byte(&mut self) -> Result<u8> {
        let mut buf = [0; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Err(Error::TruncatedInput),
                Ok(_) => {
                    self.consumed += 1;
                    return Ok(buf[0]);
                }
                Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Read a fixed number of bytes
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0; N];
        for b in buf.iter_mut() {
            *b = self.next_byte()?;
        }
        Ok(buf)
    }

    /// Read one length byte followed by that many payload bytes.
    ///
    /// Returns the length; zero is the terminator.
    fn read_sub_block(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        let len = usize::from(self.next_byte()?);
        buf.try_reserve(len)?;
        for _ in 0..len {
            buf.push(self.next_byte()?);
        }
        Ok(len)
    }

    /// Read a sequence of sub-blocks, appending their payloads to a buffer.
    ///
    /// Returns the number of non-empty sub-blocks read.
    pub fn read_sub_blocks(&mut self, buf: &mut Vec<u8>) -> Result<usize> {
        let mut count = 0;
        while self.read_sub_block(buf)? > 0 {
            count += 1;
        }
        Ok(count)
    }

    /// Consume a sequence of sub-blocks, discarding the payloads.
    ///
    /// Returns the number of payload bytes discarded.
    pub fn skip_sub_blocks(&mut self) -> Result<usize> {
        let mut skipped = 0;
        loop {
            let len = usize::from(self.next_byte()?);
            if len == 0 {
                return Ok(skipped);
            }
            for _ in 0..len {
                self.next_byte()?;
            }
            skipped += len;
        }
    }
}
