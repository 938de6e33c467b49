// private.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! Private module for top-level items
use crate::bmp::BmpEncoder;
use crate::decode::{Canvas, Context, Termination};
use crate::error::Result;
use std::io::{BufReader, BufWriter, Read, Write};

/// GIF to BMP decoder
///
/// Reads one GIF89a stream, composites every image block onto a single
/// raster, then either returns the [Canvas] or encodes it as a 24-bit BMP.
///
/// ## Example: Convert a GIF
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// # let gif = &[
/// #   0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00,
/// #   0x02, 0x00, 0x80, 0x01, 0x00, 0x00, 0x00, 0x00,
/// #   0xff, 0xff, 0xff, 0x2c, 0x00, 0x00, 0x00, 0x00,
/// #   0x02, 0x00, 0x02, 0x00, 0x00, 0x02, 0x03, 0x0c,
/// #   0x10, 0x05, 0x00, 0x3b,
/// # ][..];
/// // ... open a `File` as "gif"
/// let mut bmp = vec![];
/// let stats = gif2bmp::Decoder::new(gif).convert(&mut bmp)?;
/// assert_eq!(stats.decoded_byte_size(), 70);
/// # Ok(())
/// # }
/// ```
///
/// [Canvas]: struct.Canvas.html
pub struct Decoder<R: Read> {
    /// Reader for input data
    reader: R,
    /// Maximum image size, in bytes
    max_image_sz: Option<usize>,
    /// Strict mode
    strict: bool,
}

impl<R: Read> Decoder<BufReader<R>> {
    /// Create a new buffered GIF decoder.
    pub fn new(reader: R) -> Self {
        Self::new_unbuffered(BufReader::new(reader))
    }
}

impl<R: Read> Decoder<R> {
    /// Create a new unbuffered GIF decoder.
    pub fn new_unbuffered(reader: R) -> Self {
        Decoder {
            reader,
            max_image_sz: Some(1 << 25),
            strict: false,
        }
    }

    /// Set the maximum image size (in bytes) to allow for decoding.
    ///
    /// Checked against both the logical screen and every image block.
    pub fn max_image_sz(mut self, max_image_sz: Option<usize>) -> Self {
        self.max_image_sz = max_image_sz;
        self
    }

    /// Set strict mode.
    ///
    /// When set, unsupported blocks and extensions are errors instead of
    /// ending the stream early.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Decode all blocks onto a canvas.
    pub fn decode(self) -> Result<Canvas> {
        Context::new(self.reader, self.max_image_sz, self.strict)?.decode()
    }

    /// Decode, then encode the canvas as a BMP.
    ///
    /// Nothing is written unless decoding succeeds.
    pub fn convert<W: Write>(self, writer: W) -> Result<ConversionStats> {
        let canvas = self.decode()?;
        let mut enc = BmpEncoder::new(BufWriter::new(writer));
        let decoded_byte_size = enc.encode(canvas.raster())?;
        let stats = ConversionStats {
            decoded_byte_size,
            encoded_byte_size: canvas.encoded_byte_size(),
            termination: canvas.termination(),
        };
        info!(
            "converted {} GIF bytes to {} BMP bytes",
            stats.encoded_byte_size, stats.decoded_byte_size
        );
        Ok(stats)
    }
}

/// Result of a conversion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionStats {
    /// Number of BMP bytes written
    decoded_byte_size: u64,
    /// Number of GIF bytes consumed
    encoded_byte_size: u64,
    /// Reason block dispatch ended
    termination: Termination,
}

impl ConversionStats {
    /// Get the number of BMP bytes written
    pub fn decoded_byte_size(&self) -> u64 {
        self.decoded_byte_size
    }

    /// Get the number of GIF bytes consumed
    pub fn encoded_byte_size(&self) -> u64 {
        self.encoded_byte_size
    }

    /// Get the reason block dispatch ended
    pub fn termination(&self) -> Termination {
        self.termination
    }
}

/// Convert a GIF stream to a BMP.
///
/// No image size limit is applied; allocation failure is reported as
/// `ResourceExhaustion`.
pub fn gif2bmp<R: Read, W: Write>(reader: R, writer: W) -> Result<ConversionStats> {
    Decoder::new_unbuffered(reader)
        .max_image_sz(None)
        .convert(writer)
}
