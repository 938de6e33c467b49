// bmp.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! 24-bit BMP encoding
use crate::error::{Error, Result};
use pix::rgb::{Rgb, SRgb8};
use pix::Raster;
use std::io::Write;

/// Size of file header, in bytes
const FILE_HEADER_SZ: u32 = 14;

/// Size of info header, in bytes
const INFO_HEADER_SZ: u32 = 40;

/// Offset of pixel data
const PIXEL_OFFSET: u32 = FILE_HEADER_SZ + INFO_HEADER_SZ;

/// Get the row stride and padding for an image width, in bytes.
///
/// Each row is `width * 3` bytes, padded with zeros to a multiple of 4.
pub fn row_stride(width: u32) -> (usize, usize) {
    let row = width as usize * 3;
    let stride = (row + 3) & !3;
    (stride, stride - row)
}

/// Get the total file size for an image, in bytes.
///
/// The size field of the file header is 32 bits.
fn file_sz(width: u32, height: u32) -> Result<u32> {
    let (stride, _) = row_stride(width);
    let sz = u64::from(PIXEL_OFFSET) + stride as u64 * u64::from(height);
    u32::try_from(sz).map_err(|_| Error::TooLargeImage)
}

/// Bitmap file header
struct FileHeader {
    /// Total file size
    file_sz: u32,
}

impl FileHeader {
    fn format<W: Write>(&self, w: &mut W) -> Result<()> {
        let mut buf = Vec::with_capacity(FILE_HEADER_SZ as usize);
        buf.extend_from_slice(b"BM");
        buf.extend_from_slice(&self.file_sz.to_le_bytes());
        buf.extend_from_slice(&[0; 4]); // reserved x 2
        buf.extend_from_slice(&PIXEL_OFFSET.to_le_bytes());
        w.write_all(&buf)?;
        Ok(())
    }
}

/// Bitmap info header (BITMAPINFOHEADER)
struct InfoHeader {
    width: u32,
    height: u32,
}

impl InfoHeader {
    fn format<W: Write>(&self, w: &mut W) -> Result<()> {
        let mut buf = Vec::with_capacity(INFO_HEADER_SZ as usize);
        buf.extend_from_slice(&INFO_HEADER_SZ.to_le_bytes());
        buf.extend_from_slice(&self.width.to_le_bytes());
        buf.extend_from_slice(&self.height.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // planes
        buf.extend_from_slice(&24u16.to_le_bytes()); // bits per pixel
        buf.extend_from_slice(&0u32.to_le_bytes()); // compression
        buf.extend_from_slice(&0u32.to_le_bytes()); // image size
        buf.extend_from_slice(&[0; 8]); // resolution
        buf.extend_from_slice(&[0; 8]); // palette counts
        w.write_all(&buf)?;
        Ok(())
    }
}

/// Encoder for 24-bit bottom-up BMP files
pub struct BmpEncoder<W: Write> {
    /// Writer for output data
    writer: W,
}

impl<W: Write> BmpEncoder<W> {
    /// Create a new BMP encoder
    pub fn new(writer: W) -> Self {
        BmpEncoder { writer }
    }

    /// Encode a raster, returning the number of bytes written
    pub fn encode(&mut self, raster: &Raster<SRgb8>) -> Result<u64> {
        let width = raster.width();
        let height = raster.height();
        let file_sz = file_sz(width, height)?;
        FileHeader { file_sz }.format(&mut self.writer)?;
        InfoHeader { width, height }.format(&mut self.writer)?;
        let (stride, _) = row_stride(width);
        let mut row = Vec::with_capacity(stride);
        for y in (0..height).rev() {
            row.clear();
            for x in 0..width {
                let p = raster.pixel(x as i32, y as i32);
                row.push(u8::from(Rgb::blue(p)));
                row.push(u8::from(Rgb::green(p)));
                row.push(u8::from(Rgb::red(p)));
            }
            row.resize(stride, 0);
            self.writer.write_all(&row)?;
        }
        self.writer.flush()?;
        Ok(file_sz.into())
    }
}
