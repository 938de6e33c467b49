// lib.rs      gif2bmp crate.
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! A library for converting GIF89a images to 24-bit BMP.
//!
//! Every image block of a GIF is composited onto one raster the size of the
//! logical screen, which is then encoded bottom-up as a BMP.
#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

pub mod block;
mod bmp;
mod composite;
mod decode;
mod error;
mod lzw;
mod private;
mod reader;
#[cfg(test)]
mod test_utils;

pub use crate::bmp::{row_stride, BmpEncoder};
pub use crate::composite::interlace_rows;
pub use crate::decode::{Canvas, Termination};
pub use crate::error::{Error, Result};
pub use crate::lzw::Decompressor;
pub use crate::private::{gif2bmp, ConversionStats, Decoder};
