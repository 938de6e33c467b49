// error.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
use std::collections::TryReserveError;
use std::fmt;
use std::io;

/// Errors encountered while converting
#[derive(Debug)]
pub enum Error {
    /// A wrapped I/O error.
    Io(io::Error),
    /// Signature is not `GIF89a` (contains the bytes found).
    UnsupportedFormat([u8; 6]),
    /// Input ended while more bytes were expected.
    TruncatedInput,
    /// Unrecognized extension label (strict mode only).
    UnsupportedExtension(u8),
    /// Unrecognized block introducer (strict mode only).
    UnsupportedBlock(u8),
    /// Memory could not be reserved.
    ResourceExhaustion,
    /// Image larger than specified by
    /// [max_image_sz](struct.Decoder.html#method.max_image_sz).
    TooLargeImage,
    /// LZW minimum code size out of range.
    InvalidCodeSize(u8),
    /// Compressed LZW data invalid or corrupt
    InvalidLzwData,
    /// Image block has no local table and there is no global table.
    MissingColorTable,
    /// Decoded color index is not in the active color table.
    InvalidColorIndex(u8),
}

/// Conversion result type
pub type Result<T> = std::result::Result<T, Error>;

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(fmt),
            Error::UnsupportedFormat(sig) => write!(
                fmt,
                "unsupported signature: {:?} (expected GIF89a)",
                String::from_utf8_lossy(sig)
            ),
            Error::UnsupportedExtension(label) => {
                write!(fmt, "unsupported extension label: {:#04x}", label)
            }
            Error::UnsupportedBlock(code) => {
                write!(fmt, "unsupported block introducer: {:#04x}", code)
            }
            _ => fmt::Debug::fmt(self, fmt),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => Error::TruncatedInput,
            _ => Error::Io(err),
        }
    }
}

impl From<TryReserveError> for Error {
    fn from(_err: TryReserveError) -> Self {
        Error::ResourceExhaustion
    }
}
