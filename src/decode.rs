// decode.rs
//
// Copyright (c) 2019-2025  Douglas Lau
//
//! GIF stream decoding onto a single composited raster
use crate::block::*;
use crate::composite::Compositor;
use crate::error::{Error, Result};
use crate::lzw::Decompressor;
use crate::reader::ByteReader;
use pix::rgb::SRgb8;
use pix::Raster;
use std::io::Read;

/// Supported signature
const SIGNATURE: &[u8; 6] = b"GIF89a";

/// Valid LZW minimum code sizes
const MIN_CODE_SIZES: std::ops::RangeInclusive<u8> = 1..=11;

/// Reason block dispatch ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Trailer block reached
    Trailer,
    /// Stopped at an unrecognized extension label
    UnsupportedExtension(u8),
    /// Stopped at an unrecognized block introducer
    UnsupportedBlock(u8),
}

/// Screen raster after all image blocks are composited
pub struct Canvas {
    /// Logical screen descriptor
    screen: LogicalScreenDesc,
    /// Composited raster
    raster: Raster<SRgb8>,
    /// Reason dispatch ended
    termination: Termination,
    /// Number of input bytes consumed
    consumed: u64,
}

impl Canvas {
    /// Get the logical screen descriptor
    pub fn screen(&self) -> &LogicalScreenDesc {
        &self.screen
    }

    /// Get the composited raster
    pub fn raster(&self) -> &Raster<SRgb8> {
        &self.raster
    }

    /// Get the reason block dispatch ended
    pub fn termination(&self) -> Termination {
        self.termination
    }

    /// Get the number of input bytes consumed
    pub fn encoded_byte_size(&self) -> u64 {
        self.consumed
    }

    /// Convert into the composited raster
    pub fn into_raster(self) -> Raster<SRgb8> {
        self.raster
    }
}

/// Decoding context, threaded through every block handler
pub(crate) struct Context<R: Read> {
    /// Input byte reader
    reader: ByteReader<R>,
    /// Strict mode (unsupported blocks are errors)
    strict: bool,
    /// Maximum image size, in bytes
    max_image_sz: Option<usize>,
    /// Logical screen descriptor
    screen: LogicalScreenDesc,
    /// Global color table
    global_color_table: Option<ColorTable>,
    /// Most recent graphic control extension
    graphic_control: Option<GraphicControl>,
    /// Screen raster
    raster: Raster<SRgb8>,
    /// Number of image blocks encountered
    n_images: usize,
}

impl LogicalScreenDesc {
    /// Decode a Logical Screen Descriptor block from a buffer
    fn from_buf(buf: &[u8; 7]) -> Self {
        let width = u16::from_le_bytes([buf[0], buf[1]]);
        let height = u16::from_le_bytes([buf[2], buf[3]]);
        LogicalScreenDesc::default()
            .with_screen_width(width)
            .with_screen_height(height)
            .with_flags(buf[4])
            .with_background_color_idx(buf[5])
            .with_pixel_aspect_ratio(buf[6])
    }
}

impl ImageDesc {
    /// Decode an Image Descriptor block (after the separator) from a buffer
    fn from_buf(buf: &[u8; 9]) -> Self {
        let left = u16::from_le_bytes([buf[0], buf[1]]);
        let top = u16::from_le_bytes([buf[2], buf[3]]);
        let width = u16::from_le_bytes([buf[4], buf[5]]);
        let height = u16::from_le_bytes([buf[6], buf[7]]);
        ImageDesc::default()
            .with_left(left)
            .with_top(top)
            .with_width(width)
            .with_height(height)
            .with_flags(buf[8])
    }
}

impl GraphicControl {
    /// Decode a Graphic Control body from a buffer
    fn from_buf(buf: &[u8; 4]) -> Self {
        let delay = u16::from_le_bytes([buf[1], buf[2]]);
        GraphicControl::default()
            .with_flags(buf[0])
            .with_delay_time_cs(delay)
            .with_transparent_color_idx(buf[3])
    }
}

impl TextGrid {
    /// Decode a Plain Text header from a buffer
    fn from_buf(buf: &[u8; 12]) -> Self {
        TextGrid {
            left: u16::from_le_bytes([buf[0], buf[1]]),
            top: u16::from_le_bytes([buf[2], buf[3]]),
            width: u16::from_le_bytes([buf[4], buf[5]]),
            height: u16::from_le_bytes([buf[6], buf[7]]),
            cell_width: buf[8],
            cell_height: buf[9],
            foreground_color_idx: buf[10],
            background_color_idx: buf[11],
        }
    }
}

impl ApplicationId {
    /// Decode an Application header from a buffer
    fn from_buf(buf: &[u8; 11]) -> Self {
        let mut identifier = [0; 8];
        identifier.copy_from_slice(&buf[..8]);
        let mut auth_code = [0; 3];
        auth_code.copy_from_slice(&buf[8..]);
        ApplicationId {
            identifier,
            auth_code,
        }
    }
}

/// Check the signature
fn parse_signature<R: Read>(reader: &mut ByteReader<R>) -> Result<()> {
    let sig = reader.read_array::<6>()?;
    if &sig == SIGNATURE {
        Ok(())
    } else {
        Err(Error::UnsupportedFormat(sig))
    }
}

/// Load a color table of a given length
fn load_color_table<R: Read>(
    reader: &mut ByteReader<R>,
    config: &ColorTableConfig,
) -> Result<ColorTable> {
    let mut colors = Vec::new();
    colors.try_reserve_exact(config.size_bytes())?;
    for _ in 0..config.size_bytes() {
        colors.push(reader.next_byte()?);
    }
    Ok(ColorTable::with_colors(&colors))
}

/// Allocate a raster covering the logical screen
fn alloc_raster(screen: &LogicalScreenDesc) -> Result<Raster<SRgb8>> {
    let width = screen.screen_width();
    let height = screen.screen_height();
    let len = usize::from(width) * usize::from(height);
    let mut pixels = Vec::new();
    pixels.try_reserve_exact(len)?;
    pixels.resize(len, SRgb8::default());
    Ok(Raster::with_pixels(width.into(), height.into(), pixels))
}

/// Check an image size against the maximum
fn check_image_sz(max_image_sz: Option<usize>, sz: usize) -> Result<()> {
    match max_image_sz {
        Some(max) if sz > max => Err(Error::TooLargeImage),
        _ => Ok(()),
    }
}

impl<R: Read> Context<R> {
    /// Read the header and global color table, then allocate the raster
    pub fn new(
        reader: R,
        max_image_sz: Option<usize>,
        strict: bool,
    ) -> Result<Self> {
        let mut reader = ByteReader::new(reader);
        parse_signature(&mut reader)?;
        let screen = LogicalScreenDesc::from_buf(&reader.read_array()?);
        debug!("screen : {:?}", screen);
        check_image_sz(max_image_sz, screen.image_sz())?;
        let config = screen.color_table_config();
        let global_color_table = if config.len() > 0 {
            Some(load_color_table(&mut reader, &config)?)
        } else {
            None
        };
        let raster = alloc_raster(&screen)?;
        Ok(Context {
            reader,
            strict,
            max_image_sz,
            screen,
            global_color_table,
            graphic_control: None,
            raster,
            n_images: 0,
        })
    }

    /// Dispatch all blocks, then get the composited canvas
    pub fn decode(mut self) -> Result<Canvas> {
        let termination = self.dispatch()?;
        let consumed = self.reader.consumed();
        info!(
            "decoded {} images from {} bytes ({:?})",
            self.n_images, consumed, termination
        );
        Ok(Canvas {
            screen: self.screen,
            raster: self.raster,
            termination,
            consumed,
        })
    }

    /// Dispatch blocks until the trailer or an unsupported block
    fn dispatch(&mut self) -> Result<Termination> {
        use crate::block::BlockCode::*;
        use crate::block::ExtensionCode::*;
        loop {
            let code = self.reader.next_byte()?;
            match BlockCode::from_u8(code) {
                Some(Trailer_) => return Ok(Termination::Trailer),
                Some(ImageDesc_) => self.image_block()?,
                Some(Extension_) => {
                    let label = self.reader.next_byte()?;
                    match ExtensionCode::from(label) {
                        GraphicControl_ => self.graphic_control()?,
                        Comment_ => self.comment()?,
                        PlainText_ => self.plain_text()?,
                        Application_ => self.application()?,
                        Unknown_(n) => {
                            return self.unsupported(Termination::UnsupportedExtension(n))
                        }
                    }
                }
                None => return self.unsupported(Termination::UnsupportedBlock(code)),
            }
        }
    }

    /// Handle an unsupported block or extension
    fn unsupported(&self, termination: Termination) -> Result<Termination> {
        match (self.strict, termination) {
            (true, Termination::UnsupportedExtension(n)) => {
                Err(Error::UnsupportedExtension(n))
            }
            (true, Termination::UnsupportedBlock(n)) => Err(Error::UnsupportedBlock(n)),
            _ => {
                warn!(
                    "stopping at byte {}: {:?}",
                    self.reader.consumed(),
                    termination
                );
                Ok(termination)
            }
        }
    }

    /// Read the fixed size byte of an extension
    fn extension_size(&mut self, expected: u8) -> Result<()> {
        let sz = self.reader.next_byte()?;
        if sz != expected {
            warn!("extension size {} (expected {})", sz, expected);
        }
        Ok(())
    }

    /// Handle a Graphic Control extension
    fn graphic_control(&mut self) -> Result<()> {
        self.extension_size(4)?;
        let gc = GraphicControl::from_buf(&self.reader.read_array()?);
        if self.reader.next_byte()? != 0 {
            warn!("graphic control extension not terminated");
        }
        debug!(
            "  block  : {:?} disposal: {:?}, delay: {}",
            gc,
            gc.disposal_method(),
            gc.delay_time_cs()
        );
        self.graphic_control = Some(gc);
        Ok(())
    }

    /// Handle a Comment extension
    fn comment(&mut self) -> Result<()> {
        let mut text = vec![];
        self.reader.read_sub_blocks(&mut text)?;
        debug!("  block  : Comment {:?}", String::from_utf8_lossy(&text));
        Ok(())
    }

    /// Handle a Plain Text extension
    fn plain_text(&mut self) -> Result<()> {
        self.extension_size(12)?;
        let grid = TextGrid::from_buf(&self.reader.read_array()?);
        let sz = self.reader.skip_sub_blocks()?;
        debug!("  block  : {:?}, {} text bytes", grid, sz);
        Ok(())
    }

    /// Handle an Application extension
    fn application(&mut self) -> Result<()> {
        self.extension_size(11)?;
        let app = ApplicationId::from_buf(&self.reader.read_array()?);
        let sz = self.reader.skip_sub_blocks()?;
        debug!(
            "  block  : Application {}{} looping: {}, {} data bytes",
            String::from_utf8_lossy(&app.identifier),
            String::from_utf8_lossy(&app.auth_code),
            app.is_looping(),
            sz
        );
        Ok(())
    }

    /// Handle an image block
    fn image_block(&mut self) -> Result<()> {
        self.n_images += 1;
        let desc = ImageDesc::from_buf(&self.reader.read_array()?);
        debug!("  block  : {:?} #{}", desc, self.n_images);
        // indices are expanded to 3 bytes per pixel
        check_image_sz(self.max_image_sz, desc.image_sz() * 3)?;
        let config = desc.color_table_config();
        let local_color_table = if config.len() > 0 {
            Some(load_color_table(&mut self.reader, &config)?)
        } else {
            None
        };
        let min_code_size = self.reader.next_byte()?;
        if !MIN_CODE_SIZES.contains(&min_code_size) {
            return Err(Error::InvalidCodeSize(min_code_size));
        }
        let mut data = vec![];
        let n_sub = self.reader.read_sub_blocks(&mut data)?;
        debug!("sub-blocks: {} ({} bytes)", n_sub, data.len());
        let colors = match (&local_color_table, &self.global_color_table) {
            (Some(tbl), _) => tbl,
            (None, Some(tbl)) => tbl,
            (None, None) => return Err(Error::MissingColorTable),
        };
        let transparent = if self.n_images > 1 {
            self.graphic_control
                .as_ref()
                .and_then(|gc| gc.transparent_color())
        } else {
            None
        };
        let mut indices = vec![];
        if !data.is_empty() {
            let mut dec = Decompressor::new(min_code_size);
            dec.decompress(&data, &mut indices, desc.image_sz())?;
        }
        let mut comp = Compositor::new(&mut self.raster, &desc, colors, transparent);
        comp.composite(&indices)?;
        if !comp.is_complete() {
            warn!(
                "incomplete image data: {} of {} pixels",
                comp.cursor(),
                desc.image_sz()
            );
        }
        Ok(())
    }
}
