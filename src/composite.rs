// composite.rs
//
// Copyright (c) 2025  Douglas Lau
//
//! Placement of decoded color indices onto the screen raster
use crate::block::{ColorTable, ImageDesc};
use crate::error::{Error, Result};
use pix::rgb::SRgb8;
use pix::Raster;

/// Interlace passes (starting row, row step)
const PASSES: [(u16, usize); 4] = [(0, 8), (4, 8), (2, 4), (1, 2)];

/// Get image rows in the order they are stored for an interlaced image
pub fn interlace_rows(height: u16) -> impl Iterator<Item = u16> {
    PASSES
        .into_iter()
        .flat_map(move |(start, step)| (start..height).step_by(step))
}

/// Compositor for one image block.
///
/// Color indices are placed in decode order; transparent indices advance
/// the pixel cursor without touching the raster.
pub(crate) struct Compositor<'a> {
    /// Screen raster
    raster: &'a mut Raster<SRgb8>,
    /// Image descriptor of the block
    desc: &'a ImageDesc,
    /// Active color table
    colors: &'a ColorTable,
    /// Transparent color index, if applicable
    transparent: Option<u8>,
    /// Image row for each stored row (interlaced only)
    rows: Vec<u16>,
    /// Pixel cursor
    n: usize,
    /// Count of pixels outside of the screen
    clipped: usize,
}

impl<'a> Compositor<'a> {
    /// Create a new compositor
    pub fn new(
        raster: &'a mut Raster<SRgb8>,
        desc: &'a ImageDesc,
        colors: &'a ColorTable,
        transparent: Option<u8>,
    ) -> Self {
        let rows = if desc.interlaced() {
            interlace_rows(desc.height()).collect()
        } else {
            vec![]
        };
        Compositor {
            raster,
            desc,
            colors,
            transparent,
            rows,
            n: 0,
            clipped: 0,
        }
    }

    /// Get the pixel cursor
    pub fn cursor(&self) -> usize {
        self.n
    }

    /// Check whether every pixel of the image rectangle is placed
    pub fn is_complete(&self) -> bool {
        self.n >= self.desc.image_sz()
    }

    /// Get screen coordinates of the pixel at the cursor
    fn position(&self) -> (u32, u32) {
        let width = usize::from(self.desc.width());
        let row = self.n / width;
        let col = (self.n % width) as u32;
        let row = if self.desc.interlaced() {
            u32::from(self.rows[row])
        } else {
            row as u32
        };
        (
            col + u32::from(self.desc.left()),
            row + u32::from(self.desc.top()),
        )
    }

    /// Place one color index at the cursor, then advance it
    pub fn put(&mut self, idx: u8) -> Result<()> {
        if self.is_complete() {
            return Ok(());
        }
        let (x, y) = self.position();
        self.n += 1;
        if self.transparent == Some(idx) {
            return Ok(());
        }
        let clr = self.colors.entry(idx).ok_or(Error::InvalidColorIndex(idx))?;
        if x < self.raster.width() && y < self.raster.height() {
            *self.raster.pixel_mut(x as i32, y as i32) = clr;
        } else {
            self.clipped += 1;
        }
        Ok(())
    }

    /// Place a sequence of color indices
    pub fn composite(&mut self, indices: &[u8]) -> Result<()> {
        for idx in indices {
            if self.is_complete() {
                break;
            }
            self.put(*idx)?;
        }
        let extra = indices.len().saturating_sub(self.desc.image_sz());
        if extra > 0 {
            warn!("Extra image data: {} indices", extra);
        }
        if self.clipped > 0 {
            warn!("{} pixels outside of screen", self.clipped);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn colors() -> ColorTable {
        ColorTable::with_colors(&[
            0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x00,
            0xFF,
        ])
    }

    #[test]
    fn interlace_order() {
        let rows: Vec<u16> = interlace_rows(8).collect();
        assert_eq!(rows, [0, 4, 2, 6, 1, 3, 5, 7]);
        let rows: Vec<u16> = interlace_rows(5).collect();
        assert_eq!(rows, [0, 4, 2, 1, 3]);
        let rows: Vec<u16> = interlace_rows(1).collect();
        assert_eq!(rows, [0]);
        let mut rows: Vec<u16> = interlace_rows(19).collect();
        assert_eq!(&rows[..3], [0, 8, 16]);
        rows.sort();
        assert_eq!(rows, (0..19).collect::<Vec<u16>>());
    }

    #[test]
    fn offset_block() -> Result<()> {
        let mut raster = Raster::<SRgb8>::with_clear(4, 4);
        let desc = ImageDesc::default()
            .with_left(1)
            .with_top(2)
            .with_width(2)
            .with_height(2);
        let colors = colors();
        let mut comp = Compositor::new(&mut raster, &desc, &colors, None);
        comp.composite(&[1, 2, 3, 1])?;
        assert!(comp.is_complete());
        assert_eq!(raster.pixel(1, 2), SRgb8::new(0xFF, 0, 0));
        assert_eq!(raster.pixel(2, 2), SRgb8::new(0, 0xFF, 0));
        assert_eq!(raster.pixel(1, 3), SRgb8::new(0, 0, 0xFF));
        assert_eq!(raster.pixel(2, 3), SRgb8::new(0xFF, 0, 0));
        assert_eq!(raster.pixel(0, 0), SRgb8::default());
        Ok(())
    }

    #[test]
    fn interlaced_block() -> Result<()> {
        let mut raster = Raster::<SRgb8>::with_clear(1, 8);
        let desc = ImageDesc::default()
            .with_width(1)
            .with_height(8)
            .with_flags(0b0100_0000);
        let colors = colors();
        let mut comp = Compositor::new(&mut raster, &desc, &colors, None);
        comp.composite(&[0, 1, 2, 3, 0, 1, 2, 3])?;
        // stored rows 0, 4, 2, 6, 1, 3, 5, 7
        let expected = [0, 0, 2, 1, 1, 2, 3, 3];
        for (y, idx) in expected.iter().enumerate() {
            assert_eq!(raster.pixel(0, y as i32), colors.entry(*idx).unwrap());
        }
        Ok(())
    }

    #[test]
    fn transparent_skip() -> Result<()> {
        let mut raster = Raster::<SRgb8>::with_clear(3, 1);
        let colors = colors();
        *raster.pixel_mut(1, 0) = SRgb8::new(1, 2, 3);
        let desc = ImageDesc::default().with_width(3).with_height(1);
        let mut comp = Compositor::new(&mut raster, &desc, &colors, Some(2));
        comp.put(1)?;
        comp.put(2)?;
        assert_eq!(comp.cursor(), 2);
        comp.put(3)?;
        assert_eq!(raster.pixel(0, 0), SRgb8::new(0xFF, 0, 0));
        assert_eq!(raster.pixel(1, 0), SRgb8::new(1, 2, 3));
        assert_eq!(raster.pixel(2, 0), SRgb8::new(0, 0, 0xFF));
        Ok(())
    }

    #[test]
    fn clipped() -> Result<()> {
        let mut raster = Raster::<SRgb8>::with_clear(2, 2);
        let desc = ImageDesc::default()
            .with_left(1)
            .with_top(1)
            .with_width(2)
            .with_height(2);
        let colors = colors();
        let mut comp = Compositor::new(&mut raster, &desc, &colors, None);
        comp.composite(&[1, 1, 1, 1, 1, 1])?;
        assert_eq!(comp.cursor(), 4);
        assert_eq!(raster.pixel(1, 1), SRgb8::new(0xFF, 0, 0));
        assert_eq!(raster.pixel(0, 0), SRgb8::default());
        Ok(())
    }

    #[test]
    fn invalid_index() {
        let mut raster = Raster::<SRgb8>::with_clear(2, 2);
        let desc = ImageDesc::default().with_width(2).with_height(2);
        let colors = colors();
        let mut comp = Compositor::new(&mut raster, &desc, &colors, None);
        assert!(matches!(comp.put(4), Err(Error::InvalidColorIndex(4))));
    }
}
